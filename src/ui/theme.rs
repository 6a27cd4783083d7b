//! Custom theme for cliclack prompts

use cliclack::ThemeState;
use console::Style;

/// Green-accented theme for aarsync prompts
#[derive(Debug, Clone, Default)]
pub struct AarsyncTheme;

impl cliclack::Theme for AarsyncTheme {
    fn bar_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Style::new().green(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().green().dim(),
        }
    }

    fn state_symbol_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Style::new().green(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().cyan(),
        }
    }
}

/// Initialize the global theme
pub fn init_theme() {
    cliclack::set_theme(AarsyncTheme);
}

#[cfg(test)]
mod tests {
    use super::*;
    use cliclack::Theme;

    #[test]
    fn theme_colors() {
        let theme = AarsyncTheme;
        let _ = theme.bar_color(&ThemeState::Active);
        let _ = theme.state_symbol_color(&ThemeState::Submit);
    }
}
