//! Step and banner output, cliclack logs in a terminal and tagged lines in CI

use super::context::UiContext;
use console::{style, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Ok,
    Info,
    Warn,
    Error,
}

impl Level {
    fn tag(self) -> &'static str {
        match self {
            Self::Ok => "[OK]",
            Self::Info => "[INFO]",
            Self::Warn => "[WARN]",
            Self::Error => "[FAIL]",
        }
    }

    fn color(self) -> Style {
        match self {
            Self::Ok => Style::new().green(),
            Self::Info => Style::new().cyan(),
            Self::Warn => Style::new().yellow(),
            Self::Error => Style::new().red(),
        }
    }
}

fn step(ctx: &UiContext, level: Level, message: &str) {
    if !ctx.use_fancy_output() {
        println!("  {} {}", level.color().apply_to(level.tag()), message);
        return;
    }
    let logged = match level {
        Level::Ok => cliclack::log::success(message),
        Level::Info => cliclack::log::info(message),
        Level::Warn => cliclack::log::warning(message),
        Level::Error => cliclack::log::error(message),
    };
    logged.ok();
}

fn outro(ctx: &UiContext, level: Level, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::outro(level.color().bold().apply_to(message)).ok();
    } else {
        let tag = if level == Level::Error { "[ERROR]" } else { level.tag() };
        println!();
        println!("{} {}", level.color().apply_to(tag), message);
    }
}

/// Command banner
pub fn intro(ctx: &UiContext, title: &str) {
    if ctx.use_fancy_output() {
        cliclack::intro(style(title).green().bold()).ok();
    } else {
        println!("{}", style(title).green().bold());
        println!();
    }
}

pub fn outro_success(ctx: &UiContext, message: &str) {
    outro(ctx, Level::Ok, message);
}

pub fn outro_warn(ctx: &UiContext, message: &str) {
    outro(ctx, Level::Warn, message);
}

pub fn outro_error(ctx: &UiContext, message: &str) {
    outro(ctx, Level::Error, message);
}

/// Bold heading preceded by a blank line
pub fn section(ctx: &UiContext, title: &str) {
    println!();
    if ctx.use_fancy_output() {
        cliclack::log::info(style(title).bold()).ok();
    } else {
        println!("{}", style(title).bold());
    }
}

pub fn step_ok(ctx: &UiContext, message: &str) {
    step(ctx, Level::Ok, message);
}

pub fn step_info(ctx: &UiContext, message: &str) {
    step(ctx, Level::Info, message);
}

pub fn step_warn(ctx: &UiContext, message: &str) {
    step(ctx, Level::Warn, message);
}

/// Warning followed by a dimmed remedy
pub fn step_warn_hint(ctx: &UiContext, message: &str, hint: &str) {
    let hint = if ctx.use_fancy_output() {
        style(hint).dim().to_string()
    } else {
        hint.to_string()
    };
    step(ctx, Level::Warn, &format!("{} - {}", message, hint));
}

pub fn step_error(ctx: &UiContext, message: &str) {
    step(ctx, Level::Error, message);
}

/// List dependency coordinates under a heading, one per line
pub fn coordinate_list(ctx: &UiContext, heading: &str, coordinates: &[String]) {
    if coordinates.is_empty() {
        return;
    }
    section(ctx, heading);
    for coordinate in coordinates {
        if ctx.use_fancy_output() {
            println!("  {} {}", style("-").dim(), coordinate);
        } else {
            println!("  - {}", coordinate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_non_interactive() {
        let ctx = UiContext::non_interactive();
        intro(&ctx, "Test");
        step_ok(&ctx, "Step completed");
        step_warn(&ctx, "Warning");
        step_warn_hint(&ctx, "Warning", "hint");
        step_error(&ctx, "Error");
        step_info(&ctx, "Info");
        coordinate_list(&ctx, "Missing", &["g:a:1".to_string()]);
        coordinate_list(&ctx, "Nothing", &[]);
        outro_warn(&ctx, "Incomplete");
        outro_error(&ctx, "Failed");
        outro_success(&ctx, "Done");
    }

    #[test]
    fn levels_have_distinct_tags() {
        let tags = [Level::Ok, Level::Info, Level::Warn, Level::Error].map(Level::tag);
        assert_eq!(tags, ["[OK]", "[INFO]", "[WARN]", "[FAIL]"]);
    }
}
