//! Post-processing progress bar with CI fallback

use super::context::UiContext;
use crate::archive::StepOutcome;
use indicatif::{ProgressBar, ProgressStyle};

/// Progress bar for artifact post-processing.
///
/// Fed one [`StepOutcome`] per processed artifact. Shows an indicatif bar
/// in interactive mode and stays silent in CI.
#[derive(Clone)]
pub struct BatchProgress {
    bar: Option<ProgressBar>,
}

const BAR_LENGTH: u64 = 100;

impl BatchProgress {
    pub fn new(ctx: &UiContext) -> Self {
        let bar = ctx.use_fancy_output().then(|| {
            let bar = ProgressBar::new(BAR_LENGTH);
            let bar_style = ProgressStyle::default_bar()
                .template("  {spinner:.green} Processing  {bar:20.green/dim} {percent:>3}% {msg:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                .progress_chars("━╸─");
            bar.set_style(bar_style);
            bar
        });
        Self { bar }
    }

    /// Advance the bar for one finished step
    pub fn on_step(&self, outcome: &StepOutcome) {
        let Some(bar) = &self.bar else {
            return;
        };
        bar.set_position((outcome.progress.clamp(0.0, 1.0) * BAR_LENGTH as f32) as u64);
        bar.set_message(shorten(&outcome.message));
        if outcome.done {
            bar.finish_and_clear();
        }
    }
}

fn shorten(message: &str) -> String {
    const MAX: usize = 60;
    if message.chars().count() > MAX {
        let tail: String = message.chars().rev().take(MAX - 3).collect::<Vec<_>>().into_iter().rev().collect();
        format!("...{}", tail)
    } else {
        message.to_string()
    }
}
