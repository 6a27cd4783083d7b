//! Terminal output for the aarsync CLI
//!
//! Uses `cliclack` for prompts and step logs and `indicatif` for the
//! post-processing bar, falling back to plain lines in CI.
//!
//! # Example
//!
//! ```rust,ignore
//! use aarsync::ui::{self, BatchProgress, UiContext};
//!
//! let ctx = UiContext::detect().with_auto_yes(args.yes);
//! ui::intro(&ctx, "aarsync resolve");
//!
//! let progress = BatchProgress::new(&ctx);
//! let resolver = resolver.with_progress(Arc::new(move |step: &StepOutcome| progress.on_step(step)));
//!
//! ui::coordinate_list(&ctx, "Missing", &missing);
//! ui::outro_warn(&ctx, "Resolution incomplete");
//! ```

mod context;
mod output;
mod progress;
mod prompts;
mod theme;

pub use context::UiContext;
pub use output::{
    coordinate_list, intro, outro_error, outro_success, outro_warn, section, step_error,
    step_info, step_ok, step_warn, step_warn_hint,
};
pub use progress::BatchProgress;
pub use prompts::{confirm, PromptConfirm};
pub use theme::init_theme;
