//! Interactive prompts with CI/non-interactive fallback

use super::context::UiContext;
use crate::conflict::ConflictConfirm;
use crate::error::{AarsyncError, AarsyncResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Prompt for confirmation, returns default if non-interactive or auto-yes
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> AarsyncResult<bool> {
    if ctx.auto_yes() {
        println!("  {} (auto-approved)", message);
        return Ok(true);
    }

    if !ctx.is_interactive() {
        return Ok(default);
    }

    // cliclack blocks on terminal input
    let message = message.to_string();
    let result = tokio::task::spawn_blocking(move || {
        cliclack::confirm(&message)
            .initial_value(default)
            .interact()
    })
    .await
    .map_err(|e| AarsyncError::User(format!("Prompt task failed: {}", e)))?;

    result.map_err(|e| AarsyncError::User(format!("Prompt failed: {}", e)))
}

/// [`ConflictConfirm`] asking on the terminal
pub struct PromptConfirm {
    ctx: UiContext,
}

impl PromptConfirm {
    pub fn new(ctx: UiContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl ConflictConfirm for PromptConfirm {
    async fn confirm_delete(&self, managed: &Path, duplicates: &[PathBuf]) -> bool {
        let listed: Vec<String> = duplicates.iter().map(|p| p.display().to_string()).collect();
        let message = format!(
            "Remove older {} (superseded by {})?",
            listed.join(", "),
            managed.display()
        );
        match confirm(&self.ctx, &message, false).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn confirm_auto_yes() {
        let ctx = UiContext::non_interactive().with_auto_yes(true);
        let result = confirm(&ctx, "Test?", false).await.unwrap();
        assert!(result);
    }

    #[tokio::test]
    async fn confirm_non_interactive_default() {
        let ctx = UiContext::non_interactive();
        let result = confirm(&ctx, "Test?", true).await.unwrap();
        assert!(result);

        let result = confirm(&ctx, "Test?", false).await.unwrap();
        assert!(!result);
    }

    #[tokio::test]
    async fn prompt_confirm_declines_without_terminal() {
        let confirm = PromptConfirm::new(UiContext::non_interactive());
        assert!(
            !confirm
                .confirm_delete(Path::new("a-2.0.aar"), &[PathBuf::from("a-1.0.aar")])
                .await
        );

        let confirm = PromptConfirm::new(UiContext::non_interactive().with_auto_yes(true));
        assert!(
            confirm
                .confirm_delete(Path::new("a-2.0.aar"), &[PathBuf::from("a-1.0.aar")])
                .await
        );
    }
}
