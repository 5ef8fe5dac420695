//! Interactive prompts with CI/non-interactive fallback

use super::context::UiContext;
use crate::error::{DdddError, DdddResult};

/// Ask for confirmation.
///
/// `--yes` answers true; without a terminal the default is returned.
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> DdddResult<bool> {
    if ctx.auto_yes() {
        println!("  {} (auto-approved)", message);
        return Ok(true);
    }

    if !ctx.is_interactive() {
        return Ok(default);
    }

    // cliclack blocks on stdin
    let message = message.to_string();
    tokio::task::spawn_blocking(move || {
        cliclack::confirm(&message)
            .initial_value(default)
            .interact()
    })
    .await
    .map_err(|e| DdddError::Internal(format!("prompt task failed: {}", e)))?
    .map_err(|e| DdddError::User(format!("Prompt failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn confirm_auto_yes() {
        let ctx = UiContext::non_interactive().with_auto_yes(true);
        assert!(confirm(&ctx, "Clear?", false).await.unwrap());
    }

    #[tokio::test]
    async fn confirm_non_interactive_default() {
        let ctx = UiContext::non_interactive();
        assert!(confirm(&ctx, "Clear?", true).await.unwrap());
        assert!(!confirm(&ctx, "Clear?", false).await.unwrap());
    }
}
