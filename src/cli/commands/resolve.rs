//! Resolve command - fetch and process every declared dependency

use crate::archive::StepOutcome;
use crate::cli::args::ResolveArgs;
use crate::cli::commands::ProjectContext;
use crate::conflict::{ConflictConfirm, FixedAnswer};
use crate::error::{AarsyncError, AarsyncResult};
use crate::resolution::{ResolutionOutcome, ResolutionService, ResolveOptions};
use crate::ui::{self, BatchProgress, PromptConfirm, UiContext};
use std::sync::Arc;
use tracing::debug;

/// Execute the resolve command
pub async fn execute(args: ResolveArgs, project: &ProjectContext) -> AarsyncResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);
    ui::intro(&ctx, "aarsync resolve");

    let declarations = project.declarations(&ctx);
    if declarations.dependencies.is_empty() {
        ui::step_info(&ctx, "No dependencies declared");
        ui::outro_success(&ctx, "Nothing to resolve");
        return Ok(());
    }
    ui::step_info(
        &ctx,
        &format!(
            "{} dependencies from {} declaration files",
            declarations.dependencies.len(),
            declarations.files.len()
        ),
    );

    let confirm: Arc<dyn ConflictConfirm> = if project.config.resolver.auto_resolve_conflicts {
        Arc::new(FixedAnswer(true))
    } else {
        Arc::new(PromptConfirm::new(ctx.clone()))
    };
    let progress = BatchProgress::new(&ctx);
    let resolver = project
        .resolver()
        .with_confirm(confirm)
        .with_progress(Arc::new(move |step: &StepOutcome| progress.on_step(step)));

    let (handle, task) = ResolutionService::spawn(resolver);
    let outcome = handle
        .resolve(
            declarations.dependencies,
            ResolveOptions { force: args.force },
        )
        .await;
    drop(handle);
    task.await
        .map_err(|e| AarsyncError::Internal(format!("Resolution task failed: {}", e)))?;
    let outcome = outcome?;

    report(&ctx, project, &outcome);

    if let Some(error) = outcome.error {
        ui::outro_error(&ctx, "Resolution failed");
        return Err(AarsyncError::User(error));
    }
    if !outcome.is_complete() {
        ui::outro_warn(&ctx, "Resolution incomplete");
        return Err(AarsyncError::User(format!(
            "{} dependencies could not be resolved",
            outcome.missing.len()
        )));
    }

    ui::outro_success(&ctx, "All dependencies resolved");
    Ok(())
}

fn report(ctx: &UiContext, project: &ProjectContext, outcome: &ResolutionOutcome) {
    debug!("Resolution took {} attempts", outcome.attempts);
    let relative = |path: &std::path::Path| project.layout.relative(path).display().to_string();

    if !outcome.copied.is_empty() {
        ui::step_ok(ctx, &format!("Fetched {} artifacts", outcome.copied.len()));
    }
    let batch = &outcome.batch;
    if !batch.processed.is_empty() {
        ui::step_ok(ctx, &format!("Processed {} archives", batch.processed.len()));
    }
    for path in &batch.removed {
        ui::step_info(ctx, &format!("Removed stale {}", relative(path)));
    }
    for (path, cause) in &batch.failed {
        ui::step_error(ctx, &format!("{}: {}", relative(path), cause));
    }
    for path in &outcome.conflicts.deleted {
        ui::step_info(ctx, &format!("Deleted older duplicate {}", relative(path)));
    }
    for warning in &outcome.warnings {
        ui::step_warn(ctx, warning);
    }

    let missing: Vec<String> = outcome
        .missing
        .iter()
        .map(|dep| {
            if dep.created_by.is_empty() {
                dep.key()
            } else {
                format!("{} (declared by {})", dep.key(), dep.created_by)
            }
        })
        .collect();
    ui::coordinate_list(ctx, "Missing dependencies", &missing);
}
