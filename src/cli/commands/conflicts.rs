//! Conflicts command - detect duplicate managed and unmanaged artifacts

use crate::cli::args::ConflictsArgs;
use crate::cli::commands::ProjectContext;
use crate::conflict::ConflictResolver;
use crate::error::AarsyncResult;
use crate::ui::{self, PromptConfirm, UiContext};

/// Execute the conflicts command
pub async fn execute(args: ConflictsArgs, project: &ProjectContext) -> AarsyncResult<()> {
    let auto = args.yes || project.config.resolver.auto_resolve_conflicts;
    let ctx = UiContext::detect().with_auto_yes(auto);
    let resolver = project.resolver();
    let layout = &project.layout;

    if resolver.managed().is_empty() {
        ui::step_info(&ctx, "No managed artifacts yet; run aarsync resolve first");
        return Ok(());
    }

    let report = ConflictResolver::new(&layout.asset_root, resolver.managed())
        .skipping(vec![layout.scratch_dir.clone()])
        .resolve(&PromptConfirm::new(ctx.clone()))
        .await?;

    for path in &report.deleted {
        ui::step_ok(
            &ctx,
            &format!("Deleted older duplicate {}", layout.relative(path).display()),
        );
    }
    for warning in &report.warnings {
        ui::step_warn(&ctx, &warning.to_string());
    }
    if report.deleted.is_empty() && report.warnings.is_empty() {
        ui::step_ok(&ctx, "No conflicting artifacts");
    }

    Ok(())
}
