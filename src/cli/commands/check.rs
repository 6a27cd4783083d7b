//! Check command - list cached artifacts whose build settings went stale

use crate::cli::commands::ProjectContext;
use crate::error::AarsyncResult;
use console::style;

/// Execute the check command
pub async fn execute(project: &ProjectContext) -> AarsyncResult<()> {
    let resolver = project.resolver();
    let stale = resolver.stale_artifacts();

    if stale.is_empty() {
        println!(
            "All {} cached artifacts match the current build settings.",
            resolver.cache().len()
        );
        return Ok(());
    }

    println!("{:<50} {:<30}", "ARTIFACT", "REASON");
    println!("{}", "-".repeat(80));
    for (name, reason) in &stale {
        println!("{:<50} {:<30}", name, style(reason).yellow());
    }

    println!();
    println!(
        "{} artifact(s) will be reprocessed on the next resolve",
        stale.len()
    );
    Ok(())
}
