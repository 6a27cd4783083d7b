//! Status command - check SDK, build tool and cache health

use crate::cli::commands::ProjectContext;
use crate::environment::{ConfigEnvironment, Environment};
use crate::error::AarsyncResult;
use crate::fetch::{ArtifactFetcher, CommandRunner, ProcessRunner};
use console::{style, Emoji};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[FAIL] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");

/// Execute the status command
pub async fn execute(project: &ProjectContext) -> AarsyncResult<()> {
    println!("{}", style("aarsync Status").bold().green());
    println!();

    let mut all_ok = true;
    all_ok &= check_sdk(project);
    all_ok &= check_build_tool(project, &ProcessRunner).await;
    check_project(project);

    println!();
    if all_ok {
        println!("{}", style("All critical checks passed").green().bold());
    } else {
        println!(
            "{}",
            style("Some checks failed - see above for details").yellow().bold()
        );
    }

    Ok(())
}

fn check_sdk(project: &ProjectContext) -> bool {
    println!("{}", style("Android SDK:").bold());
    let env = ConfigEnvironment::new(project.config.clone());

    match ArtifactFetcher::sdk_root(&env) {
        Ok(root) => {
            println!("  {} {}", CHECK, style(root.display()).green());
            let snapshot = env.snapshot();
            let abis: Vec<&str> = snapshot.target_abis.iter().collect();
            println!(
                "  {} Target ABIs: {}",
                CHECK,
                if abis.is_empty() { "all".to_string() } else { abis.join(", ") }
            );
            true
        }
        Err(e) => {
            let hint = e.hint().unwrap_or_default();
            println!("  {} {} - {}", CROSS, style(e).red(), hint);
            false
        }
    }
}

async fn check_build_tool(project: &ProjectContext, runner: &dyn CommandRunner) -> bool {
    println!();
    println!("{}", style("Build tool:").bold());

    let command = &project.config.resolver.gradle_command;
    match runner
        .run(command, &["--version".to_string()], &project.layout.root)
        .await
    {
        Ok(output) if output.success() => {
            let version = output
                .stdout
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty() && !line.starts_with('-'))
                .unwrap_or("unknown version");
            println!("  {} {} ({})", CHECK, style(command).green(), version);
            true
        }
        Ok(output) => {
            println!(
                "  {} {} - exited with {:?}",
                WARN,
                style(command).yellow(),
                output.exit_code
            );
            false
        }
        Err(e) => {
            let hint = e.hint().unwrap_or_default();
            println!("  {} {} - {}", CROSS, style(e).red(), hint);
            false
        }
    }
}

fn check_project(project: &ProjectContext) {
    let layout = &project.layout;
    println!();
    println!("{}", style("Project:").bold());
    println!("  {} Root: {}", CHECK, layout.root.display());
    match &project.local_config {
        Some(path) => println!("  {} Local config: {}", CHECK, path.display()),
        None => println!("  {} No local config (run: aarsync init)", WARN),
    }

    let resolver = project.resolver();
    let cache = resolver.cache();
    let stale = resolver.stale_artifacts();
    if stale.is_empty() {
        println!("  {} Explode cache: {} entries", CHECK, cache.len());
    } else {
        println!(
            "  {} Explode cache: {} entries, {} stale (run: aarsync check)",
            WARN,
            cache.len(),
            stale.len()
        );
    }
    println!(
        "  {} Managed artifacts: {}",
        CHECK,
        resolver.managed().len()
    );
}
