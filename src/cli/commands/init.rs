//! Init command - create project-local .aarsync.toml

use crate::cli::args::InitArgs;
use crate::config::LOCAL_CONFIG_FILE;
use crate::error::{AarsyncError, AarsyncResult};
use crate::ui::{self, UiContext};
use std::path::Path;
use tokio::fs;

/// Template for project-local config
const INIT_TEMPLATE: &str = r#"# aarsync project configuration
# Settings here override your global config (~/.config/aarsync/config.toml)

[project]
# asset_root = "Assets"
# packages_dir = "Assets/Plugins/Android"
# scratch_dir = "Temp/aarsync"
# application_id = "com.example.app"

[android]
# sdk_root = "/opt/android-sdk"      # falls back to ANDROID_HOME
# target_abis = ["armeabi-v7a", "arm64-v8a"]
# gradle_build = true
# export_project = false

[resolver]
# gradle_command = "gradle"
# repositories = ["https://maven.google.com/"]
# auto_resolve_conflicts = false

# [resolver.manifest_variables]
# scheme = "myapp"
"#;

/// Execute the init command
pub async fn execute(args: InitArgs) -> AarsyncResult<()> {
    let ctx = UiContext::detect();

    let target_dir = match args.path {
        Some(ref p) => p.clone(),
        None => std::env::current_dir()
            .map_err(|e| AarsyncError::io("getting current directory", e))?,
    };

    let config_path = target_dir.join(LOCAL_CONFIG_FILE);

    if config_path.exists() && !args.force {
        return Err(AarsyncError::User(format!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        )));
    }

    ensure_dir(&target_dir).await?;

    fs::write(&config_path, INIT_TEMPLATE)
        .await
        .map_err(|e| AarsyncError::io(format!("writing {}", config_path.display()), e))?;

    ui::step_ok(
        &ctx,
        &format!("Created project config {}", config_path.display()),
    );

    Ok(())
}

async fn ensure_dir(dir: &Path) -> AarsyncResult<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| AarsyncError::io(format!("creating directory {}", dir.display()), e))?;
    }
    Ok(())
}
