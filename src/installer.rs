//! SDK platform package installation

use crate::error::{AarsyncError, AarsyncResult};
use crate::fetch::CommandRunner;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Installs SDK platform packages requested by declarations
#[async_trait]
pub trait PackageInstaller: Send + Sync {
    async fn install(&self, package_ids: &[String]) -> AarsyncResult<()>;
}

/// Installs through the SDK's command line `sdkmanager`
pub struct SdkManagerInstaller {
    runner: Arc<dyn CommandRunner>,
    sdk_root: PathBuf,
}

impl SdkManagerInstaller {
    pub fn new(runner: Arc<dyn CommandRunner>, sdk_root: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            sdk_root: sdk_root.into(),
        }
    }

    /// Location of `sdkmanager`, preferring the command-line tools layout
    pub fn sdkmanager(&self) -> PathBuf {
        let latest = self.sdk_root.join("cmdline-tools/latest/bin/sdkmanager");
        if latest.exists() {
            latest
        } else {
            self.sdk_root.join("tools/bin/sdkmanager")
        }
    }
}

#[async_trait]
impl PackageInstaller for SdkManagerInstaller {
    async fn install(&self, package_ids: &[String]) -> AarsyncResult<()> {
        if package_ids.is_empty() {
            return Ok(());
        }
        let program = self.sdkmanager();
        let mut args = vec![format!("--sdk_root={}", self.sdk_root.display())];
        args.extend(package_ids.iter().cloned());

        info!("Installing SDK packages: {}", package_ids.join(", "));
        let output = self
            .runner
            .run(&program.to_string_lossy(), &args, &self.sdk_root)
            .await?;
        match output.exit_code {
            Some(0) => Ok(()),
            Some(code) => Err(AarsyncError::ToolFailed {
                code,
                output: output.tail(),
            }),
            None => Err(AarsyncError::ToolSignaled),
        }
    }
}
