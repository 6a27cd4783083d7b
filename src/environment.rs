//! Host build environment
//!
//! The resolver never queries the host directly; everything it needs about
//! the current build target comes through the [`Environment`] trait as an
//! immutable [`EnvironmentSnapshot`].

use crate::abi::{AbiSet, KNOWN_ABIS};
use crate::archive::ProcessMode;
use crate::config::Config;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Environment variables consulted for the SDK root, in order
pub const SDK_ENV_VARS: &[&str] = &["ANDROID_HOME", "ANDROID_SDK_ROOT"];

/// Build settings at one instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentSnapshot {
    pub application_id: String,
    pub target_abis: AbiSet,
    pub gradle_build: bool,
    pub export_project: bool,
    pub gradle_template: bool,
    pub supports_packed_libraries: bool,
    pub explode_enabled: bool,
    pub jetifier: bool,
}

impl EnvironmentSnapshot {
    /// How exploded archives are laid out for this build
    pub fn process_mode(&self) -> ProcessMode {
        if !self.gradle_build || self.export_project {
            ProcessMode::ExpandedProject
        } else {
            ProcessMode::Repack
        }
    }
}

/// Capability interface onto the host build environment
pub trait Environment: Send + Sync {
    /// Current build settings
    fn snapshot(&self) -> EnvironmentSnapshot;

    /// Android SDK root, if one is configured
    fn sdk_root(&self) -> Option<PathBuf>;

    /// Whether the jetifier can be switched on
    fn jetifier_supported(&self) -> bool;

    /// Switch the jetifier on. Returns false when unsupported.
    fn enable_jetifier(&self) -> bool;
}

/// Where things live inside a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub root: PathBuf,
    pub asset_root: PathBuf,
    pub packages_dir: PathBuf,
    pub scratch_dir: PathBuf,
}

impl ProjectLayout {
    pub fn from_config(root: &Path, config: &Config) -> Self {
        Self {
            root: root.to_path_buf(),
            asset_root: root.join(&config.project.asset_root),
            packages_dir: root.join(&config.project.packages_dir),
            scratch_dir: root.join(&config.project.scratch_dir),
        }
    }

    pub fn cache_file(&self) -> PathBuf {
        self.scratch_dir.join("explode-cache.toml")
    }

    pub fn managed_file(&self) -> PathBuf {
        self.scratch_dir.join("managed-assets.json")
    }

    pub fn properties_file(&self) -> PathBuf {
        self.scratch_dir.join("resolve.properties")
    }

    pub fn work_dir(&self) -> PathBuf {
        self.scratch_dir.join("work")
    }

    /// Project-relative display form of `path`
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

/// [`Environment`] backed by the merged configuration
pub struct ConfigEnvironment {
    config: Config,
    jetifier: AtomicBool,
}

impl ConfigEnvironment {
    pub fn new(config: Config) -> Self {
        for abi in &config.android.target_abis {
            if !KNOWN_ABIS.contains(&abi.as_str()) {
                warn!("Unknown target ABI in configuration: {}", abi);
            }
        }
        let jetifier = AtomicBool::new(config.android.jetifier);
        Self { config, jetifier }
    }
}

impl Environment for ConfigEnvironment {
    fn snapshot(&self) -> EnvironmentSnapshot {
        let android = &self.config.android;
        EnvironmentSnapshot {
            application_id: self.config.project.application_id.clone(),
            target_abis: android.target_abis.iter().map(String::as_str).collect(),
            gradle_build: android.gradle_build,
            export_project: android.export_project,
            gradle_template: android.gradle_template,
            supports_packed_libraries: android.supports_packed_libraries,
            explode_enabled: self.config.resolver.explode_archives,
            jetifier: self.jetifier.load(Ordering::SeqCst),
        }
    }

    fn sdk_root(&self) -> Option<PathBuf> {
        self.config.android.sdk_root.clone().or_else(|| {
            SDK_ENV_VARS
                .iter()
                .filter_map(|var| std::env::var_os(var))
                .find(|value| !value.is_empty())
                .map(PathBuf::from)
        })
    }

    fn jetifier_supported(&self) -> bool {
        self.config.android.jetifier_supported
    }

    fn enable_jetifier(&self) -> bool {
        if !self.jetifier_supported() {
            return false;
        }
        if !self.jetifier.swap(true, Ordering::SeqCst) {
            info!("Jetifier enabled for this session");
        }
        true
    }
}
