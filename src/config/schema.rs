//! Configuration schema for aarsync
//!
//! Global configuration is stored at `~/.config/aarsync/config.toml`;
//! a project-local `.aarsync.toml` overrides individual keys.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Project layout
    pub project: ProjectConfig,

    /// Android build target settings
    pub android: AndroidConfig,

    /// Resolver behaviour
    pub resolver: ResolverConfig,
}

/// General application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Project layout, all paths relative to the project root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Root of the asset tree scanned for declarations and conflicts
    pub asset_root: PathBuf,

    /// Destination directory for fetched artifacts
    pub packages_dir: PathBuf,

    /// Scratch directory for the cache file, properties and work dirs
    pub scratch_dir: PathBuf,

    /// Application id substituted into manifests
    pub application_id: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("Assets"),
            packages_dir: PathBuf::from("Assets/Plugins/Android"),
            scratch_dir: PathBuf::from("Temp/aarsync"),
            application_id: "com.example.app".to_string(),
        }
    }
}

/// Android build target settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AndroidConfig {
    /// SDK root; falls back to ANDROID_HOME / ANDROID_SDK_ROOT
    pub sdk_root: Option<PathBuf>,

    /// Target ABIs; empty means universal
    pub target_abis: Vec<String>,

    /// Build with Gradle rather than the legacy internal build system
    pub gradle_build: bool,

    /// Export a project instead of building an APK
    pub export_project: bool,

    /// A custom Gradle template is in use
    pub gradle_template: bool,

    /// Whether packed (.aar) libraries can be consumed without exploding
    pub supports_packed_libraries: bool,

    /// Jetifier is currently enabled
    pub jetifier: bool,

    /// Jetifier can be enabled on demand
    pub jetifier_supported: bool,
}

impl Default for AndroidConfig {
    fn default() -> Self {
        Self {
            sdk_root: None,
            target_abis: vec!["armeabi-v7a".to_string(), "arm64-v8a".to_string()],
            gradle_build: true,
            export_project: false,
            gradle_template: false,
            supports_packed_libraries: true,
            jetifier: false,
            jetifier_supported: true,
        }
    }
}

/// Resolver behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Command used to launch Gradle
    pub gradle_command: String,

    /// Build script passed with `-b`; None uses the tool's default
    pub build_script: Option<PathBuf>,

    /// Task that copies the resolved packages
    pub task: String,

    /// Repositories searched before any declared repository
    pub repositories: Vec<String>,

    /// Explode archives that need processing
    pub explode_archives: bool,

    /// Fallback version for the data-binding/tooling artifacts
    pub data_binding_version: String,

    /// Delete older unmanaged duplicates without prompting
    pub auto_resolve_conflicts: bool,

    /// Request installation of declared platform packages
    pub install_platform_packages: bool,

    /// Extra `${name}` manifest substitutions
    pub manifest_variables: BTreeMap<String, String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            gradle_command: "gradle".to_string(),
            build_script: None,
            task: "copyPackages".to_string(),
            repositories: vec![
                "https://maven.google.com/".to_string(),
                "https://repo1.maven.org/maven2/".to_string(),
            ],
            explode_archives: true,
            data_binding_version: "3.4.0".to_string(),
            auto_resolve_conflicts: false,
            install_platform_packages: false,
            manifest_variables: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[project]"));
        assert!(toml.contains("[android]"));
        assert!(toml.contains("[resolver]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.resolver.task, "copyPackages");
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [android]
            target_abis = ["x86_64"]
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.android.target_abis, vec!["x86_64"]);
        assert!(config.android.gradle_build); // default preserved
    }

    #[test]
    fn manifest_variables_roundtrip() {
        let toml = r#"
            [resolver.manifest_variables]
            scheme = "myapp"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.resolver.manifest_variables.get("scheme").map(String::as_str),
            Some("myapp")
        );
    }
}
