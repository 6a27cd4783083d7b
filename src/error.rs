//! Error types for aarsync
//!
//! All modules use `AarsyncResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for aarsync operations
pub type AarsyncResult<T> = Result<T, AarsyncError>;

/// All errors that can occur in aarsync
#[derive(Error, Debug)]
pub enum AarsyncError {
    // Environment errors
    #[error("Android SDK root not configured. Set android.sdk_root or ANDROID_HOME")]
    SdkRootMissing,

    #[error("Android SDK root does not exist: {0}")]
    SdkRootInvalid(PathBuf),

    #[error("Build tool not found: {command}")]
    BuildToolNotFound { command: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid dependency declaration in {path}: {reason}")]
    DeclarationInvalid { path: PathBuf, reason: String },

    #[error("Invalid package spec '{0}': expected group:artifact:version")]
    PackageSpecInvalid(String),

    // Fetch errors
    #[error("Build tool exited with code {code}")]
    ToolFailed { code: i32, output: String },

    #[error("Build tool was terminated by a signal")]
    ToolSignaled,

    #[error("AndroidX artifacts fetched but jetifier is not available: {0}")]
    JetifierUnavailable(String),

    // Archive errors
    #[error("Failed to process archive {path}: {reason}")]
    Archive { path: PathBuf, reason: String },

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // Cache errors
    #[error("Failed to read explode cache {path}: {reason}")]
    CacheRead { path: PathBuf, reason: String },

    #[error("Failed to persist explode cache: {0}")]
    CachePersist(String),

    // Resolution errors
    #[error("Resolution service stopped before replying")]
    ServiceStopped,

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl AarsyncError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create an archive processing error
    pub fn archive(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Archive {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Errors that abort a resolution before anything is mutated.
    pub fn is_configuration_fatal(&self) -> bool {
        matches!(
            self,
            Self::SdkRootMissing
                | Self::SdkRootInvalid(_)
                | Self::BuildToolNotFound { .. }
                | Self::ConfigInvalid { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::SdkRootMissing => Some("Run: aarsync config set android.sdk_root <path>"),
            Self::SdkRootInvalid(_) => Some("Check that the Android SDK is installed"),
            Self::BuildToolNotFound { .. } => {
                Some("Install Gradle or set resolver.gradle_command in .aarsync.toml")
            }
            Self::ToolFailed { .. } => Some("Re-run with -vv to see the full build output"),
            Self::JetifierUnavailable(_) => Some("Enable android.jetifier_supported"),
            _ => None,
        }
    }
}
