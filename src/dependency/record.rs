//! Declared package requests

use crate::error::{AarsyncError, AarsyncResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Version string meaning "newest available"
pub const LATEST: &str = "LATEST";

/// A package request declared by one caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub group: String,
    pub artifact: String,
    pub version: String,

    /// Candidate repositories in preference order
    pub repositories: Vec<String>,

    /// Who declared this dependency (usually a declaration file path)
    pub created_by: String,

    /// SDK packages that must be installed for this dependency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_package_ids: Option<Vec<String>>,
}

impl Dependency {
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
            repositories: Vec::new(),
            created_by: String::new(),
            platform_package_ids: None,
        }
    }

    /// Parse a `group:artifact:version` coordinate
    pub fn parse(spec: &str) -> AarsyncResult<Self> {
        let parts: Vec<&str> = spec.trim().split(':').collect();
        match parts.as_slice() {
            [group, artifact, version]
                if !group.is_empty() && !artifact.is_empty() && !version.is_empty() =>
            {
                Ok(Self::new(*group, *artifact, *version))
            }
            _ => Err(AarsyncError::PackageSpecInvalid(spec.to_string())),
        }
    }

    /// Rebuild a dependency from whatever coordinate the build tool printed.
    ///
    /// Never fails: a `+` or absent version becomes [`LATEST`], absent
    /// components stay empty.
    pub fn from_coordinate(coordinate: &str) -> Self {
        let mut parts = coordinate.trim().splitn(3, ':');
        let group = parts.next().unwrap_or_default();
        let artifact = parts.next().unwrap_or_default();
        let version = match parts.next() {
            None | Some("") | Some("+") => LATEST,
            Some(version) => version,
        };
        Self::new(group, artifact, version)
    }

    pub fn with_repositories(mut self, repositories: Vec<String>) -> Self {
        self.repositories = repositories;
        self
    }

    pub fn with_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = created_by.into();
        self
    }

    pub fn with_platform_packages(mut self, ids: Vec<String>) -> Self {
        self.platform_package_ids = Some(ids);
        self
    }

    /// Version-independent identity, `group:artifact`
    pub fn versionless_key(&self) -> String {
        format!("{}:{}", self.group, self.artifact)
    }

    /// Full coordinate, `group:artifact:version`
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.group, self.artifact, self.version)
    }

    /// Coordinate handed to the build tool; `LATEST` becomes the open `+` range
    pub fn package_spec(&self) -> String {
        let version = if self.version == LATEST {
            "+"
        } else {
            self.version.as_str()
        };
        format!("{}:{}:{}", self.group, self.artifact, version)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
