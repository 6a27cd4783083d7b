//! Explode cache records and their dirtiness rules

use crate::abi::AbiSet;
use crate::environment::EnvironmentSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Cached explode decision for one artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplodeEntry {
    /// Artifact file stem, the cache key
    pub name: String,

    /// Artifact modification time when the decision was made
    pub last_modified: DateTime<Utc>,

    /// Whether the artifact must be exploded
    pub explode: bool,

    /// Application id the artifact was processed for
    pub bundle_id: String,

    /// Where the artifact currently lives (archive or exploded directory)
    pub path: PathBuf,

    /// Architectures the archive ships native code for
    #[serde(default)]
    pub available_abis: AbiSet,

    /// Architectures targeted when the decision was made
    #[serde(default)]
    pub target_abis: AbiSet,

    pub gradle_build: bool,
    pub gradle_export: bool,
    pub gradle_template: bool,

    /// Version the user chose to keep despite a conflict
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignored_version: Option<String>,
}

/// Why a cached decision no longer holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtyReason {
    ApplicationId,
    TargetAbis,
    GradleBuild,
    GradleExport,
    GradleTemplate,
    Missing,
    /// Managed output with no cache record, e.g. after the cache was lost
    Untracked,
}

impl fmt::Display for DirtyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::ApplicationId => "application id changed",
            Self::TargetAbis => "target ABIs changed",
            Self::GradleBuild => "build system changed",
            Self::GradleExport => "project export changed",
            Self::GradleTemplate => "build template changed",
            Self::Missing => "artifact missing",
            Self::Untracked => "no cache record",
        };
        f.write_str(reason)
    }
}

impl ExplodeEntry {
    /// Fresh entry recording the environment at decision time
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        last_modified: DateTime<Utc>,
        env: &EnvironmentSnapshot,
    ) -> Self {
        let mut entry = Self {
            name: name.into(),
            last_modified,
            explode: false,
            bundle_id: String::new(),
            path: path.into(),
            available_abis: AbiSet::universal(),
            target_abis: AbiSet::universal(),
            gradle_build: false,
            gradle_export: false,
            gradle_template: false,
            ignored_version: None,
        };
        entry.record_environment(env);
        entry
    }

    /// Copy the decision-relevant environment fields into the entry
    pub fn record_environment(&mut self, env: &EnvironmentSnapshot) {
        self.bundle_id = env.application_id.clone();
        self.target_abis = env.target_abis.clone();
        self.gradle_build = env.gradle_build;
        self.gradle_export = env.export_project;
        self.gradle_template = env.gradle_template;
    }

    /// Compare the recorded environment against `env`.
    ///
    /// Pure: never touches the filesystem. `ignored_version` is not
    /// considered.
    pub fn settings_mismatch(&self, env: &EnvironmentSnapshot) -> Option<DirtyReason> {
        if self.bundle_id != env.application_id {
            Some(DirtyReason::ApplicationId)
        } else if self.target_abis != env.target_abis {
            Some(DirtyReason::TargetAbis)
        } else if self.gradle_build != env.gradle_build {
            Some(DirtyReason::GradleBuild)
        } else if self.gradle_export != env.export_project {
            Some(DirtyReason::GradleExport)
        } else if self.gradle_template != env.gradle_template {
            Some(DirtyReason::GradleTemplate)
        } else {
            None
        }
    }

    /// Settings mismatch, or the artifact is gone from disk
    pub fn dirty_reason(&self, env: &EnvironmentSnapshot) -> Option<DirtyReason> {
        self.settings_mismatch(env)
            .or_else(|| (!self.path.exists()).then_some(DirtyReason::Missing))
    }

    /// Architectures stripped under the recorded target that `env` now
    /// accepts. Only the original archive still has their libraries.
    pub fn restorable_abis(&self, env: &EnvironmentSnapshot) -> AbiSet {
        self.available_abis
            .rejected_by(&self.target_abis)
            .filter(|abi| env.target_abis.is_universal() || env.target_abis.contains(abi))
            .collect()
    }
}
