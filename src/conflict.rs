//! Duplicate artifact detection
//!
//! After processing, the asset tree may hold several versions of the same
//! logical artifact: the managed one the resolver fetched and unmanaged
//! copies dropped in by hand or by other tooling. Unmanaged copies that are
//! provably older are removed once confirmed; everything else is reported.

use crate::archive::is_package;
use crate::cache::artifact_name;
use crate::dependency::{compare_versions, split_versioned_name};
use crate::error::{AarsyncError, AarsyncResult};
use crate::managed::ManagedAssets;
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Base name of the monolithic legacy Play Services archive
pub const LEGACY_PLAY_SERVICES: &str = "google-play-services";

/// Base name prefix of split Play Services artifacts
pub const PLAY_SERVICES_PREFIX: &str = "play-services-";

/// Asks whether older unmanaged duplicates may be deleted
#[async_trait]
pub trait ConflictConfirm: Send + Sync {
    async fn confirm_delete(&self, managed: &Path, duplicates: &[PathBuf]) -> bool;
}

/// Answers every confirmation the same way
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

#[async_trait]
impl ConflictConfirm for FixedAnswer {
    async fn confirm_delete(&self, _managed: &Path, _duplicates: &[PathBuf]) -> bool {
        self.0
    }
}

/// A duplicate the resolver will not remove on its own
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictWarning {
    /// Version-stripped artifact name
    pub key: String,
    pub managed: Option<PathBuf>,
    pub conflicting: Vec<PathBuf>,
    pub reason: String,
}

impl fmt::Display for ConflictWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.reason)?;
        if let Some(managed) = &self.managed {
            write!(f, "; managed {}", managed.display())?;
        }
        let paths: Vec<String> = self
            .conflicting
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        write!(f, "; conflicting {}", paths.join(", "))
    }
}

/// Outcome of a conflict pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictReport {
    pub deleted: Vec<PathBuf>,
    pub warnings: Vec<ConflictWarning>,
}

#[derive(Debug, Clone)]
struct Found {
    path: PathBuf,
    version: Option<String>,
}

fn versioned(path: &Path) -> (String, Found) {
    let name = artifact_name(path);
    let (base, version) = split_versioned_name(&name);
    (
        base.to_string(),
        Found {
            path: path.to_path_buf(),
            version: version.map(str::to_string),
        },
    )
}

/// Reconciles managed artifacts against unmanaged copies under the asset
/// root
pub struct ConflictResolver<'a> {
    asset_root: &'a Path,
    managed: &'a ManagedAssets,
    skip: Vec<PathBuf>,
}

impl<'a> ConflictResolver<'a> {
    pub fn new(asset_root: &'a Path, managed: &'a ManagedAssets) -> Self {
        Self {
            asset_root,
            managed,
            skip: Vec::new(),
        }
    }

    /// Directories never scanned for unmanaged artifacts
    pub fn skipping(mut self, dirs: Vec<PathBuf>) -> Self {
        self.skip = dirs;
        self
    }

    fn managed_by_key(&self) -> BTreeMap<String, Found> {
        let mut keyed: BTreeMap<String, Found> = BTreeMap::new();
        for path in self.managed.paths().filter(|p| p.exists()) {
            let (key, found) = versioned(&path);
            let newer = match keyed.get(&key) {
                Some(existing) => match (&found.version, &existing.version) {
                    (Some(a), Some(b)) => compare_versions(a, b) == Ordering::Greater,
                    (Some(_), None) => true,
                    _ => false,
                },
                None => true,
            };
            if newer {
                keyed.insert(key, found);
            }
        }
        keyed
    }

    fn unmanaged_by_key(&self) -> AarsyncResult<BTreeMap<String, Vec<Found>>> {
        let mut keyed: BTreeMap<String, Vec<Found>> = BTreeMap::new();
        if !self.asset_root.is_dir() {
            return Ok(keyed);
        }

        let walker = WalkDir::new(self.asset_root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let hidden = entry.depth() > 0
                    && entry.file_name().to_string_lossy().starts_with('.');
                !hidden && !self.skip.iter().any(|dir| entry.path() == dir)
            });
        for entry in walker {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file() || !is_package(path) || self.managed.is_managed(path) {
                continue;
            }
            let (key, found) = versioned(path);
            keyed.entry(key).or_default().push(found);
        }
        Ok(keyed)
    }

    /// Find duplicates and remove the ones that are provably older
    pub async fn resolve(&self, confirm: &dyn ConflictConfirm) -> AarsyncResult<ConflictReport> {
        let managed = self.managed_by_key();
        let unmanaged = self.unmanaged_by_key()?;
        let mut report = ConflictReport::default();

        if let Some(warning) = legacy_play_services(&managed, &unmanaged) {
            warn!("{}", warning);
            report.warnings.push(warning);
        }

        for (key, owned) in &managed {
            let Some(duplicates) = unmanaged.get(key) else {
                continue;
            };
            let paths: Vec<PathBuf> = duplicates.iter().map(|d| d.path.clone()).collect();

            let safe = match &owned.version {
                Some(managed_version) => duplicates.iter().all(|d| {
                    d.version
                        .as_deref()
                        .is_some_and(|v| compare_versions(v, managed_version) != Ordering::Greater)
                }),
                None => false,
            };

            let reason = if !safe {
                if owned.version.is_none() || duplicates.iter().any(|d| d.version.is_none()) {
                    "unversioned duplicate"
                } else {
                    "unmanaged copy is newer than the managed version"
                }
            } else if confirm.confirm_delete(&owned.path, &paths).await {
                for path in &paths {
                    fs::remove_file(path).map_err(|e| {
                        AarsyncError::io(format!("removing {}", path.display()), e)
                    })?;
                    info!("Removed older duplicate {}", path.display());
                }
                report.deleted.extend(paths);
                continue;
            } else {
                "removal of older duplicate declined"
            };

            let warning = ConflictWarning {
                key: key.clone(),
                managed: Some(owned.path.clone()),
                conflicting: paths,
                reason: reason.to_string(),
            };
            warn!("{}", warning);
            report.warnings.push(warning);
        }

        Ok(report)
    }
}

fn legacy_play_services(
    managed: &BTreeMap<String, Found>,
    unmanaged: &BTreeMap<String, Vec<Found>>,
) -> Option<ConflictWarning> {
    let all = managed.iter().chain(
            unmanaged
                .iter()
                .flat_map(|(key, list)| list.iter().map(move |found| (key, found))),
        );

    let mut legacy = Vec::new();
    let mut modern = false;
    for (key, found) in all {
        if key == LEGACY_PLAY_SERVICES {
            legacy.push(found.path.clone());
        } else if key.starts_with(PLAY_SERVICES_PREFIX) {
            modern = true;
        }
    }

    (modern && !legacy.is_empty()).then(|| ConflictWarning {
        key: LEGACY_PLAY_SERVICES.to_string(),
        managed: None,
        conflicting: legacy,
        reason: "legacy monolithic Play Services archive conflicts with split play-services artifacts; remove it"
            .to_string(),
    })
}
