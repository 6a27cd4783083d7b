//! Incremental post-processing of managed artifacts
//!
//! [`BatchProcessor`] is a step object: each [`BatchProcessor::step`] call
//! handles exactly one artifact, so an async driver can yield between
//! steps and report progress.

use crate::abi::AbiSet;
use crate::archive::processor::{archive_abis, ArchiveProcessor};
use crate::archive::{is_explodable, EXPLODABLE_EXTENSIONS};
use crate::cache::{artifact_name, DirtyReason, ExplodeCache};
use crate::environment::EnvironmentSnapshot;
use crate::error::{AarsyncError, AarsyncResult};
use crate::managed::ManagedAssets;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Result of one step
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub done: bool,
    /// Fraction of the batch completed, 0.0 to 1.0
    pub progress: f32,
    pub message: String,
}

/// Summary of a finished batch
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchReport {
    /// Outputs of archives that were exploded
    pub processed: Vec<PathBuf>,

    /// Exploded directories removed because they went stale
    pub removed: Vec<PathBuf>,

    /// Artifacts whose processing failed, with the cause
    pub failed: Vec<(PathBuf, String)>,

    /// Artifacts that must be fetched again
    pub reresolve: Vec<String>,
}

enum Action {
    Skipped,
    Processed(PathBuf),
    Kept,
    Dropped,
    Removed(PathBuf),
    Reresolve(PathBuf),
}

/// Walks the union of managed artifacts and cache entries
pub struct BatchProcessor<'a> {
    cache: &'a mut ExplodeCache,
    managed: &'a mut ManagedAssets,
    processor: &'a ArchiveProcessor,
    env: EnvironmentSnapshot,
    scratch: PathBuf,
    updated: BTreeSet<PathBuf>,
    force: bool,
    queue: Vec<PathBuf>,
    position: usize,
    report: BatchReport,
}

impl<'a> BatchProcessor<'a> {
    /// `updated` lists artifacts copied by the current fetch; they are
    /// processed even when their cache entry is clean.
    pub fn new(
        cache: &'a mut ExplodeCache,
        managed: &'a mut ManagedAssets,
        processor: &'a ArchiveProcessor,
        env: EnvironmentSnapshot,
        scratch: impl Into<PathBuf>,
        updated: impl IntoIterator<Item = PathBuf>,
    ) -> Self {
        let updated: BTreeSet<PathBuf> = updated.into_iter().collect();
        let queue: BTreeSet<PathBuf> = managed
            .paths()
            .chain(cache.entries().map(|entry| entry.path.clone()))
            .chain(updated.iter().cloned())
            .filter(|path| is_explodable(path) || !path.is_file())
            .collect();

        Self {
            cache,
            managed,
            processor,
            env,
            scratch: scratch.into(),
            updated,
            force: false,
            queue: queue.into_iter().collect(),
            position: 0,
            report: BatchReport::default(),
        }
    }

    /// Reprocess every archive, clean entries included
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Process the next artifact
    pub fn step(&mut self) -> StepOutcome {
        let Some(path) = self.queue.get(self.position).cloned() else {
            return self.finish_step();
        };
        self.position += 1;

        let message = match self.visit(&path) {
            Ok(Action::Skipped) => format!("{} is up to date", path.display()),
            Ok(Action::Kept) => format!("Kept {}", path.display()),
            Ok(Action::Processed(output)) => {
                let message = format!("Exploded {}", output.display());
                self.report.processed.push(output);
                message
            }
            Ok(Action::Dropped) => format!("Forgot {}", path.display()),
            Ok(Action::Removed(dir)) => {
                let message = format!("Removed stale {}", dir.display());
                self.report.removed.push(dir);
                message
            }
            Ok(Action::Reresolve(discarded)) => {
                let message = format!("{} must be resolved again", discarded.display());
                self.report.reresolve.push(artifact_name(&discarded));
                self.report.removed.push(discarded);
                message
            }
            Err(e) => {
                error!(artifact = %path.display(), "Processing failed: {}", e);
                let message = format!("Failed to process {}", path.display());
                self.report.failed.push((path.clone(), e.to_string()));
                message
            }
        };

        if self.position >= self.queue.len() {
            let mut outcome = self.finish_step();
            outcome.message = message;
            outcome
        } else {
            StepOutcome {
                done: false,
                progress: self.progress(),
                message,
            }
        }
    }

    fn progress(&self) -> f32 {
        if self.queue.is_empty() {
            1.0
        } else {
            self.position as f32 / self.queue.len() as f32
        }
    }

    fn finish_step(&mut self) -> StepOutcome {
        if let Err(e) = self.persist() {
            error!("Failed to persist processing state: {}", e);
        }
        StepOutcome {
            done: true,
            progress: 1.0,
            message: "Processing complete".to_string(),
        }
    }

    fn persist(&mut self) -> AarsyncResult<()> {
        self.cache.save()?;
        self.managed.save()
    }

    /// Summary of everything done so far
    pub fn report(&self) -> &BatchReport {
        &self.report
    }

    pub fn into_report(self) -> BatchReport {
        self.report
    }

    /// Run every step, yielding to the runtime in between
    pub async fn drive<F>(mut self, mut on_step: F) -> BatchReport
    where
        F: FnMut(&StepOutcome),
    {
        loop {
            let outcome = self.step();
            on_step(&outcome);
            if outcome.done {
                break;
            }
            tokio::task::yield_now().await;
        }
        self.into_report()
    }

    fn visit(&mut self, path: &Path) -> AarsyncResult<Action> {
        if path.is_dir() {
            return self.visit_exploded(path);
        }
        if !path.exists() {
            let name = artifact_name(path);
            let tracked = self
                .cache
                .get(&name)
                .is_some_and(|entry| entry.path == path);
            if tracked {
                self.cache.invalidate(&name)?;
            }
            self.managed.unlabel(path);
            return Ok(Action::Dropped);
        }
        self.visit_archive(path)
    }

    fn visit_exploded(&mut self, dir: &Path) -> AarsyncResult<Action> {
        let name = artifact_name(dir);
        let reason = match self.cache.get(&name) {
            Some(entry) if entry.path == dir => entry.settings_mismatch(&self.env),
            Some(_) => None,
            None => Some(DirtyReason::Untracked),
        };
        let Some(reason) = reason else {
            return Ok(Action::Kept);
        };

        // a fresh copy of the archive is processed on its own step
        if source_archive(dir).is_some() {
            debug!("{} is stale ({}); source archive present", dir.display(), reason);
            return Ok(Action::Kept);
        }

        info!("Removing stale {} ({})", dir.display(), reason);
        remove_dir(dir)?;
        self.cache.invalidate(&name)?;
        self.managed.unlabel(dir);
        Ok(Action::Reresolve(dir.to_path_buf()))
    }

    fn visit_archive(&mut self, archive: &Path) -> AarsyncResult<Action> {
        let name = artifact_name(archive);
        let fresh = self.updated.contains(archive);
        let needs_processing = fresh
            || self.force
            || match self.cache.get(&name) {
                Some(entry) => entry.path != archive || entry.dirty_reason(&self.env).is_some(),
                None => true,
            };
        if !needs_processing {
            return Ok(Action::Skipped);
        }

        if !fresh {
            let restorable = self
                .cache
                .get(&name)
                .filter(|entry| entry.path == archive)
                .map(|entry| entry.restorable_abis(&self.env))
                .unwrap_or_default();
            let on_disk = if restorable.is_empty() {
                AbiSet::universal()
            } else {
                archive_abis(archive)?
            };
            if restorable.iter().any(|abi| !on_disk.contains(abi)) {
                info!(
                    "{} was stripped of {} libraries that are now targeted",
                    archive.display(),
                    restorable
                );
                fs::remove_file(archive).map_err(|e| {
                    AarsyncError::io(format!("removing {}", archive.display()), e)
                })?;
                self.cache.invalidate(&name)?;
                self.managed.unlabel(archive);
                return Ok(Action::Reresolve(archive.to_path_buf()));
            }
        }

        let explode = self.cache.should_explode(archive, &self.env, &self.scratch)?;
        let dest = archive.parent().unwrap_or(Path::new("."));

        if !explode {
            let stale = dest.join(&name);
            if stale.is_dir() {
                remove_dir(&stale)?;
                self.managed.unlabel(&stale);
                return Ok(Action::Removed(stale));
            }
            return Ok(Action::Skipped);
        }

        let processed = self.processor.process(
            archive,
            dest,
            self.env.process_mode(),
            &self.env.target_abis,
        )?;
        self.cache
            .mark_processed(&name, &processed.output, processed.available_abis)?;
        if processed.output != archive {
            self.managed.unlabel(archive);
            self.managed.label(&processed.output);
        }
        Ok(Action::Processed(processed.output))
    }
}

/// Archive an exploded directory was produced from, if still present
fn source_archive(dir: &Path) -> Option<PathBuf> {
    let name = dir.file_name()?.to_string_lossy().into_owned();
    let parent = dir.parent()?;
    EXPLODABLE_EXTENSIONS
        .iter()
        .map(|ext| parent.join(format!("{}.{}", name, ext)))
        .find(|candidate| candidate.is_file())
}

fn remove_dir(dir: &Path) -> AarsyncResult<()> {
    fs::remove_dir_all(dir).map_err(|e| AarsyncError::io(format!("removing {}", dir.display()), e))
}
