//! End-to-end resolution cycle
//!
//! merge → install platform packages → fetch → label → process → resolve
//! conflicts. Configuration and tool failures report every dependency
//! missing and leave the tree untouched.

use crate::archive::manifest::APPLICATION_ID_VARIABLE;
use crate::archive::{ArchiveProcessor, BatchProcessor, BatchReport, StepOutcome};
use crate::cache::{artifact_name, DirtyReason, ExplodeCache};
use crate::config::Config;
use crate::conflict::{ConflictConfirm, ConflictReport, ConflictResolver, FixedAnswer};
use crate::dependency::{Dependency, DependencyMerger, MergedRequest};
use crate::environment::{Environment, ProjectLayout};
use crate::error::AarsyncError;
use crate::fetch::{ArtifactFetcher, CommandRunner, FetchOutcome, FetchSettings};
use crate::installer::{PackageInstaller, SdkManagerInstaller};
use crate::managed::ManagedAssets;
use crate::resolution::ResolutionState;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Fetch attempts per resolution: one retry for the jetifier or for
/// artifacts whose exploded output had to be discarded
const MAX_ATTEMPTS: usize = 2;

/// Progress callback invoked after every processing step
pub type ProgressFn = Arc<dyn Fn(&StepOutcome) + Send + Sync>;

/// Per-request options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Reprocess every managed artifact, not only the fetched ones
    pub force: bool,
}

/// What a resolution produced
#[derive(Debug, Clone, Default)]
pub struct ResolutionOutcome {
    /// Dependencies still unresolved
    pub missing: Vec<Dependency>,
    pub copied: Vec<PathBuf>,
    pub batch: BatchReport,
    pub conflicts: ConflictReport,
    /// Non-fatal problems, merge warnings included
    pub warnings: Vec<String>,
    /// Fatal error that aborted the cycle
    pub error: Option<String>,
    pub attempts: usize,
}

impl ResolutionOutcome {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.error.is_none()
    }
}

/// Owns the explode cache and the managed asset set for one project
pub struct Resolver {
    env: Arc<dyn Environment>,
    fetcher: ArtifactFetcher,
    installer: Option<Arc<dyn PackageInstaller>>,
    confirm: Arc<dyn ConflictConfirm>,
    progress: Option<ProgressFn>,
    layout: ProjectLayout,
    cache: ExplodeCache,
    managed: ManagedAssets,
    global_repositories: Vec<String>,
    manifest_variables: BTreeMap<String, String>,
}

impl Resolver {
    pub fn new(
        env: Arc<dyn Environment>,
        runner: Arc<dyn CommandRunner>,
        config: &Config,
        layout: ProjectLayout,
    ) -> Self {
        let installer: Option<Arc<dyn PackageInstaller>> = if config.resolver.install_platform_packages {
            env.sdk_root().map(|sdk| {
                Arc::new(SdkManagerInstaller::new(runner.clone(), sdk)) as Arc<dyn PackageInstaller>
            })
        } else {
            None
        };
        let fetcher = ArtifactFetcher::new(
            runner,
            FetchSettings::from_config(&config.resolver),
            layout.root.clone(),
            layout.properties_file(),
        );
        let cache = ExplodeCache::load(layout.cache_file());
        let managed = ManagedAssets::load(layout.managed_file(), layout.root.clone());

        Self {
            env,
            fetcher,
            installer,
            confirm: Arc::new(FixedAnswer(config.resolver.auto_resolve_conflicts)),
            progress: None,
            layout,
            cache,
            managed,
            global_repositories: config.resolver.repositories.clone(),
            manifest_variables: config.resolver.manifest_variables.clone(),
        }
    }

    pub fn with_confirm(mut self, confirm: Arc<dyn ConflictConfirm>) -> Self {
        self.confirm = confirm;
        self
    }

    pub fn with_installer(mut self, installer: Arc<dyn PackageInstaller>) -> Self {
        self.installer = Some(installer);
        self
    }

    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn cache(&self) -> &ExplodeCache {
        &self.cache
    }

    pub fn managed(&self) -> &ManagedAssets {
        &self.managed
    }

    /// Build the deduplicated request for `dependencies`
    pub fn merge(&self, dependencies: &[Dependency]) -> MergedRequest {
        let sdk_root = self.env.sdk_root();
        let asset_root = self.layout.relative(&self.layout.asset_root).to_path_buf();
        DependencyMerger::new(&self.global_repositories, &self.layout.root, &asset_root)
            .with_sdk_root(sdk_root.as_deref())
            .merge(dependencies)
    }

    /// Cache entries whose settings no longer match the environment, and
    /// exploded outputs the cache has no record of
    pub fn stale_artifacts(&self) -> Vec<(String, DirtyReason)> {
        let mut stale = self.cache.stale_artifacts(&self.env.snapshot());
        stale.extend(
            self.managed
                .paths()
                .filter(|path| path.is_dir())
                .map(|dir| artifact_name(&dir))
                .filter(|name| self.cache.get(name).is_none())
                .map(|name| (name, DirtyReason::Untracked)),
        );
        stale
    }

    /// Run one full resolution
    pub async fn resolve(
        &mut self,
        dependencies: &[Dependency],
        options: ResolveOptions,
    ) -> ResolutionOutcome {
        let request = self.merge(dependencies);
        let mut outcome = ResolutionOutcome {
            warnings: request.warnings.clone(),
            ..ResolutionOutcome::default()
        };
        for warning in &request.warnings {
            warn!("{}", warning);
        }

        if let Err(e) = ArtifactFetcher::sdk_root(self.env.as_ref()) {
            return self.abort(outcome, &request, e);
        }
        self.install_platform_packages(dependencies, &mut outcome).await;

        let mut force = options.force;
        let mut copied: BTreeSet<PathBuf> = BTreeSet::new();
        let mut state = ResolutionState::default();
        for attempt in 1..=MAX_ATTEMPTS {
            outcome.attempts = attempt;
            let fetched = self
                .fetcher
                .fetch(&request, self.env.as_ref(), &self.layout.packages_dir)
                .await;
            state = match fetched {
                Ok(FetchOutcome::Completed(state)) => state,
                Ok(FetchOutcome::RetryWithJetifier(state)) if attempt < MAX_ATTEMPTS => {
                    debug!("Ignoring {} copies made without the jetifier", state.copied.len());
                    continue;
                }
                Ok(FetchOutcome::RetryWithJetifier(state)) => state,
                Err(e) => return self.abort(outcome, &request, e),
            };

            for path in &state.copied {
                self.managed.label(path);
            }
            copied.extend(state.copied.iter().cloned());

            let batch = self.process(&state.copied, force).await;
            state.processed = true;
            let reresolve = !batch.reresolve.is_empty();
            if !batch.failed.is_empty() {
                state.problems_logged = true;
            }
            outcome.batch = batch;

            if reresolve && attempt < MAX_ATTEMPTS {
                info!(
                    "Fetching again for {} discarded artifacts",
                    outcome.batch.reresolve.len()
                );
                force = false;
                continue;
            }
            break;
        }

        outcome.missing = state.missing;
        outcome.copied = copied.into_iter().collect();

        let root = self.layout.asset_root.clone();
        let skip = vec![self.layout.scratch_dir.clone()];
        match ConflictResolver::new(&root, &self.managed)
            .skipping(skip)
            .resolve(self.confirm.as_ref())
            .await
        {
            Ok(report) => {
                outcome
                    .warnings
                    .extend(report.warnings.iter().map(|w| w.to_string()));
                outcome.conflicts = report;
            }
            Err(e) => {
                error!("Conflict check failed: {}", e);
                outcome.warnings.push(format!("conflict check failed: {}", e));
            }
        }

        self.managed.retain_existing();
        if let Err(e) = self.managed.save() {
            warn!("Failed to save managed asset list: {}", e);
        }

        for dep in &outcome.missing {
            warn!("Unresolved dependency {} (declared by {})", dep, dep.created_by);
        }
        info!(
            copied = outcome.copied.len(),
            missing = outcome.missing.len(),
            problems = state.problems_logged,
            "Resolution finished"
        );
        outcome
    }

    fn abort(
        &self,
        mut outcome: ResolutionOutcome,
        request: &MergedRequest,
        e: AarsyncError,
    ) -> ResolutionOutcome {
        if e.is_configuration_fatal() {
            error!("Resolution aborted: {}", e);
        } else {
            error!("Fetch failed: {}", e);
            if let AarsyncError::ToolFailed { output, .. } = &e {
                error!("{}", output);
            }
        }
        outcome.missing = request.dependencies();
        outcome.error = Some(e.to_string());
        outcome
    }

    async fn install_platform_packages(
        &self,
        dependencies: &[Dependency],
        outcome: &mut ResolutionOutcome,
    ) {
        let Some(installer) = &self.installer else {
            return;
        };
        let ids: Vec<String> = dependencies
            .iter()
            .filter_map(|dep| dep.platform_package_ids.as_ref())
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if ids.is_empty() {
            return;
        }
        if let Err(e) = installer.install(&ids).await {
            warn!("Platform package installation failed: {}", e);
            outcome
                .warnings
                .push(format!("platform package installation failed: {}", e));
        }
    }

    async fn process(&mut self, copied: &[PathBuf], force: bool) -> BatchReport {
        match self.cache.prune() {
            Ok(pruned) if !pruned.is_empty() => {
                debug!("Pruned {} vanished artifacts from the explode cache", pruned.len())
            }
            Ok(_) => {}
            Err(e) => warn!("Failed to prune explode cache: {}", e),
        }

        let snapshot = self.env.snapshot();
        let mut variables = self.manifest_variables.clone();
        variables.insert(
            APPLICATION_ID_VARIABLE.to_string(),
            snapshot.application_id.clone(),
        );
        let processor = ArchiveProcessor::new(self.layout.work_dir()).with_variables(variables);

        let batch = BatchProcessor::new(
            &mut self.cache,
            &mut self.managed,
            &processor,
            snapshot,
            self.layout.scratch_dir.clone(),
            copied.to_vec(),
        )
        .with_force(force);
        debug!("Processing {} artifacts", batch.len());
        let progress = self.progress.clone();
        batch
            .drive(move |step| {
                if let Some(progress) = &progress {
                    progress(step);
                }
            })
            .await
    }
}
