//! Single-flight resolution queue
//!
//! One consumer task owns the [`Resolver`]; requests arrive over a channel
//! and are served strictly one at a time in arrival order.

use crate::dependency::Dependency;
use crate::error::{AarsyncError, AarsyncResult};
use crate::resolution::resolver::{ResolutionOutcome, ResolveOptions, Resolver};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

struct Job {
    dependencies: Vec<Dependency>,
    options: ResolveOptions,
    reply: oneshot::Sender<ResolutionOutcome>,
}

/// Spawns the consumer task
pub struct ResolutionService;

impl ResolutionService {
    /// Start serving requests. The task ends, handing the resolver back,
    /// once every handle is dropped.
    pub fn spawn(resolver: Resolver) -> (ResolutionHandle, JoinHandle<Resolver>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = ResolutionHandle {
            tx,
            active: Arc::new(AtomicBool::new(false)),
            queued: Arc::new(AtomicUsize::new(0)),
        };
        let task = tokio::spawn(serve(
            resolver,
            rx,
            handle.active.clone(),
            handle.queued.clone(),
        ));
        (handle, task)
    }
}

async fn serve(
    mut resolver: Resolver,
    mut rx: mpsc::UnboundedReceiver<Job>,
    active: Arc<AtomicBool>,
    queued: Arc<AtomicUsize>,
) -> Resolver {
    while let Some(job) = rx.recv().await {
        queued.fetch_sub(1, Ordering::SeqCst);
        active.store(true, Ordering::SeqCst);
        let id = Uuid::new_v4();
        debug!(%id, "Starting resolution of {} dependencies", job.dependencies.len());

        let outcome = resolver
            .resolve(&job.dependencies, job.options)
            .instrument(info_span!("resolution", %id))
            .await;

        active.store(false, Ordering::SeqCst);
        if job.reply.send(outcome).is_err() {
            debug!("Resolution requester went away before the reply");
        }
    }
    resolver
}

/// Cloneable submission handle
#[derive(Clone)]
pub struct ResolutionHandle {
    tx: mpsc::UnboundedSender<Job>,
    active: Arc<AtomicBool>,
    queued: Arc<AtomicUsize>,
}

impl ResolutionHandle {
    /// Queue a resolution; the receiver completes when it has run
    pub fn request(
        &self,
        dependencies: Vec<Dependency>,
        options: ResolveOptions,
    ) -> AarsyncResult<oneshot::Receiver<ResolutionOutcome>> {
        let (reply, rx) = oneshot::channel();
        self.queued.fetch_add(1, Ordering::SeqCst);
        let job = Job {
            dependencies,
            options,
            reply,
        };
        if self.tx.send(job).is_err() {
            self.queued.fetch_sub(1, Ordering::SeqCst);
            return Err(AarsyncError::ServiceStopped);
        }
        Ok(rx)
    }

    /// Queue a resolution and wait for it
    pub async fn resolve(
        &self,
        dependencies: Vec<Dependency>,
        options: ResolveOptions,
    ) -> AarsyncResult<ResolutionOutcome> {
        self.request(dependencies, options)?
            .await
            .map_err(|_| AarsyncError::ServiceStopped)
    }

    /// A resolution is running right now
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Requests waiting behind the active one
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::environment::{ConfigEnvironment, ProjectLayout};
    use crate::fetch::{CommandOutput, CommandRunner};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;
    use tokio::sync::Semaphore;

    /// Build tool stand-in that blocks until a permit is released and
    /// records the order it saw requests in
    struct GatedRunner {
        gate: Semaphore,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CommandRunner for GatedRunner {
        async fn run(&self, _program: &str, args: &[String], _cwd: &Path) -> AarsyncResult<CommandOutput> {
            let packages = args
                .iter()
                .find_map(|a| a.strip_prefix("-PPACKAGES_TO_COPY="))
                .unwrap_or_default()
                .to_string();
            let permit = self.gate.acquire().await.map_err(|e| AarsyncError::Internal(e.to_string()))?;
            permit.forget();
            self.seen.lock().unwrap().push(packages.clone());
            Ok(CommandOutput {
                exit_code: Some(0),
                stdout: format!("Missing artifacts:\n{}\n", packages.replace(';', "\n")),
                stderr: String::new(),
            })
        }
    }

    fn resolver(temp: &TempDir, runner: Arc<GatedRunner>) -> Resolver {
        std::fs::create_dir_all(temp.path().join("sdk")).unwrap();
        let mut config = Config::default();
        config.android.sdk_root = Some(temp.path().join("sdk"));
        config.resolver.repositories = vec![];
        let layout = ProjectLayout::from_config(temp.path(), &config);
        let env = Arc::new(ConfigEnvironment::new(config.clone()));
        Resolver::new(env, runner, &config, layout)
    }

    #[tokio::test]
    async fn requests_run_one_at_a_time_in_order() {
        let temp = TempDir::new().unwrap();
        let runner = Arc::new(GatedRunner {
            gate: Semaphore::new(0),
            seen: Mutex::new(Vec::new()),
        });
        let (handle, task) = ResolutionService::spawn(resolver(&temp, runner.clone()));

        let first = handle
            .request(vec![Dependency::new("g", "first", "1")], ResolveOptions::default())
            .unwrap();
        let second = handle
            .request(vec![Dependency::new("g", "second", "1")], ResolveOptions::default())
            .unwrap();

        while !handle.is_active() {
            tokio::task::yield_now().await;
        }
        assert_eq!(handle.queued(), 1);

        runner.gate.add_permits(2);
        let first = first.await.unwrap();
        let second = second.await.unwrap();

        assert_eq!(first.missing[0].artifact, "first");
        assert_eq!(second.missing[0].artifact, "second");
        assert_eq!(
            *runner.seen.lock().unwrap(),
            vec!["g:first:1".to_string(), "g:second:1".to_string()]
        );
        assert_eq!(handle.queued(), 0);

        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn stopped_service_reports_error() {
        let temp = TempDir::new().unwrap();
        let runner = Arc::new(GatedRunner {
            gate: Semaphore::new(0),
            seen: Mutex::new(Vec::new()),
        });
        let (handle, task) = ResolutionService::spawn(resolver(&temp, runner));
        task.abort();
        let _ = task.await;

        let err = handle
            .resolve(vec![Dependency::new("g", "a", "1")], ResolveOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AarsyncError::ServiceStopped));
    }
}
