//! One build tool fetch attempt

use crate::config::ResolverConfig;
use crate::dependency::{Dependency, MergedRequest};
use crate::environment::Environment;
use crate::error::{AarsyncError, AarsyncResult};
use crate::fetch::properties::FetchProperties;
use crate::fetch::report::FetchReport;
use crate::fetch::runner::CommandRunner;
use crate::resolution::ResolutionState;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Prefix of file names of AndroidX artifacts
const ANDROIDX_PREFIX: &str = "androidx.";

/// How the build tool is invoked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub command: String,
    pub build_script: Option<PathBuf>,
    pub task: String,
    pub data_binding_version: String,
}

impl FetchSettings {
    pub fn from_config(resolver: &ResolverConfig) -> Self {
        Self {
            command: resolver.gradle_command.clone(),
            build_script: resolver.build_script.clone(),
            task: resolver.task.clone(),
            data_binding_version: resolver.data_binding_version.clone(),
        }
    }
}

/// Result of a fetch attempt that ran the tool successfully
#[derive(Debug)]
pub enum FetchOutcome {
    /// Artifacts classified; nothing more to do
    Completed(ResolutionState),
    /// AndroidX artifacts arrived without the jetifier; it is now enabled
    /// and the cycle should run again
    RetryWithJetifier(ResolutionState),
}

/// Runs the build tool and classifies what it copied
pub struct ArtifactFetcher {
    runner: Arc<dyn CommandRunner>,
    settings: FetchSettings,
    project_root: PathBuf,
    properties_file: PathBuf,
}

impl ArtifactFetcher {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        settings: FetchSettings,
        project_root: impl Into<PathBuf>,
        properties_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            runner,
            settings,
            project_root: project_root.into(),
            properties_file: properties_file.into(),
        }
    }

    /// Validated SDK root
    pub fn sdk_root(env: &dyn Environment) -> AarsyncResult<PathBuf> {
        let root = env.sdk_root().ok_or(AarsyncError::SdkRootMissing)?;
        if !root.is_dir() {
            return Err(AarsyncError::SdkRootInvalid(root));
        }
        Ok(root)
    }

    /// Fetch every package in `request` into `dest`.
    ///
    /// Configuration problems and tool failures are returned as errors; the
    /// caller reports every dependency missing.
    pub async fn fetch(
        &self,
        request: &MergedRequest,
        env: &dyn Environment,
        dest: &Path,
    ) -> AarsyncResult<FetchOutcome> {
        let sdk_root = Self::sdk_root(env)?;
        let jetifier = env.snapshot().jetifier;

        let properties = FetchProperties {
            sdk_root,
            target_dir: dest.to_path_buf(),
            repositories: request
                .repository_uris()
                .into_iter()
                .map(str::to_string)
                .collect(),
            packages: request.packages.clone(),
            jetifier,
            data_binding_version: self.settings.data_binding_version.clone(),
        };
        properties.write(&self.properties_file)?;

        let mut args = Vec::new();
        if let Some(script) = &self.settings.build_script {
            args.push("-b".to_string());
            args.push(script.to_string_lossy().into_owned());
        }
        args.extend(properties.overrides(&self.properties_file));
        args.push(self.settings.task.clone());

        info!(
            "Fetching {} packages from {} repositories",
            properties.packages.len(),
            properties.repositories.len()
        );
        let output = self
            .runner
            .run(&self.settings.command, &args, &self.project_root)
            .await?;

        match output.exit_code {
            Some(0) => {}
            Some(code) => {
                error!("{} failed with exit code {}:\n{}", self.settings.command, code, output.tail());
                return Err(AarsyncError::ToolFailed {
                    code,
                    output: output.tail(),
                });
            }
            None => return Err(AarsyncError::ToolSignaled),
        }

        let report = FetchReport::parse(&output.stdout, dest);
        let mut state = ResolutionState::new(output);
        state.missing = report
            .missing
            .iter()
            .map(|coordinate| map_missing(request, coordinate))
            .collect();
        state.copied = report.copied;
        state.modified = report.modified;
        if !state.missing.is_empty() {
            state.problems_logged = true;
        }

        let androidx: Vec<&PathBuf> = state.copied.iter().filter(|p| is_androidx(p)).collect();
        if androidx.is_empty() || jetifier {
            return Ok(FetchOutcome::Completed(state));
        }

        if env.enable_jetifier() {
            info!(
                "{} AndroidX artifacts fetched; retrying with the jetifier enabled",
                androidx.len()
            );
            return Ok(FetchOutcome::RetryWithJetifier(state));
        }

        warn!(
            "{}",
            AarsyncError::JetifierUnavailable(
                androidx
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        );
        for path in &state.copied {
            if let Err(e) = remove_path(path) {
                warn!("Failed to remove {}: {}", path.display(), e);
            }
        }
        state.copied.clear();
        state.missing = request.dependencies();
        state.problems_logged = true;
        Ok(FetchOutcome::Completed(state))
    }
}

fn is_androidx(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(ANDROIDX_PREFIX))
}

fn remove_path(path: &Path) -> std::io::Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)
    } else if path.exists() {
        fs::remove_file(path)
    } else {
        Ok(())
    }
}

/// Map a reported coordinate back to the dependency that requested it
fn map_missing(request: &MergedRequest, coordinate: &str) -> Dependency {
    let coordinate = coordinate.trim();
    if let Some(dep) = request.by_spec.get(coordinate) {
        return dep.clone();
    }
    let rebuilt = Dependency::from_coordinate(coordinate);
    if let Some(dep) = request.by_spec.get(&rebuilt.package_spec()) {
        return dep.clone();
    }
    warn!("Build tool reported unknown missing artifact {}", coordinate);
    rebuilt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dependency::{DependencyMerger, LATEST};
    use crate::environment::ConfigEnvironment;
    use crate::fetch::runner::CommandOutput;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct ScriptedRunner {
        outputs: Mutex<Vec<CommandOutput>>,
        calls: Mutex<Vec<Vec<String>>>,
        copy: Option<(PathBuf, &'static str)>,
    }

    impl ScriptedRunner {
        fn new(outputs: Vec<CommandOutput>) -> Self {
            Self {
                outputs: Mutex::new(outputs),
                calls: Mutex::new(Vec::new()),
                copy: None,
            }
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(&self, _program: &str, args: &[String], _cwd: &Path) -> AarsyncResult<CommandOutput> {
            self.calls.lock().unwrap().push(args.to_vec());
            if let Some((dir, name)) = &self.copy {
                fs::write(dir.join(name), b"aar").unwrap();
            }
            Ok(self.outputs.lock().unwrap().remove(0))
        }
    }

    fn stdout(text: &str) -> CommandOutput {
        CommandOutput {
            exit_code: Some(0),
            stdout: text.to_string(),
            stderr: String::new(),
        }
    }

    fn setup(jetifier_supported: bool) -> (TempDir, ConfigEnvironment, MergedRequest) {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("sdk")).unwrap();
        fs::create_dir_all(temp.path().join("out")).unwrap();
        let mut config = Config::default();
        config.android.sdk_root = Some(temp.path().join("sdk"));
        config.android.jetifier_supported = jetifier_supported;
        let env = ConfigEnvironment::new(config);

        let deps = vec![
            Dependency::new("com.a", "one", "1.0").with_created_by("A"),
            Dependency::new("com.b", "two", LATEST).with_created_by("B"),
        ];
        let request =
            DependencyMerger::new(&[], temp.path(), Path::new("Assets")).merge(&deps);
        (temp, env, request)
    }

    fn fetcher(temp: &TempDir, runner: Arc<dyn CommandRunner>) -> ArtifactFetcher {
        let settings = FetchSettings::from_config(&Config::default().resolver);
        ArtifactFetcher::new(runner, settings, temp.path(), temp.path().join("fetch.properties"))
    }

    #[tokio::test]
    async fn classifies_report_and_maps_missing() {
        let (temp, env, request) = setup(true);
        let runner = Arc::new(ScriptedRunner::new(vec![stdout(
            "Copied artifacts:\ncom.a.one-1.0.aar\n\nMissing artifacts:\ncom.b:two:+\norg.x:y\n",
        )]));
        let dest = temp.path().join("out");

        let outcome = fetcher(&temp, runner.clone())
            .fetch(&request, &env, &dest)
            .await
            .unwrap();
        let FetchOutcome::Completed(state) = outcome else {
            panic!("expected completion");
        };

        assert_eq!(state.copied, vec![dest.join("com.a.one-1.0.aar")]);
        assert_eq!(state.missing.len(), 2);
        assert_eq!(state.missing[0].created_by, "B");
        assert_eq!(state.missing[1].key(), format!("org.x:y:{}", LATEST));
        assert!(temp.path().join("fetch.properties").exists());

        let args = runner.calls.lock().unwrap()[0].clone();
        assert_eq!(args.last().unwrap(), "copyPackages");
        assert!(args.iter().any(|a| a == "-PPACKAGES_TO_COPY=com.a:one:1.0;com.b:two:+"));
    }

    #[tokio::test]
    async fn missing_sdk_is_configuration_fatal() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.android.sdk_root = Some(temp.path().join("nope"));
        let env = ConfigEnvironment::new(config);
        let runner = Arc::new(ScriptedRunner::new(vec![]));

        let err = fetcher(&temp, runner.clone())
            .fetch(&MergedRequest::default(), &env, temp.path())
            .await
            .unwrap_err();
        assert!(err.is_configuration_fatal());
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn tool_failure_carries_output() {
        let (temp, env, request) = setup(true);
        let runner = Arc::new(ScriptedRunner::new(vec![CommandOutput {
            exit_code: Some(1),
            stdout: "Copied artifacts:\nx.aar\n".into(),
            stderr: "FAILURE: Build failed".into(),
        }]));

        let err = fetcher(&temp, runner)
            .fetch(&request, &env, &temp.path().join("out"))
            .await
            .unwrap_err();
        match err {
            AarsyncError::ToolFailed { code, output } => {
                assert_eq!(code, 1);
                assert!(output.contains("Build failed"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn androidx_requests_jetifier_retry() {
        let (temp, env, request) = setup(true);
        let runner = Arc::new(ScriptedRunner::new(vec![stdout(
            "Copied artifacts:\nandroidx.core.core-1.0.0.aar\n",
        )]));

        let outcome = fetcher(&temp, runner)
            .fetch(&request, &env, &temp.path().join("out"))
            .await
            .unwrap();
        assert!(matches!(outcome, FetchOutcome::RetryWithJetifier(_)));
        assert!(env.snapshot().jetifier);
    }

    #[tokio::test]
    async fn androidx_without_jetifier_support_removes_copies() {
        let (temp, env, request) = setup(false);
        let dest = temp.path().join("out");
        let mut runner = ScriptedRunner::new(vec![stdout(
            "Copied artifacts:\nandroidx.core.core-1.0.0.aar\n",
        )]);
        runner.copy = Some((dest.clone(), "androidx.core.core-1.0.0.aar"));

        let outcome = fetcher(&temp, Arc::new(runner))
            .fetch(&request, &env, &dest)
            .await
            .unwrap();
        let FetchOutcome::Completed(state) = outcome else {
            panic!("expected completion");
        };
        assert!(state.copied.is_empty());
        assert_eq!(state.missing.len(), 2);
        assert!(!dest.join("androidx.core.core-1.0.0.aar").exists());
    }
}
