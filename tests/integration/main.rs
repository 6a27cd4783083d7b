//! Integration tests for aarsync

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn aarsync() -> Command {
        cargo_bin_cmd!("aarsync")
    }

    /// Command isolated from the user's configuration and SDK
    fn project_cmd(project: &Path) -> Command {
        let mut cmd = aarsync();
        cmd.current_dir(project)
            .env_remove("ANDROID_HOME")
            .env_remove("ANDROID_SDK_ROOT")
            .env_remove("AARSYNC_CONFIG")
            .arg("--no-local")
            .arg("--config")
            .arg(project.join("global.toml"));
        cmd
    }

    fn declare(project: &Path, file: &str, specs: &[&str]) {
        let dir = project.join("Assets").join("Editor");
        std::fs::create_dir_all(&dir).unwrap();
        let body: String = specs
            .iter()
            .map(|spec| format!("[[package]]\nspec = \"{}\"\n\n", spec))
            .collect();
        std::fs::write(dir.join(file), body).unwrap();
    }

    #[test]
    fn help_displays() {
        aarsync()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Android dependency resolver"));
    }

    #[test]
    fn version_displays() {
        aarsync()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("aarsync"));
    }

    #[test]
    fn deps_lists_declared_packages() {
        let temp = TempDir::new().unwrap();
        declare(
            temp.path(),
            "FirebaseDependencies.toml",
            &["com.google.firebase:firebase-app:16.0.0", "com.example:lib:1.0"],
        );
        declare(temp.path(), "OtherDependencies.toml", &["com.example:lib:1.0"]);

        project_cmd(temp.path())
            .args(["deps", "--format", "plain"])
            .assert()
            .success()
            .stdout(
                predicate::str::contains("com.google.firebase:firebase-app:16.0.0")
                    .and(predicate::str::contains("com.example:lib:1.0")),
            );
    }

    #[test]
    fn deps_json_output() {
        let temp = TempDir::new().unwrap();
        declare(temp.path(), "LibDependencies.toml", &["com.example:lib:1.0"]);

        project_cmd(temp.path())
            .args(["deps", "--format", "json"])
            .assert()
            .success()
            .stdout(
                predicate::str::contains("\"packages\"")
                    .and(predicate::str::contains("maven.google.com")),
            );
    }

    #[test]
    fn deps_reports_malformed_declaration() {
        let temp = TempDir::new().unwrap();
        declare(temp.path(), "BadDependencies.toml", &["not-a-coordinate"]);

        project_cmd(temp.path())
            .args(["deps", "--format", "table"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No dependencies declared"));
    }

    #[test]
    fn resolve_without_declarations_succeeds() {
        let temp = TempDir::new().unwrap();

        project_cmd(temp.path())
            .arg("resolve")
            .assert()
            .success()
            .stdout(predicate::str::contains("Nothing to resolve"));
    }

    #[test]
    fn resolve_without_sdk_fails() {
        let temp = TempDir::new().unwrap();
        declare(temp.path(), "LibDependencies.toml", &["com.example:lib:1.0"]);

        project_cmd(temp.path())
            .arg("resolve")
            .assert()
            .failure()
            .stderr(predicate::str::contains("SDK root not configured"))
            .stdout(predicate::str::contains("com.example:lib:1.0"));
    }

    #[test]
    fn cache_path() {
        let temp = TempDir::new().unwrap();

        project_cmd(temp.path())
            .args(["cache", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("explode-cache.toml"));
    }

    #[test]
    fn cache_list_empty() {
        let temp = TempDir::new().unwrap();

        project_cmd(temp.path())
            .args(["cache", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached artifacts"));
    }

    #[test]
    fn check_empty_cache() {
        let temp = TempDir::new().unwrap();

        project_cmd(temp.path())
            .arg("check")
            .assert()
            .success()
            .stdout(predicate::str::contains("match the current build settings"));
    }

    #[test]
    fn conflicts_without_managed_artifacts() {
        let temp = TempDir::new().unwrap();

        project_cmd(temp.path())
            .arg("conflicts")
            .assert()
            .success()
            .stdout(predicate::str::contains("No managed artifacts"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();

        project_cmd(temp.path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("global.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();

        project_cmd(temp.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[resolver]"));
    }

    #[test]
    fn config_set_local_then_show() {
        let temp = TempDir::new().unwrap();

        project_cmd(temp.path())
            .args(["config", "set", "android.target_abis", "x86_64", "--local"])
            .assert()
            .success();
        assert!(temp.path().join(".aarsync.toml").exists());

        aarsync()
            .current_dir(temp.path())
            .arg("--config")
            .arg(temp.path().join("global.toml"))
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("x86_64"));
    }

    #[test]
    fn config_set_unknown_key_fails() {
        let temp = TempDir::new().unwrap();

        project_cmd(temp.path())
            .args(["config", "set", "android.nope", "1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn init_creates_local_config() {
        let temp = TempDir::new().unwrap();

        aarsync()
            .args(["init", "--path"])
            .arg(temp.path())
            .assert()
            .success();
        assert!(temp.path().join(".aarsync.toml").exists());

        aarsync()
            .args(["init", "--path"])
            .arg(temp.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));
    }

    #[test]
    fn invalid_global_config_fails() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("global.toml"), "[android]\ngradle_build = 3\n").unwrap();

        project_cmd(temp.path())
            .arg("check")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }
}
