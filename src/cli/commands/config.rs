//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::cli::commands::ProjectContext;
use crate::config::{Config, ConfigManager, LOCAL_CONFIG_FILE};
use crate::error::{AarsyncError, AarsyncResult};
use crate::ui::{self, UiContext};
use std::path::Path;
use tokio::fs;

/// Value shape of a settable key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyKind {
    Text,
    Bool,
    List,
}

const KEYS: &[(&str, KeyKind)] = &[
    ("general.log_format", KeyKind::Text),
    ("project.asset_root", KeyKind::Text),
    ("project.packages_dir", KeyKind::Text),
    ("project.scratch_dir", KeyKind::Text),
    ("project.application_id", KeyKind::Text),
    ("android.sdk_root", KeyKind::Text),
    ("android.target_abis", KeyKind::List),
    ("android.gradle_build", KeyKind::Bool),
    ("android.export_project", KeyKind::Bool),
    ("android.gradle_template", KeyKind::Bool),
    ("android.supports_packed_libraries", KeyKind::Bool),
    ("android.jetifier", KeyKind::Bool),
    ("android.jetifier_supported", KeyKind::Bool),
    ("resolver.gradle_command", KeyKind::Text),
    ("resolver.build_script", KeyKind::Text),
    ("resolver.task", KeyKind::Text),
    ("resolver.repositories", KeyKind::List),
    ("resolver.explode_archives", KeyKind::Bool),
    ("resolver.data_binding_version", KeyKind::Text),
    ("resolver.auto_resolve_conflicts", KeyKind::Bool),
    ("resolver.install_platform_packages", KeyKind::Bool),
];

/// Prefix for `${name}` manifest substitutions, e.g. `resolver.manifest_variables.scheme`
const MANIFEST_VARIABLE_PREFIX: &str = "resolver.manifest_variables.";

/// Execute the config command
pub async fn execute(args: ConfigArgs, project: &ProjectContext) -> AarsyncResult<()> {
    let manager = &project.manager;

    match args.action {
        None | Some(ConfigAction::Show) => show_config(&project.config)?,
        Some(ConfigAction::Path) => show_path(manager, project.local_config.as_deref()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value, local }) => {
            let path = if local {
                project
                    .local_config
                    .clone()
                    .unwrap_or_else(|| project.layout.root.join(LOCAL_CONFIG_FILE))
            } else {
                manager.path().to_path_buf()
            };
            set_value(&path, &key, &value).await?
        }
    }

    Ok(())
}

fn show_config(config: &Config) -> AarsyncResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn show_path(manager: &ConfigManager, local: Option<&Path>) {
    println!("{}", manager.path().display());
    if let Some(local) = local {
        println!("{}", local.display());
    }
}

async fn init_config(manager: &ConfigManager, force: bool) -> AarsyncResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok(
        &ctx,
        &format!("Configuration initialized at {}", path.display()),
    );

    Ok(())
}

/// Write one dotted key into `path`, keeping every other key the file
/// already sets and nothing more
async fn set_value(path: &Path, key: &str, value: &str) -> AarsyncResult<()> {
    let ctx = UiContext::detect();
    let kind = key_kind(key)?;

    let mut doc: toml::Value = if path.exists() {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| AarsyncError::io(format!("reading {}", path.display()), e))?;
        content
            .parse()
            .map_err(|e: toml::de::Error| AarsyncError::ConfigInvalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
    } else {
        toml::Value::Table(toml::map::Map::new())
    };

    set_toml_value(&mut doc, key, typed_value(kind, value)?)?;

    // Reject values the schema would not load
    let _: Config = doc
        .clone()
        .try_into()
        .map_err(|e: toml::de::Error| AarsyncError::User(format!("Invalid value for {}: {}", key, e)))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| AarsyncError::ConfigDirCreate {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }
    let content = toml::to_string_pretty(&doc)?;
    fs::write(path, content)
        .await
        .map_err(|e| AarsyncError::io(format!("writing {}", path.display()), e))?;

    ui::step_ok(
        &ctx,
        &format!("Set {} = {} in {}", key, value, path.display()),
    );

    Ok(())
}

fn key_kind(key: &str) -> AarsyncResult<KeyKind> {
    if let Some(name) = key.strip_prefix(MANIFEST_VARIABLE_PREFIX) {
        if !name.is_empty() && !name.contains('.') {
            return Ok(KeyKind::Text);
        }
    }
    KEYS.iter()
        .find(|(known, _)| *known == key)
        .map(|(_, kind)| *kind)
        .ok_or_else(|| {
            let valid: Vec<&str> = KEYS.iter().map(|(known, _)| *known).collect();
            AarsyncError::User(format!(
                "Unknown config key: {}\nValid keys:\n  {}\n  {}<name>",
                key,
                valid.join("\n  "),
                MANIFEST_VARIABLE_PREFIX
            ))
        })
}

fn typed_value(kind: KeyKind, value: &str) -> AarsyncResult<toml::Value> {
    Ok(match kind {
        KeyKind::Text => toml::Value::String(value.to_string()),
        KeyKind::Bool => toml::Value::Boolean(parse_bool(value)?),
        KeyKind::List => toml::Value::Array(
            value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| toml::Value::String(s.to_string()))
                .collect(),
        ),
    })
}

/// Set a dot-separated key in a TOML value tree, creating intermediate tables as needed.
fn set_toml_value(doc: &mut toml::Value, key: &str, value: toml::Value) -> AarsyncResult<()> {
    let parts: Vec<&str> = key.split('.').collect();
    let Some((leaf, tables)) = parts.split_last() else {
        return Err(AarsyncError::User("Empty config key".to_string()));
    };

    let mut current = doc;
    for &part in tables {
        current = current
            .as_table_mut()
            .ok_or_else(|| AarsyncError::User(format!("Expected table at key: {}", part)))?
            .entry(part)
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    current
        .as_table_mut()
        .ok_or_else(|| AarsyncError::User(format!("Expected table for key: {}", key)))?
        .insert((*leaf).to_string(), value);
    Ok(())
}

fn parse_bool(value: &str) -> AarsyncResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(AarsyncError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[tokio::test]
    async fn set_writes_only_the_key() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(LOCAL_CONFIG_FILE);

        set_value(&path, "android.sdk_root", "/opt/sdk").await.unwrap();
        set_value(&path, "android.target_abis", "x86_64, arm64-v8a")
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("[resolver]"));

        let config: Config = toml::from_str(&content).unwrap();
        assert_eq!(config.android.sdk_root, Some(PathBuf::from("/opt/sdk")));
        assert_eq!(config.android.target_abis, vec!["x86_64", "arm64-v8a"]);
    }

    #[tokio::test]
    async fn set_manifest_variable() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        set_value(&path, "resolver.manifest_variables.scheme", "myapp")
            .await
            .unwrap();

        let config: Config = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            config.resolver.manifest_variables.get("scheme").map(String::as_str),
            Some("myapp")
        );
    }

    #[tokio::test]
    async fn set_rejects_unknown_key() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        let err = set_value(&path, "android.nope", "1").await.unwrap_err();
        assert!(err.to_string().contains("Unknown config key"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn set_rejects_bad_bool() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        let err = set_value(&path, "android.gradle_build", "sometimes")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid boolean"));
    }

    #[test]
    fn parse_bool_variants() {
        assert!(parse_bool("yes").unwrap());
        assert!(parse_bool("TRUE").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("maybe").is_err());
    }
}
