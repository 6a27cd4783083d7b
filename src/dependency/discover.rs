//! Dependency declaration discovery
//!
//! Declaration files are TOML files named `*Dependencies.toml` anywhere
//! under the asset root:
//!
//! ```toml
//! [[package]]
//! spec = "com.google.firebase:firebase-app:16.0.0"
//! repositories = ["https://maven.google.com"]
//! platform_package_ids = ["extra-google-m2repository"]
//! ```

use crate::dependency::record::Dependency;
use crate::error::{AarsyncError, AarsyncResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Suffix identifying declaration files
pub const DECLARATION_SUFFIX: &str = "Dependencies.toml";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DeclarationFile {
    #[serde(default, rename = "package")]
    packages: Vec<PackageDeclaration>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PackageDeclaration {
    spec: String,
    #[serde(default)]
    repositories: Vec<String>,
    #[serde(default)]
    platform_package_ids: Option<Vec<String>>,
}

/// Everything found under the asset root
#[derive(Debug, Default)]
pub struct Declarations {
    pub dependencies: Vec<Dependency>,
    pub files: Vec<PathBuf>,
    pub errors: Vec<AarsyncError>,
}

/// Parse one declaration file. `created_by` labels every record.
pub fn parse_declarations(
    content: &str,
    path: &Path,
    created_by: &str,
) -> AarsyncResult<Vec<Dependency>> {
    let file: DeclarationFile =
        toml::from_str(content).map_err(|e| AarsyncError::DeclarationInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    file.packages
        .into_iter()
        .map(|package| {
            let dep = Dependency::parse(&package.spec)
                .map_err(|e| AarsyncError::DeclarationInvalid {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?
                .with_repositories(package.repositories)
                .with_created_by(created_by);
            Ok(match package.platform_package_ids {
                Some(ids) => dep.with_platform_packages(ids),
                None => dep,
            })
        })
        .collect()
}

fn is_skipped(entry: &DirEntry, skip: &[PathBuf]) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    let hidden = entry.file_name().to_string_lossy().starts_with('.');
    hidden || skip.iter().any(|s| entry.path().starts_with(s))
}

/// Walk `asset_root` and load every declaration file in path order.
///
/// A malformed file is recorded in [`Declarations::errors`]; the remaining
/// files still load.
pub fn discover(project_root: &Path, asset_root: &Path, skip: &[PathBuf]) -> Declarations {
    let mut found = Declarations::default();
    let root = project_root.join(asset_root);
    if !root.is_dir() {
        debug!("Asset root {} does not exist", root.display());
        return found;
    }

    let walker = WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped(e, skip));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable path: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file()
            || !entry.file_name().to_string_lossy().ends_with(DECLARATION_SUFFIX)
        {
            continue;
        }

        let path = entry.into_path();
        let created_by = path
            .strip_prefix(project_root)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");

        let loaded = std::fs::read_to_string(&path)
            .map_err(|e| AarsyncError::io(format!("reading {}", path.display()), e))
            .and_then(|content| parse_declarations(&content, &path, &created_by));

        match loaded {
            Ok(deps) => {
                debug!("Loaded {} dependencies from {}", deps.len(), created_by);
                found.dependencies.extend(deps);
                found.files.push(path);
            }
            Err(e) => {
                warn!("{}", e);
                found.errors.push(e);
            }
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
        [[package]]
        spec = "com.google.firebase:firebase-app:16.0.0"
        repositories = ["https://maven.google.com"]
        platform_package_ids = ["extra-google-m2repository"]

        [[package]]
        spec = "com.example:widget:LATEST"
    "#;

    #[test]
    fn parses_packages() {
        let deps = parse_declarations(SAMPLE, Path::new("X.toml"), "Assets/XDependencies.toml")
            .unwrap();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].repositories, vec!["https://maven.google.com"]);
        assert_eq!(
            deps[0].platform_package_ids,
            Some(vec!["extra-google-m2repository".to_string()])
        );
        assert_eq!(deps[1].version, "LATEST");
        assert_eq!(deps[1].created_by, "Assets/XDependencies.toml");
    }

    #[test]
    fn rejects_bad_spec() {
        let err = parse_declarations(
            "[[package]]\nspec = \"nope\"\n",
            Path::new("BadDependencies.toml"),
            "x",
        )
        .unwrap_err();
        assert!(err.to_string().contains("BadDependencies.toml"));
    }

    #[test]
    fn discover_walks_in_order_and_keeps_going() {
        let temp = TempDir::new().unwrap();
        let assets = temp.path().join("Assets");
        std::fs::create_dir_all(assets.join("B/Editor")).unwrap();
        std::fs::create_dir_all(assets.join("A/Editor")).unwrap();
        std::fs::create_dir_all(assets.join(".hidden")).unwrap();

        std::fs::write(
            assets.join("B/Editor/BDependencies.toml"),
            "[[package]]\nspec = \"g:b:1\"\n",
        )
        .unwrap();
        std::fs::write(
            assets.join("A/Editor/ADependencies.toml"),
            "[[package]]\nspec = \"g:a:1\"\n",
        )
        .unwrap();
        std::fs::write(assets.join("A/BrokenDependencies.toml"), "[[package]]\n").unwrap();
        std::fs::write(
            assets.join(".hidden/HiddenDependencies.toml"),
            "[[package]]\nspec = \"g:h:1\"\n",
        )
        .unwrap();

        let found = discover(temp.path(), Path::new("Assets"), &[]);

        let keys: Vec<String> = found.dependencies.iter().map(|d| d.key()).collect();
        assert_eq!(keys, vec!["g:a:1", "g:b:1"]);
        assert_eq!(found.errors.len(), 1);
        assert_eq!(
            found.dependencies[0].created_by,
            "Assets/A/Editor/ADependencies.toml"
        );
    }
}
