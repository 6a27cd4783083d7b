//! Merge dependency declarations from every caller into one request
//!
//! Package specs are deduplicated in first-declared order. Repositories are
//! ordered globals first, then declared repositories interleaved by position
//! index so that one dependency's long list cannot starve another's.

use crate::dependency::record::Dependency;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Provenance label for repositories that come from configuration
pub const GLOBAL_SOURCE: &str = "config";

const SDK_PLACEHOLDERS: &[&str] = &[
    "$ANDROID_HOME",
    "${ANDROID_HOME}",
    "$ANDROID_SDK_ROOT",
    "${ANDROID_SDK_ROOT}",
    "$ANDROID_SDK",
    "${ANDROID_SDK}",
];

/// A repository and everyone who asked for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryEntry {
    pub uri: String,
    pub sources: Vec<String>,
}

/// The deduplicated request handed to the fetcher
#[derive(Debug, Clone, Default)]
pub struct MergedRequest {
    /// Package specs in first-declared order
    pub packages: Vec<String>,

    /// Repositories in search order
    pub repositories: Vec<RepositoryEntry>,

    /// Package spec to the first dependency that declared it
    pub by_spec: BTreeMap<String, Dependency>,

    /// Non-fatal problems found while merging
    pub warnings: Vec<String>,
}

impl MergedRequest {
    pub fn repository_uris(&self) -> Vec<&str> {
        self.repositories.iter().map(|r| r.uri.as_str()).collect()
    }

    /// Every originally requested dependency, in declaration order
    pub fn dependencies(&self) -> Vec<Dependency> {
        self.packages
            .iter()
            .filter_map(|spec| self.by_spec.get(spec).cloned())
            .collect()
    }
}

/// Builds a [`MergedRequest`] from declared dependencies
pub struct DependencyMerger<'a> {
    global_repositories: &'a [String],
    project_root: &'a Path,
    asset_root: &'a Path,
    sdk_root: Option<&'a Path>,
}

impl<'a> DependencyMerger<'a> {
    pub fn new(
        global_repositories: &'a [String],
        project_root: &'a Path,
        asset_root: &'a Path,
    ) -> Self {
        Self {
            global_repositories,
            project_root,
            asset_root,
            sdk_root: None,
        }
    }

    /// Filter repositories that live inside the SDK
    pub fn with_sdk_root(mut self, sdk_root: Option<&'a Path>) -> Self {
        self.sdk_root = sdk_root;
        self
    }

    pub fn merge(&self, dependencies: &[Dependency]) -> MergedRequest {
        let mut request = MergedRequest::default();

        for dep in dependencies {
            let spec = dep.package_spec();
            if !request.by_spec.contains_key(&spec) {
                request.packages.push(spec.clone());
                request.by_spec.insert(spec, dep.clone());
            }
        }

        let mut index: HashMap<String, usize> = HashMap::new();
        for uri in self.global_repositories {
            self.add_repository(&mut request, &mut index, uri, GLOBAL_SOURCE);
        }

        let longest = dependencies
            .iter()
            .map(|d| d.repositories.len())
            .max()
            .unwrap_or(0);
        for position in 0..longest {
            for dep in dependencies {
                if let Some(uri) = dep.repositories.get(position) {
                    self.add_repository(&mut request, &mut index, uri, &dep.created_by);
                }
            }
        }

        debug!(
            "Merged {} dependencies into {} packages and {} repositories",
            dependencies.len(),
            request.packages.len(),
            request.repositories.len()
        );
        request
    }

    fn add_repository(
        &self,
        request: &mut MergedRequest,
        index: &mut HashMap<String, usize>,
        raw: &str,
        source: &str,
    ) {
        let Some(uri) = self.normalize_repository(raw, source, &mut request.warnings) else {
            return;
        };

        match index.get(&uri) {
            Some(&i) => {
                let sources = &mut request.repositories[i].sources;
                if !sources.iter().any(|s| s == source) {
                    sources.push(source.to_string());
                }
            }
            None => {
                index.insert(uri.clone(), request.repositories.len());
                request.repositories.push(RepositoryEntry {
                    uri,
                    sources: vec![source.to_string()],
                });
            }
        }
    }

    /// Returns None for repositories the build environment supplies itself.
    fn normalize_repository(
        &self,
        raw: &str,
        source: &str,
        warnings: &mut Vec<String>,
    ) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() || self.references_sdk(raw) {
            debug!("Skipping SDK repository {}", raw);
            return None;
        }

        let local = match raw.strip_prefix("file://") {
            Some(path) => PathBuf::from(path),
            None if has_scheme(raw) => return Some(raw.to_string()),
            None => PathBuf::from(raw),
        };

        let absolute = if local.is_absolute() {
            local.clone()
        } else {
            self.project_root.join(&local)
        };
        if absolute.exists() {
            return Some(file_uri(&absolute));
        }

        if let Some(found) = self.search_asset_root(&local) {
            debug!("Relocated repository {} to {}", raw, found.display());
            return Some(file_uri(&found));
        }

        let message = format!("Repository {} declared by {} does not exist", raw, source);
        warn!("{}", message);
        warnings.push(message);
        Some(raw.to_string())
    }

    fn references_sdk(&self, raw: &str) -> bool {
        if SDK_PLACEHOLDERS.iter().any(|p| raw.contains(p)) {
            return true;
        }
        match self.sdk_root {
            Some(sdk) => {
                let path = raw.strip_prefix("file://").unwrap_or(raw);
                Path::new(path).starts_with(sdk)
            }
            None => false,
        }
    }

    /// Find a directory under the asset root whose path ends with `suffix`.
    fn search_asset_root(&self, suffix: &Path) -> Option<PathBuf> {
        let suffix: PathBuf = suffix
            .components()
            .filter(|c| matches!(c, std::path::Component::Normal(_)))
            .collect();
        if suffix.as_os_str().is_empty() {
            return None;
        }

        let root = if self.asset_root.is_absolute() {
            self.asset_root.to_path_buf()
        } else {
            self.project_root.join(self.asset_root)
        };

        WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
            .map(|e| e.into_path())
            .find(|path| path.ends_with(&suffix))
    }
}

pub(crate) fn has_scheme(raw: &str) -> bool {
    match raw.find("://") {
        Some(i) => {
            let scheme = &raw[..i];
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

fn file_uri(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    if normalized.starts_with('/') {
        format!("file://{}", normalized)
    } else {
        format!("file:///{}", normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependency::record::LATEST;
    use tempfile::TempDir;

    fn dep(spec: &str, repos: &[&str], by: &str) -> Dependency {
        Dependency::parse(spec)
            .unwrap()
            .with_repositories(repos.iter().map(|r| r.to_string()).collect())
            .with_created_by(by)
    }

    #[test]
    fn repositories_interleave_by_index() {
        let temp = TempDir::new().unwrap();
        let globals = vec!["https://global.example/".to_string()];
        let merger = DependencyMerger::new(&globals, temp.path(), Path::new("Assets"));

        let deps = vec![
            dep("g:a:1", &["https://a.example/", "https://b.example/"], "d1"),
            dep("g:b:1", &["https://c.example/"], "d2"),
        ];
        let request = merger.merge(&deps);

        assert_eq!(
            request.repository_uris(),
            vec![
                "https://global.example/",
                "https://a.example/",
                "https://c.example/",
                "https://b.example/",
            ]
        );
    }

    #[test]
    fn duplicate_repositories_keep_provenance() {
        let temp = TempDir::new().unwrap();
        let merger = DependencyMerger::new(&[], temp.path(), Path::new("Assets"));

        let deps = vec![
            dep("g:a:1", &["https://maven.example/"], "FirstDependencies.toml"),
            dep("g:b:1", &["https://maven.example/"], "SecondDependencies.toml"),
        ];
        let request = merger.merge(&deps);

        assert_eq!(request.repositories.len(), 1);
        assert_eq!(
            request.repositories[0].sources,
            vec!["FirstDependencies.toml", "SecondDependencies.toml"]
        );
    }

    #[test]
    fn packages_deduplicate_and_rewrite_latest() {
        let temp = TempDir::new().unwrap();
        let merger = DependencyMerger::new(&[], temp.path(), Path::new("Assets"));

        let deps = vec![
            dep("g:a:1.0", &[], "x"),
            dep("g:a:1.0", &[], "y"),
            Dependency::new("g", "b", LATEST),
        ];
        let request = merger.merge(&deps);

        assert_eq!(request.packages, vec!["g:a:1.0", "g:b:+"]);
        assert_eq!(request.by_spec["g:a:1.0"].created_by, "x");
    }

    #[test]
    fn sdk_repositories_are_filtered() {
        let temp = TempDir::new().unwrap();
        let sdk = temp.path().join("sdk");
        let globals = vec![
            "$ANDROID_HOME/extras/google/m2repository".to_string(),
            format!("file://{}/extras/android/m2repository", sdk.display()),
        ];
        let merger = DependencyMerger::new(&globals, temp.path(), Path::new("Assets"))
            .with_sdk_root(Some(&sdk));

        let request = merger.merge(&[]);
        assert!(request.repositories.is_empty());
    }

    #[test]
    fn missing_local_repository_found_by_suffix() {
        let temp = TempDir::new().unwrap();
        let real = temp.path().join("Assets").join("Vendor").join("m2repository");
        std::fs::create_dir_all(&real).unwrap();

        let merger = DependencyMerger::new(&[], temp.path(), Path::new("Assets"));
        let deps = vec![dep("g:a:1", &["Plugins/Vendor/m2repository"], "d")];
        let request = merger.merge(&deps);

        // "Plugins/Vendor/m2repository" does not exist; "Vendor/m2repository" does not
        // end with it either, so the declared string is kept with a warning.
        assert_eq!(request.repository_uris(), vec!["Plugins/Vendor/m2repository"]);
        assert_eq!(request.warnings.len(), 1);

        let deps = vec![dep("g:a:1", &["Vendor/m2repository"], "d")];
        let request = merger.merge(&deps);
        assert_eq!(request.repository_uris(), vec![file_uri(&real)]);
        assert!(request.warnings.is_empty());
    }

    #[test]
    fn scheme_detection() {
        assert!(has_scheme("https://maven.google.com"));
        assert!(has_scheme("gcs+s3://bucket"));
        assert!(!has_scheme("Assets/m2repository"));
        assert!(!has_scheme("C:\\repo"));
    }
}
