//! Persistent explode cache
//!
//! Entries are keyed by artifact file stem and written as TOML, one
//! `[[artifact]]` table per entry in name order. The live map and the last
//! persisted map are kept as separate clones; a save whose rendered text is
//! identical to the last write is skipped.

use crate::abi::AbiSet;
use crate::archive::manifest::has_application_id_placeholder;
use crate::archive::processor::{list_abis, CLASSES_JAR, MANIFEST, NATIVE_DIR};
use crate::archive::{is_package, zipio};
use crate::cache::entry::{DirtyReason, ExplodeEntry};
use crate::environment::EnvironmentSnapshot;
use crate::error::{AarsyncError, AarsyncResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    #[serde(default, rename = "artifact")]
    artifacts: Vec<ExplodeEntry>,
}

/// On-disk explode decisions for every managed artifact
#[derive(Debug)]
pub struct ExplodeCache {
    path: PathBuf,
    entries: BTreeMap<String, ExplodeEntry>,
    persisted: BTreeMap<String, ExplodeEntry>,
    rendered: Option<String>,
}

/// Cache key for an artifact path: the stem of an archive, or the name of
/// an exploded directory
pub fn artifact_name(path: &Path) -> String {
    let name = if is_package(path) {
        path.file_stem()
    } else {
        path.file_name()
    };
    name.map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Modification time of a file or directory
pub fn modified_time(path: &Path) -> AarsyncResult<DateTime<Utc>> {
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| AarsyncError::io(format!("reading metadata of {}", path.display()), e))?;
    Ok(DateTime::<Utc>::from(modified))
}

impl ExplodeCache {
    /// Empty cache persisted at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
            persisted: BTreeMap::new(),
            rendered: None,
        }
    }

    /// Load the cache file. A missing or unreadable file yields an empty
    /// cache.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let mut cache = Self::new(path);
        if !cache.path.exists() {
            return cache;
        }

        let parsed = fs::read_to_string(&cache.path)
            .map_err(|e| AarsyncError::CacheRead {
                path: cache.path.clone(),
                reason: e.to_string(),
            })
            .and_then(|content| {
                toml::from_str::<CacheFile>(&content)
                    .map(|file| (file, content))
                    .map_err(|e| AarsyncError::CacheRead {
                        path: cache.path.clone(),
                        reason: e.to_string(),
                    })
            });

        match parsed {
            Ok((file, content)) => {
                cache.entries = file
                    .artifacts
                    .into_iter()
                    .map(|entry| (entry.name.clone(), entry))
                    .collect();
                cache.persisted = cache.entries.clone();
                cache.rendered = Some(content);
                debug!("Loaded {} explode cache entries", cache.entries.len());
            }
            Err(e) => warn!("{}; starting with an empty cache", e),
        }
        cache
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, name: &str) -> Option<&ExplodeEntry> {
        self.entries.get(name)
    }

    pub fn entries(&self) -> impl Iterator<Item = &ExplodeEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the live map differs from what was last persisted
    pub fn has_unsaved_changes(&self) -> bool {
        self.entries != self.persisted
    }

    /// Insert or replace an entry
    pub fn insert(&mut self, entry: ExplodeEntry) {
        self.entries.insert(entry.name.clone(), entry);
    }

    /// Record the result of processing: the output location, its
    /// modification time and the architectures the archive shipped.
    ///
    /// Architectures accumulate across runs since a repacked archive no
    /// longer holds the libraries it was stripped of.
    pub fn mark_processed(&mut self, name: &str, output: &Path, abis: AbiSet) -> AarsyncResult<()> {
        let modified = modified_time(output)?;
        if let Some(entry) = self.entries.get_mut(name) {
            entry.path = output.to_path_buf();
            entry.last_modified = modified;
            entry.available_abis = entry.available_abis.union(&abis);
        }
        self.save().map(|_| ())
    }

    /// Persist if the rendered content changed. Returns whether the file
    /// was written.
    pub fn save(&mut self) -> AarsyncResult<bool> {
        let file = CacheFile {
            artifacts: self.entries.values().cloned().collect(),
        };
        let rendered = toml::to_string_pretty(&file)?;
        if self.rendered.as_deref() == Some(rendered.as_str()) {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AarsyncError::CachePersist(format!("creating {}: {}", parent.display(), e))
            })?;
        }
        fs::write(&self.path, &rendered).map_err(|e| {
            AarsyncError::CachePersist(format!("writing {}: {}", self.path.display(), e))
        })?;

        debug!("Saved {} explode cache entries", self.entries.len());
        self.persisted = self.entries.clone();
        self.rendered = Some(rendered);
        Ok(true)
    }

    /// Decide whether `artifact` must be exploded, updating and persisting
    /// its entry.
    ///
    /// `scratch` hosts the temporary inspection directory.
    pub fn should_explode(
        &mut self,
        artifact: &Path,
        env: &EnvironmentSnapshot,
        scratch: &Path,
    ) -> AarsyncResult<bool> {
        let name = artifact_name(artifact);
        let modified = modified_time(artifact)?;

        let cached = self.entries.get(&name).filter(|entry| {
            entry.path == artifact
                && entry.dirty_reason(env).is_none()
                && entry.last_modified >= modified
        });

        let (explode, inspected_abis) = if !env.explode_enabled {
            (false, None)
        } else if !env.supports_packed_libraries {
            (true, None)
        } else if let Some(entry) = cached {
            debug!("Reusing explode decision for {}", name);
            (entry.explode, None)
        } else {
            let (explode, abis) = inspect(artifact, env, scratch)?;
            (explode, Some(abis))
        };

        let entry = self
            .entries
            .entry(name.clone())
            .or_insert_with(|| ExplodeEntry::new(&name, artifact, modified, env));
        entry.explode = explode;
        entry.path = artifact.to_path_buf();
        entry.last_modified = modified;
        entry.record_environment(env);
        if let Some(abis) = inspected_abis {
            entry.available_abis = entry.available_abis.union(&abis);
        }

        self.save()?;
        Ok(explode)
    }

    /// Names and reasons of entries whose decision no longer holds
    pub fn stale_artifacts(&self, env: &EnvironmentSnapshot) -> Vec<(String, DirtyReason)> {
        self.entries
            .values()
            .filter_map(|entry| entry.dirty_reason(env).map(|r| (entry.name.clone(), r)))
            .collect()
    }

    /// Drop entries whose backing artifact is gone. Returns removed names.
    pub fn prune(&mut self) -> AarsyncResult<Vec<String>> {
        let gone: Vec<String> = self
            .entries
            .values()
            .filter(|entry| !entry.path.exists())
            .map(|entry| entry.name.clone())
            .collect();
        for name in &gone {
            debug!("Pruning explode cache entry {}", name);
            self.entries.remove(name);
        }
        self.save()?;
        Ok(gone)
    }

    /// Drop an entry marked for re-resolution
    pub fn invalidate(&mut self, name: &str) -> AarsyncResult<Option<ExplodeEntry>> {
        let removed = self.entries.remove(name);
        if removed.is_some() {
            self.save()?;
        }
        Ok(removed)
    }

    /// Remove every entry and the backing file
    pub fn clear(&mut self) -> AarsyncResult<()> {
        self.entries.clear();
        self.persisted.clear();
        self.rendered = None;
        if self.path.exists() {
            fs::remove_file(&self.path)
                .map_err(|e| AarsyncError::io(format!("removing {}", self.path.display()), e))?;
        }
        Ok(())
    }
}

/// Unpack the manifest, class archive and native libraries of `artifact`
/// and decide whether it needs exploding.
fn inspect(
    artifact: &Path,
    env: &EnvironmentSnapshot,
    scratch: &Path,
) -> AarsyncResult<(bool, AbiSet)> {
    fs::create_dir_all(scratch)
        .map_err(|e| AarsyncError::io(format!("creating {}", scratch.display()), e))?;
    let dir = tempfile::Builder::new()
        .prefix("inspect-")
        .tempdir_in(scratch)
        .map_err(|e| AarsyncError::io("creating inspection directory", e))?;

    let native_prefix = format!("{}/", NATIVE_DIR);
    zipio::extract_matching(artifact, dir.path(), |name| {
        name == MANIFEST || name == CLASSES_JAR || name.starts_with(&native_prefix)
    })?;

    let manifest_path = dir.path().join(MANIFEST);
    let needs_application_id = if manifest_path.exists() {
        let manifest = fs::read_to_string(&manifest_path)
            .map_err(|e| AarsyncError::io(format!("reading manifest of {}", artifact.display()), e))?;
        has_application_id_placeholder(&manifest)
    } else {
        false
    };
    let missing_classes = !dir.path().join(CLASSES_JAR).exists();
    let available = list_abis(&dir.path().join(NATIVE_DIR))?;
    let extra_abis = available.exceeds(&env.target_abis);

    debug!(
        artifact = %artifact.display(),
        needs_application_id,
        missing_classes,
        extra_abis,
        "Inspected archive"
    );
    Ok((needs_application_id || missing_classes || extra_abis, available))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::environment::{ConfigEnvironment, Environment};
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn write_aar(path: &Path, entries: &[(&str, &str)]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, data) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    fn snapshot() -> EnvironmentSnapshot {
        let mut config = Config::default();
        config.android.target_abis = vec!["arm64-v8a".into()];
        ConfigEnvironment::new(config).snapshot()
    }

    fn plain_aar(dir: &Path) -> PathBuf {
        let aar = dir.join("plain-1.0.aar");
        write_aar(&aar, &[(MANIFEST, "<manifest/>"), (CLASSES_JAR, "jar")]);
        aar
    }

    #[test]
    fn plain_archive_not_exploded() {
        let temp = TempDir::new().unwrap();
        let aar = plain_aar(temp.path());
        let mut cache = ExplodeCache::new(temp.path().join("cache.toml"));

        assert!(!cache.should_explode(&aar, &snapshot(), temp.path()).unwrap());
        let entry = cache.get("plain-1.0").unwrap();
        assert_eq!(entry.path, aar);
        assert!(entry.available_abis.is_universal());
    }

    #[test]
    fn inspection_triggers() {
        let temp = TempDir::new().unwrap();
        let mut cache = ExplodeCache::new(temp.path().join("cache.toml"));
        let env = snapshot();

        let placeholder = temp.path().join("provider-1.0.aar");
        write_aar(
            &placeholder,
            &[
                (MANIFEST, r#"<provider android:authorities="${applicationId}.p"/>"#),
                (CLASSES_JAR, "jar"),
            ],
        );
        assert!(cache.should_explode(&placeholder, &env, temp.path()).unwrap());

        let no_classes = temp.path().join("resources-1.0.aar");
        write_aar(&no_classes, &[(MANIFEST, "<manifest/>")]);
        assert!(cache.should_explode(&no_classes, &env, temp.path()).unwrap());

        let native = temp.path().join("native-1.0.aar");
        write_aar(
            &native,
            &[
                (CLASSES_JAR, "jar"),
                ("jni/arm64-v8a/libx.so", "a"),
                ("jni/x86/libx.so", "b"),
            ],
        );
        assert!(cache.should_explode(&native, &env, temp.path()).unwrap());
        assert_eq!(
            cache.get("native-1.0").unwrap().available_abis,
            ["arm64-v8a", "x86"].into_iter().collect()
        );

        // scratch inspection directories are gone
        let leftovers = fs::read_dir(temp.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with("inspect-"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn policy_overrides() {
        let temp = TempDir::new().unwrap();
        let native = temp.path().join("native-1.0.aar");
        write_aar(&native, &[(CLASSES_JAR, "jar"), ("jni/x86/libx.so", "b")]);
        let mut cache = ExplodeCache::new(temp.path().join("cache.toml"));

        let mut env = snapshot();
        env.explode_enabled = false;
        assert!(!cache.should_explode(&native, &env, temp.path()).unwrap());
        assert!(cache.get("native-1.0").is_some());

        let plain = plain_aar(temp.path());
        let mut env = snapshot();
        env.supports_packed_libraries = false;
        assert!(cache.should_explode(&plain, &env, temp.path()).unwrap());
    }

    #[test]
    fn repeated_decision_does_not_rewrite() {
        let temp = TempDir::new().unwrap();
        let aar = plain_aar(temp.path());
        let cache_path = temp.path().join("cache.toml");
        let mut cache = ExplodeCache::new(&cache_path);
        let env = snapshot();

        cache.should_explode(&aar, &env, temp.path()).unwrap();
        let first = fs::read_to_string(&cache_path).unwrap();
        assert!(!cache.has_unsaved_changes());

        cache.should_explode(&aar, &env, temp.path()).unwrap();
        assert!(!cache.save().unwrap());
        assert_eq!(fs::read_to_string(&cache_path).unwrap(), first);
    }

    #[test]
    fn abi_change_forces_reinspection() {
        let temp = TempDir::new().unwrap();
        let native = temp.path().join("native-1.0.aar");
        write_aar(
            &native,
            &[(CLASSES_JAR, "jar"), ("jni/arm64-v8a/libx.so", "a"), ("jni/x86/libx.so", "b")],
        );
        let mut cache = ExplodeCache::new(temp.path().join("cache.toml"));

        let mut env = snapshot();
        env.target_abis = ["arm64-v8a", "x86"].into_iter().collect();
        assert!(!cache.should_explode(&native, &env, temp.path()).unwrap());
        assert!(cache.stale_artifacts(&env).is_empty());

        env.target_abis = ["arm64-v8a"].into_iter().collect();
        assert_eq!(
            cache.stale_artifacts(&env),
            vec![("native-1.0".to_string(), DirtyReason::TargetAbis)]
        );
        assert!(cache.should_explode(&native, &env, temp.path()).unwrap());
        assert!(cache.stale_artifacts(&env).is_empty());
    }

    #[test]
    fn load_roundtrip_and_corrupt_file() {
        let temp = TempDir::new().unwrap();
        let aar = plain_aar(temp.path());
        let cache_path = temp.path().join("cache.toml");
        let env = snapshot();

        let mut cache = ExplodeCache::new(&cache_path);
        cache.should_explode(&aar, &env, temp.path()).unwrap();
        let content = fs::read_to_string(&cache_path).unwrap();
        assert!(content.contains("[[artifact]]"));

        let mut reloaded = ExplodeCache::load(&cache_path);
        assert_eq!(reloaded.get("plain-1.0"), cache.get("plain-1.0"));
        assert!(!reloaded.save().unwrap());

        fs::write(&cache_path, "this is [not toml").unwrap();
        let broken = ExplodeCache::load(&cache_path);
        assert!(broken.is_empty());
    }

    #[test]
    fn names_of_archives_and_directories() {
        let temp = TempDir::new().unwrap();
        assert_eq!(artifact_name(Path::new("libs/foo-1.0.2.aar")), "foo-1.0.2");
        assert_eq!(artifact_name(Path::new("libs/foo-1.0.2.srcaar")), "foo-1.0.2");
        let exploded = temp.path().join("foo-1.0.2");
        fs::create_dir(&exploded).unwrap();
        assert_eq!(artifact_name(&exploded), "foo-1.0.2");
    }

    #[test]
    fn prune_and_invalidate() {
        let temp = TempDir::new().unwrap();
        let aar = plain_aar(temp.path());
        let other = temp.path().join("other-2.0.aar");
        write_aar(&other, &[(MANIFEST, "<manifest/>"), (CLASSES_JAR, "jar")]);
        let mut cache = ExplodeCache::new(temp.path().join("cache.toml"));
        let env = snapshot();

        cache.should_explode(&aar, &env, temp.path()).unwrap();
        cache.should_explode(&other, &env, temp.path()).unwrap();

        fs::remove_file(&other).unwrap();
        assert_eq!(cache.prune().unwrap(), vec!["other-2.0".to_string()]);
        assert_eq!(cache.len(), 1);

        assert!(cache.invalidate("plain-1.0").unwrap().is_some());
        assert!(cache.invalidate("plain-1.0").unwrap().is_none());
        assert!(cache.is_empty());
    }
}
