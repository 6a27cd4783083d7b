//! Registry of files owned by the resolver
//!
//! Labels are project-relative paths persisted as a JSON list next to the
//! explode cache.

use crate::error::{AarsyncError, AarsyncResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Default, Serialize, Deserialize)]
struct ManagedFile {
    #[serde(default)]
    assets: BTreeSet<PathBuf>,
}

/// Set of resolver-managed files
#[derive(Debug)]
pub struct ManagedAssets {
    file: PathBuf,
    root: PathBuf,
    assets: BTreeSet<PathBuf>,
}

impl ManagedAssets {
    /// Load labels from `file`; paths are relative to `root`.
    pub fn load(file: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Self {
        let file = file.into();
        let assets = match fs::read_to_string(&file) {
            Ok(content) => match serde_json::from_str::<ManagedFile>(&content) {
                Ok(parsed) => parsed.assets,
                Err(e) => {
                    warn!("Ignoring unreadable managed asset list {}: {}", file.display(), e);
                    BTreeSet::new()
                }
            },
            Err(_) => BTreeSet::new(),
        };
        Self {
            file,
            root: root.into(),
            assets,
        }
    }

    pub fn save(&self) -> AarsyncResult<()> {
        if let Some(parent) = self.file.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AarsyncError::io(format!("creating {}", parent.display()), e))?;
        }
        let content = serde_json::to_string_pretty(&ManagedFile {
            assets: self.assets.clone(),
        })?;
        fs::write(&self.file, content)
            .map_err(|e| AarsyncError::io(format!("writing {}", self.file.display()), e))
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root).unwrap_or(path).to_path_buf()
    }

    /// Label `path` as managed
    pub fn label(&mut self, path: &Path) {
        let relative = self.relative(path);
        self.assets.insert(relative);
    }

    pub fn unlabel(&mut self, path: &Path) {
        let relative = self.relative(path);
        self.assets.remove(&relative);
    }

    pub fn is_managed(&self, path: &Path) -> bool {
        self.assets.contains(&self.relative(path))
    }

    /// Absolute paths of every labelled file
    pub fn paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.assets.iter().map(|relative| self.root.join(relative))
    }

    /// Forget labels whose file is gone. Returns how many were dropped.
    pub fn retain_existing(&mut self) -> usize {
        let before = self.assets.len();
        let root = self.root.clone();
        self.assets.retain(|relative| root.join(relative).exists());
        before - self.assets.len()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
