//! Explode or repack a single Android archive
//!
//! All work happens in an isolated scratch directory that is removed when
//! processing ends, whatever the outcome.

use crate::abi::AbiSet;
use crate::archive::manifest;
use crate::archive::zipio;
use crate::archive::ProcessMode;
use crate::error::{AarsyncError, AarsyncResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const MANIFEST: &str = "AndroidManifest.xml";
pub const CLASSES_JAR: &str = "classes.jar";
pub const NATIVE_DIR: &str = "jni";
pub const LIBS_DIR: &str = "libs";
pub const PROJECT_PROPERTIES: &str = "project.properties";

const PROJECT_DESCRIPTOR: &str = "target=android-9\nandroid.library=true\n";

/// Outcome of processing one archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedArtifact {
    /// Where the artifact now lives
    pub output: PathBuf,

    /// Architectures the archive shipped, before filtering
    pub available_abis: AbiSet,
}

/// Unpacks archives, substitutes manifest variables and strips native
/// libraries for architectures outside the target set
pub struct ArchiveProcessor {
    work_root: PathBuf,
    variables: BTreeMap<String, String>,
}

impl ArchiveProcessor {
    pub fn new(work_root: impl Into<PathBuf>) -> Self {
        Self {
            work_root: work_root.into(),
            variables: BTreeMap::new(),
        }
    }

    /// Manifest substitutions, `applicationId` included
    pub fn with_variables(mut self, variables: BTreeMap<String, String>) -> Self {
        self.variables = variables;
        self
    }

    pub fn process(
        &self,
        artifact: &Path,
        dest_dir: &Path,
        mode: ProcessMode,
        target_abis: &AbiSet,
    ) -> AarsyncResult<ProcessedArtifact> {
        let stem = artifact
            .file_stem()
            .ok_or_else(|| AarsyncError::archive(artifact, "archive has no file name"))?
            .to_os_string();

        fs::create_dir_all(&self.work_root).map_err(|e| {
            AarsyncError::io(format!("creating {}", self.work_root.display()), e)
        })?;
        let scratch = tempfile::Builder::new()
            .prefix("explode-")
            .tempdir_in(&self.work_root)
            .map_err(|e| AarsyncError::io("creating working directory", e))?;
        let work = scratch.path().join(&stem);

        zipio::extract_all(artifact, &work)?;
        self.substitute_manifest(&work)?;

        let available_abis = list_abis(&work.join(NATIVE_DIR))?;
        let native_dir = match mode {
            ProcessMode::ExpandedProject => layout_library_project(&work)?,
            ProcessMode::Repack => {
                ensure_classes_jar(&work.join(CLASSES_JAR))?;
                work.join(NATIVE_DIR)
            }
        };

        for abi in available_abis.rejected_by(target_abis) {
            let dir = native_dir.join(abi);
            debug!("Removing {} libraries from {}", abi, artifact.display());
            fs::remove_dir_all(&dir)
                .map_err(|e| AarsyncError::io(format!("removing {}", dir.display()), e))?;
        }

        let output = match mode {
            ProcessMode::ExpandedProject => {
                fs::write(work.join(PROJECT_PROPERTIES), PROJECT_DESCRIPTOR)
                    .map_err(|e| AarsyncError::io("writing project.properties", e))?;

                let output = dest_dir.join(&stem);
                if output.exists() {
                    fs::remove_dir_all(&output).map_err(|e| {
                        AarsyncError::io(format!("removing {}", output.display()), e)
                    })?;
                }
                zipio::move_dir(&work, &output)?;
                fs::remove_file(artifact).map_err(|e| {
                    AarsyncError::io(format!("removing {}", artifact.display()), e)
                })?;
                output
            }
            ProcessMode::Repack => {
                let parent = artifact.parent().unwrap_or(Path::new("."));
                let mut packed = tempfile::NamedTempFile::new_in(parent)
                    .map_err(|e| AarsyncError::io("creating repacked archive", e))?;
                zipio::pack_dir_into(&work, packed.as_file_mut())?;
                packed.persist(artifact).map_err(|e| {
                    AarsyncError::io(format!("replacing {}", artifact.display()), e.error)
                })?;
                artifact.to_path_buf()
            }
        };

        info!(
            "Processed {} ({:?}, abis: {})",
            artifact.display(),
            mode,
            if available_abis.is_universal() {
                "none".to_string()
            } else {
                available_abis.to_string()
            }
        );

        Ok(ProcessedArtifact {
            output,
            available_abis,
        })
    }

    fn substitute_manifest(&self, work: &Path) -> AarsyncResult<()> {
        let path = work.join(MANIFEST);
        if !path.exists() {
            return Ok(());
        }
        let original = fs::read_to_string(&path)
            .map_err(|e| AarsyncError::io(format!("reading {}", path.display()), e))?;
        let updated = manifest::substitute(&original, &self.variables);
        if updated != original {
            fs::write(&path, updated)
                .map_err(|e| AarsyncError::io(format!("writing {}", path.display()), e))?;
        }
        Ok(())
    }
}

/// Subdirectories of a native library directory
pub(crate) fn list_abis(native_dir: &Path) -> AarsyncResult<AbiSet> {
    if !native_dir.is_dir() {
        return Ok(AbiSet::universal());
    }
    let entries = fs::read_dir(native_dir)
        .map_err(|e| AarsyncError::io(format!("reading {}", native_dir.display()), e))?;

    let mut abis = AbiSet::universal();
    for entry in entries {
        let entry =
            entry.map_err(|e| AarsyncError::io(format!("reading {}", native_dir.display()), e))?;
        if entry.path().is_dir() {
            abis.insert(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(abis)
}

/// Architectures with native libraries inside a packed archive
pub(crate) fn archive_abis(archive: &Path) -> AarsyncResult<AbiSet> {
    let prefix = format!("{}/", NATIVE_DIR);
    Ok(zipio::entry_names(archive)?
        .iter()
        .filter_map(|name| name.strip_prefix(&prefix))
        .filter_map(|rest| rest.split_once('/'))
        .map(|(abi, _)| abi)
        .collect())
}

fn ensure_classes_jar(path: &Path) -> AarsyncResult<()> {
    if !path.exists() {
        debug!("Synthesizing missing {}", path.display());
        zipio::write_empty_jar(path)?;
    }
    Ok(())
}

/// Move `classes.jar` and `jni/<abi>` under `libs/`. Returns the new native
/// library directory.
fn layout_library_project(work: &Path) -> AarsyncResult<PathBuf> {
    let libs = work.join(LIBS_DIR);
    fs::create_dir_all(&libs)
        .map_err(|e| AarsyncError::io(format!("creating {}", libs.display()), e))?;

    let classes = work.join(CLASSES_JAR);
    let relocated = libs.join(CLASSES_JAR);
    if classes.exists() {
        fs::rename(&classes, &relocated)
            .map_err(|e| AarsyncError::io(format!("moving {}", classes.display()), e))?;
    } else {
        ensure_classes_jar(&relocated)?;
    }

    let jni = work.join(NATIVE_DIR);
    if jni.is_dir() {
        let entries = fs::read_dir(&jni)
            .map_err(|e| AarsyncError::io(format!("reading {}", jni.display()), e))?;
        for entry in entries {
            let entry = entry.map_err(|e| AarsyncError::io(format!("reading {}", jni.display()), e))?;
            let target = libs.join(entry.file_name());
            if target.exists() {
                fs::remove_dir_all(&target)
                    .map_err(|e| AarsyncError::io(format!("removing {}", target.display()), e))?;
            }
            zipio::move_dir(&entry.path(), &target)?;
        }
        fs::remove_dir_all(&jni)
            .map_err(|e| AarsyncError::io(format!("removing {}", jni.display()), e))?;
    }

    Ok(libs)
}
