//! Android archive post-processing

pub mod batch;
pub mod manifest;
pub mod processor;
pub mod zipio;

use std::path::Path;

pub use batch::{BatchProcessor, BatchReport, StepOutcome};
pub use processor::{ArchiveProcessor, ProcessedArtifact};

/// Extensions of archives that may be exploded
pub const EXPLODABLE_EXTENSIONS: &[&str] = &["aar", "srcaar"];

/// Extensions treated as packaged artifacts
pub const PACKAGE_EXTENSIONS: &[&str] = &["aar", "jar", "srcaar"];

/// Layout of a processed archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessMode {
    /// Unpacked into a library project directory
    ExpandedProject,
    /// Filtered and re-archived in place
    Repack,
}

pub fn is_explodable(path: &Path) -> bool {
    has_extension(path, EXPLODABLE_EXTENSIONS)
}

pub fn is_package(path: &Path) -> bool {
    has_extension(path, PACKAGE_EXTENSIONS)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}
