//! Dependency declarations and the merged resolution request

pub mod discover;
pub mod merge;
pub mod record;
pub mod version;

pub use discover::{discover, Declarations};
pub use merge::{DependencyMerger, MergedRequest, RepositoryEntry};
pub use record::{Dependency, LATEST};
pub use version::{compare_versions, split_versioned_name};
