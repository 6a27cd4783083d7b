//! Fetching artifacts through the external build tool

pub mod fetcher;
pub mod properties;
pub mod report;
pub mod runner;

pub use fetcher::{ArtifactFetcher, FetchOutcome, FetchSettings};
pub use properties::FetchProperties;
pub use report::FetchReport;
pub use runner::{CommandOutput, CommandRunner, ProcessRunner};
