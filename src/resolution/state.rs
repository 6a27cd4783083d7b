//! Transient state of one fetch cycle

use crate::dependency::Dependency;
use crate::fetch::CommandOutput;
use std::path::PathBuf;

/// What one fetch attempt produced
#[derive(Debug, Clone, Default)]
pub struct ResolutionState {
    /// Tool exit status and captured output
    pub output: CommandOutput,

    pub copied: Vec<PathBuf>,
    pub missing: Vec<Dependency>,
    pub modified: Vec<PathBuf>,

    /// An error or warning was logged for this cycle
    pub problems_logged: bool,

    /// Post-processing ran over the copied artifacts
    pub processed: bool,
}

impl ResolutionState {
    pub fn new(output: CommandOutput) -> Self {
        Self {
            output,
            ..Self::default()
        }
    }
}
