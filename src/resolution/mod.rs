//! Resolution cycle and its single-flight queue

pub mod resolver;
pub mod serializer;
pub mod state;

pub use resolver::{ProgressFn, ResolutionOutcome, ResolveOptions, Resolver};
pub use serializer::{ResolutionHandle, ResolutionService};
pub use state::ResolutionState;
