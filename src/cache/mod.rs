//! Explode decision cache
//!
//! Records, per artifact, whether the archive had to be exploded and the
//! build settings the decision was made under, so that unchanged artifacts
//! are not re-inspected on every resolution.
//!
//! # Dirtiness
//!
//! | Reason | Trigger |
//! |--------|---------|
//! | ApplicationId | owning application id changed |
//! | TargetAbis | target architecture set changed |
//! | GradleBuild / GradleExport / GradleTemplate | build flags changed |
//! | Missing | the recorded artifact path no longer exists |

pub mod entry;
pub mod store;

pub use entry::{DirtyReason, ExplodeEntry};
pub use store::{artifact_name, modified_time, ExplodeCache};
