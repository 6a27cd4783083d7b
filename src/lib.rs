//! aarsync - Android archive dependency resolver
//!
//! Merges Maven dependency declarations, fetches them through Gradle and
//! prepares the resulting archives for Android packaging.

pub mod abi;
pub mod archive;
pub mod cache;
pub mod cli;
pub mod config;
pub mod conflict;
pub mod dependency;
pub mod environment;
pub mod error;
pub mod fetch;
pub mod installer;
pub mod managed;
pub mod resolution;
pub mod ui;

pub use error::{AarsyncError, AarsyncResult};
