//! Core types for dependency-graph processing
//!
//! This module defines the data model shared by the whole pipeline: node
//! and edge types, raw backend payloads, the immutable snapshot, errors,
//! and logging setup.

mod error;
pub mod logging;
mod snapshot;
mod types;

pub use error::*;
pub use logging::*;
pub use snapshot::*;
pub use types::*;
