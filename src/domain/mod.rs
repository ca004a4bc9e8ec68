//! Domain types for nerlens.
//!
//! This module contains the core data structures:
//! - BackendKind: Which engine produced a result
//! - EntityLabel: The shared label set
//! - EntitySpan: One normalized entity

pub mod backend;
pub mod label;
pub mod span;

// Re-export commonly used types
pub use backend::{BackendKind, UnknownBackend};
pub use label::{strip_bio_prefix, EntityLabel};
pub use span::EntitySpan;
