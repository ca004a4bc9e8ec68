//! Core normalization logic.
//!
//! This module contains:
//! - LabelMapper: Native label vocabularies → shared labels
//! - Aggregation: Sub-word token merging ("simple" strategy)
//! - AdapterRegistry: Lazily-built, shared backend adapters
//! - NormalizationService: Input validation, dispatch, error wrapping
//! - Comparison: All backends side by side

pub mod aggregation;
pub mod compare;
pub mod error;
pub mod labels;
pub mod registry;
pub mod service;
pub mod text;

// Re-export commonly used types
pub use aggregation::aggregate_simple;
pub use compare::{AgreementRow, BackendResult, Comparison, Outcome};
pub use error::AnalysisError;
pub use labels::LabelMapper;
pub use registry::{build_transport, AdapterFactory, AdapterRegistry};
pub use service::{dedupe, NormalizationService};
pub use text::char_span_to_bytes;
