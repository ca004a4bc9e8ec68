//! nerlens - French named-entity recognition across interchangeable backends
//!
//! Three NER engines with different native output shapes are wrapped
//! behind one adapter contract and normalized into a single span type.
//!
//! # Architecture
//!
//! - Engines produce their native output (flat entity list, per-sentence
//!   entities, token predictions)
//! - Adapters map native output onto `EntitySpan` with a shared label set
//! - The service validates input, dispatches to a lazily-loaded adapter
//!   and wraps every failure in `AnalysisError`
//!
//! # Modules
//!
//! - `engines`: Capability traits and transports (worker process, HTTP)
//! - `adapters`: One adapter per backend kind
//! - `core`: Labels, aggregation, registry, service, comparison
//! - `domain`: Data structures (BackendKind, EntityLabel, EntitySpan)
//! - `config`: YAML configuration with env overrides
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Extract entities with the default backend
//! echo "Emmanuel Macron s'est rendu à Bruxelles." | nerlens analyze
//!
//! # Pick a backend
//! nerlens analyze --backend spacy "L'ONU siège à Genève."
//!
//! # Run every backend side by side
//! nerlens compare --example
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod engines;

// Re-export main types at crate root for convenience
pub use adapters::BackendAdapter;
pub use core::{AdapterRegistry, AnalysisError, Comparison, NormalizationService};
pub use domain::{BackendKind, EntityLabel, EntitySpan};
