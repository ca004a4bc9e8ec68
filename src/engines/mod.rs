//! Capability interfaces for external NER engines.
//!
//! Each engine family is reachable through one small trait and returns
//! its own native output shape. Adapters (see `crate::adapters`) turn
//! those shapes into `EntitySpan`s; nothing engine-specific leaks past them.
//!
//! Concrete engines live behind a `Transport`:
//! - `ProcessTransport`: persistent worker process speaking JSON lines
//! - `HttpTransport`: hosted inference endpoint
//!
//! `RemoteEngine` wraps either transport and implements all three
//! capability traits by decoding the JSON it gets back.

pub mod http;
pub mod process;
pub mod remote;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use http::HttpTransport;
pub use process::ProcessTransport;
pub use remote::RemoteEngine;

// ============================================================================
// Native output shapes
// ============================================================================

/// Document returned by a statistical pipeline: one flat entity list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticalDoc {
    #[serde(default, alias = "entities")]
    pub ents: Vec<NativeEntity>,
}

/// Entity as a statistical pipeline reports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeEntity {
    pub text: String,
    #[serde(alias = "label_")]
    pub label: String,
    /// Character offset, when the engine reports one
    #[serde(default)]
    pub start_char: Option<usize>,
    #[serde(default)]
    pub end_char: Option<usize>,
}

/// Document returned by a sentence-segmenting pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentenceDoc {
    #[serde(default)]
    pub sentences: Vec<Sentence>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    #[serde(default, alias = "entities")]
    pub ents: Vec<SentenceEntity>,
}

/// Entity nested under a sentence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceEntity {
    pub text: String,
    #[serde(rename = "type", alias = "label")]
    pub kind: String,
    #[serde(default)]
    pub start_char: Option<usize>,
    #[serde(default)]
    pub end_char: Option<usize>,
}

/// One prediction from a token classifier.
///
/// Aggregated output carries `entity_group`; raw per-token output carries
/// `entity` (possibly BIO-prefixed) instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPrediction {
    pub word: String,
    #[serde(default)]
    pub entity_group: Option<String>,
    #[serde(default)]
    pub entity: Option<String>,
    pub score: f32,
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub end: Option<usize>,
}

impl TokenPrediction {
    /// Whether the engine already merged sub-word tokens
    pub fn is_aggregated(&self) -> bool {
        self.entity_group.is_some()
    }
}

// ============================================================================
// Capability traits
// ============================================================================

/// General-purpose linguistic pipeline with a flat entity recognizer
#[async_trait]
pub trait StatisticalPipeline: Send + Sync {
    async fn process(&self, text: &str) -> Result<StatisticalDoc>;

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// Pipeline whose entities hang off sentence objects
#[async_trait]
pub trait SentencePipeline: Send + Sync {
    async fn process(&self, text: &str) -> Result<SentenceDoc>;

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// Neural token-classification engine
#[async_trait]
pub trait TokenClassifier: Send + Sync {
    async fn infer(&self, text: &str) -> Result<Vec<TokenPrediction>>;

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

/// Raw channel to an engine: text in, JSON out
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short description for logs (command line or URL)
    fn describe(&self) -> String;

    /// Send one text and return the engine's JSON answer
    async fn call(&self, text: &str) -> Result<serde_json::Value>;

    /// Verify the engine answers a trivial request
    async fn health_check(&self) -> Result<()> {
        self.call("Paris").await.map(|_| ())
    }
}
