//! Backend identifiers.
//!
//! A `BackendKind` names one of the three NER engines. It doubles as the
//! `source` tag on every span the engine produced.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which NER engine produced (or should produce) a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// General-purpose linguistic pipeline with a flat entity list (spaCy-style)
    StatisticalPipeline,

    /// Sentence-segmenting pipeline with per-sentence entities (Stanza-style)
    DependencyParserPipeline,

    /// Neural token classifier with sub-word aggregation (CamemBERT-style)
    TransformerPipeline,
}

impl BackendKind {
    /// All backends, in the order they are offered to users
    pub const ALL: [BackendKind; 3] = [
        BackendKind::TransformerPipeline,
        BackendKind::StatisticalPipeline,
        BackendKind::DependencyParserPipeline,
    ];

    /// Canonical identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::StatisticalPipeline => "statistical_pipeline",
            BackendKind::DependencyParserPipeline => "dependency_parser_pipeline",
            BackendKind::TransformerPipeline => "transformer_pipeline",
        }
    }

    /// Short key used in config files
    pub fn config_key(&self) -> &'static str {
        match self {
            BackendKind::StatisticalPipeline => "statistical",
            BackendKind::DependencyParserPipeline => "dependency_parser",
            BackendKind::TransformerPipeline => "transformer",
        }
    }

    /// Human-readable name for menus and reports
    pub fn display_name(&self) -> &'static str {
        match self {
            BackendKind::StatisticalPipeline => "spaCy",
            BackendKind::DependencyParserPipeline => "Stanza",
            BackendKind::TransformerPipeline => "CamemBERT (HuggingFace)",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known backend
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown backend identifier: '{0}'")]
pub struct UnknownBackend(pub String);

impl FromStr for BackendKind {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace('-', "_");
        match key.as_str() {
            "statistical_pipeline" | "statistical" | "spacy" => Ok(BackendKind::StatisticalPipeline),
            "dependency_parser_pipeline" | "dependency_parser" | "stanza" => {
                Ok(BackendKind::DependencyParserPipeline)
            }
            "transformer_pipeline" | "transformer" | "camembert" => {
                Ok(BackendKind::TransformerPipeline)
            }
            _ => Err(UnknownBackend(s.to_string())),
        }
    }
}
