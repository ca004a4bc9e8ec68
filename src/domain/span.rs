//! The unified entity span every adapter produces.

use serde::Serialize;

use super::backend::BackendKind;
use super::label::EntityLabel;

/// One detected named entity
///
/// Values are built once per request and never mutated. The text is
/// always trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySpan {
    text: String,
    label: EntityLabel,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f32>,
    source: BackendKind,
    /// UTF-8 byte range into the analyzed text
    #[serde(skip_serializing_if = "Option::is_none")]
    offsets: Option<(usize, usize)>,
}

impl EntitySpan {
    /// Create a span, or `None` if `text` is blank
    pub fn new(text: &str, label: EntityLabel, source: BackendKind) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        Some(Self {
            text: text.to_string(),
            label,
            score: None,
            source,
            offsets: None,
        })
    }

    /// Attach a confidence score, clamped into [0, 1]. NaN is dropped.
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = if score.is_nan() {
            None
        } else {
            Some(score.clamp(0.0, 1.0))
        };
        self
    }

    /// Attach a byte range into the analyzed text
    pub fn with_offsets(mut self, start: usize, end: usize) -> Self {
        if start < end {
            self.offsets = Some((start, end));
        }
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn label(&self) -> EntityLabel {
        self.label
    }

    pub fn score(&self) -> Option<f32> {
        self.score
    }

    pub fn source(&self) -> BackendKind {
        self.source
    }

    pub fn offsets(&self) -> Option<(usize, usize)> {
        self.offsets
    }

    /// Whether two spans denote the same entity occurrence
    pub fn same_entity(&self, other: &EntitySpan) -> bool {
        self.text == other.text && self.label == other.label && self.offsets == other.offsets
    }
}
