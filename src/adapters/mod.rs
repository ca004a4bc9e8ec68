//! Backend adapters.
//!
//! Each adapter wraps one NER engine and translates its native output
//! into an ordered sequence of `EntitySpan`. Engine-specific shapes
//! (flat lists, sentence-nested lists, sub-word groups) stop here.

pub mod dependency;
pub mod statistical;
pub mod transformer;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::core::labels::LabelMapper;
use crate::core::text::char_span_to_bytes;
use crate::domain::{BackendKind, EntitySpan};

pub use dependency::DependencyParserPipelineAdapter;
pub use statistical::StatisticalPipelineAdapter;
pub use transformer::TransformerPipelineAdapter;

/// Trait implemented by every backend adapter
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    /// Which backend this adapter serves
    fn kind(&self) -> BackendKind;

    /// Human-readable engine/model name
    fn name(&self) -> &str;

    /// Run the engine on non-blank text.
    ///
    /// `text` is the caller's string as given, not trimmed, so engine
    /// offsets index it directly. Spans come back in the order the engine
    /// emitted them; an empty vector means no entities were found.
    async fn run(&self, text: &str) -> Result<Vec<EntitySpan>>;

    /// Check that the underlying engine is reachable and loaded
    async fn health_check(&self) -> Result<()>;
}

/// Native entity fields common to every engine
pub(crate) struct RawEntity<'a> {
    pub text: &'a str,
    pub label: &'a str,
    pub score: Option<f32>,
    pub start_char: Option<usize>,
    pub end_char: Option<usize>,
}

/// Build a span from native entity fields.
///
/// When the engine reports valid character offsets the span text is cut
/// from `source`, so it can never contain text the input did not.
pub(crate) fn build_span(
    source: &str,
    raw: RawEntity<'_>,
    kind: BackendKind,
    labels: &LabelMapper,
) -> Option<EntitySpan> {
    let label = labels.map(raw.label);

    let located = match (raw.start_char, raw.end_char) {
        (Some(start), Some(end)) => char_span_to_bytes(source, start, end),
        _ => None,
    };

    let span = match located {
        Some((start, end)) => {
            let slice = &source[start..end];
            if slice != raw.text.trim() {
                debug!(backend = %kind, "Engine text differs from its offsets, using source slice");
            }
            EntitySpan::new(slice, label, kind).map(|s| s.with_offsets(start, end))
        }
        None => EntitySpan::new(raw.text, label, kind),
    };

    let span = match span {
        Some(span) => span,
        None => {
            debug!(backend = %kind, "Dropping entity with blank text");
            return None;
        }
    };

    Some(match raw.score {
        Some(score) => span.with_score(score),
        None => span,
    })
}
