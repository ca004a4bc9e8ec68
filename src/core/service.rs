//! Normalization service: the single entry point for analyses.
//!
//! Validates input, resolves the backend, runs its adapter and converts
//! every failure into an `AnalysisError`. One backend runs per `analyze`
//! call; `compare` runs all of them in turn.

use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::ResolvedConfig;
use crate::domain::{BackendKind, EntitySpan};

use super::compare::{BackendResult, Comparison, Outcome};
use super::error::AnalysisError;
use super::registry::AdapterRegistry;

/// Runs NER backends and returns normalized spans
pub struct NormalizationService {
    registry: Arc<AdapterRegistry>,
    dedupe: bool,
}

impl NormalizationService {
    /// Create a service over an existing registry
    pub fn new(registry: Arc<AdapterRegistry>) -> Self {
        Self {
            registry,
            dedupe: false,
        }
    }

    /// Build the registry and service from configuration
    pub fn from_config(config: &ResolvedConfig) -> anyhow::Result<Self> {
        let registry = AdapterRegistry::from_config(config)?;
        Ok(Self::new(Arc::new(registry)).with_dedupe(config.dedupe))
    }

    /// Drop exact duplicate spans (same text, label and offsets)
    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe = dedupe;
        self
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Analyze `text` with the backend named by `backend`.
    ///
    /// Blank input fails with `EmptyInput` before the backend is resolved;
    /// an unknown identifier fails with `Configuration`.
    #[instrument(skip(self, text), fields(request_id = %Uuid::new_v4(), text_bytes = text.len()))]
    pub async fn analyze(&self, text: &str, backend: &str) -> Result<Vec<EntitySpan>, AnalysisError> {
        ensure_not_blank(text)?;
        let kind: BackendKind = backend.parse()?;
        self.run(text, kind).await
    }

    /// Analyze `text` with an already-resolved backend
    #[instrument(skip(self, text), fields(request_id = %Uuid::new_v4(), text_bytes = text.len()))]
    pub async fn analyze_with(
        &self,
        text: &str,
        backend: BackendKind,
    ) -> Result<Vec<EntitySpan>, AnalysisError> {
        ensure_not_blank(text)?;
        self.run(text, backend).await
    }

    /// Run every registered backend on `text`, one after another.
    ///
    /// A failing backend is recorded in the comparison and does not stop
    /// the others.
    #[instrument(skip(self, text), fields(request_id = %Uuid::new_v4(), text_bytes = text.len()))]
    pub async fn compare(&self, text: &str) -> Result<Comparison, AnalysisError> {
        ensure_not_blank(text)?;

        let kinds = self.registry.kinds();
        if kinds.is_empty() {
            return Err(AnalysisError::Configuration(
                "No backends are registered".to_string(),
            ));
        }

        let mut results = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let outcome = match self.run(text, kind).await {
                Ok(spans) => Outcome::Ok { spans },
                Err(e) => {
                    warn!(backend = %kind, error = %e, "Backend failed during comparison");
                    Outcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            results.push(BackendResult {
                backend: kind,
                outcome,
            });
        }

        Ok(Comparison::from_results(results))
    }

    async fn run(&self, text: &str, kind: BackendKind) -> Result<Vec<EntitySpan>, AnalysisError> {
        let adapter = self.registry.get(kind).await?;
        let started = Instant::now();

        let spans = adapter.run(text).await.map_err(|e| {
            error!(backend = %kind, adapter = adapter.name(), error = %e, "Analysis failed");
            AnalysisError::adapter_failure(kind, &e)
        })?;

        let spans = if self.dedupe { dedupe(spans) } else { spans };

        info!(
            backend = %kind,
            entities = spans.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Analysis complete"
        );
        Ok(spans)
    }
}

fn ensure_not_blank(text: &str) -> Result<(), AnalysisError> {
    if text.trim().is_empty() {
        return Err(AnalysisError::EmptyInput);
    }
    Ok(())
}

/// Remove exact duplicates, keeping the first occurrence and the order
pub fn dedupe(spans: Vec<EntitySpan>) -> Vec<EntitySpan> {
    let mut kept: Vec<EntitySpan> = Vec::with_capacity(spans.len());
    for span in spans {
        if !kept.iter().any(|k| k.same_entity(&span)) {
            kept.push(span);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntityLabel;

    #[test]
    fn test_ensure_not_blank() {
        assert_eq!(ensure_not_blank(""), Err(AnalysisError::EmptyInput));
        assert_eq!(ensure_not_blank(" \n\t "), Err(AnalysisError::EmptyInput));
        assert!(ensure_not_blank(" Paris ").is_ok());
    }

    #[test]
    fn test_dedupe_keeps_first_and_order() {
        let make = |text: &str, label| {
            EntitySpan::new(text, label, BackendKind::StatisticalPipeline).unwrap()
        };
        let spans = vec![
            make("Paris", EntityLabel::Location),
            make("ONU", EntityLabel::Organization),
            make("Paris", EntityLabel::Location),
            make("Paris", EntityLabel::Misc),
        ];
        let kept = dedupe(spans);
        let texts: Vec<_> = kept.iter().map(|s| (s.text(), s.label())).collect();
        assert_eq!(
            texts,
            vec![
                ("Paris", EntityLabel::Location),
                ("ONU", EntityLabel::Organization),
                ("Paris", EntityLabel::Misc),
            ]
        );
    }

    #[test]
    fn test_dedupe_respects_offsets() {
        let at = |start| {
            EntitySpan::new("Paris", EntityLabel::Location, BackendKind::StatisticalPipeline)
                .unwrap()
                .with_offsets(start, start + 5)
        };
        assert_eq!(dedupe(vec![at(0), at(10)]).len(), 2);
    }
}
