//! Adapter for neural token classifiers (CamemBERT-style).
//!
//! The engine is expected to aggregate sub-word tokens itself with the
//! "simple" strategy; its `entity_group` and `score` (the mean of the
//! member token scores) are used as-is. Raw per-token output is merged
//! here with the same rule, see `core::aggregation`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::core::aggregation::aggregate_simple;
use crate::core::labels::LabelMapper;
use crate::domain::{BackendKind, EntitySpan};
use crate::engines::TokenClassifier;

use super::{build_span, BackendAdapter, RawEntity};

/// Transformer pipeline adapter
pub struct TransformerPipelineAdapter {
    name: String,
    engine: Box<dyn TokenClassifier>,
    labels: LabelMapper,
}

impl TransformerPipelineAdapter {
    pub fn new(name: impl Into<String>, engine: impl TokenClassifier + 'static) -> Self {
        Self {
            name: name.into(),
            engine: Box::new(engine),
            labels: LabelMapper::new(),
        }
    }

    pub fn with_labels(mut self, labels: LabelMapper) -> Self {
        self.labels = labels;
        self
    }
}

#[async_trait]
impl BackendAdapter for TransformerPipelineAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::TransformerPipeline
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, text: &str) -> Result<Vec<EntitySpan>> {
        let predictions = self
            .engine
            .infer(text)
            .await
            .with_context(|| format!("Token classifier '{}' failed", self.name))?;

        let groups = if predictions.iter().all(|p| p.is_aggregated()) {
            predictions
        } else {
            debug!(tokens = predictions.len(), "Aggregating raw token predictions");
            aggregate_simple(&predictions, text)
        };

        Ok(groups
            .iter()
            .filter_map(|group| {
                build_span(
                    text,
                    RawEntity {
                        text: &group.word,
                        label: group.entity_group.as_deref().unwrap_or_default(),
                        score: Some(group.score),
                        start_char: group.start,
                        end_char: group.end,
                    },
                    self.kind(),
                    &self.labels,
                )
            })
            .collect())
    }

    async fn health_check(&self) -> Result<()> {
        self.engine
            .health_check()
            .await
            .with_context(|| format!("Token classifier '{}' is not available", self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntityLabel;
    use crate::engines::TokenPrediction;

    struct Fixed(Vec<TokenPrediction>);

    #[async_trait]
    impl TokenClassifier for Fixed {
        async fn infer(&self, _text: &str) -> Result<Vec<TokenPrediction>> {
            Ok(self.0.clone())
        }
    }

    fn group(word: &str, label: &str, score: f32, start: usize, end: usize) -> TokenPrediction {
        TokenPrediction {
            word: word.to_string(),
            entity_group: Some(label.to_string()),
            entity: None,
            score,
            start: Some(start),
            end: Some(end),
        }
    }

    #[tokio::test]
    async fn test_aggregated_groups() {
        let text = "Emmanuel Macron s'est rendu à Bruxelles.";
        let adapter = TransformerPipelineAdapter::new(
            "Jean-Baptiste/camembert-ner",
            Fixed(vec![
                group("Emmanuel Macron", "PER", 0.998, 0, 15),
                group("Bruxelles", "LOC", 0.997, 30, 39),
            ]),
        );
        let spans = adapter.run(text).await.unwrap();

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text(), "Emmanuel Macron");
        assert_eq!(spans[0].label(), EntityLabel::Person);
        assert_eq!(spans[0].score(), Some(0.998));
        assert_eq!(spans[1].text(), "Bruxelles");
        assert_eq!(spans[1].label(), EntityLabel::Location);
        assert_eq!(spans[1].offsets(), Some((31, 40)));
    }

    #[tokio::test]
    async fn test_raw_tokens_are_aggregated() {
        let raw = |word: &str, entity: &str, score: f32| TokenPrediction {
            word: word.to_string(),
            entity_group: None,
            entity: Some(entity.to_string()),
            score,
            start: None,
            end: None,
        };
        let adapter = TransformerPipelineAdapter::new(
            "camembert-ner",
            Fixed(vec![
                raw("▁Emmanuel", "I-PER", 0.9),
                raw("▁Macron", "I-PER", 0.7),
                raw("▁à", "O", 0.99),
                raw("▁Bruxelles", "I-LOC", 0.95),
            ]),
        );
        let spans = adapter.run("Emmanuel Macron à Bruxelles").await.unwrap();

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text(), "Emmanuel Macron");
        assert!((spans[0].score().unwrap() - 0.8).abs() < 1e-6);
        assert_eq!(spans[1].text(), "Bruxelles");
    }

    #[tokio::test]
    async fn test_empty_prediction_list() {
        let adapter = TransformerPipelineAdapter::new("camembert-ner", Fixed(vec![]));
        assert!(adapter.run("Il fait beau aujourd'hui.").await.unwrap().is_empty());
    }
}
