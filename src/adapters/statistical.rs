//! Adapter for general-purpose statistical pipelines (spaCy-style).
//!
//! The engine returns one flat entity list per document; entities map
//! one-to-one onto spans and carry no score.

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::core::labels::LabelMapper;
use crate::domain::{BackendKind, EntitySpan};
use crate::engines::StatisticalPipeline;

use super::{build_span, BackendAdapter, RawEntity};

/// Statistical pipeline adapter
pub struct StatisticalPipelineAdapter {
    name: String,
    engine: Box<dyn StatisticalPipeline>,
    labels: LabelMapper,
}

impl StatisticalPipelineAdapter {
    /// Create an adapter over `engine` with the built-in label table
    pub fn new(name: impl Into<String>, engine: impl StatisticalPipeline + 'static) -> Self {
        Self {
            name: name.into(),
            engine: Box::new(engine),
            labels: LabelMapper::new(),
        }
    }

    /// Use a custom label mapper
    pub fn with_labels(mut self, labels: LabelMapper) -> Self {
        self.labels = labels;
        self
    }
}

#[async_trait]
impl BackendAdapter for StatisticalPipelineAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::StatisticalPipeline
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, text: &str) -> Result<Vec<EntitySpan>> {
        let doc = self
            .engine
            .process(text)
            .await
            .with_context(|| format!("Statistical pipeline '{}' failed", self.name))?;

        Ok(doc
            .ents
            .iter()
            .filter_map(|ent| {
                build_span(
                    text,
                    RawEntity {
                        text: &ent.text,
                        label: &ent.label,
                        score: None,
                        start_char: ent.start_char,
                        end_char: ent.end_char,
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
            .with_context(|| format!("Statistical pipeline '{}' is not available", self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntityLabel;
    use crate::engines::{NativeEntity, StatisticalDoc};

    struct FixedDoc(Vec<(&'static str, &'static str)>);

    #[async_trait]
    impl StatisticalPipeline for FixedDoc {
        async fn process(&self, _text: &str) -> Result<StatisticalDoc> {
            Ok(StatisticalDoc {
                ents: self
                    .0
                    .iter()
                    .map(|(text, label)| NativeEntity {
                        text: text.to_string(),
                        label: label.to_string(),
                        start_char: None,
                        end_char: None,
                    })
                    .collect(),
            })
        }
    }

    struct Broken;

    #[async_trait]
    impl StatisticalPipeline for Broken {
        async fn process(&self, _text: &str) -> Result<StatisticalDoc> {
            anyhow::bail!("model fr_core_news_md not installed")
        }
    }

    #[tokio::test]
    async fn test_maps_entities_in_order() {
        let adapter = StatisticalPipelineAdapter::new(
            "fr_core_news_md",
            FixedDoc(vec![("Emmanuel Macron", "PER"), ("Bruxelles", "LOC"), ("Union Européenne", "ORG")]),
        );
        let spans = adapter.run("ignored").await.unwrap();

        let pairs: Vec<_> = spans.iter().map(|s| (s.text(), s.label())).collect();
        assert_eq!(
            pairs,
            vec![
                ("Emmanuel Macron", EntityLabel::Person),
                ("Bruxelles", EntityLabel::Location),
                ("Union Européenne", EntityLabel::Organization),
            ]
        );
        assert!(spans.iter().all(|s| s.score().is_none()));
        assert!(spans.iter().all(|s| s.source() == BackendKind::StatisticalPipeline));
    }

    #[tokio::test]
    async fn test_blank_entities_dropped() {
        let adapter = StatisticalPipelineAdapter::new("test", FixedDoc(vec![("  ", "PER"), ("ONU", "ORG")]));
        let spans = adapter.run("ignored").await.unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text(), "ONU");
    }

    #[tokio::test]
    async fn test_engine_failure_has_context() {
        let adapter = StatisticalPipelineAdapter::new("fr_core_news_md", Broken);
        let err = adapter.run("Bonjour").await.unwrap_err();
        assert!(err.to_string().contains("fr_core_news_md"));
        assert!(format!("{:#}", err).contains("not installed"));
    }
}
