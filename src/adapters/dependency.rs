//! Adapter for sentence-segmenting pipelines (Stanza-style).
//!
//! Entities hang off sentence objects. The adapter flattens them into one
//! document-level list, sentence by sentence, keeping encounter order.

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::core::labels::LabelMapper;
use crate::domain::{BackendKind, EntitySpan};
use crate::engines::SentencePipeline;

use super::{build_span, BackendAdapter, RawEntity};

/// Dependency-parser pipeline adapter
pub struct DependencyParserPipelineAdapter {
    name: String,
    engine: Box<dyn SentencePipeline>,
    labels: LabelMapper,
}

impl DependencyParserPipelineAdapter {
    pub fn new(name: impl Into<String>, engine: impl SentencePipeline + 'static) -> Self {
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
impl BackendAdapter for DependencyParserPipelineAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::DependencyParserPipeline
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, text: &str) -> Result<Vec<EntitySpan>> {
        let doc = self
            .engine
            .process(text)
            .await
            .with_context(|| format!("Sentence pipeline '{}' failed", self.name))?;

        Ok(doc
            .sentences
            .iter()
            .flat_map(|sentence| sentence.ents.iter())
            .filter_map(|ent| {
                build_span(
                    text,
                    RawEntity {
                        text: &ent.text,
                        label: &ent.kind,
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
            .with_context(|| format!("Sentence pipeline '{}' is not available", self.name))
    }
}
