//! Engine reached through a `Transport`.

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{
    SentenceDoc, SentencePipeline, StatisticalDoc, StatisticalPipeline, TokenClassifier,
    TokenPrediction, Transport,
};

/// An out-of-process engine decoded into its native output shape
pub struct RemoteEngine {
    transport: Box<dyn Transport>,
}

impl RemoteEngine {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
        }
    }

    pub fn boxed(transport: Box<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn describe(&self) -> String {
        self.transport.describe()
    }

    async fn call(&self, text: &str) -> Result<serde_json::Value> {
        self.transport.call(text).await
    }
}

#[async_trait]
impl StatisticalPipeline for RemoteEngine {
    async fn process(&self, text: &str) -> Result<StatisticalDoc> {
        let value = self.call(text).await?;
        serde_json::from_value(value).with_context(|| {
            format!("Unexpected document shape from '{}'", self.describe())
        })
    }

    async fn health_check(&self) -> Result<()> {
        self.transport.health_check().await
    }
}

#[async_trait]
impl SentencePipeline for RemoteEngine {
    async fn process(&self, text: &str) -> Result<SentenceDoc> {
        let value = self.call(text).await?;
        serde_json::from_value(value).with_context(|| {
            format!("Unexpected sentence document shape from '{}'", self.describe())
        })
    }

    async fn health_check(&self) -> Result<()> {
        self.transport.health_check().await
    }
}

#[async_trait]
impl TokenClassifier for RemoteEngine {
    async fn infer(&self, text: &str) -> Result<Vec<TokenPrediction>> {
        let value = unwrap_batch(self.call(text).await?);
        serde_json::from_value(value).with_context(|| {
            format!("Unexpected prediction list from '{}'", self.describe())
        })
    }

    async fn health_check(&self) -> Result<()> {
        self.transport.health_check().await
    }
}

/// Hosted endpoints answer a single input with `[[...]]` at times
fn unwrap_batch(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Array(mut items)
            if items.len() == 1 && items[0].is_array() =>
        {
            items.remove(0)
        }
        other => other,
    }
}
