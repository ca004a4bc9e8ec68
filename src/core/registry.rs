//! Lazily-initialized adapter registry.
//!
//! Engines are expensive to construct, so each adapter is built at most
//! once per registry (on first use or by `warm_up`) and shared from then
//! on. The registry is created at the composition root and passed down;
//! there is no global instance.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::adapters::{
    BackendAdapter, DependencyParserPipelineAdapter, StatisticalPipelineAdapter,
    TransformerPipelineAdapter,
};
use crate::config::{BackendSettings, EngineConfig, ResolvedConfig};
use crate::domain::BackendKind;
use crate::engines::{HttpTransport, ProcessTransport, RemoteEngine, Transport};

use super::error::AnalysisError;
use super::labels::LabelMapper;

/// Builds an adapter; called at most once per successful load
pub type AdapterFactory = Box<dyn Fn() -> Result<Arc<dyn BackendAdapter>> + Send + Sync>;

struct Entry {
    factory: AdapterFactory,
    adapter: OnceCell<Arc<dyn BackendAdapter>>,
}

/// Registry of backend adapters keyed by `BackendKind`
#[derive(Default)]
pub struct AdapterRegistry {
    entries: BTreeMap<BackendKind, Entry>,
}

impl AdapterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for `kind`, replacing any previous one
    pub fn register<F>(&mut self, kind: BackendKind, factory: F)
    where
        F: Fn() -> Result<Arc<dyn BackendAdapter>> + Send + Sync + 'static,
    {
        self.entries.insert(
            kind,
            Entry {
                factory: Box::new(factory),
                adapter: OnceCell::new(),
            },
        );
    }

    /// Register an already-built adapter under its own kind
    pub fn register_adapter(&mut self, adapter: Arc<dyn BackendAdapter>) {
        let kind = adapter.kind();
        self.entries.insert(
            kind,
            Entry {
                factory: Box::new(move || Ok(adapter.clone())),
                adapter: OnceCell::new(),
            },
        );
    }

    /// Registered backends, in menu order
    pub fn kinds(&self) -> Vec<BackendKind> {
        BackendKind::ALL
            .into_iter()
            .filter(|kind| self.entries.contains_key(kind))
            .collect()
    }

    /// Whether the adapter for `kind` has been constructed
    pub fn is_loaded(&self, kind: BackendKind) -> bool {
        self.entries
            .get(&kind)
            .map(|entry| entry.adapter.initialized())
            .unwrap_or(false)
    }

    /// Get the adapter for `kind`, constructing it on first use.
    ///
    /// Concurrent first calls construct once. A failed construction is
    /// not cached, so a later call tries again.
    pub async fn get(&self, kind: BackendKind) -> Result<Arc<dyn BackendAdapter>, AnalysisError> {
        let entry = self.entries.get(&kind).ok_or_else(|| {
            AnalysisError::Configuration(format!("No adapter registered for backend '{}'", kind))
        })?;

        let adapter = entry
            .adapter
            .get_or_try_init(|| async {
                info!(backend = %kind, "Loading backend adapter");
                (entry.factory)().map_err(|e| {
                    warn!(backend = %kind, error = %e, "Backend adapter failed to load");
                    AnalysisError::adapter_failure(kind, &e)
                })
            })
            .await?;

        Ok(adapter.clone())
    }

    /// Construct and health-check every registered adapter
    pub async fn warm_up(&self) -> Vec<(BackendKind, Result<(), AnalysisError>)> {
        let mut report = Vec::new();
        for kind in self.kinds() {
            let result = match self.get(kind).await {
                Ok(adapter) => adapter
                    .health_check()
                    .await
                    .map_err(|e| AnalysisError::adapter_failure(kind, &e)),
                Err(e) => Err(e),
            };
            report.push((kind, result));
        }
        report
    }

    /// Build the registry described by the resolved configuration
    pub fn from_config(config: &ResolvedConfig) -> Result<Self> {
        let labels = LabelMapper::with_aliases(&config.label_aliases)?;
        let timeout = Duration::from_secs(config.timeout_seconds);
        let mut registry = Self::new();

        for kind in BackendKind::ALL {
            let settings = match config.backends.get(&kind) {
                Some(settings) if settings.enabled => settings.clone(),
                _ => continue,
            };
            let labels = labels.clone();
            registry.register(kind, move || build_adapter(kind, &settings, &labels, timeout));
        }

        Ok(registry)
    }
}

fn build_adapter(
    kind: BackendKind,
    settings: &BackendSettings,
    labels: &LabelMapper,
    timeout: Duration,
) -> Result<Arc<dyn BackendAdapter>> {
    let engine = RemoteEngine::boxed(build_transport(&settings.engine, timeout)?);
    let name = settings.model.clone();
    let labels = labels.clone();

    let adapter: Arc<dyn BackendAdapter> = match kind {
        BackendKind::StatisticalPipeline => {
            Arc::new(StatisticalPipelineAdapter::new(name, engine).with_labels(labels))
        }
        BackendKind::DependencyParserPipeline => {
            Arc::new(DependencyParserPipelineAdapter::new(name, engine).with_labels(labels))
        }
        BackendKind::TransformerPipeline => {
            Arc::new(TransformerPipelineAdapter::new(name, engine).with_labels(labels))
        }
    };
    Ok(adapter)
}

/// Create the transport an engine config describes
pub fn build_transport(engine: &EngineConfig, timeout: Duration) -> Result<Box<dyn Transport>> {
    Ok(match engine {
        EngineConfig::Process { command, args } => {
            Box::new(ProcessTransport::new(command.clone(), args.clone(), timeout))
        }
        EngineConfig::Http {
            url,
            token_env,
            parameters,
        } => Box::new(HttpTransport::from_env(
            url.clone(),
            token_env.as_deref(),
            parameters.clone(),
            timeout,
        )?),
    })
}
