//! Configuration for nerlens backends.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (NERLENS_DEFAULT_BACKEND, NERLENS_TIMEOUT_SECONDS)
//! 2. Config file (NERLENS_CONFIG, else .nerlens/config.yaml, else
//!    <user config dir>/nerlens/config.yaml)
//! 3. Defaults (spaCy and Stanza workers, hosted CamemBERT endpoint)
//!
//! Config file discovery:
//! - Searches current directory and parents for .nerlens/config.yaml
//! - Backends missing from the file keep their defaults

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::BackendKind;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub default_backend: Option<String>,
    #[serde(default)]
    pub dedupe: Option<bool>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub labels: LabelsConfig,
    #[serde(default)]
    pub backends: BackendsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelsConfig {
    /// Native label → shared label (PERSON, LOCATION, ORGANIZATION, MISC)
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendsConfig {
    pub statistical: Option<BackendFileConfig>,
    pub dependency_parser: Option<BackendFileConfig>,
    pub transformer: Option<BackendFileConfig>,
}

impl BackendsConfig {
    fn get(&self, kind: BackendKind) -> Option<&BackendFileConfig> {
        match kind {
            BackendKind::StatisticalPipeline => self.statistical.as_ref(),
            BackendKind::DependencyParserPipeline => self.dependency_parser.as_ref(),
            BackendKind::TransformerPipeline => self.transformer.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendFileConfig {
    pub enabled: Option<bool>,
    pub model: Option<String>,
    pub engine: Option<EngineConfig>,
}

/// How to reach an engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineConfig {
    /// Persistent worker process speaking JSON lines
    Process {
        command: String,
        #[serde(default)]
        args: Vec<String>,
    },

    /// Hosted inference endpoint
    Http {
        url: String,
        /// Environment variable holding the bearer token
        #[serde(default)]
        token_env: Option<String>,
        /// Sent as `parameters` with every request
        #[serde(default)]
        parameters: serde_json::Value,
    },
}

/// Resolved settings for one backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendSettings {
    pub enabled: bool,
    /// Model name, used in logs and reports
    pub model: String,
    pub engine: EngineConfig,
}

impl BackendSettings {
    /// Built-in settings for a backend
    pub fn default_for(kind: BackendKind) -> Self {
        match kind {
            BackendKind::StatisticalPipeline => Self {
                enabled: true,
                model: "fr_core_news_md".to_string(),
                engine: EngineConfig::Process {
                    command: "nerlens-spacy".to_string(),
                    args: vec!["fr_core_news_md".to_string()],
                },
            },
            BackendKind::DependencyParserPipeline => Self {
                enabled: true,
                model: "stanza-fr".to_string(),
                engine: EngineConfig::Process {
                    command: "nerlens-stanza".to_string(),
                    args: vec!["fr".to_string()],
                },
            },
            BackendKind::TransformerPipeline => Self {
                enabled: true,
                model: "Jean-Baptiste/camembert-ner".to_string(),
                engine: EngineConfig::Http {
                    url: "https://api-inference.huggingface.co/models/Jean-Baptiste/camembert-ner"
                        .to_string(),
                    token_env: Some("HF_API_TOKEN".to_string()),
                    parameters: serde_json::json!({ "aggregation_strategy": "simple" }),
                },
            },
        }
    }

    fn merge(kind: BackendKind, file: Option<&BackendFileConfig>) -> Self {
        let mut settings = Self::default_for(kind);
        if let Some(file) = file {
            if let Some(enabled) = file.enabled {
                settings.enabled = enabled;
            }
            if let Some(ref model) = file.model {
                settings.model = model.clone();
            }
            if let Some(ref engine) = file.engine {
                settings.engine = engine.clone();
            }
        }
        settings
    }
}

/// Resolved configuration
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// Backend used when none is named
    pub default_backend: BackendKind,
    /// Drop exact duplicate spans from results
    pub dedupe: bool,
    /// Per-call engine timeout
    pub timeout_seconds: u64,
    /// Extra native → shared label mappings
    pub label_aliases: HashMap<String, String>,
    /// Settings per backend (disabled backends included)
    pub backends: BTreeMap<BackendKind, BackendSettings>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            default_backend: BackendKind::TransformerPipeline,
            dedupe: false,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            label_aliases: HashMap::new(),
            backends: BackendKind::ALL
                .into_iter()
                .map(|kind| (kind, BackendSettings::default_for(kind)))
                .collect(),
            config_file: None,
        }
    }
}

impl ResolvedConfig {
    /// Enabled backends, in menu order
    pub fn enabled_backends(&self) -> Vec<BackendKind> {
        BackendKind::ALL
            .into_iter()
            .filter(|kind| self.backends.get(kind).map(|s| s.enabled).unwrap_or(false))
            .collect()
    }
}

/// Find config file: explicit env path, then `start` and its parents,
/// then `user_config_dir`. `var` looks an environment variable up.
fn find_config_file<F>(
    start: Option<&Path>,
    user_config_dir: Option<&Path>,
    var: F,
) -> Result<Option<PathBuf>>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(explicit) = var("NERLENS_CONFIG") {
        let path = PathBuf::from(explicit);
        if !path.exists() {
            anyhow::bail!("NERLENS_CONFIG points at a missing file: {}", path.display());
        }
        return Ok(Some(path));
    }

    if let Some(start) = start {
        for dir in start.ancestors() {
            let config_path = dir.join(".nerlens").join("config.yaml");
            if config_path.exists() {
                return Ok(Some(config_path));
            }
        }
    }

    Ok(user_config_dir
        .map(|dir| dir.join("nerlens").join("config.yaml"))
        .filter(|path| path.exists()))
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Merge a parsed config file over the defaults
fn resolve(file: Option<(PathBuf, ConfigFile)>) -> Result<ResolvedConfig> {
    let mut config = ResolvedConfig::default();

    let (path, file) = match file {
        Some(found) => found,
        None => return Ok(config),
    };

    if let Some(ref backend) = file.default_backend {
        config.default_backend = backend
            .parse()
            .with_context(|| format!("Invalid default_backend in {}", path.display()))?;
    }
    if let Some(dedupe) = file.dedupe {
        config.dedupe = dedupe;
    }
    if let Some(timeout) = file.timeout_seconds {
        config.timeout_seconds = timeout;
    }
    config.label_aliases = file.labels.aliases.clone();
    config.backends = BackendKind::ALL
        .into_iter()
        .map(|kind| (kind, BackendSettings::merge(kind, file.backends.get(kind))))
        .collect();
    config.config_file = Some(path);

    Ok(config)
}

/// Apply environment overrides; `var` looks a variable up
fn apply_env_overrides<F>(mut config: ResolvedConfig, var: F) -> Result<ResolvedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(backend) = var("NERLENS_DEFAULT_BACKEND") {
        config.default_backend = backend
            .parse()
            .context("Invalid NERLENS_DEFAULT_BACKEND")?;
    }

    if let Some(timeout) = var("NERLENS_TIMEOUT_SECONDS") {
        config.timeout_seconds = timeout
            .trim()
            .parse()
            .with_context(|| format!("Invalid NERLENS_TIMEOUT_SECONDS: '{}'", timeout))?;
    }

    Ok(config)
}

fn validate(config: &ResolvedConfig) -> Result<()> {
    if config.timeout_seconds == 0 {
        anyhow::bail!("timeout_seconds must be greater than zero");
    }
    if config.enabled_backends().is_empty() {
        anyhow::bail!("At least one backend must be enabled");
    }
    Ok(())
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().ok();
    let user_dir = dirs::config_dir();
    let found = find_config_file(cwd.as_deref(), user_dir.as_deref(), |name| {
        std::env::var(name).ok()
    })?;

    let file = match found {
        Some(path) => {
            let parsed = load_config_file(&path)?;
            Some((path, parsed))
        }
        None => None,
    };

    let config = apply_env_overrides(resolve(file)?, |name| std::env::var(name).ok())?;
    validate(&config)?;
    Ok(config)
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(content: &str) -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".nerlens");
        std::fs::create_dir_all(&dir).unwrap();

        let path = dir.join("config.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}", content).unwrap();
        (temp, path)
    }

    #[test]
    fn test_defaults() {
        let config = resolve(None).unwrap();
        assert_eq!(config.default_backend, BackendKind::TransformerPipeline);
        assert_eq!(config.timeout_seconds, 120);
        assert!(!config.dedupe);
        assert_eq!(config.enabled_backends().len(), 3);
        assert!(config.config_file.is_none());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_config_file_parsing() {
        let (_temp, path) = write_config(
            r#"
version: "1.0"
default_backend: spacy
dedupe: true
timeout_seconds: 30
labels:
  aliases:
    FAC: LOCATION
backends:
  dependency_parser:
    enabled: false
  transformer:
    model: local-camembert
    engine:
      kind: process
      command: nerlens-camembert
      args: ["--aggregation", "simple"]
"#,
        );

        let file = load_config_file(&path).unwrap();
        assert_eq!(file.version, "1.0");

        let config = resolve(Some((path.clone(), file))).unwrap();
        assert_eq!(config.default_backend, BackendKind::StatisticalPipeline);
        assert!(config.dedupe);
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.label_aliases.get("FAC"), Some(&"LOCATION".to_string()));
        assert_eq!(
            config.enabled_backends(),
            vec![BackendKind::TransformerPipeline, BackendKind::StatisticalPipeline]
        );

        let transformer = &config.backends[&BackendKind::TransformerPipeline];
        assert_eq!(transformer.model, "local-camembert");
        assert_eq!(
            transformer.engine,
            EngineConfig::Process {
                command: "nerlens-camembert".to_string(),
                args: vec!["--aggregation".to_string(), "simple".to_string()],
            }
        );

        // Untouched backend keeps its defaults
        assert_eq!(
            config.backends[&BackendKind::StatisticalPipeline],
            BackendSettings::default_for(BackendKind::StatisticalPipeline)
        );
        assert_eq!(config.config_file, Some(path));
    }

    #[test]
    fn test_http_engine_parameters() {
        let (_temp, path) = write_config(
            r#"
version: "1.0"
backends:
  transformer:
    engine:
      kind: http
      url: http://localhost:8080/ner
      parameters:
        aggregation_strategy: simple
"#,
        );
        let config = resolve(Some((path.clone(), load_config_file(&path).unwrap()))).unwrap();

        match &config.backends[&BackendKind::TransformerPipeline].engine {
            EngineConfig::Http {
                url,
                token_env,
                parameters,
            } => {
                assert_eq!(url, "http://localhost:8080/ner");
                assert!(token_env.is_none());
                assert_eq!(parameters["aggregation_strategy"], "simple");
            }
            other => panic!("Expected http engine, got {:?}", other),
        }
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_discovery_walks_up_from_nested_dir() {
        let (temp, path) = write_config("version: \"1.0\"");
        let nested = temp.path().join("corpus").join("2024");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_config_file(Some(nested.as_path()), None, no_env).unwrap();
        assert_eq!(found, Some(path));
    }

    #[test]
    fn test_discovery_falls_back_to_user_config_dir() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        let user_config = user.path().join("nerlens").join("config.yaml");
        std::fs::create_dir_all(user_config.parent().unwrap()).unwrap();
        std::fs::write(&user_config, "version: \"1.0\"\n").unwrap();

        let found = find_config_file(Some(project.path()), Some(user.path()), no_env).unwrap();
        assert_eq!(found, Some(user_config));

        let empty_user = TempDir::new().unwrap();
        let found = find_config_file(Some(project.path()), Some(empty_user.path()), no_env).unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn test_explicit_path_wins() {
        let (temp, project_config) = write_config("version: \"1.0\"");
        let explicit = temp.path().join("elsewhere.yaml");
        std::fs::write(&explicit, "version: \"1.0\"\n").unwrap();
        let explicit_str = explicit.display().to_string();

        let found = find_config_file(Some(temp.path()), None, |name| {
            (name == "NERLENS_CONFIG").then(|| explicit_str.clone())
        })
        .unwrap();
        assert_eq!(found, Some(explicit));
        assert_ne!(found, Some(project_config));
    }

    #[test]
    fn test_explicit_path_missing_is_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing.yaml").display().to_string();

        let err = find_config_file(Some(temp.path()), None, |name| {
            (name == "NERLENS_CONFIG").then(|| missing.clone())
        })
        .unwrap_err();
        assert!(err.to_string().contains("missing.yaml"));
    }

    #[test]
    fn test_invalid_default_backend() {
        let (_temp, path) = write_config("version: \"1.0\"\ndefault_backend: bert");
        let file = load_config_file(&path).unwrap();
        assert!(resolve(Some((path, file))).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("NERLENS_DEFAULT_BACKEND", "stanza"),
            ("NERLENS_TIMEOUT_SECONDS", "15"),
        ]
        .into_iter()
        .collect();

        let config = apply_env_overrides(ResolvedConfig::default(), |name| {
            env.get(name).map(|v| v.to_string())
        })
        .unwrap();
        assert_eq!(config.default_backend, BackendKind::DependencyParserPipeline);
        assert_eq!(config.timeout_seconds, 15);

        let bad = apply_env_overrides(ResolvedConfig::default(), |name| {
            (name == "NERLENS_TIMEOUT_SECONDS").then(|| "soon".to_string())
        });
        assert!(bad.is_err());
    }

    #[test]
    fn test_validation() {
        let mut config = ResolvedConfig::default();
        config.timeout_seconds = 0;
        assert!(validate(&config).is_err());

        let mut config = ResolvedConfig::default();
        for settings in config.backends.values_mut() {
            settings.enabled = false;
        }
        assert!(validate(&config).is_err());
    }
}
