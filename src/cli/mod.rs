//! Command-line interface for nerlens.
//!
//! Provides commands for analyzing text with one backend, comparing all
//! backends, listing backends and showing the resolved configuration.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::{self, EngineConfig, ResolvedConfig};
use crate::core::{AnalysisError, NormalizationService};
use crate::domain::BackendKind;

pub mod render;

/// Sample text offered by `--example`
pub const EXAMPLE_TEXT: &str = "Emmanuel Macron s'est rendu à Bruxelles pour une réunion de l'Union Européenne.\n\
Le président de TotalEnergies a rencontré les dirigeants de l'ONU à Genève.";

const EMPTY_INPUT_WARNING: &str = "Please enter some text to extract entities from.";

/// nerlens - French named-entity recognition across interchangeable backends
#[derive(Parser, Debug)]
#[command(name = "nerlens")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Where the text to analyze comes from
#[derive(clap::Args, Debug, Default)]
pub struct InputArgs {
    /// Text to analyze (reads --input or stdin if not provided)
    pub text: Option<String>,

    /// Input file
    #[arg(short, long, conflicts_with = "text")]
    pub input: Option<PathBuf>,

    /// Analyze the built-in French sample text
    #[arg(long, conflicts_with_all = ["text", "input"])]
    pub example: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract entities with one backend
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        /// Backend (transformer, spacy, stanza, ...); defaults to config
        #[arg(short, long, env = "NERLENS_BACKEND")]
        backend: Option<String>,

        /// Print JSON instead of badges
        #[arg(long)]
        json: bool,
    },

    /// Run every enabled backend on the same text
    Compare {
        #[command(flatten)]
        input: InputArgs,

        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// List configured backends
    Backends {
        /// Load every backend and run its health check
        #[arg(long)]
        check: bool,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Analyze {
                input,
                backend,
                json,
            } => analyze(input, backend, json).await,
            Commands::Compare { input, json } => compare(input, json).await,
            Commands::Backends { check } => list_backends(check).await,
            Commands::Config => show_config(),
        }
    }
}

/// Resolve the input text from the positional argument, a file or stdin
fn read_input(args: InputArgs) -> Result<String> {
    if args.example {
        return Ok(EXAMPLE_TEXT.to_string());
    }
    if let Some(text) = args.text {
        return Ok(text);
    }
    if let Some(path) = args.input {
        return std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read input file: {}", path.display()));
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        anyhow::bail!("No input provided. Pass text, use --input <file> or pipe to stdin");
    }

    let mut buffer = String::new();
    stdin
        .lock()
        .read_to_string(&mut buffer)
        .context("Failed to read from stdin")?;
    Ok(buffer)
}

fn use_color() -> bool {
    io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Blank input is a warning, not a failure
fn handle_analysis_error(error: AnalysisError) -> Result<()> {
    if error.is_empty_input() {
        eprintln!("⚠ {}", EMPTY_INPUT_WARNING);
        return Ok(());
    }
    Err(error.into())
}

async fn analyze(input: InputArgs, backend: Option<String>, json: bool) -> Result<()> {
    let cfg = config::config()?;
    let text = read_input(input)?;
    let service = NormalizationService::from_config(cfg)?;

    let backend = backend.unwrap_or_else(|| cfg.default_backend.as_str().to_string());
    let spans = match service.analyze(&text, &backend).await {
        Ok(spans) => spans,
        Err(e) => return handle_analysis_error(e),
    };

    if json {
        // analyze succeeded, so the identifier parses
        let kind: BackendKind = backend.parse()?;
        let report = render::AnalysisReport::new(kind, &spans);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", render::entity_list(&spans, use_color()));
    }

    Ok(())
}

async fn compare(input: InputArgs, json: bool) -> Result<()> {
    let cfg = config::config()?;
    let text = read_input(input)?;
    let service = NormalizationService::from_config(cfg)?;

    let comparison = match service.compare(&text).await {
        Ok(comparison) => comparison,
        Err(e) => return handle_analysis_error(e),
    };

    if json {
        let report = render::ComparisonReport::new(&comparison);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", render::comparison(&comparison, use_color()));
    }

    Ok(())
}

fn describe_engine(engine: &EngineConfig) -> String {
    match engine {
        EngineConfig::Process { command, args } if args.is_empty() => {
            format!("process: {}", command)
        }
        EngineConfig::Process { command, args } => {
            format!("process: {} {}", command, args.join(" "))
        }
        EngineConfig::Http { url, .. } => format!("http: {}", url),
    }
}

async fn list_backends(check: bool) -> Result<()> {
    let cfg = config::config()?;

    println!("Backends:");
    for kind in BackendKind::ALL {
        let Some(settings) = cfg.backends.get(&kind) else {
            continue;
        };
        let marker = if kind == cfg.default_backend { "*" } else { " " };
        let state = if settings.enabled { "" } else { " (disabled)" };
        println!(
            " {} {:<28} {:<24} {}{}",
            marker,
            kind.as_str(),
            kind.display_name(),
            describe_engine(&settings.engine),
            state
        );
    }

    if !check {
        return Ok(());
    }

    println!();
    println!("Health checks:");
    let service = NormalizationService::from_config(cfg)?;
    let mut failures = 0;
    for (kind, result) in service.registry().warm_up().await {
        match result {
            Ok(()) => println!("  ✓ {}", kind.display_name()),
            Err(e) => {
                failures += 1;
                println!("  ✗ {}: {}", kind.display_name(), e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} backend(s) failed their health check", failures);
    }
    Ok(())
}

fn show_config() -> Result<()> {
    let cfg: &ResolvedConfig = config::config()?;

    println!("nerlens configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!("Default backend: {}", cfg.default_backend);
    println!("Timeout:         {}s", cfg.timeout_seconds);
    println!("Dedupe:          {}", cfg.dedupe);
    println!();
    println!("Label aliases:");
    if cfg.label_aliases.is_empty() {
        println!("  (using defaults)");
    } else {
        let mut aliases: Vec<_> = cfg.label_aliases.iter().collect();
        aliases.sort();
        for (native, label) in aliases {
            println!("  {}: {}", native, label);
        }
    }
    println!();
    println!("Backends:");
    for (kind, settings) in &cfg.backends {
        println!("  {} ({}):", kind.config_key(), kind.display_name());
        println!("    enabled: {}", settings.enabled);
        println!("    model:   {}", settings.model);
        println!("    engine:  {}", describe_engine(&settings.engine));
    }

    Ok(())
}
