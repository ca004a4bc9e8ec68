//! Terminal and JSON rendering of analysis results.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::Comparison;
use crate::domain::{BackendKind, EntityLabel, EntitySpan};

/// JSON envelope for `analyze --json`
#[derive(Debug, Serialize)]
pub struct AnalysisReport<'a> {
    pub backend: BackendKind,
    pub analyzed_at: DateTime<Utc>,
    pub count: usize,
    pub entities: &'a [EntitySpan],
}

impl<'a> AnalysisReport<'a> {
    pub fn new(backend: BackendKind, entities: &'a [EntitySpan]) -> Self {
        Self {
            backend,
            analyzed_at: Utc::now(),
            count: entities.len(),
            entities,
        }
    }
}

/// JSON envelope for `compare --json`
#[derive(Debug, Serialize)]
pub struct ComparisonReport<'a> {
    pub analyzed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub comparison: &'a Comparison,
}

impl<'a> ComparisonReport<'a> {
    pub fn new(comparison: &'a Comparison) -> Self {
        Self {
            analyzed_at: Utc::now(),
            comparison,
        }
    }
}

/// ANSI truecolor escape for a "#RRGGBB" colour
fn ansi_color(hex: &str) -> Option<String> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(format!("\x1b[38;2;{};{};{}m", r, g, b))
}

fn label_badge(label: EntityLabel, color: bool) -> String {
    let tag = format!("[{}]", label);
    match ansi_color(label.display_color()) {
        Some(code) if color => format!("{}{:<14}\x1b[0m", code, tag),
        _ => format!("{:<14}", tag),
    }
}

/// One badge line: label, text and score when present
pub fn badge_line(span: &EntitySpan, color: bool) -> String {
    let mut line = format!("  {} {}", label_badge(span.label(), color), span.text());
    if let Some(score) = span.score() {
        let _ = write!(line, " ({:.2})", score);
    }
    line
}

/// Summary plus one badge line per span
pub fn entity_list(spans: &[EntitySpan], color: bool) -> String {
    if spans.is_empty() {
        return "No entities detected.".to_string();
    }

    let mut out = format!("{} entities detected:", spans.len());
    for span in spans {
        out.push('\n');
        out.push_str(&badge_line(span, color));
    }
    out
}

/// Per-backend sections followed by the agreement table
pub fn comparison(comparison: &Comparison, color: bool) -> String {
    let mut out = String::new();

    for result in &comparison.results {
        let _ = writeln!(out, "── {} ──", result.backend.display_name());
        match result.spans() {
            Some(spans) => {
                let _ = writeln!(out, "{}", entity_list(spans, color));
            }
            None => {
                if let crate::core::Outcome::Failed { error } = &result.outcome {
                    let _ = writeln!(out, "  failed: {}", error);
                }
            }
        }
        out.push('\n');
    }

    let _ = writeln!(out, "Agreement:");
    if comparison.agreement.is_empty() {
        let _ = writeln!(out, "  (no entities)");
    }
    let succeeded = comparison.succeeded().len();
    for row in &comparison.agreement {
        let found_by: Vec<&str> = row.found_by.iter().map(|b| b.display_name()).collect();
        let _ = writeln!(
            out,
            "  {} {}  {}/{}  {}",
            label_badge(row.label, color),
            row.text,
            row.found_by.len(),
            succeeded,
            found_by.join(", ")
        );
    }

    out.trim_end().to_string()
}
