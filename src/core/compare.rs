//! Side-by-side comparison of backends on the same text.

use serde::Serialize;

use crate::domain::{BackendKind, EntityLabel, EntitySpan};

/// What one backend produced during a comparison
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Ok { spans: Vec<EntitySpan> },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct BackendResult {
    pub backend: BackendKind,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl BackendResult {
    pub fn spans(&self) -> Option<&[EntitySpan]> {
        match &self.outcome {
            Outcome::Ok { spans } => Some(spans),
            Outcome::Failed { .. } => None,
        }
    }
}

/// One entity and the backends that found it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgreementRow {
    /// Surface form as first seen
    pub text: String,
    pub label: EntityLabel,
    pub found_by: Vec<BackendKind>,
}

/// Result of running every registered backend on one text
#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub results: Vec<BackendResult>,
    /// Keyed by case-folded text and label, in first-appearance order
    pub agreement: Vec<AgreementRow>,
}

impl Comparison {
    pub fn from_results(results: Vec<BackendResult>) -> Self {
        let mut agreement: Vec<AgreementRow> = Vec::new();

        for result in &results {
            let spans = match result.spans() {
                Some(spans) => spans,
                None => continue,
            };

            for span in spans {
                let key = span.text().to_lowercase();
                let row = agreement
                    .iter_mut()
                    .find(|row| row.label == span.label() && row.text.to_lowercase() == key);

                match row {
                    Some(row) => {
                        if !row.found_by.contains(&result.backend) {
                            row.found_by.push(result.backend);
                        }
                    }
                    None => agreement.push(AgreementRow {
                        text: span.text().to_string(),
                        label: span.label(),
                        found_by: vec![result.backend],
                    }),
                }
            }
        }

        Self { results, agreement }
    }

    /// Spans a backend produced, if it ran and succeeded
    pub fn spans_for(&self, backend: BackendKind) -> Option<&[EntitySpan]> {
        self.results
            .iter()
            .find(|r| r.backend == backend)
            .and_then(|r| r.spans())
    }

    /// Backends that ran without error
    pub fn succeeded(&self) -> Vec<BackendKind> {
        self.results
            .iter()
            .filter(|r| r.spans().is_some())
            .map(|r| r.backend)
            .collect()
    }

    /// Entities every successful backend agrees on
    pub fn unanimous(&self) -> Vec<&AgreementRow> {
        let succeeded = self.succeeded();
        if succeeded.is_empty() {
            return Vec::new();
        }
        self.agreement
            .iter()
            .filter(|row| succeeded.iter().all(|b| row.found_by.contains(b)))
            .collect()
    }

    /// Entities only `backend` found
    pub fn exclusive_to(&self, backend: BackendKind) -> Vec<&AgreementRow> {
        self.agreement
            .iter()
            .filter(|row| row.found_by == [backend])
            .collect()
    }
}
