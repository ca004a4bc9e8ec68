//! Shared entity label set.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Normalized entity category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityLabel {
    Person,
    Location,
    Organization,
    /// Fallback for every native label without a mapping
    Misc,
}

impl EntityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityLabel::Person => "PERSON",
            EntityLabel::Location => "LOCATION",
            EntityLabel::Organization => "ORGANIZATION",
            EntityLabel::Misc => "MISC",
        }
    }

    /// Map a native engine label onto the shared set.
    ///
    /// Strips a BIO/BIOES prefix first, so `B-PER`, `PER` and `person`
    /// all land on `Person`. Unknown labels become `Misc`.
    pub fn from_native(label: &str) -> Self {
        Self::parse_known(label).unwrap_or(EntityLabel::Misc)
    }

    /// Like `from_native` but returns `None` for unmapped labels
    pub fn parse_known(label: &str) -> Option<Self> {
        match strip_bio_prefix(label.trim()).to_uppercase().as_str() {
            "PER" | "PERS" | "PERSON" => Some(EntityLabel::Person),
            "LOC" | "LOCATION" | "GPE" => Some(EntityLabel::Location),
            "ORG" | "ORGANIZATION" | "ORGANISATION" => Some(EntityLabel::Organization),
            "MISC" | "MISCELLANEOUS" => Some(EntityLabel::Misc),
            _ => None,
        }
    }

    /// Badge colour used when rendering spans
    pub fn display_color(&self) -> &'static str {
        match self {
            EntityLabel::Person => "#FF6961",
            EntityLabel::Location => "#77DD77",
            EntityLabel::Organization | EntityLabel::Misc => "#779ECB",
        }
    }
}

impl fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remove a `B-`/`I-`/`E-`/`S-`/`L-`/`U-` tag prefix, if any
pub fn strip_bio_prefix(label: &str) -> &str {
    let bytes = label.as_bytes();
    if bytes.len() > 2 && bytes[1] == b'-' && matches!(bytes[0], b'B' | b'I' | b'E' | b'S' | b'L' | b'U') {
        &label[2..]
    } else {
        label
    }
}
