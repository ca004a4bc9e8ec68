//! Native label → shared label mapping.

use std::collections::HashMap;

use anyhow::Result;

use crate::domain::{strip_bio_prefix, EntityLabel};

/// Maps engine label vocabularies onto `EntityLabel`.
///
/// Configured aliases win over the built-in table, so a deployment can
/// route e.g. `FAC` to LOCATION without code changes.
#[derive(Debug, Clone, Default)]
pub struct LabelMapper {
    aliases: HashMap<String, EntityLabel>,
}

impl LabelMapper {
    /// Mapper with only the built-in table
    pub fn new() -> Self {
        Self::default()
    }

    /// Mapper with extra `native → shared` aliases
    ///
    /// Alias targets must name a shared label (`PERSON`, `LOC`, ...).
    pub fn with_aliases(aliases: &HashMap<String, String>) -> Result<Self> {
        let mut mapped = HashMap::with_capacity(aliases.len());
        for (native, target) in aliases {
            let label = EntityLabel::parse_known(target).ok_or_else(|| {
                anyhow::anyhow!(
                    "Label alias '{}' points at unknown label '{}' (expected PERSON, LOCATION, ORGANIZATION or MISC)",
                    native,
                    target
                )
            })?;
            mapped.insert(alias_key(native), label);
        }
        Ok(Self { aliases: mapped })
    }

    /// Map a native label; unknown labels become `Misc`
    pub fn map(&self, native: &str) -> EntityLabel {
        self.aliases
            .get(&alias_key(native))
            .copied()
            .unwrap_or_else(|| EntityLabel::from_native(native))
    }
}

fn alias_key(native: &str) -> String {
    strip_bio_prefix(native.trim()).to_uppercase()
}
