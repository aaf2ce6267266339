//! Deliverable count and deliverable declaration extraction.

use tracing::trace;

use super::patterns::{DELIVERABLE_COUNT, DELIVERABLE_DECLARATION};
use super::{ExtractionMatch, FieldExtractor, FieldRule};
use crate::models::schedule::{Deliverable, Ordinal};

/// Rule for the declared deliverable count ("N° DE ENTREGABLES: 3").
pub fn deliverable_count_rule() -> FieldRule<u32> {
    FieldRule {
        name: "deliverable_count",
        patterns: vec![&*DELIVERABLE_COUNT],
        normalize: |raw| raw.trim().parse::<u32>().ok(),
        fallback: |_| 0,
    }
}

/// Extractor for "<ORDINAL> ENTREGABLE HASTA <n> DÍAS" declarations.
///
/// Returns every match in text order, duplicates included.
pub struct DeclarationExtractor;

impl DeclarationExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DeclarationExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DeclarationExtractor {
    type Output = ExtractionMatch<Deliverable>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();

        for caps in DELIVERABLE_DECLARATION.captures_iter(text) {
            let (Some(full), Some(word), Some(days)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };

            let Some(ordinal) = Ordinal::from_word(word.as_str()) else {
                trace!("Unknown ordinal {:?}", word.as_str());
                continue;
            };

            // Zero-day deadlines are not real declarations
            let deadline_days = match days.as_str().parse::<u32>() {
                Ok(d) if d > 0 => d,
                _ => {
                    trace!("Rejected deadline {:?}", days.as_str());
                    continue;
                }
            };

            results.push(
                ExtractionMatch::new(Deliverable::declared(ordinal, deadline_days), 0.95, full.as_str())
                    .with_position(full.start(), full.end()),
            );
        }

        results
    }
}
