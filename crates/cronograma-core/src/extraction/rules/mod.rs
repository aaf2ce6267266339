//! Rule-based field extractors for service orders.
//!
//! Every scalar field is described by a [`FieldRule`]: a name, an ordered
//! list of patterns, a normalizer that turns the captured text into a value
//! (or rejects it), and a fallback taken from [`ExtractionConfig`].

pub mod amounts;
pub mod dates;
pub mod deliverables;
pub mod order;
pub mod patterns;

pub use amounts::{parse_soles_amount, format_soles_amount, total_amount_rule};
pub use dates::{parse_notification_date, notification_date_rule};
pub use deliverables::{deliverable_count_rule, DeclarationExtractor};
pub use order::order_number_rule;
pub use patterns::normalize_whitespace;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::{debug, trace};

use crate::models::config::ExtractionConfig;
use crate::models::schedule::Provenance;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// Extraction context with confidence scores.
#[derive(Debug, Clone)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Position in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}

/// Confidence of a match from the rule's first pattern.
const PRIMARY_CONFIDENCE: f32 = 0.95;
/// Confidence of a match from a later, looser pattern.
const SECONDARY_CONFIDENCE: f32 = 0.6;

/// A named extraction rule: patterns tried in order, a normalizer, and a fallback.
pub struct FieldRule<T> {
    /// Field name, used in logs and warnings.
    pub name: &'static str,
    /// Patterns tried in order; capture group 1 holds the raw value.
    pub patterns: Vec<&'static Regex>,
    /// Converts captured text into a value, or rejects it.
    pub normalize: fn(&str) -> Option<T>,
    /// Value used when no pattern yields an accepted match.
    pub fallback: fn(&ExtractionConfig) -> T,
}

impl<T> FieldRule<T> {
    /// Value from the first accepted match, or the fallback.
    pub fn resolve(&self, text: &str, config: &ExtractionConfig) -> (T, Provenance) {
        self.resolve_where(text, config, |_| true)
    }

    /// Like [`FieldRule::resolve`], but values failing `accept` are rejected
    /// like a failed normalization and the next candidate is tried.
    pub fn resolve_where(
        &self,
        text: &str,
        config: &ExtractionConfig,
        accept: impl Fn(&T) -> bool,
    ) -> (T, Provenance) {
        let found = self.matches(text).find(|m| {
            let ok = accept(&m.value);
            if !ok {
                debug!("{}: rejected {:?}", self.name, m.source);
            }
            ok
        });
        match found {
            Some(m) => {
                debug!("{}: matched {:?}", self.name, m.source);
                (m.value, Provenance::Extracted)
            }
            None => {
                debug!("{}: no match, using fallback", self.name);
                ((self.fallback)(config), Provenance::Defaulted)
            }
        }
    }

    fn matches<'t>(&'t self, text: &'t str) -> impl Iterator<Item = ExtractionMatch<T>> + 't {
        self.patterns
            .iter()
            .enumerate()
            .flat_map(move |(rank, pattern)| {
                pattern.captures_iter(text).filter_map(move |caps| {
                    let full = caps.get(0)?;
                    let raw = caps.get(1)?;
                    match (self.normalize)(raw.as_str()) {
                        Some(value) => {
                            let confidence = if rank == 0 {
                                PRIMARY_CONFIDENCE
                            } else {
                                SECONDARY_CONFIDENCE
                            };
                            Some(
                                ExtractionMatch::new(value, confidence, full.as_str())
                                    .with_position(full.start(), full.end()),
                            )
                        }
                        None => {
                            trace!("{}: rejected {:?}", self.name, raw.as_str());
                            None
                        }
                    }
                })
            })
    }
}

impl<T> FieldExtractor for FieldRule<T> {
    type Output = ExtractionMatch<T>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let found = self.matches(text).next();
        if let Some(m) = &found {
            debug!("{}: matched {:?}", self.name, m.source);
        }
        found
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.matches(text).collect()
    }
}

/// The ordered table of scalar field rules.
pub struct FieldRules {
    pub order_number: FieldRule<String>,
    pub notification_date: FieldRule<NaiveDate>,
    pub total_amount: FieldRule<Decimal>,
    pub deliverable_count: FieldRule<u32>,
}

impl FieldRules {
    /// Rules for Peruvian service orders.
    pub fn standard() -> Self {
        Self {
            order_number: order_number_rule(),
            notification_date: notification_date_rule(),
            total_amount: total_amount_rule(),
            deliverable_count: deliverable_count_rule(),
        }
    }

    /// Rule names in evaluation order.
    pub fn names(&self) -> [&'static str; 4] {
        [
            self.order_number.name,
            self.notification_date.name,
            self.total_amount.name,
            self.deliverable_count.name,
        ]
    }
}

impl Default for FieldRules {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_names_in_order() {
        assert_eq!(
            FieldRules::standard().names(),
            ["order_number", "notification_date", "total_amount", "deliverable_count"]
        );
    }

    #[test]
    fn test_resolve_falls_back() {
        let config = ExtractionConfig::default();
        let rules = FieldRules::standard();
        let (value, provenance) = rules.order_number.resolve("sin datos", &config);
        assert_eq!(value, "No identificado");
        assert_eq!(provenance, Provenance::Defaulted);
    }

    #[test]
    fn test_resolve_where_tries_next_candidate() {
        let config = ExtractionConfig::default();
        let rules = FieldRules::standard();
        let text = "N° DE ENTREGABLES: 500 ... N° DE ENTREGABLES: 4";
        let (value, provenance) =
            rules.deliverable_count.resolve_where(text, &config, |n| *n <= 100);
        assert_eq!(value, 4);
        assert_eq!(provenance, Provenance::Extracted);

        let (value, provenance) =
            rules.deliverable_count.resolve_where("N° DE ENTREGABLES: 500", &config, |n| *n <= 100);
        assert_eq!(value, 0);
        assert_eq!(provenance, Provenance::Defaulted);
    }

    #[test]
    fn test_secondary_pattern_has_lower_confidence() {
        let rules = FieldRules::standard();
        let labeled = rules.total_amount.extract("MONTO TOTAL: 1,000.00").unwrap();
        let loose = rules.total_amount.extract("pago de S/ 1,000.00").unwrap();
        assert!(labeled.confidence > loose.confidence);
    }
}
