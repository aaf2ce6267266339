//! Service order and deliverable schedule data models.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Label used for the trailing total row.
pub const TOTAL_LABEL: &str = "Total";

/// Where an extracted value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Matched in the document text.
    Extracted,
    /// No usable match; the configured fallback was used.
    #[default]
    Defaulted,
    /// Supplied by the caller after extraction.
    Manual,
}

/// Provenance of each scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldSources {
    pub order_number: Provenance,
    pub notification_date: Provenance,
    pub total_amount: Provenance,
    pub deliverable_count: Provenance,
}

/// Scalar fields read from a service order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    /// Service order number ("No identificado" when absent).
    pub order_number: String,

    /// Date from which deliverable deadlines are counted.
    pub notification_date: NaiveDate,

    /// Total contract amount. Zero means unresolved.
    pub total_amount: Decimal,

    /// Deliverable count stated in the document. Zero means not stated.
    pub declared_deliverable_count: u32,

    /// Provenance of each field.
    pub sources: FieldSources,
}

/// A field that needs a value from the caller before a schedule can be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingField {
    TotalAmount,
    DeliverableCount,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TotalAmount => f.write_str("total_amount"),
            Self::DeliverableCount => f.write_str("deliverable_count"),
        }
    }
}

/// Spanish ordinal words that name declared deliverables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Ordinal {
    Primer,
    Segundo,
    Tercer,
    Cuarto,
    Quinto,
    Sexto,
    Septimo,
    Octavo,
    Noveno,
    Decimo,
}

impl Ordinal {
    /// All ordinals in sequence order.
    pub const ALL: [Ordinal; 10] = [
        Self::Primer,
        Self::Segundo,
        Self::Tercer,
        Self::Cuarto,
        Self::Quinto,
        Self::Sexto,
        Self::Septimo,
        Self::Octavo,
        Self::Noveno,
        Self::Decimo,
    ];

    /// Normalized uppercase label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primer => "PRIMER",
            Self::Segundo => "SEGUNDO",
            Self::Tercer => "TERCER",
            Self::Cuarto => "CUARTO",
            Self::Quinto => "QUINTO",
            Self::Sexto => "SEXTO",
            Self::Septimo => "SEPTIMO",
            Self::Octavo => "OCTAVO",
            Self::Noveno => "NOVENO",
            Self::Decimo => "DECIMO",
        }
    }

    /// Parse an ordinal word in any case, with or without the accent on É.
    pub fn from_word(word: &str) -> Option<Self> {
        let normalized = word.trim().to_uppercase().replace('É', "E");
        Self::ALL
            .into_iter()
            .find(|ordinal| ordinal.as_str() == normalized)
    }
}

impl fmt::Display for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of a deliverable in the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliverableName {
    /// Declared in the document by its ordinal.
    Declared(Ordinal),
    /// Generated because the document declared none.
    Placeholder(u32),
}

/// A deliverable with its deadline in days from notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Deliverable {
    pub name: DeliverableName,
    pub deadline_days: u32,
}

impl Deliverable {
    pub fn declared(ordinal: Ordinal, deadline_days: u32) -> Self {
        Self {
            name: DeliverableName::Declared(ordinal),
            deadline_days,
        }
    }

    pub fn placeholder(index: u32, deadline_days: u32) -> Self {
        Self {
            name: DeliverableName::Placeholder(index),
            deadline_days,
        }
    }

    /// Row label for the deliverable at 1-based `index`.
    pub fn label(&self, index: usize) -> String {
        match self.name {
            DeliverableName::Declared(ordinal) => format!("{}°_{}_ENTREGABLE", index, ordinal),
            DeliverableName::Placeholder(i) => format!("ENTREGABLE_{}", i),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.name, DeliverableName::Placeholder(_))
    }
}

/// Values supplied by the caller for fields the extractor could not resolve.
///
/// Overrides only apply to fields reported as missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualOverrides {
    pub total_amount: Option<Decimal>,
    pub deliverable_count: Option<u32>,
}

impl ManualOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the total amount.
    pub fn with_total_amount(mut self, amount: Decimal) -> Self {
        self.total_amount = Some(amount);
        self
    }

    /// Set the deliverable count.
    pub fn with_deliverable_count(mut self, count: u32) -> Self {
        self.deliverable_count = Some(count);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.total_amount.is_none() && self.deliverable_count.is_none()
    }
}

/// One row of the schedule table.
///
/// The total row leaves deadline and dates empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub order_number: String,
    pub label: String,
    pub deadline_days: Option<u32>,
    pub payment_percent: String,
    pub payment_amount: Decimal,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

impl ScheduleRow {
    /// The trailing total row.
    pub fn total(order_number: &str, total_amount: Decimal) -> Self {
        Self {
            order_number: order_number.to_string(),
            label: TOTAL_LABEL.to_string(),
            deadline_days: None,
            payment_percent: "100%".to_string(),
            payment_amount: total_amount,
            start_date: None,
            due_date: None,
        }
    }

    pub fn is_total(&self) -> bool {
        self.deadline_days.is_none() && self.label == TOTAL_LABEL
    }
}

/// Scalar summary shown next to the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub order_number: String,
    pub total_amount: Decimal,
    pub notification_date: NaiveDate,
    /// Final deliverable count the amount is divided by.
    pub deliverable_count: u32,
    pub payment_per_deliverable: Decimal,
}

/// A finished schedule: one row per deliverable followed by the total row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub rows: Vec<ScheduleRow>,
    pub summary: ScheduleSummary,
}

impl Schedule {
    /// Rows excluding the trailing total.
    pub fn deliverable_rows(&self) -> &[ScheduleRow] {
        match self.rows.split_last() {
            Some((last, rest)) if last.is_total() => rest,
            _ => &self.rows,
        }
    }

    /// The trailing total row.
    pub fn total_row(&self) -> Option<&ScheduleRow> {
        self.rows.last().filter(|row| row.is_total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal_from_word() {
        assert_eq!(Ordinal::from_word("primer"), Some(Ordinal::Primer));
        assert_eq!(Ordinal::from_word("SÉPTIMO"), Some(Ordinal::Septimo));
        assert_eq!(Ordinal::from_word("séptimo"), Some(Ordinal::Septimo));
        assert_eq!(Ordinal::from_word("Décimo"), Some(Ordinal::Decimo));
        assert_eq!(Ordinal::from_word("undecimo"), None);
    }

    #[test]
    fn test_deliverable_labels() {
        assert_eq!(
            Deliverable::declared(Ordinal::Segundo, 60).label(2),
            "2°_SEGUNDO_ENTREGABLE"
        );
        assert_eq!(Deliverable::placeholder(3, 90).label(3), "ENTREGABLE_3");
    }

    #[test]
    fn test_total_row() {
        let row = ScheduleRow::total("445", Decimal::new(900000, 2));
        assert!(row.is_total());
        assert_eq!(row.payment_percent, "100%");
        assert!(row.start_date.is_none());
    }

    #[test]
    fn test_overrides_builder() {
        let overrides = ManualOverrides::new()
            .with_total_amount(Decimal::new(100, 0))
            .with_deliverable_count(4);
        assert!(!overrides.is_empty());
        assert_eq!(overrides.deliverable_count, Some(4));
        assert!(ManualOverrides::default().is_empty());
    }
}
