//! Two-phase service order parser.
//!
//! Phase one ([`ServiceOrderParser::parse`]) never fails: it reads the scalar
//! fields, scans for deliverables, and reports the fields that still need a
//! value. Phase two ([`Extraction::complete`]) takes the caller's values for
//! those fields and derives the schedule.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::rules::{normalize_whitespace, FieldRules};
use crate::error::ScheduleError;
use crate::models::config::ExtractionConfig;
use crate::models::schedule::{
    ExtractedFields, FieldSources, ManualOverrides, MissingField, Provenance, Schedule,
};
use crate::pdf::RawDocument;
use crate::schedule::{derive_schedule, synthesize_placeholders, DeliverableScan, ScheduleBuilder};

/// Result of the first extraction phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    /// Scalar fields, with fallbacks substituted.
    pub fields: ExtractedFields,

    /// Deliverables found or synthesized.
    pub scan: DeliverableScan,

    /// Fields that need a caller-supplied value before completion.
    pub missing: Vec<MissingField>,

    /// Extraction warnings.
    pub warnings: Vec<String>,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,

    placeholder_step_days: u32,

    max_deliverables: u32,
}

impl Extraction {
    /// True when a schedule can be derived without manual input.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Overrides that accept the fallback values for every missing field:
    /// a zero amount and the synthesized placeholder count.
    pub fn default_overrides(&self) -> ManualOverrides {
        let mut overrides = ManualOverrides::new();
        for field in &self.missing {
            overrides = match field {
                MissingField::TotalAmount => overrides.with_total_amount(self.fields.total_amount),
                MissingField::DeliverableCount => {
                    let count = u32::try_from(self.scan.deliverables.len()).unwrap_or(u32::MAX);
                    overrides.with_deliverable_count(count)
                }
            };
        }
        overrides
    }

    /// Derive the schedule, filling missing fields from `overrides`.
    ///
    /// Overrides for fields that were extracted are ignored. A manual
    /// deliverable count replaces the synthesized placeholders with that many.
    pub fn complete(&self, overrides: &ManualOverrides) -> Result<Schedule, ScheduleError> {
        let mut fields = self.fields.clone();
        let mut deliverables = self.scan.deliverables.clone();
        let mut count = self.scan.final_count;
        let mut unresolved = Vec::new();

        for field in &self.missing {
            match field {
                MissingField::TotalAmount => match overrides.total_amount {
                    Some(amount) if amount.is_sign_negative() && !amount.is_zero() => {
                        return Err(ScheduleError::InvalidOverride {
                            field: *field,
                            reason: format!("amount must not be negative, got {}", amount),
                        });
                    }
                    Some(amount) => {
                        fields.total_amount = amount;
                        fields.sources.total_amount = Provenance::Manual;
                    }
                    None => unresolved.push(*field),
                },
                MissingField::DeliverableCount => match overrides.deliverable_count {
                    Some(0) => {
                        return Err(ScheduleError::InvalidOverride {
                            field: *field,
                            reason: "count must be at least 1".to_string(),
                        });
                    }
                    Some(n) if n > self.max_deliverables => {
                        return Err(ScheduleError::InvalidOverride {
                            field: *field,
                            reason: format!(
                                "count must be at most {}, got {}",
                                self.max_deliverables, n
                            ),
                        });
                    }
                    Some(n) => {
                        fields.declared_deliverable_count = n;
                        fields.sources.deliverable_count = Provenance::Manual;
                        count = n;
                        deliverables = synthesize_placeholders(n, self.placeholder_step_days);
                    }
                    None => unresolved.push(*field),
                },
            }
        }

        if !unresolved.is_empty() {
            return Err(ScheduleError::MissingFields(unresolved));
        }

        if overrides.total_amount.is_some() && !self.missing.contains(&MissingField::TotalAmount) {
            debug!("Ignoring total amount override; amount was extracted");
        }
        if overrides.deliverable_count.is_some()
            && !self.missing.contains(&MissingField::DeliverableCount)
        {
            debug!("Ignoring deliverable count override; count was resolved");
        }

        derive_schedule(&fields, &deliverables, count)
    }

    /// Derive the schedule without manual input.
    pub fn into_schedule(self) -> Result<Schedule, ScheduleError> {
        self.complete(&ManualOverrides::default())
    }
}

/// Parser for service order documents.
pub struct ServiceOrderParser {
    rules: FieldRules,
    builder: ScheduleBuilder,
    config: ExtractionConfig,
}

impl ServiceOrderParser {
    /// Create a parser with default settings.
    pub fn new() -> Self {
        Self::with_config(ExtractionConfig::default())
    }

    /// Create a parser with explicit settings.
    pub fn with_config(config: ExtractionConfig) -> Self {
        Self {
            rules: FieldRules::standard(),
            builder: ScheduleBuilder::new(config.clone()),
            config,
        }
    }

    /// Read the four scalar fields from the whole document.
    pub fn extract_fields(&self, document: &RawDocument) -> ExtractedFields {
        let text = normalize_whitespace(&document.full_text());

        let (order_number, order_src) = self.rules.order_number.resolve(&text, &self.config);
        let (notification_date, date_src) =
            self.rules.notification_date.resolve(&text, &self.config);
        let (total_amount, amount_src) = self.rules.total_amount.resolve(&text, &self.config);
        let max = self.config.max_deliverables;
        let (declared_deliverable_count, count_src) = self
            .rules
            .deliverable_count
            .resolve_where(&text, &self.config, |n| *n <= max);

        ExtractedFields {
            order_number,
            notification_date,
            total_amount,
            declared_deliverable_count,
            sources: FieldSources {
                order_number: order_src,
                notification_date: date_src,
                total_amount: amount_src,
                deliverable_count: count_src,
            },
        }
    }

    /// First phase: extract fields and deliverables, and report missing fields.
    pub fn parse(&self, document: &RawDocument) -> Extraction {
        let start = Instant::now();
        let mut warnings = Vec::new();

        info!(
            "Parsing service order from {} pages ({} with text)",
            document.page_count(),
            document.text_pages().count()
        );

        if document.is_blank() {
            warn!("Document has no extractable text; using fallbacks for every field");
            warnings.push("No text could be extracted from the document".to_string());
        }

        let fields = self.extract_fields(document);

        if fields.sources.order_number == Provenance::Defaulted {
            warnings.push("Could not extract order number".to_string());
        }
        if fields.sources.notification_date == Provenance::Defaulted {
            warnings.push(format!(
                "Could not extract notification date, using {}",
                fields.notification_date
            ));
        }

        let scan = self.builder.scan(document, fields.declared_deliverable_count);

        if scan.synthesized {
            warnings.push(format!(
                "No deliverable declarations found; generated {} placeholders",
                scan.deliverables.len()
            ));
        } else if scan.detected_count > fields.declared_deliverable_count as usize
            && fields.declared_deliverable_count > 0
        {
            warnings.push(format!(
                "Document declares {} deliverables but {} were found; using {}",
                fields.declared_deliverable_count, scan.detected_count, scan.final_count
            ));
        } else if (scan.detected_count as u64) < u64::from(fields.declared_deliverable_count) {
            warnings.push(format!(
                "Document declares {} deliverables but only {} were found; amount divided by {}",
                fields.declared_deliverable_count, scan.detected_count, scan.final_count
            ));
        }

        if !scan.ignored_pages.is_empty() {
            warnings.push(format!(
                "Deliverable declarations on pages {:?} were ignored",
                scan.ignored_pages
            ));
        }

        let mut missing = Vec::new();
        if fields.total_amount.is_zero() {
            missing.push(MissingField::TotalAmount);
        }
        if scan.final_count == 0 {
            missing.push(MissingField::DeliverableCount);
        }

        if !missing.is_empty() {
            debug!("Fields needing manual input: {:?}", missing);
        }

        debug!(
            "Extracted order {} with {} deliverables",
            fields.order_number,
            scan.deliverables.len()
        );

        Extraction {
            fields,
            scan,
            missing,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
            placeholder_step_days: self.config.placeholder_step_days,
            max_deliverables: self.config.max_deliverables,
        }
    }
}

impl Default for ServiceOrderParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_extract_fields_across_pages() {
        let document = RawDocument::from_texts([
            "ORDEN DE SERVICIO\nN° 0031",
            "Fecha de NOTIFICACIÓN: 05/02/2025\nMONTO TOTAL: S/ 12,000.00\nN° DE ENTREGABLES: 4",
        ]);
        let fields = ServiceOrderParser::new().extract_fields(&document);

        assert_eq!(fields.order_number, "0031");
        assert_eq!(fields.notification_date, NaiveDate::from_ymd_opt(2025, 2, 5).unwrap());
        assert_eq!(fields.total_amount, dec("12000.00"));
        assert_eq!(fields.declared_deliverable_count, 4);
        assert_eq!(fields.sources.total_amount, Provenance::Extracted);
    }

    #[test]
    fn test_missing_amount_blocks_completion() {
        let document = RawDocument::from_texts(["ORDEN DE SERVICIO N° 7 PRIMER ENTREGABLE HASTA 30 DIAS"]);
        let extraction = ServiceOrderParser::new().parse(&document);

        assert_eq!(extraction.missing, vec![MissingField::TotalAmount]);
        assert_eq!(
            extraction.complete(&ManualOverrides::default()),
            Err(ScheduleError::MissingFields(vec![MissingField::TotalAmount]))
        );

        let schedule = extraction
            .complete(&ManualOverrides::new().with_total_amount(dec("600.00")))
            .unwrap();
        assert_eq!(schedule.rows[0].payment_amount, dec("600.00"));
    }

    #[test]
    fn test_manual_count_replaces_default_placeholders() {
        let document = RawDocument::from_texts(["MONTO TOTAL: 900.00"]);
        let extraction = ServiceOrderParser::new().parse(&document);

        assert_eq!(extraction.missing, vec![MissingField::DeliverableCount]);
        assert_eq!(extraction.scan.deliverables.len(), 5);

        let schedule = extraction
            .complete(&ManualOverrides::new().with_deliverable_count(3))
            .unwrap();
        assert_eq!(schedule.deliverable_rows().len(), 3);
        assert_eq!(schedule.rows[0].payment_amount, dec("300.00"));
        assert_eq!(schedule.rows[2].label, "ENTREGABLE_3");
        assert_eq!(schedule.rows[2].deadline_days, Some(90));
    }

    #[test]
    fn test_invalid_overrides() {
        let extraction = ServiceOrderParser::new().parse(&RawDocument::default());

        let zero_count = ManualOverrides::new()
            .with_total_amount(dec("100.00"))
            .with_deliverable_count(0);
        assert!(matches!(
            extraction.complete(&zero_count),
            Err(ScheduleError::InvalidOverride { field: MissingField::DeliverableCount, .. })
        ));

        let negative = ManualOverrides::new()
            .with_total_amount(dec("-1.00"))
            .with_deliverable_count(2);
        assert!(matches!(
            extraction.complete(&negative),
            Err(ScheduleError::InvalidOverride { field: MissingField::TotalAmount, .. })
        ));
    }

    #[test]
    fn test_oversized_declared_count_falls_back() {
        let document =
            RawDocument::from_texts(["MONTO TOTAL: S/ 9,000.00 N° DE ENTREGABLES: 20000000"]);
        let extraction = ServiceOrderParser::new().parse(&document);

        assert_eq!(extraction.fields.declared_deliverable_count, 0);
        assert_eq!(extraction.fields.sources.deliverable_count, Provenance::Defaulted);
        assert_eq!(extraction.scan.deliverables.len(), 5);
        assert_eq!(extraction.missing, vec![MissingField::DeliverableCount]);

        let schedule = extraction.complete(&extraction.default_overrides()).unwrap();
        assert_eq!(schedule.deliverable_rows().len(), 5);
    }

    #[test]
    fn test_declared_count_at_limit_is_kept() {
        let document = RawDocument::from_texts(["MONTO TOTAL: S/ 100.00 N° DE ENTREGABLES: 100"]);
        let extraction = ServiceOrderParser::new().parse(&document);

        assert_eq!(extraction.fields.declared_deliverable_count, 100);
        assert_eq!(extraction.scan.deliverables.len(), 100);
        assert!(extraction.is_complete());
    }

    #[test]
    fn test_oversized_manual_count_rejected() {
        let extraction = ServiceOrderParser::new().parse(&RawDocument::from_texts(["MONTO TOTAL: 900.00"]));

        let result = extraction.complete(&ManualOverrides::new().with_deliverable_count(4_000_000_000));
        assert!(matches!(
            result,
            Err(ScheduleError::InvalidOverride { field: MissingField::DeliverableCount, .. })
        ));
    }

    #[test]
    fn test_default_placeholders_capped() {
        let config = ExtractionConfig {
            default_deliverable_count: 1_000_000,
            max_deliverables: 12,
            ..ExtractionConfig::default()
        };
        let extraction = ServiceOrderParser::with_config(config).parse(&RawDocument::default());
        assert_eq!(extraction.scan.deliverables.len(), 12);
    }

    #[test]
    fn test_overrides_ignored_for_extracted_fields() {
        let document = RawDocument::from_texts([
            "MONTO TOTAL: 1,000.00 PRIMER ENTREGABLE HASTA 30 DIAS SEGUNDO ENTREGABLE HASTA 60 DIAS",
        ]);
        let extraction = ServiceOrderParser::new().parse(&document);
        assert!(extraction.is_complete());

        let schedule = extraction
            .complete(
                &ManualOverrides::new()
                    .with_total_amount(dec("5.00"))
                    .with_deliverable_count(9),
            )
            .unwrap();
        assert_eq!(schedule.summary.total_amount, dec("1000.00"));
        assert_eq!(schedule.summary.deliverable_count, 2);
    }

    #[test]
    fn test_default_overrides_accept_fallbacks() {
        let extraction = ServiceOrderParser::new().parse(&RawDocument::default());
        let overrides = extraction.default_overrides();

        assert_eq!(overrides.total_amount, Some(Decimal::ZERO));
        assert_eq!(overrides.deliverable_count, Some(5));

        let schedule = extraction.complete(&overrides).unwrap();
        assert_eq!(schedule.deliverable_rows().len(), 5);
        assert_eq!(schedule.rows[0].payment_percent, "20.0%");
        assert_eq!(schedule.total_row().unwrap().payment_amount, Decimal::ZERO);
    }

    #[test]
    fn test_declared_count_mismatch_warning() {
        let document = RawDocument::from_texts([
            "MONTO TOTAL: 1,000.00 N° DE ENTREGABLES: 4 PRIMER ENTREGABLE HASTA 30 DIAS",
        ]);
        let extraction = ServiceOrderParser::new().parse(&document);

        assert_eq!(extraction.scan.final_count, 4);
        assert!(extraction.warnings.iter().any(|w| w.contains("only 1 were found")));
    }
}
