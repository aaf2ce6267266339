//! Core library for service order schedule extraction.
//!
//! This crate provides:
//! - PDF page text extraction
//! - Rule-based extraction of order number, notification date, total amount,
//!   and declared deliverable count
//! - Deliverable detection, reconciliation, and payment/date schedule derivation
//! - A tabular export model for the schedule

pub mod error;
pub mod export;
pub mod extraction;
pub mod models;
pub mod pdf;
pub mod schedule;

pub use error::{CronogramaError, PdfError, Result, ScheduleError};
pub use export::{Column, ScheduleTable};
pub use extraction::{Extraction, ServiceOrderParser};
pub use models::config::{CronogramaConfig, PagePolicy};
pub use models::schedule::{
    Deliverable, ExtractedFields, ManualOverrides, MissingField, Ordinal, Schedule, ScheduleRow,
    ScheduleSummary,
};
pub use pdf::{PageSource, PdfExtractor, RawDocument};
pub use schedule::ScheduleBuilder;

/// Run the first extraction phase on any page source.
pub fn extract_service_order(
    source: &dyn PageSource,
    config: &CronogramaConfig,
) -> Result<Extraction> {
    let document = source.pages()?;
    tracing::debug!(
        "Read {} pages from {} backend",
        document.page_count(),
        source.backend_name()
    );
    Ok(ServiceOrderParser::with_config(config.extraction.clone()).parse(&document))
}
