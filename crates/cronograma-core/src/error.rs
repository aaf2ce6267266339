//! Error types for the cronograma-core library.

use thiserror::Error;

use crate::models::schedule::MissingField;

/// Main error type for the cronograma library.
#[derive(Error, Debug)]
pub enum CronogramaError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Schedule derivation error.
    #[error("schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors raised while completing a schedule from an extraction.
///
/// Field extraction itself never fails; these only surface in the second
/// phase, when the caller asks for a finished schedule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// Fields that could not be extracted and were not supplied manually.
    #[error("missing fields require manual input: {}", format_missing(.0))]
    MissingFields(Vec<MissingField>),

    /// A manually supplied value is out of range.
    #[error("invalid value for {field}: {reason}")]
    InvalidOverride { field: MissingField, reason: String },

    /// The schedule would have no deliverables to divide the amount over.
    #[error("deliverable count must be at least 1")]
    NoDeliverables,

    /// A due date falls outside the representable calendar.
    #[error("due date overflow: {days} days after {start}")]
    DateOverflow { start: chrono::NaiveDate, days: u32 },
}

fn format_missing(fields: &[MissingField]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for the cronograma library.
pub type Result<T> = std::result::Result<T, CronogramaError>;
