//! Configuration structures for the extraction pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CronogramaError, Result};

/// Main configuration for the cronograma pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CronogramaConfig {
    /// Field and deliverable extraction configuration.
    pub extraction: ExtractionConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Spreadsheet/table export configuration.
    pub export: ExportConfig,
}

/// Which pages are searched for deliverable declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagePolicy {
    /// Only the first page containing declarations is used. Later pages are
    /// still scanned so that their declarations can be reported as ignored.
    #[default]
    FirstMatchingPageOnly,
    /// Declarations from every page are merged in page order.
    AllPages,
}

/// Extraction fallbacks and deliverable synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Order number used when none is found.
    pub default_order_number: String,

    /// Notification date used when none is found.
    pub default_notification_date: NaiveDate,

    /// Placeholders generated when the document states no deliverable count.
    pub default_deliverable_count: u32,

    /// Deadline spacing between generated placeholders, in days.
    pub placeholder_step_days: u32,

    /// Largest deliverable count accepted from the document or the caller.
    /// Larger declared counts are treated as malformed.
    pub max_deliverables: u32,

    /// Page policy for deliverable declarations.
    pub page_policy: PagePolicy,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            default_order_number: "No identificado".to_string(),
            default_notification_date: NaiveDate::from_ymd_opt(2025, 1, 10)
                .unwrap_or(NaiveDate::MIN),
            default_deliverable_count: 5,
            placeholder_step_days: 30,
            max_deliverables: 100,
            page_policy: PagePolicy::FirstMatchingPageOnly,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Try an empty password on encrypted documents.
    pub decrypt_empty_password: bool,

    /// Fall back to pdf-extract when lopdf yields no text on any page.
    pub text_fallback: bool,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            decrypt_empty_password: true,
            text_fallback: true,
        }
    }
}

/// Export naming and formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Prefix of exported file names, followed by the order number.
    pub file_prefix: String,

    /// Worksheet name.
    pub sheet_name: String,

    /// chrono format string for dates in exported tables.
    pub date_format: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_prefix: "Cronograma_OS".to_string(),
            sheet_name: "Cronograma".to_string(),
            date_format: "%d/%m/%Y".to_string(),
        }
    }
}

impl CronogramaConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| CronogramaError::Config(e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| CronogramaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
