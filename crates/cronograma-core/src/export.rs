//! Tabular view of a schedule for display and spreadsheet export.

use std::fmt::Write;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::config::ExportConfig;
use crate::models::schedule::{Schedule, ScheduleRow};

/// Exported columns, in their fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Column {
    OrderNumber,
    DeliverableLabel,
    DeadlineDays,
    PaymentPercent,
    PaymentAmount,
    StartDate,
    DueDate,
}

impl Column {
    pub const ALL: [Column; 7] = [
        Self::OrderNumber,
        Self::DeliverableLabel,
        Self::DeadlineDays,
        Self::PaymentPercent,
        Self::PaymentAmount,
        Self::StartDate,
        Self::DueDate,
    ];

    /// Column header as shown in the exported sheet.
    pub fn header(&self) -> &'static str {
        match self {
            Self::OrderNumber => "N° OS",
            Self::DeliverableLabel => "Entregables",
            Self::DeadlineDays => "Plazo_dias",
            Self::PaymentPercent => "%_Pago",
            Self::PaymentAmount => "Pago_soles",
            Self::StartDate => "Fecha_OS",
            Self::DueDate => "Fecha_Contractual",
        }
    }
}

/// A typed table cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Integer(u32),
    Amount(Decimal),
    Date(NaiveDate),
    Empty,
}

/// Schedule laid out as a sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleTable {
    /// Worksheet name.
    pub sheet_name: String,
    /// File name without extension ("Cronograma_OS445").
    pub file_stem: String,
    /// Rows of cells in [`Column::ALL`] order, total row last.
    pub rows: Vec<Vec<Cell>>,
    date_format: String,
}

impl ScheduleTable {
    pub fn new(schedule: &Schedule, config: &ExportConfig) -> Self {
        Self {
            sheet_name: config.sheet_name.clone(),
            file_stem: export_file_stem(&schedule.summary.order_number, config),
            rows: schedule.rows.iter().map(row_cells).collect(),
            date_format: config.date_format.clone(),
        }
    }

    pub fn headers(&self) -> [&'static str; 7] {
        Column::ALL.map(|c| c.header())
    }

    /// File name with the given extension.
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.file_stem, extension)
    }

    /// Render a cell as text: dates in the configured format, amounts with two decimals.
    pub fn render(&self, cell: &Cell) -> String {
        match cell {
            Cell::Text(s) => s.clone(),
            Cell::Integer(n) => n.to_string(),
            Cell::Amount(a) => format!("{:.2}", a),
            Cell::Date(d) => format_date(*d, &self.date_format),
            Cell::Empty => String::new(),
        }
    }

    /// All rows rendered as text.
    pub fn string_records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|cell| self.render(cell)).collect())
            .collect()
    }
}

fn row_cells(row: &ScheduleRow) -> Vec<Cell> {
    vec![
        Cell::Text(row.order_number.clone()),
        Cell::Text(row.label.clone()),
        row.deadline_days.map_or(Cell::Empty, Cell::Integer),
        Cell::Text(row.payment_percent.clone()),
        Cell::Amount(row.payment_amount),
        row.start_date.map_or(Cell::Empty, Cell::Date),
        row.due_date.map_or(Cell::Empty, Cell::Date),
    ]
}

/// Export file stem: the configured prefix followed by the order number.
pub fn export_file_stem(order_number: &str, config: &ExportConfig) -> String {
    let safe: String = order_number
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    format!("{}{}", config.file_prefix, safe)
}

/// Format a date, falling back to ISO 8601 if the format string is invalid.
pub fn format_date(date: NaiveDate, format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(format)).is_err() {
        return date.to_string();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schedule::ScheduleSummary;
    use pretty_assertions::assert_eq;

    fn schedule() -> Schedule {
        let start = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        Schedule {
            rows: vec![
                ScheduleRow {
                    order_number: "445".to_string(),
                    label: "1°_PRIMER_ENTREGABLE".to_string(),
                    deadline_days: Some(30),
                    payment_percent: "100.0%".to_string(),
                    payment_amount: Decimal::new(900000, 2),
                    start_date: Some(start),
                    due_date: NaiveDate::from_ymd_opt(2025, 4, 9),
                },
                ScheduleRow::total("445", Decimal::new(9000, 0)),
            ],
            summary: ScheduleSummary {
                order_number: "445".to_string(),
                total_amount: Decimal::new(9000, 0),
                notification_date: start,
                deliverable_count: 1,
                payment_per_deliverable: Decimal::new(900000, 2),
            },
        }
    }

    #[test]
    fn test_headers_and_names() {
        let table = ScheduleTable::new(&schedule(), &ExportConfig::default());
        assert_eq!(
            table.headers(),
            ["N° OS", "Entregables", "Plazo_dias", "%_Pago", "Pago_soles", "Fecha_OS", "Fecha_Contractual"]
        );
        assert_eq!(table.sheet_name, "Cronograma");
        assert_eq!(table.file_name("xlsx"), "Cronograma_OS445.xlsx");
    }

    #[test]
    fn test_string_records() {
        let table = ScheduleTable::new(&schedule(), &ExportConfig::default());
        let records = table.string_records();

        assert_eq!(
            records[0],
            vec!["445", "1°_PRIMER_ENTREGABLE", "30", "100.0%", "9000.00", "10/03/2025", "09/04/2025"]
        );
        assert_eq!(records[1], vec!["445", "Total", "", "100%", "9000.00", "", ""]);
    }

    #[test]
    fn test_file_stem_sanitized() {
        let config = ExportConfig::default();
        assert_eq!(export_file_stem("12/2025", &config), "Cronograma_OS12_2025");
    }
}
