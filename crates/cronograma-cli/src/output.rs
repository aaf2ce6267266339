//! Rendering and writing of schedules: text table, timeline chart, CSV, JSON, XLSX.

use std::path::{Path, PathBuf};

use console::style;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;

use cronograma_core::export::{format_date, Cell};
use cronograma_core::extraction::rules::format_soles_amount;
use cronograma_core::{Extraction, Schedule, ScheduleTable};

/// Output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Summary and table as plain text
    Text,
    /// Excel workbook
    Xlsx,
    /// CSV table
    Csv,
    /// JSON document
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    schedule: &'a Schedule,
    table: &'a ScheduleTable,
    warnings: &'a [String],
}

/// Resolve where a file-based output goes: an explicit file, a file inside an
/// explicit directory, or the default file name in the current directory.
pub fn output_path(output: Option<&Path>, default_name: &str) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => path.join(default_name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(default_name),
    }
}

/// Write the schedule in `format` to `path`.
pub fn write_file(
    path: &Path,
    format: OutputFormat,
    extraction: &Extraction,
    schedule: &Schedule,
    table: &ScheduleTable,
    date_format: &str,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Xlsx => write_xlsx(path, table),
        OutputFormat::Csv => Ok(std::fs::write(path, format_csv(table)?)?),
        OutputFormat::Json => Ok(std::fs::write(path, format_json(extraction, schedule, table)?)?),
        OutputFormat::Text => Ok(std::fs::write(
            path,
            format_text(schedule, table, date_format, false),
        )?),
    }
}

pub fn format_json(
    extraction: &Extraction,
    schedule: &Schedule,
    table: &ScheduleTable,
) -> anyhow::Result<String> {
    let report = JsonReport {
        schedule,
        table,
        warnings: &extraction.warnings,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

pub fn format_csv(table: &ScheduleTable) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(table.headers())?;
    for record in table.string_records() {
        wtr.write_record(&record)?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

/// Write the table as a single-sheet workbook.
pub fn write_xlsx(path: &Path, table: &ScheduleTable) -> anyhow::Result<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let amount_format = Format::new().set_num_format("#,##0.00");

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&table.sheet_name)?;

    for (col, header) in table.headers().iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    for (i, row) in table.rows.iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let c = col as u16;
            match cell {
                Cell::Integer(n) => {
                    worksheet.write_number(r, c, f64::from(*n))?;
                }
                Cell::Amount(a) => {
                    let value = a.to_f64().unwrap_or_default();
                    worksheet.write_number_with_format(r, c, value, &amount_format)?;
                }
                Cell::Empty => {}
                other => {
                    worksheet.write_string(r, c, table.render(other))?;
                }
            }
        }
    }

    worksheet.autofit();
    workbook.save(path)?;
    Ok(())
}

/// Summary block followed by the aligned table, and optionally the timeline.
pub fn format_text(
    schedule: &Schedule,
    table: &ScheduleTable,
    date_format: &str,
    chart: bool,
) -> String {
    let summary = &schedule.summary;
    let mut output = String::new();

    output.push_str(&format!("N° OS: {}\n", summary.order_number));
    output.push_str(&format!(
        "Monto total: {}\n",
        format_soles_amount(summary.total_amount)
    ));
    output.push_str(&format!(
        "Fecha de notificación: {}\n",
        format_date(summary.notification_date, date_format)
    ));
    output.push_str(&format!("Entregables: {}\n", summary.deliverable_count));
    output.push_str(&format!(
        "Pago por entregable: {}\n",
        format_soles_amount(summary.payment_per_deliverable)
    ));
    output.push('\n');

    output.push_str(&format_table(table));

    if chart {
        output.push('\n');
        output.push_str(&format_chart(schedule, date_format));
    }

    output
}

/// Table with columns padded to their widest cell.
pub fn format_table(table: &ScheduleTable) -> String {
    let headers = table.headers();
    let records = table.string_records();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for record in &records {
        for (width, value) in widths.iter_mut().zip(record) {
            *width = (*width).max(value.chars().count());
        }
    }

    let mut output = String::new();
    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    push_row(&mut output, &header_cells, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut output, &rule, &widths);
    for record in &records {
        push_row(&mut output, record, &widths);
    }
    output
}

fn push_row(output: &mut String, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect();
    output.push_str(padded.join("  ").trim_end());
    output.push('\n');
}

const CHART_WIDTH: usize = 40;

/// Horizontal timeline: one bar per deliverable, proportional to its deadline.
pub fn format_chart(schedule: &Schedule, date_format: &str) -> String {
    let rows = schedule.deliverable_rows();
    let max_days = rows
        .iter()
        .filter_map(|r| r.deadline_days)
        .max()
        .unwrap_or(0)
        .max(1) as usize;
    let label_width = rows.iter().map(|r| r.label.chars().count()).max().unwrap_or(0);

    let mut output = String::from("Fecha contractual\n");
    for row in rows {
        let (Some(days), Some(due)) = (row.deadline_days, row.due_date) else {
            continue;
        };
        let len = ((days as usize * CHART_WIDTH) / max_days).max(1);
        let pad = label_width.saturating_sub(row.label.chars().count());
        output.push_str(&format!(
            "{}{} |{} {}\n",
            row.label,
            " ".repeat(pad),
            style("█".repeat(len)).green(),
            format_date(due, date_format)
        ));
    }
    output
}
