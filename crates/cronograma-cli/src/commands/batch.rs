//! Batch processing command for multiple service order PDFs.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use cronograma_core::models::config::CronogramaConfig;
use cronograma_core::models::schedule::Provenance;
use cronograma_core::{
    extract_service_order, Extraction, ManualOverrides, PdfExtractor, Schedule, ScheduleTable,
};

use super::config::load_config;
use crate::output::{self, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching service order PDFs
    #[arg(required = true)]
    input: String,

    /// Output directory (default: current directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "xlsx")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Accept fallback values for fields that could not be extracted
    #[arg(long)]
    accept_defaults: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    outcome: Option<(Extraction, Schedule)>,
    error: Option<String>,
}

pub fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let output_dir = args.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&output_dir)?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        match process_single_file(&path, &args, &config, &output_dir) {
            Ok(outcome) => {
                results.push(ProcessResult {
                    path,
                    outcome: Some(outcome),
                    error: None,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(ProcessResult {
                        path,
                        outcome: None,
                        error: Some(error_msg),
                    });
                } else {
                    pb.abandon();
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                }
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    if args.summary {
        let summary_path = output_dir.join("summary.csv");
        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let successful = results.iter().filter(|r| r.outcome.is_some()).count();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_single_file(
    path: &Path,
    args: &BatchArgs,
    config: &CronogramaConfig,
    output_dir: &Path,
) -> anyhow::Result<(Extraction, Schedule)> {
    let extractor = PdfExtractor::open(path, config.pdf.clone())?;
    let extraction = extract_service_order(&extractor, config)?;

    let overrides = if args.accept_defaults {
        extraction.default_overrides()
    } else {
        ManualOverrides::new()
    };
    let schedule = extraction.complete(&overrides)?;
    let table = ScheduleTable::new(&schedule, &config.export);

    let output_path = output_dir.join(format!(
        "{}.{}",
        output_stem(path, &extraction, &table),
        args.format.extension()
    ));
    output::write_file(
        &output_path,
        args.format,
        &extraction,
        &schedule,
        &table,
        &config.export.date_format,
    )?;
    debug!("Wrote output to {}", output_path.display());

    Ok((extraction, schedule))
}

/// Files without an order number are named after their input file so that
/// several of them in one batch do not overwrite each other.
fn output_stem(path: &Path, extraction: &Extraction, table: &ScheduleTable) -> String {
    if extraction.fields.sources.order_number == Provenance::Defaulted {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("service_order");
        format!("{}_{}", table.file_stem, stem)
    } else {
        table.file_stem.clone()
    }
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "order_number",
        "notification_date",
        "total_amount",
        "deliverables",
        "payment_per_deliverable",
        "missing",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some((extraction, schedule)) = &result.outcome {
            let summary = &schedule.summary;
            let missing: Vec<String> = extraction.missing.iter().map(|m| m.to_string()).collect();
            wtr.write_record([
                filename,
                "success",
                &summary.order_number,
                &summary.notification_date.to_string(),
                &format!("{:.2}", summary.total_amount),
                &summary.deliverable_count.to_string(),
                &format!("{:.2}", summary.payment_per_deliverable),
                &missing.join(";"),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                "",
                "",
                "",
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
