//! Process command - build the schedule for a single service order PDF.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};

use clap::Args;
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use tracing::{debug, info};

use cronograma_core::models::config::CronogramaConfig;
use cronograma_core::{
    extract_service_order, Extraction, ManualOverrides, MissingField, PdfExtractor, Schedule,
    ScheduleTable,
};

use super::config::load_config;
use crate::output::{self, OutputFormat};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input service order PDF
    #[arg(required = true)]
    input: PathBuf,

    /// Output file or directory (default: stdout, or the current directory for xlsx)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Total amount to use when it cannot be extracted
    #[arg(long)]
    amount: Option<Decimal>,

    /// Deliverable count to use when it cannot be determined
    #[arg(long)]
    deliverables: Option<u32>,

    /// Accept fallback values for fields that could not be extracted
    #[arg(long)]
    accept_defaults: bool,

    /// Never prompt for missing values
    #[arg(long)]
    no_prompt: bool,

    /// Append a due-date timeline to text output
    #[arg(long)]
    chart: bool,
}

pub fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let extension = args
        .input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if extension != "pdf" {
        anyhow::bail!("Unsupported file format: {}", extension);
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Reading PDF...");

    let extraction = extract(&args, &config, &pb);
    pb.finish_and_clear();
    let extraction = extraction?;

    for warning in &extraction.warnings {
        eprintln!("{} {}", style("⚠").yellow(), warning);
    }

    let overrides = resolve_overrides(&args, &extraction)?;
    let schedule = extraction.complete(&overrides)?;
    let table = ScheduleTable::new(&schedule, &config.export);

    write_output(&args, &config, &extraction, &schedule, &table)?;

    debug!("Total processing time: {:?}", start.elapsed());
    Ok(())
}

fn extract(
    args: &ProcessArgs,
    config: &CronogramaConfig,
    pb: &ProgressBar,
) -> anyhow::Result<Extraction> {
    let extractor = PdfExtractor::open(&args.input, config.pdf.clone())?;
    debug!("PDF has {} pages", extractor.page_count());

    pb.set_message("Extracting fields...");
    Ok(extract_service_order(&extractor, config)?)
}

/// Values for missing fields: flags first, then fallbacks or an interactive prompt.
fn resolve_overrides(args: &ProcessArgs, extraction: &Extraction) -> anyhow::Result<ManualOverrides> {
    let mut overrides = ManualOverrides::new();
    if let Some(amount) = args.amount {
        overrides = overrides.with_total_amount(amount);
    }
    if let Some(count) = args.deliverables {
        overrides = overrides.with_deliverable_count(count);
    }

    let unresolved: Vec<MissingField> = extraction
        .missing
        .iter()
        .copied()
        .filter(|field| match field {
            MissingField::TotalAmount => overrides.total_amount.is_none(),
            MissingField::DeliverableCount => overrides.deliverable_count.is_none(),
        })
        .collect();

    if unresolved.is_empty() {
        return Ok(overrides);
    }

    if args.accept_defaults {
        let defaults = extraction.default_overrides();
        if overrides.total_amount.is_none() {
            overrides.total_amount = defaults.total_amount;
        }
        if overrides.deliverable_count.is_none() {
            overrides.deliverable_count = defaults.deliverable_count;
        }
        return Ok(overrides);
    }

    if args.no_prompt || !console::user_attended_stderr() {
        return Ok(overrides);
    }

    let term = Term::stderr();
    for field in unresolved {
        match field {
            MissingField::TotalAmount => {
                let amount: Decimal = prompt(&term, "Total amount (S/)")?;
                overrides = overrides.with_total_amount(amount);
            }
            MissingField::DeliverableCount => {
                let count: u32 = prompt(&term, "Number of deliverables")?;
                overrides = overrides.with_deliverable_count(count);
            }
        }
    }
    Ok(overrides)
}

fn prompt<T>(term: &Term, label: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    loop {
        term.write_str(&format!("{} {}: ", style("?").cyan(), label))?;
        let line = term.read_line()?;
        let cleaned = line.trim().replace(',', "");
        if cleaned.is_empty() {
            anyhow::bail!("No value entered for {}", label.to_lowercase());
        }
        match cleaned.parse::<T>() {
            Ok(value) => return Ok(value),
            Err(e) => term.write_line(&format!("{} {}", style("✗").red(), e))?,
        }
    }
}

fn write_output(
    args: &ProcessArgs,
    config: &CronogramaConfig,
    extraction: &Extraction,
    schedule: &Schedule,
    table: &ScheduleTable,
) -> anyhow::Result<()> {
    let date_format = &config.export.date_format;

    if args.output.is_none() && args.format != OutputFormat::Xlsx {
        let rendered = match args.format {
            OutputFormat::Csv => output::format_csv(table)?,
            OutputFormat::Json => output::format_json(extraction, schedule, table)?,
            _ => output::format_text(schedule, table, date_format, args.chart),
        };
        println!("{}", rendered);
        return Ok(());
    }

    let path = output::output_path(
        args.output.as_deref(),
        &table.file_name(args.format.extension()),
    );
    output::write_file(&path, args.format, extraction, schedule, table, date_format)?;

    print!(
        "{}",
        output::format_text(schedule, table, date_format, args.chart)
    );
    println!(
        "{} Output written to {}",
        style("✓").green(),
        path.display()
    );
    Ok(())
}
