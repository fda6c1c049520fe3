//! Batch processing command for multiple statement files.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use cardsum_core::report::{build_sheets, CsvSheetWriter, SheetSink};
use cardsum_core::statement::rules::format_statement_date;
use cardsum_core::StatementReport;

use super::config::load_config;
use super::process::{analyze_file, build_parser, format_report, sheet_options, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file (default: from config, else text)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Also write per-statement sheet directories
    #[arg(long)]
    sheets: bool,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers (default: from config)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    report: Option<StatementReport>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = Arc::new(load_config(config_path)?);
    let format = OutputFormat::resolve(args.format, &config)?;
    let jobs = args.jobs.unwrap_or(config.batch.jobs).max(1);

    // Expand glob pattern
    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "pdf" | "txt")
        })
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to process ({} workers)",
        style("ℹ").blue(),
        files.len(),
        jobs
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let parser = Arc::new(build_parser(&config, None, None));
    let semaphore = Arc::new(Semaphore::new(jobs));
    let mut tasks = JoinSet::new();

    for (index, path) in files.into_iter().enumerate() {
        let permit = semaphore.clone().acquire_owned().await?;
        let parser = parser.clone();
        let config = config.clone();

        tasks.spawn_blocking(move || {
            let _permit = permit;
            let file_start = Instant::now();
            let result = analyze_file(&path, &parser, &config);
            let processing_time_ms = file_start.elapsed().as_millis() as u64;

            let (report, error) = match result {
                Ok(report) => (Some(report), None),
                Err(e) => (None, Some(format!("{:#}", e))),
            };
            (
                index,
                ProcessResult {
                    path,
                    report,
                    error,
                    processing_time_ms,
                },
            )
        });
    }

    let mut indexed = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let (index, result) = joined?;
        overall_pb.inc(1);

        if let Some(msg) = &result.error {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", result.path.display(), msg);
            } else {
                error!("Failed to process {}: {}", result.path.display(), msg);
                tasks.abort_all();
                overall_pb.abandon();
                anyhow::bail!("Processing failed for {}: {}", result.path.display(), msg);
            }
        }
        indexed.push((index, result));
    }

    overall_pb.finish_with_message("Complete");

    // Restore input order
    indexed.sort_by_key(|(index, _)| *index);
    let results: Vec<ProcessResult> = indexed.into_iter().map(|(_, r)| r).collect();

    let successful: Vec<_> = results.iter().filter(|r| r.report.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if let Some(output_dir) = &args.output_dir {
        let paths: Vec<PathBuf> = results.iter().map(|r| r.path.clone()).collect();
        for (result, output_name) in results.iter().zip(output_stems(&paths)) {
            let Some(report) = &result.report else {
                continue;
            };

            let output_path = output_dir.join(format!("{}.{}", output_name, format.extension()));
            fs::write(&output_path, format_report(report, format)?)?;
            debug!("Wrote output to {}", output_path.display());

            if args.sheets {
                let mut writer = CsvSheetWriter::new(output_dir.join(&output_name))?;
                writer.write_all(&build_sheets(report, &sheet_options(&config)))?;
            }
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    eprintln!();
    eprintln!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for result in &failed {
            eprintln!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

/// One output name per input, in input order.
///
/// Inputs sharing a file stem (`enero.pdf` and `enero.txt`, or the same
/// name in two directories) get `_2`, `_3`, ... so no output overwrites
/// another.
fn output_stems(paths: &[PathBuf]) -> Vec<String> {
    let mut used = HashSet::new();
    paths
        .iter()
        .map(|path| {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("statement");
            let mut name = stem.to_string();
            let mut n = 2;
            while !used.insert(name.clone()) {
                name = format!("{}_{}", stem, n);
                n += 1;
            }
            if name != stem {
                warn!("{} shares its name with another input, writing {}", path.display(), name);
            }
            name
        })
        .collect()
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "account_holder",
        "closing_date",
        "due_date",
        "cards",
        "purchase_total",
        "tax_total",
        "payment_total",
        "warnings",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        let time_ms = result.processing_time_ms.to_string();

        let row: Vec<String> = match &result.report {
            Some(report) => {
                let header = &report.header;
                let cards = report
                    .cards
                    .iter()
                    .map(|g| g.card.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                vec![
                    filename.to_string(),
                    "success".to_string(),
                    header.account_holder.to_string(),
                    header.closing_date.render(format_statement_date),
                    header.due_date.render(format_statement_date),
                    cards,
                    format!("{:.2}", report.purchase_total()),
                    format!("{:.2}", report.tax_total()),
                    format!("{:.2}", report.payment_total()),
                    report.warnings.len().to_string(),
                    time_ms,
                    String::new(),
                ]
            }
            None => {
                let mut row = vec![filename.to_string(), "error".to_string()];
                row.extend(std::iter::repeat_n(String::new(), 8));
                row.push(time_ms);
                row.push(result.error.clone().unwrap_or_default());
                row
            }
        };
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}
