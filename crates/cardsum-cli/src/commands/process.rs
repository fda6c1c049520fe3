//! Process command - analyze a single statement file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use cardsum_core::models::config::CardsumConfig;
use cardsum_core::report::{self, build_sheets, CsvSheetWriter, SheetOptions, SheetSink};
use cardsum_core::statement::{RuleStatementParser, StatementParser};
use cardsum_core::{read_statement_text, StatementReport};

use super::config::load_config;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or extracted .txt)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (default: from config, else text)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Also write one CSV per sheet into this directory
    #[arg(long)]
    sheets_dir: Option<PathBuf>,

    /// Account holder to use when the statement has none
    #[arg(long)]
    holder: Option<String>,

    /// Due date (DD/MM/YYYY) to use when the statement has none
    #[arg(long, value_parser = parse_due_date)]
    due_date: Option<NaiveDate>,

    /// Print parsing warnings to stderr
    #[arg(long)]
    show_warnings: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Flat CSV of every record
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    /// Explicit flag first, then the configured default.
    pub fn resolve(flag: Option<Self>, config: &CardsumConfig) -> anyhow::Result<Self> {
        match flag {
            Some(format) => Ok(format),
            None => Self::from_str(&config.output.format, true).map_err(|_| {
                anyhow::anyhow!("Unknown output format in config: {}", config.output.format)
            }),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

fn parse_due_date(s: &str) -> Result<NaiveDate, String> {
    cardsum_core::statement::rules::parse_statement_date(s).map_err(|e| e.to_string())
}

/// Parser configured from the config file, with CLI overrides on top.
pub fn build_parser(
    config: &CardsumConfig,
    holder: Option<String>,
    due_date: Option<NaiveDate>,
) -> RuleStatementParser {
    let mut parser = RuleStatementParser::new();
    if let Some(holder) = holder.or_else(|| config.defaults.account_holder.clone()) {
        parser = parser.with_default_holder(holder);
    }
    if let Some(date) = due_date.or(config.defaults.due_date) {
        parser = parser.with_default_due_date(date);
    }
    parser
}

/// Read and parse one statement file.
pub fn analyze_file(
    path: &Path,
    parser: &RuleStatementParser,
    config: &CardsumConfig,
) -> anyhow::Result<StatementReport> {
    let text = read_statement_text(path, &config.pdf)?;
    Ok(parser.parse(&text))
}

pub fn format_report(report: &StatementReport, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(report::to_json(report, true)?),
        OutputFormat::Csv => Ok(report::to_csv(report)?),
        OutputFormat::Text => Ok(report::render_text(report)),
    }
}

pub fn sheet_options(config: &CardsumConfig) -> SheetOptions {
    SheetOptions {
        summary: config.output.summary_sheet,
        credits: config.output.credits_sheet,
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let format = OutputFormat::resolve(args.format, &config)?;

    // Check input file exists
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );

    pb.set_message("Reading statement...");
    let parser = build_parser(&config, args.holder.clone(), args.due_date);
    let report = analyze_file(&args.input, &parser, &config)?;

    pb.finish_and_clear();

    if args.show_warnings && !report.warnings.is_empty() {
        eprintln!("{}", style("Warnings:").yellow());
        for warning in &report.warnings {
            eprintln!("  - {}", warning);
        }
    }

    if let Some(dir) = &args.sheets_dir {
        let mut writer = CsvSheetWriter::new(dir)?;
        writer.write_all(&build_sheets(&report, &sheet_options(&config)))?;
        eprintln!(
            "{} {} sheets written to {}",
            style("✓").green(),
            writer.written().len(),
            dir.display()
        );
    }

    let output = format_report(&report, format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        print!("{}", output);
        if !output.ends_with('\n') {
            println!();
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
