//! Tabular sheets built from a statement report, and sinks that write them.

use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::statement::{Field, LineRecord, StatementReport};
use crate::statement::rules::format_statement_date;

pub const SUMMARY_SHEET: &str = "Summary";
pub const TRANSACTIONS_SHEET: &str = "Transactions";
pub const TAXES_SHEET: &str = "Taxes";
pub const CREDITS_SHEET: &str = "Credits";

/// A named table of string cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// File-system friendly form of the sheet name.
    pub fn file_stem(&self) -> String {
        self.name
            .chars()
            .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect()
    }
}

/// Which optional sheets to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetOptions {
    pub summary: bool,
    pub credits: bool,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            summary: true,
            credits: true,
        }
    }
}

/// Build every sheet for a report, in display order.
///
/// Card sheets follow boundary-marker order. The Transactions sheet is
/// only present for statements without card markers.
pub fn build_sheets(report: &StatementReport, options: &SheetOptions) -> Vec<Sheet> {
    let mut sheets = Vec::new();

    if options.summary {
        sheets.push(summary_sheet(report));
    }

    for group in &report.cards {
        let purchases: Vec<&LineRecord> = group.purchases().collect();
        sheets.push(records_sheet(format!("Card {}", group.card), &purchases));
    }

    if report.cards.is_empty() || !report.ungrouped.is_empty() {
        let purchases: Vec<&LineRecord> =
            report.ungrouped.iter().filter(|r| r.is_purchase()).collect();
        sheets.push(records_sheet(TRANSACTIONS_SHEET.to_string(), &purchases));
    }

    let mut taxes = Sheet::new(TAXES_SHEET, &["Date", "Concept", "Amount"]);
    for tax in &report.taxes {
        taxes.push_row(vec![
            format_statement_date(&tax.date),
            tax.description.clone(),
            cell_amount(tax.amount),
        ]);
    }
    sheets.push(taxes);

    if options.credits {
        let mut credits = Sheet::new(CREDITS_SHEET, &["Date", "Description", "Amount"]);
        for credit in &report.credits {
            credits.push_row(vec![
                format_statement_date(&credit.date),
                credit.description.clone(),
                cell_amount(credit.amount),
            ]);
        }
        sheets.push(credits);
    }

    debug!("Built {} sheets", sheets.len());
    sheets
}

fn records_sheet(name: String, records: &[&LineRecord]) -> Sheet {
    let with_installment = records.iter().any(|r| r.installment.is_some());
    let columns: &[&str] = if with_installment {
        &["Date", "Description", "Installment", "Amount"]
    } else {
        &["Date", "Description", "Amount"]
    };

    let mut sheet = Sheet::new(name, columns);
    for record in records {
        let mut row = vec![
            format_statement_date(&record.date),
            record.description.clone(),
        ];
        if with_installment {
            row.push(record.installment.map(|i| i.to_string()).unwrap_or_default());
        }
        row.push(cell_amount(record.amount));
        sheet.push_row(row);
    }
    sheet
}

fn summary_sheet(report: &StatementReport) -> Sheet {
    let header = &report.header;
    let mut sheet = Sheet::new(SUMMARY_SHEET, &["Field", "Value"]);

    let mut row = |field: &str, value: String| sheet.push_row(vec![field.to_string(), value]);

    row("Account holder", field_cell(&header.account_holder, |s| s.clone()));
    row("Closing date", field_cell(&header.closing_date, format_statement_date));
    row("Due date", field_cell(&header.due_date, format_statement_date));
    row("Prior balance (local)", field_cell(&header.prior_balance_local, |s| s.clone()));
    row("Prior balance (foreign)", field_cell(&header.prior_balance_foreign, |s| s.clone()));

    for group in &report.cards {
        row(&format!("Card {} subtotal", group.card), cell_amount(group.subtotal()));
    }
    row("Purchase total", cell_amount(report.purchase_total()));
    row("Tax total", cell_amount(report.tax_total()));
    row("Payment total", cell_amount(report.payment_total()));
    row("Foreign payment total", cell_amount(report.foreign_payment_total()));

    sheet
}

fn field_cell<T>(field: &Field<T>, f: impl Fn(&T) -> String) -> String {
    match field {
        Field::Defaulted(v) => format!("{} (default)", f(v)),
        other => other.render(f),
    }
}

/// Amounts are written with a `.` decimal point and two decimals so
/// spreadsheet tools read them as numbers.
fn cell_amount(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

/// Destination for rendered sheets.
pub trait SheetSink {
    /// Write one sheet.
    fn write_sheet(&mut self, sheet: &Sheet) -> crate::Result<()>;

    /// Write every sheet in order.
    fn write_all(&mut self, sheets: &[Sheet]) -> crate::Result<()> {
        for sheet in sheets {
            self.write_sheet(sheet)?;
        }
        Ok(())
    }
}

/// Writes each sheet as `<dir>/<sheet>.csv`.
pub struct CsvSheetWriter {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl CsvSheetWriter {
    /// Create the writer, creating `dir` if needed.
    pub fn new(dir: impl AsRef<Path>) -> crate::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            written: Vec::new(),
        })
    }

    /// Files written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl SheetSink for CsvSheetWriter {
    fn write_sheet(&mut self, sheet: &Sheet) -> crate::Result<()> {
        let path = self.dir.join(format!("{}.csv", sheet.file_stem()));
        let mut wtr = csv::Writer::from_path(&path)?;

        wtr.write_record(&sheet.columns)?;
        for row in &sheet.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;

        debug!("Wrote sheet '{}' to {}", sheet.name, path.display());
        self.written.push(path);
        Ok(())
    }
}
