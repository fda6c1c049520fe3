//! Report rendering: JSON, plain text, flat CSV and per-table sheets.

pub mod sheets;

pub use sheets::{build_sheets, CsvSheetWriter, Sheet, SheetOptions, SheetSink};

use std::fmt::Write;

use serde::Serialize;

use crate::models::statement::{StatementReport, Totals};
use crate::statement::rules::{format_amount, format_statement_date};

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    report: &'a StatementReport,
    totals: Totals,
}

/// Serialize a report with its totals attached.
pub fn to_json(report: &StatementReport, pretty: bool) -> serde_json::Result<String> {
    let view = JsonReport {
        report,
        totals: report.totals(),
    };
    if pretty {
        serde_json::to_string_pretty(&view)
    } else {
        serde_json::to_string(&view)
    }
}

/// One flat CSV of every record: purchases by card, ungrouped purchases,
/// taxes and credits.
pub fn to_csv(report: &StatementReport) -> crate::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["card", "date", "description", "installment", "amount", "category"])?;

    let grouped = report
        .cards
        .iter()
        .flat_map(|g| g.purchases().map(move |r| (g.card.as_str(), r)));
    let ungrouped = report
        .ungrouped
        .iter()
        .filter(|r| r.is_purchase())
        .map(|r| ("", r));
    let other = report.taxes.iter().chain(report.credits.iter()).map(|r| ("", r));

    for (card, record) in grouped.chain(ungrouped).chain(other) {
        let date = format_statement_date(&record.date);
        let installment = record.installment.map(|i| i.to_string()).unwrap_or_default();
        let amount = format!("{:.2}", record.amount);
        let category = record.category.to_string();
        wtr.write_record([
            card,
            date.as_str(),
            record.description.as_str(),
            installment.as_str(),
            amount.as_str(),
            category.as_str(),
        ])?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

/// Human-readable summary.
pub fn render_text(report: &StatementReport) -> String {
    let header = &report.header;
    let mut out = String::new();

    let _ = writeln!(out, "Account holder: {}", header.account_holder);
    let _ = writeln!(
        out,
        "Closing date:   {}",
        header.closing_date.render(format_statement_date)
    );
    let _ = writeln!(
        out,
        "Due date:       {}",
        header.due_date.render(format_statement_date)
    );
    let _ = writeln!(
        out,
        "Prior balance:  $ {} / U$S {}",
        header.prior_balance_local, header.prior_balance_foreign
    );

    if !report.cards.is_empty() {
        out.push_str("\nCards:\n");
        for group in &report.cards {
            let _ = writeln!(
                out,
                "  {}  {:>16}  ({} purchases)",
                group.card,
                format_amount(group.subtotal()),
                group.purchases().count()
            );
        }
    }

    out.push_str("\nTotals:\n");
    let _ = writeln!(out, "  Purchases:         {:>16}", format_amount(report.purchase_total()));
    let _ = writeln!(out, "  Taxes:             {:>16}", format_amount(report.tax_total()));
    let _ = writeln!(out, "  Payments:          {:>16}", format_amount(report.payment_total()));
    if !report.foreign_payments.is_empty() {
        let _ = writeln!(
            out,
            "  Payments (U$S):    {:>16}",
            format_amount(report.foreign_payment_total())
        );
    }

    out
}
