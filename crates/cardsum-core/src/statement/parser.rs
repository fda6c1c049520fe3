//! Rule-based statement parser.

use std::time::Instant;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::aggregate::Aggregator;
use super::rules::{
    extract_header, foreign_payment_entries, payment_entries, segment, LineClassifier,
};
use crate::models::statement::{HeaderDefaults, StatementReport};

/// Caller preferences for a parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// Fallbacks for header fields the statement does not provide.
    pub defaults: HeaderDefaults,
}

/// Trait for statement parsing.
pub trait StatementParser {
    /// Parse one statement's text into a report.
    ///
    /// Never fails: missing fields become sentinels and unreadable lines
    /// become warnings.
    fn parse(&self, text: &str) -> StatementReport;
}

/// Parser built from the compiled-in pattern set.
#[derive(Debug, Clone, Default)]
pub struct RuleStatementParser {
    options: ParserOptions,
    classifier: LineClassifier,
}

impl RuleStatementParser {
    /// Create a new parser with no header defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set all parser options at once.
    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    /// Holder name to use when the statement has none.
    pub fn with_default_holder(mut self, holder: impl Into<String>) -> Self {
        self.options.defaults.account_holder = Some(holder.into());
        self
    }

    /// Due date to use when the statement has none.
    pub fn with_default_due_date(mut self, date: NaiveDate) -> Self {
        self.options.defaults.due_date = Some(date);
        self
    }
}

impl StatementParser for RuleStatementParser {
    fn parse(&self, text: &str) -> StatementReport {
        let start = Instant::now();

        let header = extract_header(text).with_defaults(&self.options.defaults);
        let mut report = StatementReport {
            warnings: header
                .missing_fields()
                .into_iter()
                .map(|field| format!("Header field not found: {}", field))
                .collect(),
            header,
            payments: payment_entries(text),
            foreign_payments: foreign_payment_entries(text),
            ..Default::default()
        };

        let segments = segment(text);
        let mut aggregator = Aggregator::new();
        for block in segments.blocks {
            let card = block.card;
            debug!(card = ?card, len = block.text.len(), "Classifying block");
            aggregator.add_block(card, self.classifier.classify(block.text));
        }
        if !segments.trailer.trim().is_empty() {
            aggregator.add_trailer(self.classifier.classify(segments.trailer));
        }

        report = aggregator.finish(report);
        if report.is_empty() {
            report.warnings.push("No transaction lines detected".to_string());
        }
        for total in report.capped_totals() {
            warn!("{} exceeds the decimal range", total);
            report
                .warnings
                .push(format!("{} exceeds the decimal range and was capped", total));
        }

        info!(
            cards = report.cards.len(),
            records = report.record_count(),
            taxes = report.taxes.len(),
            payments = report.payments.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Statement parsed"
        );
        report
    }
}
