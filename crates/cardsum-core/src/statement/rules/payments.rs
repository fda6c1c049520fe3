//! Payment total calculation.
//!
//! Payments are found by scanning the whole statement for the payment
//! marker followed, on the same line, by an amount with a trailing minus.
//! Segmentation plays no part here.

use regex::Regex;
use rust_decimal::Decimal;
use tracing::{trace, warn};

use super::amounts::normalize_amount;
use super::patterns::{PAYMENT_FOREIGN, PAYMENT_LOCAL};
use super::{ExtractionMatch, FieldExtractor};
use crate::models::statement::{checked_sum, PaymentEntry};

/// Currency of the payment marker to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentCurrency {
    Local,
    Foreign,
}

/// Payment marker extractor.
pub struct PaymentExtractor {
    currency: PaymentCurrency,
}

impl PaymentExtractor {
    pub fn new(currency: PaymentCurrency) -> Self {
        Self { currency }
    }

    fn pattern(&self) -> &'static Regex {
        match self.currency {
            PaymentCurrency::Local => &*PAYMENT_LOCAL,
            PaymentCurrency::Foreign => &*PAYMENT_FOREIGN,
        }
    }
}

impl Default for PaymentExtractor {
    fn default() -> Self {
        Self::new(PaymentCurrency::Local)
    }
}

impl FieldExtractor for PaymentExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results = Vec::new();

        for caps in self.pattern().captures_iter(text) {
            let (Some(full), Some(raw)) = (caps.get(0), caps.get(1)) else {
                continue;
            };

            match normalize_amount(raw.as_str()) {
                Ok(amount) => {
                    trace!(raw = raw.as_str(), offset = full.start(), "Payment matched");
                    results.push(
                        ExtractionMatch::new(amount, raw.as_str())
                            .with_position(full.start(), full.end()),
                    );
                }
                Err(e) => warn!("Skipping payment: {}", e),
            }
        }

        results
    }
}

fn entries(currency: PaymentCurrency, text: &str) -> Vec<PaymentEntry> {
    PaymentExtractor::new(currency)
        .extract_all(text)
        .into_iter()
        .map(|m| PaymentEntry {
            offset: m.start(),
            amount: m.value,
            raw: m.source,
        })
        .collect()
}

/// Every local-currency payment, in text order.
pub fn payment_entries(text: &str) -> Vec<PaymentEntry> {
    entries(PaymentCurrency::Local, text)
}

/// Every foreign-currency payment, in text order.
pub fn foreign_payment_entries(text: &str) -> Vec<PaymentEntry> {
    entries(PaymentCurrency::Foreign, text)
}

/// Sum of local-currency payments. Zero when there are none, capped at
/// `Decimal::MAX` when the sum leaves the decimal range.
pub fn payment_total(text: &str) -> Decimal {
    checked_sum(payment_entries(text).into_iter().map(|p| p.amount)).unwrap_or(Decimal::MAX)
}
