//! Rule-based extractors for credit-card statement text.

pub mod amounts;
pub mod dates;
pub mod header;
pub mod lines;
pub mod patterns;
pub mod payments;
pub mod segments;

pub use amounts::{format_amount, normalize_amount};
pub use dates::{format_statement_date, parse_statement_date};
pub use header::extract_header;
pub use lines::{ClassifiedBlock, LineClassifier};
pub use payments::{
    foreign_payment_entries, payment_entries, payment_total, PaymentCurrency, PaymentExtractor,
};
pub use segments::{segment, Block, BoundaryExtractor, Segments};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the first occurrence of the field.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field, in text order.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A matched value together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Byte span of the whole match in the source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, source: impl Into<String>) -> Self {
        Self {
            value,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }

    pub fn start(&self) -> usize {
        self.position.map(|(s, _)| s).unwrap_or(0)
    }

    pub fn end(&self) -> usize {
        self.position.map(|(_, e)| e).unwrap_or(0)
    }
}
