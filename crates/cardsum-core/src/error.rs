//! Error types for the cardsum-core library.

use thiserror::Error;

/// Main error type for the cardsum library.
#[derive(Error, Debug)]
pub enum CardsumError {
    /// Document acquisition error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Sheet export error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while turning a document into statement text.
///
/// Any of these aborts the current document; no partial report is produced.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// A page produced no text at all.
    #[error("page {0} has no extractable text")]
    EmptyPage(u32),
}

/// Errors for a single matched token.
///
/// The statement parser never propagates these; the offending record is
/// skipped and a warning is attached to the report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// A matched amount token could not be normalized to a decimal.
    #[error("malformed amount: {raw}")]
    MalformedAmount { raw: String },

    /// A matched date token is not a valid calendar date.
    #[error("invalid date: {raw}")]
    InvalidDate { raw: String },
}

/// Result type for the cardsum library.
pub type Result<T> = std::result::Result<T, CardsumError>;
