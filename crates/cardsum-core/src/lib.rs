//! Core library for credit-card statement analysis.
//!
//! This crate provides:
//! - Statement text acquisition from PDF (lopdf, pdf-extract) or plain text
//! - Header extraction, payment totals and per-card segmentation
//! - Line classification into purchases, taxes and credits
//! - Aggregated reports rendered as JSON, text, CSV or per-table sheets

pub mod error;
pub mod models;
pub mod pdf;
pub mod report;
pub mod statement;

pub use error::{CardsumError, ExtractionError, PdfError, Result};
pub use models::config::CardsumConfig;
pub use models::statement::{
    CardGroup, CardSuffix, Category, Field, HeaderDefaults, HeaderFields, Installment,
    LineRecord, StatementReport, Totals,
};
pub use pdf::{read_statement_text, PdfExtractor, PdfProcessor};
pub use report::{build_sheets, CsvSheetWriter, Sheet, SheetOptions, SheetSink};
pub use statement::{ParserOptions, RuleStatementParser, StatementParser};
