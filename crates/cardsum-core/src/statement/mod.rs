//! Statement text parsing pipeline.
//!
//! Header extraction and payment scanning run over the whole text;
//! line classification runs once per card block. Everything here is a
//! pure function of the input text.

mod aggregate;
mod parser;
pub mod rules;

pub use aggregate::Aggregator;
pub use parser::{ParserOptions, RuleStatementParser, StatementParser};
