//! Statement text acquisition.

mod extractor;

pub use extractor::{PdfExtractor, PdfPage};

use std::path::Path;

use tracing::{debug, info};

use crate::error::PdfError;
use crate::models::config::PdfConfig;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract the text of every page, in page order.
    fn extract_pages(&self) -> Result<Vec<PdfPage>>;

    /// Extract the whole document as one text stream, pages joined with `\n`.
    fn extract_text(&self) -> Result<String> {
        Ok(join_pages(&self.extract_pages()?))
    }
}

/// Join page texts in page order.
pub fn join_pages(pages: &[PdfPage]) -> String {
    pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read statement text from a file.
///
/// `.txt` files are taken as already-extracted text; anything else is
/// loaded as a PDF.
pub fn read_statement_text(path: &Path, config: &PdfConfig) -> crate::Result<String> {
    let is_text = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt"));

    if is_text {
        debug!("Reading plain text statement {}", path.display());
        return Ok(std::fs::read_to_string(path)?);
    }

    let data = std::fs::read(path)?;
    let mut extractor = PdfExtractor::new().with_empty_page_check(config.reject_empty_pages);
    extractor.load(&data)?;
    let text = extractor.extract_text()?;

    let readable = text.chars().filter(|c| !c.is_whitespace()).count();
    if readable < config.min_text_length {
        return Err(PdfError::TextExtraction(format!(
            "only {} characters of text found (minimum {})",
            readable, config.min_text_length
        ))
        .into());
    }

    info!(
        "Extracted {} characters from {} pages of {}",
        text.len(),
        extractor.page_count(),
        path.display()
    );
    Ok(text)
}
