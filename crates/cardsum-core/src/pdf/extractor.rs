//! PDF text extraction using lopdf and pdf-extract.

use lopdf::Document;
use tracing::{debug, trace, warn};

use super::{PdfProcessor, Result};
use crate::error::PdfError;

/// Page separator emitted by pdf-extract.
const FORM_FEED: char = '\u{c}';

/// PDF text extractor using lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
    reject_empty_pages: bool,
}

/// Text of a single PDF page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfPage {
    /// Page number (1-indexed).
    pub number: u32,
    /// Extracted text from this page.
    pub text: String,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
            reject_empty_pages: true,
        }
    }

    /// Set whether a page without text fails the whole document.
    pub fn with_empty_page_check(mut self, reject: bool) -> Self {
        self.reject_empty_pages = reject;
        self
    }

    fn document(&self) -> Result<&Document> {
        self.document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("No document loaded".to_string()))
    }

    /// Per-page extraction through lopdf's content stream decoder.
    fn extract_with_lopdf(&self, doc: &Document) -> Result<Vec<PdfPage>> {
        let mut pages = Vec::new();
        for number in doc.get_pages().keys().copied() {
            let text = doc
                .extract_text(&[number])
                .map_err(|e| PdfError::TextExtraction(format!("page {}: {}", number, e)))?;
            trace!("Page {}: {} chars", number, text.len());
            pages.push(PdfPage { number, text });
        }
        Ok(pages)
    }

    /// Whole-document extraction through pdf-extract.
    ///
    /// Pages are split on form feeds when the count matches the document;
    /// otherwise the text is returned as a single page.
    fn extract_with_pdf_extract(&self, page_count: u32) -> Result<Vec<PdfPage>> {
        let text = pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))?;

        let parts: Vec<&str> = text.split(FORM_FEED).collect();
        if parts.len() as u32 == page_count {
            return Ok(parts
                .into_iter()
                .zip(1..)
                .map(|(text, number)| PdfPage {
                    number,
                    text: text.to_string(),
                })
                .collect());
        }

        debug!(
            "pdf-extract returned {} parts for {} pages, keeping one text stream",
            parts.len(),
            page_count
        );
        Ok(vec![PdfPage { number: 1, text }])
    }

    fn check_pages(&self, pages: &[PdfPage]) -> Result<()> {
        if pages.is_empty() {
            return Err(PdfError::NoPages);
        }
        if self.reject_empty_pages {
            if let Some(page) = pages.iter().find(|p| p.text.trim().is_empty()) {
                return Err(PdfError::EmptyPage(page.number));
            }
        }
        Ok(())
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract needs the decrypted bytes for the fallback path
            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_pages(&self) -> Result<Vec<PdfPage>> {
        let doc = self.document()?;

        let pages = match self.extract_with_lopdf(doc) {
            Ok(pages) => pages,
            Err(e) => {
                warn!("Per-page extraction failed ({}), falling back to pdf-extract", e);
                self.extract_with_pdf_extract(self.page_count())?
            }
        };

        self.check_pages(&pages)?;
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    fn statement_pdf(lines: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("Td", vec![50.into(), 800.into()]),
        ];
        for line in lines {
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("Td", vec![0.into(), (-14).into()]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut data = Vec::new();
        doc.save_to(&mut data).unwrap();
        data
    }

    #[test]
    fn test_pdf_extractor_new() {
        let extractor = PdfExtractor::new();
        assert!(extractor.document.is_none());
        assert_eq!(extractor.page_count(), 0);
        assert!(extractor.extract_pages().is_err());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let mut extractor = PdfExtractor::new();
        assert!(matches!(extractor.load(b"%PDF-garbage"), Err(PdfError::Parse(_))));
    }

    #[test]
    fn test_extract_single_page() {
        let data = statement_pdf(&["CIERRE ACTUAL 25/01/24", "15/01/24 AMAZON 15.000,50"]);
        let mut extractor = PdfExtractor::new();
        extractor.load(&data).unwrap();

        assert_eq!(extractor.page_count(), 1);
        let pages = extractor.extract_pages().unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].number, 1);
        let text = extractor.extract_text().unwrap();
        assert!(text.contains("AMAZON"));
    }

    #[test]
    fn test_empty_page_is_rejected() {
        let extractor = PdfExtractor::new();
        let pages = vec![
            PdfPage { number: 1, text: "SALDO ANTERIOR".to_string() },
            PdfPage { number: 2, text: " \n ".to_string() },
        ];
        assert!(matches!(extractor.check_pages(&pages), Err(PdfError::EmptyPage(2))));

        let lenient = PdfExtractor::new().with_empty_page_check(false);
        assert!(lenient.check_pages(&pages).is_ok());
        assert!(matches!(lenient.check_pages(&[]), Err(PdfError::NoPages)));
    }
}
