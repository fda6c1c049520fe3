//! Line matching and classification within a card block.

use regex::Captures;
use tracing::{debug, trace, warn};

use super::amounts::normalize_amount;
use super::dates::parse_statement_date;
use super::patterns::{FISCAL_KEYWORDS, HEADER_NOISE_TOKENS, INSTALLMENT, TRANSACTION_LINE};
use crate::models::statement::{Category, Installment, LineRecord};

/// Output of classifying one block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedBlock {
    /// Purchase and Tax records, in text order.
    pub records: Vec<LineRecord>,
    /// Lines whose amount carried a trailing minus.
    pub credits: Vec<LineRecord>,
    /// Records skipped because a date or amount did not parse.
    pub warnings: Vec<String>,
}

impl ClassifiedBlock {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.credits.is_empty()
    }
}

/// Single-pass line classifier.
#[derive(Debug, Clone)]
pub struct LineClassifier {
    fiscal_keywords: &'static [&'static str],
    noise_tokens: &'static [&'static str],
}

impl LineClassifier {
    pub fn new() -> Self {
        Self {
            fiscal_keywords: FISCAL_KEYWORDS,
            noise_tokens: HEADER_NOISE_TOKENS,
        }
    }

    /// Match every candidate line of `block` and classify it.
    ///
    /// An empty block, or one without candidate lines, yields an empty
    /// result.
    pub fn classify(&self, block: &str) -> ClassifiedBlock {
        let mut out = ClassifiedBlock::default();

        for caps in TRANSACTION_LINE.captures_iter(block) {
            let description = caps["desc"].trim();
            let upper = description.to_uppercase();

            if self.is_noise(&upper) {
                trace!(description, "Discarding table header line");
                continue;
            }

            let record = match self.build_record(&caps, description, &upper) {
                Ok(record) => record,
                Err(message) => {
                    warn!("{}", message);
                    out.warnings.push(message);
                    continue;
                }
            };

            if record.category == Category::Payment {
                out.credits.push(record);
            } else {
                out.records.push(record);
            }
        }

        debug!(
            records = out.records.len(),
            credits = out.credits.len(),
            "Block classified"
        );
        out
    }

    /// Whether a description names a tax, withholding or surcharge.
    pub fn is_fiscal(&self, description: &str) -> bool {
        self.has_fiscal_keyword(&description.to_uppercase())
    }

    fn has_fiscal_keyword(&self, upper: &str) -> bool {
        self.fiscal_keywords
            .iter()
            .any(|keyword| contains_word(upper, keyword))
    }

    fn is_noise(&self, upper: &str) -> bool {
        self.noise_tokens.iter().any(|token| upper.contains(token))
    }

    fn build_record(
        &self,
        caps: &Captures<'_>,
        description: &str,
        upper: &str,
    ) -> Result<LineRecord, String> {
        let line = caps[0].trim();

        let date = parse_statement_date(&caps["date"])
            .map_err(|e| format!("Skipping line '{}': {}", line, e))?;
        let amount = normalize_amount(&caps["amount"])
            .map_err(|e| format!("Skipping line '{}': {}", line, e))?;

        let installment = caps
            .name("inst")
            .and_then(|m| INSTALLMENT.captures(m.as_str()))
            .and_then(|c| Some(Installment::new(c[1].parse().ok()?, c[2].parse().ok()?)));

        let category = if caps.name("credit").is_some() {
            Category::Payment
        } else if self.has_fiscal_keyword(upper) {
            Category::Tax
        } else {
            Category::Purchase
        };

        Ok(LineRecord {
            date,
            description: description.to_string(),
            installment,
            amount,
            category,
        })
    }
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// `keyword` occurs in `haystack` and is not glued to a neighbouring
/// letter or digit. A keyword ending in punctuation (`IMP.`) may be
/// followed by anything.
fn contains_word(haystack: &str, keyword: &str) -> bool {
    let ends_alnum = keyword.chars().next_back().is_some_and(char::is_alphanumeric);

    haystack.match_indices(keyword).any(|(i, _)| {
        let before_ok = haystack[..i]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let after_ok = !ends_alnum
            || haystack[i + keyword.len()..]
                .chars()
                .next()
                .is_none_or(|c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_single_purchase() {
        let out = LineClassifier::new().classify("15/01/24 AMAZON 15.000,50");

        assert_eq!(
            out.records,
            vec![LineRecord {
                date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                description: "AMAZON".to_string(),
                installment: None,
                amount: dec("15000.50"),
                category: Category::Purchase,
            }]
        );
        assert!(out.credits.is_empty());
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_installment_purchase() {
        let out = LineClassifier::new().classify("18/01/2024 CUOTA GIMNASIO C.03/12 8.900,00\n");
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].description, "CUOTA GIMNASIO");
        assert_eq!(out.records[0].installment, Some(Installment::new(3, 12)));
        assert_eq!(out.records[0].amount, dec("8900.00"));
    }

    #[test]
    fn test_trailing_minus_never_reaches_records() {
        let block = "\
05/01/24 SU PAGO EN PESOS 3.990.000,00-
07/01/24 DEVOLUCION AMAZON 1.000,00-
10/01/24 IMPUESTO DE SELLOS 50,00-
15/01/24 AMAZON 15.000,50
";
        let out = LineClassifier::new().classify(block);

        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].description, "AMAZON");
        assert_eq!(out.credits.len(), 3);
        assert!(out.credits.iter().all(|r| r.category == Category::Payment));
    }

    #[test]
    fn test_fiscal_lines_become_taxes() {
        let block = "\
25/01/24 IVA RG 4240 21,00
25/01/24 PERCEPCION AFIP 30% 1.200,00
25/01/24 DB.RG 5617 3% 90,00
25/01/24 IMP. DE SELLOS 45,10
25/01/24 RIVADAVIA LIBROS 2.000,00
";
        let out = LineClassifier::new().classify(block);
        let categories: Vec<Category> = out.records.iter().map(|r| r.category).collect();

        assert_eq!(
            categories,
            vec![
                Category::Tax,
                Category::Tax,
                Category::Tax,
                Category::Tax,
                Category::Purchase,
            ]
        );
    }

    #[test]
    fn test_keywords_match_whole_words() {
        let classifier = LineClassifier::new();
        assert!(classifier.is_fiscal("iva rg 4240"));
        assert!(classifier.is_fiscal("Percepción AFIP"));
        assert!(!classifier.is_fiscal("DIVAS SHOP"));
        assert!(!classifier.is_fiscal("IMPRENTA CENTRAL"));
        assert!(!classifier.is_fiscal("CORRIENTES GARAGE"));
    }

    #[test]
    fn test_header_noise_is_discarded() {
        let block = "\
01/01/24 FECHA COMPROBANTE 0,00
15/01/24 AMAZON 15.000,50
";
        let out = LineClassifier::new().classify(block);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].description, "AMAZON");
    }

    #[test]
    fn test_invalid_date_skips_record_only() {
        let block = "\
31/02/24 FANTASMA 100,00
15/01/24 AMAZON 15.000,50
";
        let out = LineClassifier::new().classify(block);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("31/02/24"));
    }

    #[test]
    fn test_malformed_amount_skips_record_only() {
        let block = "\
15/01/24 CONCESIONARIA 100000000000000000000000000000,00
16/01/24 AMAZON 15.000,50
";
        let out = LineClassifier::new().classify(block);

        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].description, "AMAZON");
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("malformed amount"));
        assert!(out.warnings[0].contains("CONCESIONARIA"));
    }

    #[test]
    fn test_empty_block() {
        let out = LineClassifier::new().classify("");
        assert!(out.is_empty());
        assert!(out.warnings.is_empty());
    }
}
