//! Compiled-in patterns and keyword sets for credit-card statement text.
//!
//! The anchors target Argentine statement layouts (Spanish captions, `.`
//! thousands separator, `,` decimal separator, trailing `-` on credits).
//! Every anchor allows arbitrary whitespace, newlines included, between the
//! label and its value because the text layout depends on the PDF renderer.

use lazy_static::lazy_static;
use regex::Regex;

/// Amount token: `1.234.567,89`, `1234,56` or `0,00`.
pub const AMOUNT: &str = r"(?:\d{1,3}(?:\.\d{3})+|\d+),\d{2}";

/// Day/month/year with a 2- or 4-digit year.
pub const DATE: &str = r"\d{2}[/.\-]\d{2}[/.\-](?:\d{4}|\d{2})";

/// Optional installment marker followed by a `current/total` pair.
pub const INSTALLMENT_LABEL: &str = r"(?:(?:C\.?|CUOTA)[ \t]*)?\d{2}/\d{2}";

lazy_static! {
    // Header anchors
    pub static ref CLOSING_DATE: Regex = Regex::new(&format!(
        r"(?i)CIERRE\s+ACTUAL[:\s]*({DATE})"
    )).unwrap();

    pub static ref DUE_DATE: Regex = Regex::new(&format!(
        r"(?i)VENCIMIENTO\s+ACTUAL[:\s]*({DATE})"
    )).unwrap();

    pub static ref ACCOUNT_HOLDER: Regex = Regex::new(
        r"(?i)\b(?:TIT(?:ULAR|\.)\s*DE\s+CUENTA|TITULAR)[:\s]+(\S[^\n]*?)[ \t]*(?:\n|$)"
    ).unwrap();

    pub static ref BALANCE_LOCAL: Regex = Regex::new(&format!(
        r"(?i)SALDO\s+ANTERIOR(?:\s+(?:EN\s+)?PESOS)?[:\s]+(?:\$\s*)?\b({AMOUNT})"
    )).unwrap();

    /// Either a labeled dollar balance or the second amount of a
    /// `SALDO ANTERIOR <pesos> <dollars>` pair.
    pub static ref BALANCE_FOREIGN: Regex = Regex::new(&format!(
        concat!(
            r"(?i)SALDO\s+ANTERIOR(?:",
            r"\s+(?:EN\s+)?D[OÓ]LARES[:\s]+(?:U\$S|USD)?\s*\b(?P<labeled>{AMOUNT})",
            r"|(?:\s+(?:EN\s+)?PESOS)?[:\s]+(?:\$\s*)?{AMOUNT}[ \t]+(?:(?:U\$S|USD)[ \t]*)?\b(?P<paired>{AMOUNT})",
            r")"
        ),
        AMOUNT = AMOUNT
    )).unwrap();

    // Payments: the amount must carry the trailing minus of a credit.
    pub static ref PAYMENT_LOCAL: Regex = Regex::new(&format!(
        r"(?i)SU\s+PAGO\s+EN\s+PESOS[^\n]*?\b({AMOUNT})-"
    )).unwrap();

    pub static ref PAYMENT_FOREIGN: Regex = Regex::new(&format!(
        r"(?i)SU\s+PAGO\s+EN\s+(?:D[OÓ]LARES|USD|U\$S)[^\n]*?\b({AMOUNT})-"
    )).unwrap();

    /// Closes the block of the card whose last four digits it carries.
    pub static ref CARD_BOUNDARY: Regex = Regex::new(
        r"(?i)TOTAL\s+CONSUMOS\s+(?:DE\s+)?TARJETA\s+(?:N[°º.]?\s*)?(?:[X*]{4}[ \-]?){0,3}(\d{4})\b"
    ).unwrap();

    /// `DATE  DESCRIPTION  [INSTALLMENT]  AMOUNT[-]`, one per line.
    ///
    /// The description is lazy so it stops at the first installment or
    /// amount token instead of swallowing it.
    pub static ref TRANSACTION_LINE: Regex = Regex::new(&format!(
        concat!(
            r"(?mR)^[ \t]*(?P<date>{DATE})[ \t]+",
            r"(?P<desc>[\p{{L}}\d][\p{{L}}\d .,*&/'#:+%()_\-]*?)[ \t]+",
            r"(?:(?P<inst>{INSTALLMENT_LABEL})[ \t]+)?",
            r"\b(?P<amount>{AMOUNT})(?P<credit>-)?(?:[ \t]|$)"
        ),
        DATE = DATE,
        INSTALLMENT_LABEL = INSTALLMENT_LABEL,
        AMOUNT = AMOUNT
    )).unwrap();

    pub static ref INSTALLMENT: Regex = Regex::new(
        r"(?i)^(?:(?:C\.?|CUOTA)\s*)?(\d{2})/(\d{2})$"
    ).unwrap();

}

/// Description tokens that mark a line as tax, withholding, stamp duty or
/// surcharge. Matched case-insensitively at word boundaries.
pub const FISCAL_KEYWORDS: &[&str] = &[
    "IVA",
    "IMPUESTO",
    "IMPUESTOS",
    "IMP",
    "IMP.",
    "PERCEPCION",
    "PERCEPCIÓN",
    "PERC.",
    "RETENCION",
    "RETENCIÓN",
    "RET.",
    "SELLOS",
    "IIBB",
    "ING.BRUTOS",
    "DB.RG",
    "RG",
    "RECARGO",
    "TASA",
];

/// Column captions and summary captions that bleed into extracted text.
pub const HEADER_NOISE_TOKENS: &[&str] = &[
    "FECHA",
    "COMPROBANTE",
    "DETALLE DE TRANSACCION",
    "DETALLE DE TRANSACCIONES",
    "NRO. CUPON",
    "REFERENCIA",
    "SALDO ANTERIOR",
    "SALDO ACTUAL",
    "PAGO MINIMO",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_line_matches_basic_row() {
        let caps = TRANSACTION_LINE.captures("15/01/24 AMAZON 15.000,50").unwrap();
        assert_eq!(&caps["date"], "15/01/24");
        assert_eq!(&caps["desc"], "AMAZON");
        assert!(caps.name("inst").is_none());
        assert_eq!(&caps["amount"], "15.000,50");
        assert!(caps.name("credit").is_none());
    }

    #[test]
    fn test_transaction_line_keeps_installment_out_of_description() {
        let caps = TRANSACTION_LINE
            .captures("18/01/2024 CUOTA GIMNASIO C.03/12 8.900,00")
            .unwrap();
        assert_eq!(&caps["desc"], "CUOTA GIMNASIO");
        assert_eq!(&caps["inst"], "C.03/12");
        assert_eq!(&caps["amount"], "8.900,00");
    }

    #[test]
    fn test_transaction_line_captures_trailing_minus() {
        let caps = TRANSACTION_LINE
            .captures("05/01/24 SU PAGO EN PESOS 3.990.000,00-")
            .unwrap();
        assert_eq!(&caps["amount"], "3.990.000,00");
        assert!(caps.name("credit").is_some());
    }

    #[test]
    fn test_card_boundary() {
        let caps = CARD_BOUNDARY
            .captures("TOTAL CONSUMOS DE TARJETA XXXX XXXX XXXX 4321   12.000,00")
            .unwrap();
        assert_eq!(&caps[1], "4321");
    }

    #[test]
    fn test_installment_pattern() {
        assert!(INSTALLMENT.is_match("02/06"));
        assert!(INSTALLMENT.is_match("C.02/06"));
        assert!(INSTALLMENT.is_match("CUOTA 02/06"));
        assert!(!INSTALLMENT.is_match("2/6"));
    }
}
