//! Amount normalization for statement amounts.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::ExtractionError;

/// Parse a statement amount (`1.234.567,89`) into a decimal.
///
/// Every `.` is removed first and only then is `,` turned into the decimal
/// point. Doing it the other way round turns `1.234,56` into `123456`.
pub fn normalize_amount(raw: &str) -> Result<Decimal, ExtractionError> {
    let normalized = raw.trim().replace('.', "").replace(',', ".");
    Decimal::from_str(&normalized).map_err(|_| ExtractionError::MalformedAmount {
        raw: raw.to_string(),
    })
}

/// Format an amount the way statements print it (1.234,56).
pub fn format_amount(amount: Decimal) -> String {
    let s = format!("{:.2}", amount.abs());
    let (integer_part, decimal_part) = s.split_once('.').unwrap_or((s.as_str(), "00"));

    let chars: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::new();
    if amount.is_sign_negative() && !amount.is_zero() {
        formatted.push('-');
    }

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push('.');
        }
        formatted.push(*c);
    }

    format!("{},{}", formatted, decimal_part)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_normalize_amount() {
        assert_eq!(normalize_amount("1.234.567,89").unwrap(), dec("1234567.89"));
        assert_eq!(normalize_amount("0,00").unwrap(), Decimal::ZERO);
        assert_eq!(normalize_amount("1.500,00").unwrap(), dec("1500.00"));
        assert_eq!(normalize_amount("15.000,50").unwrap(), dec("15000.50"));
        assert_eq!(normalize_amount(" 200,00 ").unwrap(), dec("200.00"));
    }

    #[test]
    fn test_substitution_order_matters() {
        let raw = "1.234,56";
        let reversed = raw.replace(',', ".").replace('.', "");
        let reversed = Decimal::from_str(&reversed).unwrap();

        assert_eq!(reversed, dec("123456"));
        assert_ne!(reversed, normalize_amount(raw).unwrap());
        assert_eq!(normalize_amount(raw).unwrap(), dec("1234.56"));
    }

    #[test]
    fn test_malformed_amount() {
        assert_eq!(
            normalize_amount("1,2,3"),
            Err(ExtractionError::MalformedAmount { raw: "1,2,3".to_string() })
        );
        assert!(normalize_amount("").is_err());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec("1234567.89")), "1.234.567,89");
        assert_eq!(format_amount(dec("0")), "0,00");
        assert_eq!(format_amount(dec("15000.5")), "15.000,50");
        assert_eq!(format_amount(dec("-200")), "-200,00");
    }
}
