//! Header field extraction: dates, holder and prior balances.

use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, trace};

use super::dates::parse_statement_date;
use super::patterns::{ACCOUNT_HOLDER, BALANCE_FOREIGN, BALANCE_LOCAL, CLOSING_DATE, DUE_DATE};
use crate::models::statement::{Field, HeaderFields};

/// Extract every header field from the statement text.
///
/// Total over any input: a field whose anchor does not match, or whose
/// date does not exist on the calendar, is left as `NotFound`.
pub fn extract_header(text: &str) -> HeaderFields {
    let header = HeaderFields {
        closing_date: Field::from_option(extract_date(&CLOSING_DATE, text)),
        due_date: Field::from_option(extract_date(&DUE_DATE, text)),
        account_holder: Field::from_option(extract_holder(text)),
        prior_balance_local: Field::from_option(first_group(&BALANCE_LOCAL, text)),
        prior_balance_foreign: Field::from_option(extract_foreign_balance(text)),
    };

    debug!(missing = ?header.missing_fields(), "Header extracted");
    header
}

fn first_group(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

fn extract_date(pattern: &Regex, text: &str) -> Option<NaiveDate> {
    let raw = first_group(pattern, text)?;
    match parse_statement_date(&raw) {
        Ok(date) => Some(date),
        Err(e) => {
            debug!("Ignoring header date: {}", e);
            None
        }
    }
}

fn extract_holder(text: &str) -> Option<String> {
    let name = first_group(&ACCOUNT_HOLDER, text)?;
    let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
    (!name.is_empty()).then_some(name)
}

fn extract_foreign_balance(text: &str) -> Option<String> {
    // A labeled dollar balance wins over the second amount of a pair.
    let mut paired = None;
    for caps in BALANCE_FOREIGN.captures_iter(text) {
        if let Some(m) = caps.name("labeled") {
            trace!(raw = m.as_str(), "Labeled foreign balance");
            return Some(m.as_str().to_string());
        }
        if paired.is_none() {
            paired = caps.name("paired").map(|m| m.as_str().to_string());
        }
    }
    paired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::statement::NOT_FOUND;
    use crate::statement::rules::amounts::normalize_amount;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn test_empty_text_yields_all_sentinels() {
        let header = extract_header("");
        assert_eq!(header, HeaderFields::default());
        assert_eq!(header.missing_fields().len(), 5);
        assert_eq!(header.closing_date.to_string(), NOT_FOUND);
    }

    #[test]
    fn test_garbage_text_is_total() {
        for text in ["\n\n\n", "SALDO ANTERIOR", "CIERRE ACTUAL 99/99/99", "VENCIMIENTO"] {
            let header = extract_header(text);
            assert_eq!(header.due_date, Field::NotFound);
            assert_eq!(header.closing_date, Field::NotFound);
        }
    }

    #[test]
    fn test_prior_balance_pair() {
        let header = extract_header("SALDO ANTERIOR 1.500,00 200,00\n");
        assert_eq!(header.prior_balance_local, Field::Found("1.500,00".to_string()));
        assert_eq!(header.prior_balance_foreign, Field::Found("200,00".to_string()));

        let local = header.prior_balance_local.value().unwrap();
        assert_eq!(normalize_amount(local).unwrap(), Decimal::from_str("1500.00").unwrap());
    }

    #[test]
    fn test_labeled_foreign_balance() {
        let text = "SALDO ANTERIOR EN PESOS $ 10.000,00\nSALDO ANTERIOR EN DOLARES U$S 35,10\n";
        let header = extract_header(text);
        assert_eq!(header.prior_balance_local, Field::Found("10.000,00".to_string()));
        assert_eq!(header.prior_balance_foreign, Field::Found("35,10".to_string()));
    }

    #[test]
    fn test_full_header_across_lines() {
        let text = "\
RESUMEN DE CUENTA
Titular: PEREZ  JUAN CARLOS
CIERRE ACTUAL
25/01/24
vencimiento actual: 05/02/2024
";
        let header = extract_header(text);
        assert_eq!(header.account_holder, Field::Found("PEREZ JUAN CARLOS".to_string()));
        assert_eq!(
            header.closing_date,
            Field::Found(NaiveDate::from_ymd_opt(2024, 1, 25).unwrap())
        );
        assert_eq!(
            header.due_date,
            Field::Found(NaiveDate::from_ymd_opt(2024, 2, 5).unwrap())
        );
        assert_eq!(header.prior_balance_local, Field::NotFound);
    }

    #[test]
    fn test_cotitular_is_not_the_holder() {
        let header = extract_header("COTITULAR: GOMEZ ANA\n");
        assert_eq!(header.account_holder, Field::NotFound);

        let header = extract_header("COTITULAR: GOMEZ ANA\nTITULAR: PEREZ JUAN\n");
        assert_eq!(header.account_holder, Field::Found("PEREZ JUAN".to_string()));
    }

    #[test]
    fn test_invalid_calendar_date_is_not_found() {
        let header = extract_header("CIERRE ACTUAL 31/02/24");
        assert_eq!(header.closing_date, Field::NotFound);
    }
}
