//! Statement data models: header fields, line records, card groups and the
//! aggregated report.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Text shown for a header field whose pattern did not match.
pub const NOT_FOUND: &str = "not found";

/// A header value as seen by the extractor.
///
/// `NotFound` is the explicit sentinel for a pattern miss. `Defaulted`
/// marks a value supplied by the caller after extraction failed, so a
/// fallback is never mistaken for something read from the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Field<T> {
    Found(T),
    Defaulted(T),
    NotFound,
}

impl<T> Field<T> {
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Field::Found(v),
            None => Field::NotFound,
        }
    }

    /// The value, whether extracted or defaulted.
    pub fn value(&self) -> Option<&T> {
        match self {
            Field::Found(v) | Field::Defaulted(v) => Some(v),
            Field::NotFound => None,
        }
    }

    /// Replace a `NotFound` with the caller's default, if there is one.
    pub fn or_default_value(self, default: Option<T>) -> Self {
        match (self, default) {
            (Field::NotFound, Some(v)) => Field::Defaulted(v),
            (field, _) => field,
        }
    }

    /// Render the value with `f`, or the sentinel text.
    pub fn render(&self, f: impl Fn(&T) -> String) -> String {
        self.value().map(f).unwrap_or_else(|| NOT_FOUND.to_string())
    }
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::NotFound
    }
}

impl<T: fmt::Display> fmt::Display for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(v) => write!(f, "{}", v),
            None => f.write_str(NOT_FOUND),
        }
    }
}

/// Scalar fields from the top of the statement.
///
/// Balances stay as the raw matched text; the display layer decides how
/// to format them and anything that sums them goes through
/// [`normalize_amount`](crate::statement::rules::amounts::normalize_amount).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderFields {
    /// Current closing date (cierre actual).
    pub closing_date: Field<NaiveDate>,

    /// Current due date (vencimiento actual).
    pub due_date: Field<NaiveDate>,

    /// Account holder name.
    pub account_holder: Field<String>,

    /// Prior balance in local currency, raw.
    pub prior_balance_local: Field<String>,

    /// Prior balance in foreign currency, raw.
    pub prior_balance_foreign: Field<String>,
}

impl HeaderFields {
    /// Fill fields the document did not provide with caller defaults.
    pub fn with_defaults(self, defaults: &HeaderDefaults) -> Self {
        Self {
            due_date: self.due_date.or_default_value(defaults.due_date),
            account_holder: self
                .account_holder
                .or_default_value(defaults.account_holder.clone()),
            ..self
        }
    }

    /// Names of the fields left as `NotFound`.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.closing_date.value().is_none() {
            missing.push("closing_date");
        }
        if self.due_date.value().is_none() {
            missing.push("due_date");
        }
        if self.account_holder.value().is_none() {
            missing.push("account_holder");
        }
        if self.prior_balance_local.value().is_none() {
            missing.push("prior_balance_local");
        }
        if self.prior_balance_foreign.value().is_none() {
            missing.push("prior_balance_foreign");
        }
        missing
    }
}

/// Caller-supplied fallbacks for header fields that extraction may miss.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderDefaults {
    /// Holder name to show when the statement has none.
    pub account_holder: Option<String>,

    /// Due date to show when the statement has none.
    pub due_date: Option<NaiveDate>,
}

/// Classification of a matched line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// A purchase, possibly one installment of a financed purchase.
    Purchase,
    /// A tax, withholding, stamp duty or surcharge.
    Tax,
    /// A payment or credit (amount carried a trailing minus).
    Payment,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Purchase => "purchase",
            Category::Tax => "tax",
            Category::Payment => "payment",
        };
        f.write_str(s)
    }
}

/// A "current/total" installment pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Installment {
    pub current: u16,
    pub total: u16,
}

impl Installment {
    pub fn new(current: u16, total: u16) -> Self {
        Self { current, total }
    }
}

impl fmt::Display for Installment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}", self.current, self.total)
    }
}

/// One matched transaction-like line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRecord {
    /// Transaction date.
    pub date: NaiveDate,

    /// Free-text description (the concept, for taxes).
    pub description: String,

    /// Installment pair for financed purchases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installment: Option<Installment>,

    /// Always positive; the source sign convention is consumed on parse.
    pub amount: Decimal,

    pub category: Category,
}

impl LineRecord {
    pub fn is_purchase(&self) -> bool {
        self.category == Category::Purchase
    }

    pub fn is_tax(&self) -> bool {
        self.category == Category::Tax
    }
}

/// Sum of amounts, `None` when it leaves the decimal range.
pub fn checked_sum(amounts: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |total, amount| total.checked_add(amount))
}

/// Sum of `.amount` over a record set, capped at `Decimal::MAX`.
///
/// Amounts are positive, so an overflow can only go upwards.
pub fn sum_amounts<'a>(records: impl IntoIterator<Item = &'a LineRecord>) -> Decimal {
    checked_sum(records.into_iter().map(|r| r.amount)).unwrap_or(Decimal::MAX)
}

fn sum_payments(payments: &[PaymentEntry]) -> Decimal {
    checked_sum(payments.iter().map(|p| p.amount)).unwrap_or(Decimal::MAX)
}

/// Last four digits identifying a card inside a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardSuffix(String);

impl CardSuffix {
    /// Accepts exactly four ASCII digits.
    pub fn new(digits: &str) -> Option<Self> {
        let digits = digits.trim();
        if digits.len() == 4 && digits.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(digits.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Records belonging to one card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardGroup {
    pub card: CardSuffix,
    pub records: Vec<LineRecord>,
}

impl CardGroup {
    pub fn new(card: CardSuffix) -> Self {
        Self {
            card,
            records: Vec::new(),
        }
    }

    pub fn purchases(&self) -> impl Iterator<Item = &LineRecord> {
        self.records.iter().filter(|r| r.is_purchase())
    }

    /// Sum of this card's purchases.
    pub fn subtotal(&self) -> Decimal {
        sum_amounts(self.purchases())
    }
}

/// A payment-marker match that contributed to a payment total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEntry {
    /// Raw amount token, without the trailing minus.
    pub raw: String,
    pub amount: Decimal,
    /// Byte offset of the marker in the statement text.
    pub offset: usize,
}

/// Everything derived from one statement.
///
/// Totals are methods over the stored sets so they can never drift from
/// the records they summarize.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementReport {
    pub header: HeaderFields,

    /// Per-card groups in boundary-marker order.
    pub cards: Vec<CardGroup>,

    /// Records from a statement without boundary markers.
    pub ungrouped: Vec<LineRecord>,

    /// Deduplicated tax records, statement-wide.
    pub taxes: Vec<LineRecord>,

    /// Credit lines seen by the classifier, for display only.
    pub credits: Vec<LineRecord>,

    /// Local-currency payments.
    pub payments: Vec<PaymentEntry>,

    /// Foreign-currency payments.
    pub foreign_payments: Vec<PaymentEntry>,

    /// Recoverable issues found while parsing.
    pub warnings: Vec<String>,
}

impl StatementReport {
    /// Subtotal for one card, `None` when the card is not in the statement.
    pub fn card_subtotal(&self, card: &str) -> Option<Decimal> {
        self.cards
            .iter()
            .find(|g| g.card.as_str() == card)
            .map(CardGroup::subtotal)
    }

    /// All purchases, across cards and the ungrouped set.
    pub fn purchases(&self) -> impl Iterator<Item = &LineRecord> {
        self.cards
            .iter()
            .flat_map(|g| g.records.iter())
            .chain(self.ungrouped.iter())
            .filter(|r| r.is_purchase())
    }

    pub fn purchase_total(&self) -> Decimal {
        sum_amounts(self.purchases())
    }

    pub fn tax_total(&self) -> Decimal {
        sum_amounts(&self.taxes)
    }

    pub fn payment_total(&self) -> Decimal {
        sum_payments(&self.payments)
    }

    pub fn foreign_payment_total(&self) -> Decimal {
        sum_payments(&self.foreign_payments)
    }

    /// Names of the totals that left the decimal range and were capped.
    pub fn capped_totals(&self) -> Vec<String> {
        let overflows = |amounts: Vec<Decimal>| checked_sum(amounts).is_none();

        let mut capped: Vec<String> = self
            .cards
            .iter()
            .filter(|g| overflows(g.purchases().map(|r| r.amount).collect()))
            .map(|g| format!("card {} subtotal", g.card))
            .collect();
        if overflows(self.purchases().map(|r| r.amount).collect()) {
            capped.push("purchase total".to_string());
        }
        if overflows(self.taxes.iter().map(|r| r.amount).collect()) {
            capped.push("tax total".to_string());
        }
        if overflows(self.payments.iter().map(|p| p.amount).collect()) {
            capped.push("payment total".to_string());
        }
        if overflows(self.foreign_payments.iter().map(|p| p.amount).collect()) {
            capped.push("foreign payment total".to_string());
        }
        capped
    }

    pub fn record_count(&self) -> usize {
        self.cards.iter().map(|g| g.records.len()).sum::<usize>() + self.ungrouped.len()
    }

    /// True when no line records were detected anywhere.
    pub fn is_empty(&self) -> bool {
        self.record_count() == 0 && self.taxes.is_empty()
    }

    /// Snapshot of every total, for output.
    pub fn totals(&self) -> Totals {
        Totals {
            cards: self
                .cards
                .iter()
                .map(|g| CardTotal {
                    card: g.card.clone(),
                    subtotal: g.subtotal(),
                    purchases: g.purchases().count(),
                })
                .collect(),
            purchase_total: self.purchase_total(),
            tax_total: self.tax_total(),
            payment_total: self.payment_total(),
            foreign_payment_total: self.foreign_payment_total(),
        }
    }
}

/// Subtotal line for one card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardTotal {
    pub card: CardSuffix,
    pub subtotal: Decimal,
    pub purchases: usize,
}

/// Point-in-time copy of the report totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub cards: Vec<CardTotal>,
    pub purchase_total: Decimal,
    pub tax_total: Decimal,
    pub payment_total: Decimal,
    pub foreign_payment_total: Decimal,
}
