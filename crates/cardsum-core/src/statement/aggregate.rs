//! Grouping of classified records into the statement report.

use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use super::rules::ClassifiedBlock;
use crate::models::statement::{CardGroup, CardSuffix, LineRecord, StatementReport};

/// Accumulates classified blocks into card groups and the tax set.
#[derive(Debug, Default)]
pub struct Aggregator {
    cards: Vec<CardGroup>,
    ungrouped: Vec<LineRecord>,
    taxes: Vec<LineRecord>,
    seen_taxes: HashSet<(NaiveDate, String, Decimal)>,
    credits: Vec<LineRecord>,
    warnings: Vec<String>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the records of one block.
    ///
    /// A card seen twice gets its records appended to the first group.
    pub fn add_block(&mut self, card: Option<CardSuffix>, block: ClassifiedBlock) {
        self.absorb_side_outputs(block.credits, block.warnings);

        for record in &block.records {
            if record.is_tax() {
                self.add_tax(record.clone());
            }
        }

        match card {
            Some(card) => {
                let index = match self.cards.iter().position(|g| g.card == card) {
                    Some(i) => i,
                    None => {
                        self.cards.push(CardGroup::new(card));
                        self.cards.len() - 1
                    }
                };
                self.cards[index].records.extend(block.records);
            }
            None => self.ungrouped.extend(block.records),
        }
    }

    /// Add the records found after the last card marker.
    ///
    /// Only taxes are kept: they are statement-level charges. Purchases in
    /// that span belong to no card and are dropped.
    pub fn add_trailer(&mut self, block: ClassifiedBlock) {
        self.absorb_side_outputs(block.credits, block.warnings);

        for record in block.records {
            if record.is_tax() {
                self.add_tax(record);
            } else {
                debug!(
                    description = %record.description,
                    "Dropping purchase found after the last card marker"
                );
            }
        }
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Tax records are deduplicated on (date, concept, amount).
    fn add_tax(&mut self, record: LineRecord) {
        let key = (record.date, record.description.clone(), record.amount);
        if self.seen_taxes.insert(key) {
            self.taxes.push(record);
        } else {
            debug!(description = %record.description, "Duplicate tax line");
        }
    }

    fn absorb_side_outputs(&mut self, credits: Vec<LineRecord>, warnings: Vec<String>) {
        self.credits.extend(credits);
        self.warnings.extend(warnings);
    }

    /// Fold the accumulated records into `report`.
    pub fn finish(self, mut report: StatementReport) -> StatementReport {
        report.cards = self.cards;
        report.ungrouped = self.ungrouped;
        report.taxes = self.taxes;
        report.credits = self.credits;
        report.warnings.extend(self.warnings);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::statement::Category;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn record(day: u32, desc: &str, amount: &str, category: Category) -> LineRecord {
        LineRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            description: desc.to_string(),
            installment: None,
            amount: Decimal::from_str(amount).unwrap(),
            category,
        }
    }

    fn block(records: Vec<LineRecord>) -> ClassifiedBlock {
        ClassifiedBlock {
            records,
            ..Default::default()
        }
    }

    #[test]
    fn test_identical_tax_triples_collapse() {
        let mut agg = Aggregator::new();
        agg.add_block(
            CardSuffix::new("1111"),
            block(vec![
                record(25, "IVA RG 4240", "21.00", Category::Tax),
                record(25, "IVA RG 4240", "21.00", Category::Tax),
            ]),
        );
        agg.add_trailer(block(vec![
            record(25, "IVA RG 4240", "21.00", Category::Tax),
            record(25, "IVA RG 4240", "21.01", Category::Tax),
            record(26, "IVA RG 4240", "21.00", Category::Tax),
            record(25, "IVA RG 4815", "21.00", Category::Tax),
        ]));

        let report = agg.finish(StatementReport::default());
        let amounts: Vec<String> = report
            .taxes
            .iter()
            .map(|t| format!("{} {} {}", t.date, t.description, t.amount))
            .collect();

        assert_eq!(
            amounts,
            vec![
                "2024-01-25 IVA RG 4240 21.00",
                "2024-01-25 IVA RG 4240 21.01",
                "2024-01-26 IVA RG 4240 21.00",
                "2024-01-25 IVA RG 4815 21.00",
            ]
        );
        assert_eq!(report.tax_total(), Decimal::from_str("84.01").unwrap());
    }

    #[test]
    fn test_repeated_card_merges_into_first_group() {
        let mut agg = Aggregator::new();
        agg.add_block(
            CardSuffix::new("1111"),
            block(vec![record(1, "A", "10.00", Category::Purchase)]),
        );
        agg.add_block(
            CardSuffix::new("2222"),
            block(vec![record(2, "B", "20.00", Category::Purchase)]),
        );
        agg.add_block(
            CardSuffix::new("1111"),
            block(vec![record(3, "C", "30.00", Category::Purchase)]),
        );

        let report = agg.finish(StatementReport::default());
        assert_eq!(report.cards.len(), 2);
        assert_eq!(report.cards[0].card.as_str(), "1111");
        assert_eq!(report.card_subtotal("1111"), Some(Decimal::from_str("40.00").unwrap()));
        assert_eq!(report.card_subtotal("2222"), Some(Decimal::from_str("20.00").unwrap()));
    }

    #[test]
    fn test_trailer_purchases_are_dropped() {
        let mut agg = Aggregator::new();
        agg.add_trailer(block(vec![
            record(1, "AMAZON", "10.00", Category::Purchase),
            record(1, "IVA", "2.10", Category::Tax),
        ]));

        let report = agg.finish(StatementReport::default());
        assert_eq!(report.purchase_total(), Decimal::ZERO);
        assert_eq!(report.taxes.len(), 1);
    }

    #[test]
    fn test_ungrouped_records() {
        let mut agg = Aggregator::new();
        agg.add_block(None, block(vec![record(1, "AMAZON", "10.00", Category::Purchase)]));

        let report = agg.finish(StatementReport::default());
        assert!(report.cards.is_empty());
        assert_eq!(report.ungrouped.len(), 1);
        assert_eq!(report.purchase_total(), Decimal::from_str("10.00").unwrap());
    }
}
