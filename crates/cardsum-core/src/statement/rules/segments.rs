//! Per-card segmentation.
//!
//! A card boundary marker closes the block of the card it names: block *k*
//! runs from the end of marker *k-1* (or the start of the text) to the
//! start of marker *k*. Text after the last marker belongs to no card.

use tracing::debug;

use super::patterns::CARD_BOUNDARY;
use super::{ExtractionMatch, FieldExtractor};
use crate::models::statement::CardSuffix;

/// A span of statement text attributed to one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<'a> {
    /// `None` for the implicit block of a statement without markers.
    pub card: Option<CardSuffix>,
    pub text: &'a str,
}

/// Statement text split into disjoint card blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segments<'a> {
    /// Blocks in marker order.
    pub blocks: Vec<Block<'a>>,
    /// Text after the last marker; empty when there are no markers.
    pub trailer: &'a str,
}

impl Segments<'_> {
    /// True when the text had no boundary markers at all.
    pub fn is_implicit(&self) -> bool {
        matches!(self.blocks.as_slice(), [Block { card: None, .. }])
    }

    /// Card suffixes in marker order.
    pub fn cards(&self) -> Vec<&CardSuffix> {
        self.blocks.iter().filter_map(|b| b.card.as_ref()).collect()
    }
}

/// Card boundary marker extractor.
#[derive(Debug, Default)]
pub struct BoundaryExtractor;

impl FieldExtractor for BoundaryExtractor {
    type Output = ExtractionMatch<CardSuffix>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        CARD_BOUNDARY
            .captures_iter(text)
            .filter_map(|caps| {
                let full = caps.get(0)?;
                let card = CardSuffix::new(caps.get(1)?.as_str())?;
                Some(
                    ExtractionMatch::new(card, full.as_str())
                        .with_position(full.start(), full.end()),
                )
            })
            .collect()
    }
}

/// Split the statement text into per-card blocks.
pub fn segment(text: &str) -> Segments<'_> {
    let markers = BoundaryExtractor.extract_all(text);

    if markers.is_empty() {
        debug!("No card boundary markers, using one implicit block");
        return Segments {
            blocks: vec![Block { card: None, text }],
            trailer: "",
        };
    }

    let mut blocks = Vec::with_capacity(markers.len());
    let mut cursor = 0;
    for marker in markers {
        let (start, end) = (marker.start(), marker.end());
        blocks.push(Block {
            card: Some(marker.value),
            text: &text[cursor..start],
        });
        cursor = end;
    }

    debug!(blocks = blocks.len(), "Statement segmented");
    Segments {
        blocks,
        trailer: &text[cursor..],
    }
}
