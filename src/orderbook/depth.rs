//! Cumulative depth aggregation and the display transform
//!
//! Aggregation always runs best-first. Asks are reversed afterwards for
//! display (worst ask on top, best ask next to the spread row); each displayed
//! row keeps the cumulative figures computed best-first for its own level.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::warn;

use super::spread::{compute_spread, Spread};
use super::Side;
use crate::parser::{OrderBookSnapshot, PriceLevel};

/// Running totals from the best price out to one level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedLevel {
    /// Sum of base quantity from the best level up to this one
    pub cumulative_quantity: Decimal,
    /// Sum of `price * quantity` over the same levels
    pub cumulative_notional: Decimal,
    /// Average fill price for sweeping the book up to this level
    pub average_price: Decimal,
}

/// Data-quality problems found while aggregating a side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnapshotAnomaly {
    /// Price at `index` does not improve on the previous level's ordering
    NonMonotonicPrice { side: Side, index: usize },
    /// Quantity at `index` is zero or negative
    NonPositiveQuantity { side: Side, index: usize },
    /// Running totals overflow at `index`; aggregation stops before it
    Overflow { side: Side, index: usize },
    /// A side is empty or the best bid is not positive, so no spread exists
    InvalidTopOfBook,
    /// Best ask is below best bid
    CrossedBook,
}

impl SnapshotAnomaly {
    pub fn kind(&self) -> &'static str {
        match self {
            SnapshotAnomaly::NonMonotonicPrice { .. } => "non_monotonic_price",
            SnapshotAnomaly::NonPositiveQuantity { .. } => "non_positive_quantity",
            SnapshotAnomaly::Overflow { .. } => "overflow",
            SnapshotAnomaly::InvalidTopOfBook => "invalid_top_of_book",
            SnapshotAnomaly::CrossedBook => "crossed_book",
        }
    }
}

/// Aggregation result for one side, index-aligned with the input levels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SideDepth {
    pub side: Side,
    pub levels: Vec<AggregatedLevel>,
    pub anomalies: Vec<SnapshotAnomaly>,
}

impl SideDepth {
    pub fn is_well_formed(&self) -> bool {
        self.anomalies.is_empty()
    }

    /// Total quantity on the side
    pub fn total_quantity(&self) -> Decimal {
        self.levels
            .last()
            .map(|level| level.cumulative_quantity)
            .unwrap_or(Decimal::ZERO)
    }
}

/// Aggregate a side given in best-first order.
///
/// Empty input yields an empty result. Out-of-order prices and non-positive
/// quantities are reported in [`SideDepth::anomalies`] rather than fixed up.
/// If the running totals overflow, an [`SnapshotAnomaly::Overflow`] is
/// recorded and `levels` ends before the offending level.
pub fn aggregate(levels: &[PriceLevel], side: Side) -> SideDepth {
    let mut anomalies = Vec::new();
    let mut aggregated = Vec::with_capacity(levels.len());
    let mut quantity = Decimal::ZERO;
    let mut notional = Decimal::ZERO;

    for (index, level) in levels.iter().enumerate() {
        if level.quantity <= Decimal::ZERO {
            anomalies.push(SnapshotAnomaly::NonPositiveQuantity { side, index });
        }
        if index > 0 && !side.is_ordered(levels[index - 1].price, level.price) {
            anomalies.push(SnapshotAnomaly::NonMonotonicPrice { side, index });
        }

        let totals = level.notional().and_then(|level_notional| {
            Some((
                quantity.checked_add(level.quantity)?,
                notional.checked_add(level_notional)?,
            ))
        });
        let Some((next_quantity, next_notional)) = totals else {
            anomalies.push(SnapshotAnomaly::Overflow { side, index });
            break;
        };
        quantity = next_quantity;
        notional = next_notional;

        aggregated.push(AggregatedLevel {
            cumulative_quantity: quantity,
            cumulative_notional: notional,
            average_price: notional.checked_div(quantity).unwrap_or(Decimal::ZERO),
        });
    }

    if !anomalies.is_empty() {
        warn!(
            side = ?side,
            levels = levels.len(),
            anomalies = anomalies.len(),
            first = ?anomalies[0],
            "Malformed order book side"
        );
    }

    SideDepth {
        side,
        levels: aggregated,
        anomalies,
    }
}

/// Largest single-level quantity on a side
pub fn max_quantity(levels: &[PriceLevel]) -> Option<Decimal> {
    levels.iter().map(|level| level.quantity).max()
}

/// Width of a depth bar in percent of the largest level on the side
pub fn bar_width(quantity: Decimal, max_quantity: Decimal) -> Decimal {
    if max_quantity <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    quantity
        .checked_div(max_quantity)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

/// Rows highlighted when hovering displayed row `hovered`: every row between
/// the spread and the hovered one, inclusive.
pub fn highlight_range(side: Side, hovered: usize, len: usize) -> Range<usize> {
    if hovered >= len {
        return 0..0;
    }
    match side {
        // asks are displayed worst first, the spread sits below the last row
        Side::Ask => hovered..len,
        Side::Bid => 0..hovered + 1,
    }
}

/// One displayed order book row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthRow {
    pub price: Decimal,
    pub quantity: Decimal,
    pub depth: AggregatedLevel,
    /// Depth bar width in percent
    pub bar_width: Decimal,
}

/// Rows for one side in display order
pub fn display_rows(levels: &[PriceLevel], depth: &SideDepth) -> Vec<DepthRow> {
    let max = max_quantity(levels).unwrap_or(Decimal::ZERO);
    let rows = levels.iter().zip(&depth.levels).map(|(level, aggregated)| DepthRow {
        price: level.price,
        quantity: level.quantity,
        depth: *aggregated,
        bar_width: bar_width(level.quantity, max),
    });

    match depth.side {
        Side::Ask => rows.rev().collect(),
        Side::Bid => rows.collect(),
    }
}

/// Display-ready order book: asks worst-first, spread, bids best-first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthView {
    pub asks: Vec<DepthRow>,
    pub spread: Option<Spread>,
    pub bids: Vec<DepthRow>,
    pub anomalies: Vec<SnapshotAnomaly>,
}

impl DepthView {
    pub fn build(snapshot: &OrderBookSnapshot) -> Self {
        let bid_depth = aggregate(&snapshot.bids, Side::Bid);
        let ask_depth = aggregate(&snapshot.asks, Side::Ask);

        let mut anomalies = bid_depth.anomalies.clone();
        anomalies.extend_from_slice(&ask_depth.anomalies);

        let spread = match compute_spread(
            snapshot.best_bid().map(|level| level.price),
            snapshot.best_ask().map(|level| level.price),
        ) {
            Ok(spread) => Some(spread),
            Err(e) => {
                warn!(error = %e, "No spread for order book snapshot");
                anomalies.push(SnapshotAnomaly::InvalidTopOfBook);
                None
            }
        };
        if spread.is_some_and(|s| s.is_crossed()) {
            anomalies.push(SnapshotAnomaly::CrossedBook);
        }

        Self {
            asks: display_rows(&snapshot.asks, &ask_depth),
            spread,
            bids: display_rows(&snapshot.bids, &bid_depth),
            anomalies,
        }
    }

    /// View of a book that has not received a snapshot yet
    pub fn empty() -> Self {
        Self {
            asks: Vec::new(),
            spread: None,
            bids: Vec::new(),
            anomalies: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.asks.is_empty() && self.bids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn level(price: Decimal, quantity: Decimal) -> PriceLevel {
        PriceLevel::new(price, quantity)
    }

    fn asks() -> Vec<PriceLevel> {
        vec![
            level(dec!(4.12), dec!(10)),
            level(dec!(4.13), dec!(30)),
            level(dec!(4.15), dec!(5)),
            level(dec!(4.20), dec!(55)),
        ]
    }

    fn bids() -> Vec<PriceLevel> {
        vec![
            level(dec!(4.10), dec!(20)),
            level(dec!(4.08), dec!(40)),
            level(dec!(4.05), dec!(10)),
        ]
    }

    #[test]
    fn test_empty_side() {
        let depth = aggregate(&[], Side::Bid);
        assert!(depth.levels.is_empty());
        assert!(depth.is_well_formed());
        assert_eq!(depth.total_quantity(), Decimal::ZERO);
    }

    #[test]
    fn test_cumulative_sums() {
        let depth = aggregate(&asks(), Side::Ask);
        assert!(depth.is_well_formed());
        assert_eq!(depth.levels.len(), 4);

        assert_eq!(depth.levels[0].cumulative_quantity, dec!(10));
        assert_eq!(depth.levels[0].cumulative_notional, dec!(41.20));
        assert_eq!(depth.levels[0].average_price, dec!(4.12));

        // 41.20 + 123.90
        assert_eq!(depth.levels[1].cumulative_quantity, dec!(40));
        assert_eq!(depth.levels[1].cumulative_notional, dec!(165.10));
        assert_eq!(depth.levels[1].average_price, dec!(4.1275));
    }

    #[test]
    fn test_cumulative_quantity_is_monotonic_and_totals() {
        for (levels, side) in [(asks(), Side::Ask), (bids(), Side::Bid)] {
            let depth = aggregate(&levels, side);
            for pair in depth.levels.windows(2) {
                assert!(pair[1].cumulative_quantity >= pair[0].cumulative_quantity);
            }
            let total: Decimal = levels.iter().map(|l| l.quantity).sum();
            assert_eq!(depth.total_quantity(), total);
        }
    }

    #[test]
    fn test_average_price_within_seen_range() {
        for (levels, side) in [(asks(), Side::Ask), (bids(), Side::Bid)] {
            let depth = aggregate(&levels, side);
            for (i, aggregated) in depth.levels.iter().enumerate() {
                let seen = &levels[..=i];
                let min = seen.iter().map(|l| l.price).min().unwrap();
                let max = seen.iter().map(|l| l.price).max().unwrap();
                assert!(aggregated.average_price >= min, "index {i}");
                assert!(aggregated.average_price <= max, "index {i}");
                assert_eq!(
                    aggregated.average_price,
                    aggregated.cumulative_notional / aggregated.cumulative_quantity
                );
            }
        }
    }

    #[test]
    fn test_non_monotonic_prices_flagged() {
        let mut levels = bids();
        levels.swap(1, 2);
        let depth = aggregate(&levels, Side::Bid);
        assert_eq!(
            depth.anomalies,
            vec![SnapshotAnomaly::NonMonotonicPrice {
                side: Side::Bid,
                index: 1
            }]
        );
        // still aggregated over the given order
        assert_eq!(depth.levels.len(), 3);

        let mut levels = asks();
        levels[1].price = levels[0].price;
        let depth = aggregate(&levels, Side::Ask);
        assert_eq!(depth.anomalies.len(), 1);
    }

    #[test]
    fn test_non_positive_quantity_flagged() {
        let levels = vec![level(dec!(1), dec!(0))];
        let depth = aggregate(&levels, Side::Ask);
        assert_eq!(
            depth.anomalies,
            vec![SnapshotAnomaly::NonPositiveQuantity {
                side: Side::Ask,
                index: 0
            }]
        );
        assert_eq!(depth.levels[0].average_price, Decimal::ZERO);
    }

    #[test]
    fn test_ask_display_order_keeps_best_first_depth() {
        let levels = asks();
        let depth = aggregate(&levels, Side::Ask);
        let rows = display_rows(&levels, &depth);

        // worst ask on top, best ask adjacent to the spread
        assert_eq!(rows.first().unwrap().price, dec!(4.20));
        assert_eq!(rows.last().unwrap().price, dec!(4.12));

        for (display_index, row) in rows.iter().enumerate() {
            let aggregation_index = levels.len() - 1 - display_index;
            assert_eq!(row.depth, depth.levels[aggregation_index]);
        }

        // the best ask carries the smallest cumulative quantity
        let smallest = rows.iter().map(|r| r.depth.cumulative_quantity).min().unwrap();
        assert_eq!(depth.levels[0].cumulative_quantity, smallest);
        assert_eq!(rows.last().unwrap().depth.cumulative_quantity, dec!(10));
        assert_eq!(rows.first().unwrap().depth.cumulative_quantity, dec!(100));
    }

    #[test]
    fn test_bid_display_order_unchanged() {
        let levels = bids();
        let depth = aggregate(&levels, Side::Bid);
        let rows = display_rows(&levels, &depth);
        assert_eq!(rows[0].price, dec!(4.10));
        assert_eq!(rows[0].depth.cumulative_quantity, dec!(20));
        assert_eq!(rows[2].depth.cumulative_quantity, dec!(70));
    }

    #[test]
    fn test_bar_width_uses_single_level_max() {
        let levels = asks();
        let depth = aggregate(&levels, Side::Ask);
        let rows = display_rows(&levels, &depth);
        // 55 is the largest single level
        assert_eq!(rows[0].bar_width, dec!(100));
        let best = rows.last().unwrap();
        assert_eq!(best.bar_width, dec!(10) / dec!(55) * dec!(100));
        assert_eq!(bar_width(dec!(1), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_highlight_range() {
        assert_eq!(highlight_range(Side::Ask, 1, 4), 1..4);
        assert_eq!(highlight_range(Side::Ask, 3, 4), 3..4);
        assert_eq!(highlight_range(Side::Bid, 0, 3), 0..1);
        assert_eq!(highlight_range(Side::Bid, 2, 3), 0..3);
        assert_eq!(highlight_range(Side::Bid, 5, 3), 0..0);
    }

    #[test]
    fn test_depth_view() {
        let snapshot = OrderBookSnapshot {
            timestamp: None,
            bids: bids(),
            asks: asks(),
        };
        let view = DepthView::build(&snapshot);
        assert!(view.anomalies.is_empty());
        assert_eq!(view.asks.len(), 4);
        assert_eq!(view.bids.len(), 3);
        assert_eq!(view.spread.unwrap().amount, dec!(0.02));
    }

    #[test]
    fn test_depth_view_flags_crossed_book() {
        let snapshot = OrderBookSnapshot {
            timestamp: None,
            bids: vec![level(dec!(4.15), dec!(1))],
            asks: vec![level(dec!(4.12), dec!(1))],
        };
        let view = DepthView::build(&snapshot);
        assert_eq!(view.anomalies, vec![SnapshotAnomaly::CrossedBook]);
        assert_eq!(view.spread.unwrap().amount, dec!(-0.03));
    }

    #[test]
    fn test_depth_view_empty_book() {
        let view = DepthView::build(&OrderBookSnapshot::default());
        assert!(view.is_empty());
        assert!(view.spread.is_none());
        assert_eq!(view.anomalies, vec![SnapshotAnomaly::InvalidTopOfBook]);
    }

    #[test]
    fn test_depth_view_one_sided_book() {
        let snapshot = OrderBookSnapshot {
            timestamp: None,
            bids: bids(),
            asks: Vec::new(),
        };
        let view = DepthView::build(&snapshot);
        assert_eq!(view.bids.len(), 3);
        assert!(view.spread.is_none());
        assert_eq!(view.anomalies, vec![SnapshotAnomaly::InvalidTopOfBook]);

        let snapshot = OrderBookSnapshot {
            timestamp: None,
            bids: vec![level(dec!(0), dec!(5))],
            asks: asks(),
        };
        let view = DepthView::build(&snapshot);
        assert!(view.anomalies.contains(&SnapshotAnomaly::InvalidTopOfBook));
    }

    #[test]
    fn test_overflowing_quantity_stops_aggregation() {
        let levels = vec![
            level(dec!(4.10), dec!(20)),
            level(dec!(4.09), Decimal::MAX),
            level(dec!(4.08), dec!(1)),
        ];
        let depth = aggregate(&levels, Side::Bid);
        assert_eq!(
            depth.anomalies,
            vec![SnapshotAnomaly::Overflow {
                side: Side::Bid,
                index: 1
            }]
        );
        assert_eq!(depth.levels.len(), 1);
        assert_eq!(depth.total_quantity(), dec!(20));
    }

    #[test]
    fn test_depth_view_survives_overflowing_snapshot() {
        let raw = r#"{"bids":[["4","79228162514264337593543950335"]],"asks":[["5","1"]]}"#;
        let snapshot = crate::parser::parse_orderbook(raw).unwrap();
        let view = DepthView::build(&snapshot);
        assert!(view.bids.is_empty());
        assert_eq!(view.asks.len(), 1);
        assert_eq!(
            view.anomalies,
            vec![SnapshotAnomaly::Overflow {
                side: Side::Bid,
                index: 0
            }]
        );
        assert_eq!(view.spread.unwrap().amount, dec!(1));
    }

    #[test]
    fn test_bar_width_overflow_is_zero() {
        assert_eq!(bar_width(Decimal::MIN, dec!(0.0000001)), Decimal::ZERO);
    }
}
