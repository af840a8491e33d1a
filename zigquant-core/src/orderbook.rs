use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use zigquant_decimal::Decimal;

/// A single price level in an order book side.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub price: Decimal,
    pub size: Decimal,
    pub num_orders: u32,
}

/// Whether an update replaces the book entirely or patches existing levels.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum BookUpdateKind {
    Snapshot,
    Delta,
}

/// A depth order book for one symbol, bids descending by price and asks
/// ascending by price.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Orderbook {
    pub timestamp: Timestamp,
    bids: Vec<Level>,
    asks: Vec<Level>,
}

impl Orderbook {
    pub fn new(timestamp: Timestamp, bids: Vec<Level>, asks: Vec<Level>) -> Self {
        let mut book = Self {
            timestamp,
            bids,
            asks,
        };
        book.sort();
        book
    }

    fn sort(&mut self) {
        self.bids
            .sort_by(|a, b| b.price.partial_cmp(&a.price).unwrap());
        self.asks
            .sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap());
    }

    pub fn bids(&self) -> &[Level] {
        &self.bids
    }

    pub fn asks(&self) -> &[Level] {
        &self.asks
    }

    /// Highest bid, or `None` if the book's bid side has no depth.
    pub fn best_bid(&self) -> Option<Level> {
        self.bids.first().copied()
    }

    /// Lowest ask, or `None` if the book's ask side has no depth.
    pub fn best_ask(&self) -> Option<Level> {
        self.asks.first().copied()
    }

    /// Midpoint of best bid and best ask; `None` unless both sides have
    /// depth.
    pub fn mid_price(&self) -> Option<Decimal> {
        let bid = self.best_bid()?.price;
        let ask = self.best_ask()?.price;
        Some((bid + ask) / Decimal::from_int(2))
    }

    /// Applies a delta: levels with zero size are removed, others are
    /// inserted or replaced, keeping each side sorted.
    pub fn apply_delta(&mut self, timestamp: Timestamp, bid_updates: &[Level], ask_updates: &[Level]) {
        self.timestamp = timestamp;
        Self::apply_side(&mut self.bids, bid_updates);
        Self::apply_side(&mut self.asks, ask_updates);
        self.sort();
    }

    fn apply_side(side: &mut Vec<Level>, updates: &[Level]) {
        for update in updates {
            side.retain(|level| level.price != update.price);
            if !update.size.is_zero() {
                side.push(*update);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(price: i64, size: i64) -> Level {
        Level {
            price: Decimal::from_int(price),
            size: Decimal::from_int(size),
            num_orders: 1,
        }
    }

    #[test]
    fn best_bid_and_ask_are_none_on_empty_book() {
        let book = Orderbook::new(Timestamp(0), vec![], vec![]);
        assert!(book.best_bid().is_none());
        assert!(book.best_ask().is_none());
        assert!(book.mid_price().is_none());
    }

    #[test]
    fn sorts_bids_descending_and_asks_ascending() {
        let book = Orderbook::new(
            Timestamp(0),
            vec![level(100, 1), level(102, 1), level(101, 1)],
            vec![level(105, 1), level(103, 1), level(104, 1)],
        );
        assert_eq!(book.bids()[0].price, Decimal::from_int(102));
        assert_eq!(book.asks()[0].price, Decimal::from_int(103));
    }

    #[test]
    fn mid_price_averages_best_bid_and_ask() {
        let book = Orderbook::new(Timestamp(0), vec![level(100, 1)], vec![level(102, 1)]);
        assert_eq!(book.mid_price(), Some(Decimal::from_int(101)));
    }

    #[test]
    fn delta_removes_zero_size_levels_and_keeps_sort_order() {
        let mut book = Orderbook::new(Timestamp(0), vec![level(100, 1), level(99, 1)], vec![level(101, 1)]);
        book.apply_delta(
            Timestamp(1),
            &[Level {
                price: Decimal::from_int(100),
                size: Decimal::ZERO,
                num_orders: 0,
            }, level(98, 2)],
            &[],
        );
        assert_eq!(book.bids().len(), 2);
        assert_eq!(book.bids()[0].price, Decimal::from_int(99));
        assert_eq!(book.bids()[1].price, Decimal::from_int(98));
    }
}
