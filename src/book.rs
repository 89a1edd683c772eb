//! §4.5 — per-symbol, two-sided, price-indexed aggregate-depth ladder.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use log::warn;

use crate::error::Diagnostics;
use crate::event::{BookOp, Side};
use crate::symbol::Symbol;

/// A flattened, fixed-depth view of a book at one instant (§6 `BookSink`
/// schema). Sentinel levels are `(0, 0)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub sec: u32,
    pub nano: u32,
    pub symbol: Symbol,
    pub bid_price: Vec<i64>,
    pub bid_shares: Vec<u32>,
    pub ask_price: Vec<i64>,
    pub ask_shares: Vec<u32>,
}

pub struct Book {
    symbol: Symbol,
    bids: BTreeMap<i64, u32>,
    asks: BTreeMap<i64, u32>,
    sec: u32,
    nano: u32,
}

impl Book {
    pub fn new(symbol: Symbol) -> Self {
        Book {
            symbol,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            sec: 0,
            nano: 0,
        }
    }

    /// Applies a resolved delta (§4.5). A delta against a price that
    /// isn't present is a defensive no-op unless it's a first-touch
    /// positive insertion.
    pub fn apply(&mut self, op: &BookOp, diag: &mut Diagnostics) {
        let side_map = match op.side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        };
        match side_map.entry(op.price) {
            Entry::Occupied(mut e) => {
                let updated = *e.get() as i64 + op.shares_delta;
                if updated <= 0 {
                    e.remove();
                } else {
                    *e.get_mut() = updated as u32;
                }
            }
            Entry::Vacant(e) => {
                if op.shares_delta > 0 {
                    e.insert(op.shares_delta as u32);
                }
                // else: target level never existed in this book; ignore.
            }
        }
        self.sec = op.sec;
        self.nano = op.nano;
        self.check_crossed(diag);
    }

    fn check_crossed(&self, diag: &mut Diagnostics) {
        if let (Some((&bid, _)), Some((&ask, _))) = (self.bids.iter().next_back(), self.asks.iter().next()) {
            if bid >= ask {
                diag.crossed_book += 1;
                warn!(
                    "crossed book for {}: best bid {} >= best ask {}",
                    self.symbol, bid, ask
                );
            }
        }
    }

    /// Top-N snapshot: bids strictly descending, asks strictly ascending,
    /// padded with `(0, 0)` sentinels to exactly `levels` entries.
    pub fn snapshot(&self, levels: usize) -> Snapshot {
        let mut bid_price = Vec::with_capacity(levels);
        let mut bid_shares = Vec::with_capacity(levels);
        for (&price, &shares) in self.bids.iter().rev().take(levels) {
            bid_price.push(price);
            bid_shares.push(shares);
        }
        bid_price.resize(levels, 0);
        bid_shares.resize(levels, 0);

        let mut ask_price = Vec::with_capacity(levels);
        let mut ask_shares = Vec::with_capacity(levels);
        for (&price, &shares) in self.asks.iter().take(levels) {
            ask_price.push(price);
            ask_shares.push(shares);
        }
        ask_price.resize(levels, 0);
        ask_shares.resize(levels, 0);

        Snapshot {
            sec: self.sec,
            nano: self.nano,
            symbol: self.symbol,
            bid_price,
            bid_shares,
            ask_price,
            ask_shares,
        }
    }

    #[cfg(test)]
    pub fn bid_levels(&self) -> &BTreeMap<i64, u32> {
        &self.bids
    }
}
