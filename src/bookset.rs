//! §4.6 — routes resolved book deltas to the right per-symbol book and
//! emits a snapshot for every mutating event.

use std::collections::HashMap;

use crate::book::{Book, Snapshot};
use crate::error::Diagnostics;
use crate::event::BookOp;
use crate::symbol::Symbol;

pub struct BookSet {
    books: HashMap<Symbol, Book>,
    levels: usize,
}

impl BookSet {
    /// Creates a book for every subscribed symbol up front; books live
    /// for the entire run (§3 Lifecycles).
    pub fn new(symbols: impl IntoIterator<Item = Symbol>, levels: usize) -> Self {
        let books = symbols.into_iter().map(|s| (s, Book::new(s))).collect();
        BookSet { books, levels }
    }

    pub fn is_subscribed(&self, symbol: &Symbol) -> bool {
        self.books.contains_key(symbol)
    }

    /// Applies `op` to the book for `op.symbol` and returns the resulting
    /// snapshot, or `None` if the symbol isn't subscribed (§4.6).
    pub fn apply(&mut self, op: &BookOp, diag: &mut Diagnostics) -> Option<Snapshot> {
        let book = self.books.get_mut(&op.symbol)?;
        book.apply(op, diag);
        Some(book.snapshot(self.levels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Side;

    #[test]
    fn unsubscribed_symbol_is_ignored() {
        let mut set = BookSet::new(["GOOG".parse().unwrap()], 2);
        let mut diag = Diagnostics::default();
        let op = BookOp {
            sec: 0,
            nano: 0,
            symbol: "AAPL".parse().unwrap(),
            side: Side::Bid,
            price: 100,
            shares_delta: 10,
        };
        assert!(set.apply(&op, &mut diag).is_none());
    }

    #[test]
    fn subscribed_symbol_yields_snapshot() {
        let mut set = BookSet::new(["GOOG".parse().unwrap()], 2);
        let mut diag = Diagnostics::default();
        let op = BookOp {
            sec: 1,
            nano: 2,
            symbol: "GOOG".parse().unwrap(),
            side: Side::Bid,
            price: 4_000_000,
            shares_delta: 100,
        };
        let snap = set.apply(&op, &mut diag).unwrap();
        assert_eq!(snap.bid_price[0], 4_000_000);
    }
}
