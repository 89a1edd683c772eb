//! §4.4 — the order registry: the hinge between refno-keyed wire events
//! and price/side-keyed book mutations.

use std::collections::HashMap;

use log::warn;

use crate::error::Diagnostics;
use crate::event::{BookOp, Event, PendingEvent, Side};
use crate::symbol::Symbol;

#[derive(Debug, Clone, Copy)]
pub struct RestingOrder {
    pub symbol: Symbol,
    pub side: Side,
    pub price: i64,
    pub shares: u32,
}

/// Outcome of resolving one [`PendingEvent`] (§4.4). A wire `'U'` message
/// splits into an informational `Replace` marker (already emitted by the
/// normalizer, §4.3) plus two halves that only drive the book — ground
/// truth's `unpack()` calls `messagelist.add` exactly once per `'U'`, for
/// the marker, never for the synthetic delete/add — so the two halves
/// come back as [`ResolvedEvent::BookOnly`] rather than a message.
pub enum ResolvedEvent {
    /// A fully resolved event that reaches `MessageSink` and, if it
    /// carries a book delta, `BookSink`.
    Message(Event, Option<BookOp>),
    /// A replace-half: drives the book only, no `MessageSink` traffic.
    BookOnly(Option<BookOp>),
}

#[derive(Default)]
pub struct OrderRegistry {
    orders: HashMap<u64, RestingOrder>,
}

impl OrderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Inserts a new resting order. A duplicate refno is a feed violation:
    /// recoverable, logged, and the entry is overwritten (§7).
    pub fn add(&mut self, refno: u64, order: RestingOrder, diag: &mut Diagnostics) {
        if self.orders.insert(refno, order).is_some() {
            diag.duplicate_add += 1;
            warn!("duplicate refno {refno} on Add; overwriting resting order");
        }
    }

    /// Resolves a refno-only event against the resting-order table,
    /// mutating that table in the same step (§4.4's `resolve`/`apply`
    /// combined, since neither the spec nor any external caller observes
    /// an intermediate state between them). Returns `None` when the
    /// refno is unknown — tolerated silently per §4.4's last bullet.
    pub fn resolve(&mut self, pending: PendingEvent, diag: &mut Diagnostics) -> Option<ResolvedEvent> {
        match pending {
            PendingEvent::Execute {
                sec,
                nano,
                refno,
                shares_executed,
            } => {
                let order = self.orders.get_mut(&refno)?;
                let executed = clamp_to_resting(shares_executed, order.shares, diag);
                let book_op = BookOp {
                    sec,
                    nano,
                    symbol: order.symbol,
                    side: order.side,
                    price: order.price,
                    shares_delta: -(executed as i64),
                };
                decrement_or_remove(&mut self.orders, refno, executed);
                Some(ResolvedEvent::Message(
                    Event::Execute {
                        sec,
                        nano,
                        refno,
                        shares_executed,
                    },
                    Some(book_op),
                ))
            }
            PendingEvent::ExecuteWithPrice {
                sec,
                nano,
                refno,
                shares_executed,
                price,
            } => {
                let order = self.orders.get_mut(&refno)?;
                let resting_price = order.price;
                let executed = clamp_to_resting(shares_executed, order.shares, diag);
                let book_op = BookOp {
                    sec,
                    nano,
                    symbol: order.symbol,
                    side: order.side,
                    price: resting_price,
                    shares_delta: -(executed as i64),
                };
                decrement_or_remove(&mut self.orders, refno, executed);
                Some(ResolvedEvent::Message(
                    Event::ExecuteWithPrice {
                        sec,
                        nano,
                        refno,
                        shares_executed,
                        price,
                        resting_price,
                    },
                    Some(book_op),
                ))
            }
            PendingEvent::Cancel {
                sec,
                nano,
                refno,
                shares_cancelled,
            } => {
                let order = self.orders.get_mut(&refno)?;
                let cancelled = shares_cancelled.min(order.shares);
                let book_op = BookOp {
                    sec,
                    nano,
                    symbol: order.symbol,
                    side: order.side,
                    price: order.price,
                    shares_delta: -(cancelled as i64),
                };
                decrement_or_remove(&mut self.orders, refno, cancelled);
                Some(ResolvedEvent::Message(
                    Event::Cancel {
                        sec,
                        nano,
                        refno,
                        shares_cancelled,
                    },
                    Some(book_op),
                ))
            }
            PendingEvent::Delete { sec, nano, refno } => {
                let order = self.orders.remove(&refno)?;
                let book_op = BookOp {
                    sec,
                    nano,
                    symbol: order.symbol,
                    side: order.side,
                    price: order.price,
                    shares_delta: -(order.shares as i64),
                };
                Some(ResolvedEvent::Message(Event::Delete { sec, nano, refno }, Some(book_op)))
            }
            PendingEvent::ReplaceDelete { sec, nano, refno } => {
                // Physical removal is deferred to the paired `ReplaceAdd`
                // resolution below, which still needs this entry to
                // inherit symbol/side. Order-of-emission to the book
                // (delete before add) is preserved regardless, since the
                // book mutation is driven by the `BookOp` returned here,
                // not by registry removal timing.
                let order = self.orders.get(&refno).copied()?;
                let book_op = BookOp {
                    sec,
                    nano,
                    symbol: order.symbol,
                    side: order.side,
                    price: order.price,
                    shares_delta: -(order.shares as i64),
                };
                // No standalone sink-facing Event for this half: the
                // informational `Replace` marker already carries
                // old_refno/new_refno (§4.3), and ground truth's `unpack`
                // never calls `messagelist.add` for this half.
                Some(ResolvedEvent::BookOnly(Some(book_op)))
            }
            PendingEvent::ReplaceAdd {
                sec,
                nano,
                old_refno,
                new_refno,
                shares,
                price,
            } => {
                // Counted uniformly by the pipeline on a `None` return,
                // same as every other refno-keyed variant above.
                let order = self.orders.remove(&old_refno)?;
                self.orders.insert(
                    new_refno,
                    RestingOrder {
                        symbol: order.symbol,
                        side: order.side,
                        price,
                        shares,
                    },
                );
                let book_op = BookOp {
                    sec,
                    nano,
                    symbol: order.symbol,
                    side: order.side,
                    price,
                    shares_delta: shares as i64,
                };
                // No standalone sink-facing Event for this half either;
                // see the `ReplaceDelete` arm above.
                Some(ResolvedEvent::BookOnly(Some(book_op)))
            }
        }
    }
}

fn clamp_to_resting(requested: u32, resting: u32, diag: &mut Diagnostics) -> u32 {
    if requested > resting {
        diag.execute_exceeds_resting += 1;
        warn!("execute/cancel of {requested} shares exceeds resting {resting}; treating as zero-out");
        resting
    } else {
        requested
    }
}

fn decrement_or_remove(orders: &mut HashMap<u64, RestingOrder>, refno: u64, amount: u32) {
    if let Some(order) = orders.get_mut(&refno) {
        order.shares -= amount;
        if order.shares == 0 {
            orders.remove(&refno);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Symbol;

    fn goog() -> Symbol {
        "GOOG".parse().unwrap()
    }

    #[test]
    fn partial_execute_decrements_and_negates() {
        let mut reg = OrderRegistry::new();
        let mut diag = Diagnostics::default();
        reg.add(
            1,
            RestingOrder {
                symbol: goog(),
                side: Side::Bid,
                price: 4_000_000,
                shares: 100,
            },
            &mut diag,
        );
        let resolved = reg
            .resolve(
                PendingEvent::Execute {
                    sec: 0,
                    nano: 0,
                    refno: 1,
                    shares_executed: 30,
                },
                &mut diag,
            )
            .unwrap();
        let ResolvedEvent::Message(event, op) = resolved else {
            panic!("expected Message");
        };
        assert!(matches!(event, Event::Execute { shares_executed: 30, .. }));
        assert_eq!(op.unwrap().shares_delta, -30);
        assert_eq!(reg.orders.get(&1).unwrap().shares, 70);
    }

    #[test]
    fn delete_removes_entry_and_negates_full_size() {
        let mut reg = OrderRegistry::new();
        let mut diag = Diagnostics::default();
        reg.add(
            1,
            RestingOrder {
                symbol: goog(),
                side: Side::Bid,
                price: 4_000_000,
                shares: 70,
            },
            &mut diag,
        );
        let resolved = reg
            .resolve(PendingEvent::Delete { sec: 0, nano: 0, refno: 1 }, &mut diag)
            .unwrap();
        let ResolvedEvent::Message(_, op) = resolved else {
            panic!("expected Message");
        };
        assert_eq!(op.unwrap().shares_delta, -70);
        assert!(reg.is_empty());
    }

    #[test]
    fn unknown_refno_resolves_to_none() {
        let mut reg = OrderRegistry::new();
        let mut diag = Diagnostics::default();
        assert!(reg
            .resolve(PendingEvent::Delete { sec: 0, nano: 0, refno: 99 }, &mut diag)
            .is_none());
    }

    #[test]
    fn execute_exceeding_resting_clamps_and_zeroes_out() {
        let mut reg = OrderRegistry::new();
        let mut diag = Diagnostics::default();
        reg.add(
            1,
            RestingOrder {
                symbol: goog(),
                side: Side::Bid,
                price: 4_000_000,
                shares: 10,
            },
            &mut diag,
        );
        let resolved = reg
            .resolve(
                PendingEvent::Execute {
                    sec: 0,
                    nano: 0,
                    refno: 1,
                    shares_executed: 50,
                },
                &mut diag,
            )
            .unwrap();
        let ResolvedEvent::Message(_, op) = resolved else {
            panic!("expected Message");
        };
        assert_eq!(op.unwrap().shares_delta, -10);
        assert!(reg.is_empty());
        assert_eq!(diag.execute_exceeds_resting, 1);
    }

    #[test]
    fn replace_moves_entry_under_new_refno() {
        let mut reg = OrderRegistry::new();
        let mut diag = Diagnostics::default();
        reg.add(
            1,
            RestingOrder {
                symbol: goog(),
                side: Side::Bid,
                price: 4_000_000,
                shares: 100,
            },
            &mut diag,
        );
        let resolved = reg
            .resolve(PendingEvent::ReplaceDelete { sec: 0, nano: 0, refno: 1 }, &mut diag)
            .unwrap();
        let ResolvedEvent::BookOnly(del_op) = resolved else {
            panic!("expected BookOnly; replace halves must not reach MessageSink");
        };
        assert_eq!(del_op.unwrap().shares_delta, -100);

        let resolved = reg
            .resolve(
                PendingEvent::ReplaceAdd {
                    sec: 0,
                    nano: 0,
                    old_refno: 1,
                    new_refno: 2,
                    shares: 50,
                    price: 4_010_000,
                },
                &mut diag,
            )
            .unwrap();
        let ResolvedEvent::BookOnly(add_op) = resolved else {
            panic!("expected BookOnly; replace halves must not reach MessageSink");
        };
        let add_op = add_op.unwrap();
        assert_eq!(add_op.symbol.as_str(), "GOOG");
        assert_eq!(add_op.side, Side::Bid);
        assert_eq!(add_op.price, 4_010_000);
        assert_eq!(add_op.shares_delta, 50);
        assert!(reg.orders.contains_key(&2));
        assert!(!reg.orders.contains_key(&1));
    }
}
