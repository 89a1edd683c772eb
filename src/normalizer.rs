//! §4.3 — folds `T` messages into a running clock, resolves each event's
//! wire time into `(sec, nano)`, and splits `Replace` into the
//! three-event form canonical per `prickle/core.py` (§9 Open Question).

use smallvec::SmallVec;

use crate::event::{Event, PendingEvent, RawEvent, RawTime};

/// A raw event never normalizes to more than the replace-split's three
/// outputs (marker + synthetic delete + synthetic add); inline storage
/// avoids a heap allocation per message, matching the teacher's own use
/// of `smallvec` for short-lived per-packet buffers.
pub type NormalizedBuf = SmallVec<[NormalizedEvent; 3]>;

pub struct Normalizer {
    current_sec: u32,
}

impl Normalizer {
    pub fn new() -> Self {
        Normalizer { current_sec: 0 }
    }

    fn resolve_time(&self, time: RawTime) -> (u32, u32) {
        match time {
            RawTime::SubSecond(nano) => (self.current_sec, nano),
            RawTime::Absolute(nano) => ((nano / 1_000_000_000) as u32, (nano % 1_000_000_000) as u32),
        }
    }

    /// Folds one decoder output into zero or more normalized outputs, fed
    /// in emission order to [`crate::pipeline::Pipeline`].
    pub fn normalize(&mut self, raw: RawEvent, out: &mut NormalizedBuf) {
        match raw {
            RawEvent::Clock(sec) => {
                self.current_sec = sec;
            }
            RawEvent::SystemEvent { time, code } => {
                let (sec, nano) = self.resolve_time(time);
                out.push(NormalizedEvent::Ready(Event::SystemEvent { sec, nano, code }));
            }
            RawEvent::TradingAction { time, symbol, state } => {
                let (sec, nano) = self.resolve_time(time);
                out.push(NormalizedEvent::Ready(Event::TradingAction {
                    sec,
                    nano,
                    symbol,
                    state,
                }));
            }
            RawEvent::Add {
                time,
                refno,
                side,
                shares,
                symbol,
                price,
                mpid,
            } => {
                let (sec, nano) = self.resolve_time(time);
                out.push(NormalizedEvent::Ready(Event::Add {
                    sec,
                    nano,
                    refno,
                    side,
                    shares,
                    symbol,
                    price,
                    mpid,
                }));
            }
            RawEvent::Execute {
                time,
                refno,
                shares_executed,
            } => {
                let (sec, nano) = self.resolve_time(time);
                out.push(NormalizedEvent::Pending(PendingEvent::Execute {
                    sec,
                    nano,
                    refno,
                    shares_executed,
                }));
            }
            RawEvent::ExecuteWithPrice {
                time,
                refno,
                shares_executed,
                price,
            } => {
                let (sec, nano) = self.resolve_time(time);
                out.push(NormalizedEvent::Pending(PendingEvent::ExecuteWithPrice {
                    sec,
                    nano,
                    refno,
                    shares_executed,
                    price,
                }));
            }
            RawEvent::Cancel {
                time,
                refno,
                shares_cancelled,
            } => {
                let (sec, nano) = self.resolve_time(time);
                out.push(NormalizedEvent::Pending(PendingEvent::Cancel {
                    sec,
                    nano,
                    refno,
                    shares_cancelled,
                }));
            }
            RawEvent::Delete { time, refno } => {
                let (sec, nano) = self.resolve_time(time);
                out.push(NormalizedEvent::Pending(PendingEvent::Delete { sec, nano, refno }));
            }
            RawEvent::Replace {
                time,
                old_refno,
                new_refno,
                shares,
                price,
            } => {
                let (sec, nano) = self.resolve_time(time);
                // (1) informational marker, emitted before the two derived events (§4.3).
                out.push(NormalizedEvent::Ready(Event::Replace {
                    sec,
                    nano,
                    old_refno,
                    new_refno,
                    shares,
                    price,
                }));
                // (2) synthetic delete of the old order.
                out.push(NormalizedEvent::Pending(PendingEvent::ReplaceDelete {
                    sec,
                    nano,
                    refno: old_refno,
                }));
                // (3) synthetic add under the new refno, symbol/side inherited.
                out.push(NormalizedEvent::Pending(PendingEvent::ReplaceAdd {
                    sec,
                    nano,
                    old_refno,
                    new_refno,
                    shares,
                    price,
                }));
            }
            RawEvent::Trade {
                time,
                refno,
                side,
                shares,
                symbol,
                price,
            } => {
                let (sec, nano) = self.resolve_time(time);
                out.push(NormalizedEvent::Ready(Event::Trade {
                    sec,
                    nano,
                    refno,
                    side,
                    shares,
                    symbol,
                    price,
                }));
            }
            RawEvent::CrossTrade {
                time,
                symbol,
                shares,
                price,
                cross_type,
            } => {
                let (sec, nano) = self.resolve_time(time);
                out.push(NormalizedEvent::Ready(Event::CrossTrade {
                    sec,
                    nano,
                    symbol,
                    shares,
                    price,
                    cross_type,
                }));
            }
            RawEvent::NoiiIndicator {
                time,
                symbol,
                paired,
                imbalance,
                direction,
                far,
                near,
                current,
                cross_type,
            } => {
                let (sec, nano) = self.resolve_time(time);
                out.push(NormalizedEvent::Ready(Event::NoiiIndicator {
                    sec,
                    nano,
                    symbol,
                    paired,
                    imbalance,
                    direction,
                    far,
                    near,
                    current,
                    cross_type,
                }));
            }
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Output of normalization: either a fully-formed sink-facing `Event`
/// that needs no registry resolution, or a `PendingEvent` that does.
pub enum NormalizedEvent {
    Ready(Event),
    Pending(PendingEvent),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v4_clock_then_subsecond_event_combines() {
        let mut n = Normalizer::new();
        let mut out = NormalizedBuf::new();
        n.normalize(RawEvent::Clock(34_201), &mut out);
        assert!(out.is_empty());
        n.normalize(
            RawEvent::SystemEvent {
                time: RawTime::SubSecond(0),
                code: b'O',
            },
            &mut out,
        );
        match &out[0] {
            NormalizedEvent::Ready(Event::SystemEvent { sec, nano, .. }) => {
                assert_eq!(*sec, 34_201);
                assert_eq!(*nano, 0);
            }
            _ => panic!("expected SystemEvent"),
        }
    }

    #[test]
    fn v5_absolute_nanos_split() {
        let mut n = Normalizer::new();
        let mut out = NormalizedBuf::new();
        n.normalize(
            RawEvent::SystemEvent {
                time: RawTime::Absolute(34_201_123_456_789),
                code: b'O',
            },
            &mut out,
        );
        match &out[0] {
            NormalizedEvent::Ready(Event::SystemEvent { sec, nano, .. }) => {
                assert_eq!(*sec, 34_201);
                assert_eq!(*nano, 123_456_789);
            }
            _ => panic!("expected SystemEvent"),
        }
    }

    #[test]
    fn replace_emits_marker_then_delete_then_add_in_order() {
        let mut n = Normalizer::new();
        let mut out = NormalizedBuf::new();
        n.normalize(
            RawEvent::Replace {
                time: RawTime::SubSecond(0),
                old_refno: 1,
                new_refno: 2,
                shares: 50,
                price: 4_010_000,
            },
            &mut out,
        );
        assert_eq!(out.len(), 3);
        assert!(matches!(out[0], NormalizedEvent::Ready(Event::Replace { .. })));
        assert!(matches!(
            out[1],
            NormalizedEvent::Pending(PendingEvent::ReplaceDelete { refno: 1, .. })
        ));
        assert!(matches!(
            out[2],
            NormalizedEvent::Pending(PendingEvent::ReplaceAdd {
                old_refno: 1,
                new_refno: 2,
                ..
            })
        ));
    }
}
