//! The tagged-variant event model (§3, §9).
//!
//! Three distinct shapes cross the pipeline:
//! - [`RawEvent`]: decoder output, wire-shaped, time not yet resolved.
//! - [`PendingEvent`]: normalizer output for refno-keyed events that still
//!   need the order registry to fill in `symbol`/`side`/`price`.
//! - [`Event`]: the sink-facing value, fully resolved. Never mutated after
//!   construction (§9): the registry builds a new `Event` rather than
//!   patching fields onto an existing one.
//!
//! [`BookOp`] is the separate boundary value the registry hands to the
//! book (§9's "fully-formed event value at the boundary between registry
//! and book") — it is not the same type as the sink-facing `Event` because
//! book application keys on the order's *resting* price, which for
//! `ExecuteWithPrice` differs from the wire execution price carried on the
//! sink-facing event.

use crate::symbol::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Bid,
    Ask,
}

impl TryFrom<u8> for Side {
    type Error = ();
    fn try_from(b: u8) -> Result<Self, ()> {
        match b {
            b'B' => Ok(Side::Bid),
            b'S' => Ok(Side::Ask),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradingState {
    Halted,
    Paused,
    QuotationOnly,
    Trading,
}

impl TryFrom<u8> for TradingState {
    type Error = ();
    fn try_from(b: u8) -> Result<Self, ()> {
        match b {
            b'H' => Ok(TradingState::Halted),
            b'P' => Ok(TradingState::Paused),
            b'Q' => Ok(TradingState::QuotationOnly),
            b'T' => Ok(TradingState::Trading),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossType {
    Opening,
    Closing,
    HaltOrIpo,
    Intraday,
}

impl TryFrom<u8> for CrossType {
    type Error = ();
    fn try_from(b: u8) -> Result<Self, ()> {
        match b {
            b'O' => Ok(CrossType::Opening),
            b'C' => Ok(CrossType::Closing),
            b'H' => Ok(CrossType::HaltOrIpo),
            b'I' => Ok(CrossType::Intraday),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImbalanceDirection {
    Buy,
    Sell,
    NoImbalance,
    InsufficientOrders,
}

impl TryFrom<u8> for ImbalanceDirection {
    type Error = ();
    fn try_from(b: u8) -> Result<Self, ()> {
        match b {
            b'B' => Ok(ImbalanceDirection::Buy),
            b'S' => Ok(ImbalanceDirection::Sell),
            b'N' => Ok(ImbalanceDirection::NoImbalance),
            b'O' => Ok(ImbalanceDirection::InsufficientOrders),
            _ => Err(()),
        }
    }
}

/// Time as read straight off the wire, before the normalizer resolves it
/// against the running clock (§4.3).
#[derive(Debug, Clone, Copy)]
pub enum RawTime {
    /// v4.x sub-second messages: nanoseconds within the current second.
    SubSecond(u32),
    /// v5.0: full 48-bit nanoseconds-since-midnight field.
    Absolute(u64),
}

/// Decoder output (§4.2). `Clock` is not a market event; it updates the
/// v4.x running-second clock and produces no downstream `Event`.
#[derive(Debug, Clone)]
pub enum RawEvent {
    Clock(u32),
    SystemEvent {
        time: RawTime,
        code: u8,
    },
    TradingAction {
        time: RawTime,
        symbol: Symbol,
        state: TradingState,
    },
    Add {
        time: RawTime,
        refno: u64,
        side: Side,
        shares: u32,
        symbol: Symbol,
        price: i64,
        mpid: Option<[u8; 4]>,
    },
    Execute {
        time: RawTime,
        refno: u64,
        shares_executed: u32,
    },
    ExecuteWithPrice {
        time: RawTime,
        refno: u64,
        shares_executed: u32,
        price: i64,
    },
    Cancel {
        time: RawTime,
        refno: u64,
        shares_cancelled: u32,
    },
    Delete {
        time: RawTime,
        refno: u64,
    },
    Replace {
        time: RawTime,
        old_refno: u64,
        new_refno: u64,
        shares: u32,
        price: i64,
    },
    Trade {
        time: RawTime,
        refno: u64,
        side: Side,
        shares: u32,
        symbol: Symbol,
        price: i64,
    },
    CrossTrade {
        time: RawTime,
        symbol: Symbol,
        shares: u64,
        price: i64,
        cross_type: CrossType,
    },
    NoiiIndicator {
        time: RawTime,
        symbol: Symbol,
        paired: u64,
        imbalance: u64,
        direction: ImbalanceDirection,
        far: i64,
        near: i64,
        current: i64,
        cross_type: CrossType,
    },
}

/// Normalizer output for events that still need registry resolution
/// (§4.3, §4.4). `sec`/`nano` are already resolved; `symbol`/`side`/price
/// (where applicable) are not.
#[derive(Debug, Clone)]
pub enum PendingEvent {
    Execute {
        sec: u32,
        nano: u32,
        refno: u64,
        shares_executed: u32,
    },
    ExecuteWithPrice {
        sec: u32,
        nano: u32,
        refno: u64,
        shares_executed: u32,
        price: i64,
    },
    Cancel {
        sec: u32,
        nano: u32,
        refno: u64,
        shares_cancelled: u32,
    },
    Delete {
        sec: u32,
        nano: u32,
        refno: u64,
    },
    /// Delete-half of a replace: removes `old_refno` entirely.
    ReplaceDelete {
        sec: u32,
        nano: u32,
        refno: u64,
    },
    /// Add-half of a replace: `new_refno` inherits symbol/side from
    /// `old_refno`'s resting order.
    ReplaceAdd {
        sec: u32,
        nano: u32,
        old_refno: u64,
        new_refno: u64,
        shares: u32,
        price: i64,
    },
}

/// The sink-facing, fully resolved event (§3, §6). Field shapes follow the
/// distilled data model exactly; `ExecuteWithPrice` additionally carries
/// `resting_price`, a value needed to apply the delta to the correct book
/// level (book levels are keyed by the order's standing price, not the
/// execution/improvement price) but not named in the distilled per-variant
/// field list. See DESIGN.md.
#[derive(Debug, Clone)]
pub enum Event {
    SystemEvent {
        sec: u32,
        nano: u32,
        code: u8,
    },
    TradingAction {
        sec: u32,
        nano: u32,
        symbol: Symbol,
        state: TradingState,
    },
    Add {
        sec: u32,
        nano: u32,
        refno: u64,
        side: Side,
        shares: u32,
        symbol: Symbol,
        price: i64,
        mpid: Option<[u8; 4]>,
    },
    Execute {
        sec: u32,
        nano: u32,
        refno: u64,
        shares_executed: u32,
    },
    ExecuteWithPrice {
        sec: u32,
        nano: u32,
        refno: u64,
        shares_executed: u32,
        price: i64,
        resting_price: i64,
    },
    Cancel {
        sec: u32,
        nano: u32,
        refno: u64,
        shares_cancelled: u32,
    },
    Delete {
        sec: u32,
        nano: u32,
        refno: u64,
    },
    /// Informational marker; carries only what the wire `U` message
    /// itself carries (§4.3, §8 scenario 4).
    Replace {
        sec: u32,
        nano: u32,
        old_refno: u64,
        new_refno: u64,
        shares: u32,
        price: i64,
    },
    Trade {
        sec: u32,
        nano: u32,
        refno: u64,
        side: Side,
        shares: u32,
        symbol: Symbol,
        price: i64,
    },
    CrossTrade {
        sec: u32,
        nano: u32,
        symbol: Symbol,
        shares: u64,
        price: i64,
        cross_type: CrossType,
    },
    NoiiIndicator {
        sec: u32,
        nano: u32,
        symbol: Symbol,
        paired: u64,
        imbalance: u64,
        direction: ImbalanceDirection,
        far: i64,
        near: i64,
        current: i64,
        cross_type: CrossType,
    },
}

/// The boundary value between the registry and the book set (§9):
/// a fully-resolved price-level delta, constructed once and never mutated.
#[derive(Debug, Clone, Copy)]
pub struct BookOp {
    pub sec: u32,
    pub nano: u32,
    pub symbol: Symbol,
    pub side: Side,
    pub price: i64,
    /// Signed shares delta to apply at `price` on `side`.
    pub shares_delta: i64,
}
