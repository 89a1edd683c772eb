//! §4.7, §5, §9 — the pipeline driver. Owns every piece of state
//! (framer, clock, registry, book set) for its lifetime and exposes both
//! a `step` operation for tests and a `run_to_completion` operation for
//! production use, replacing the source drivers' interactive/printing
//! control flow (§9).

use std::io::Read;

use log::info;

use crate::bookset::BookSet;
use crate::config::PipelineConfig;
use crate::decoder::{decode, DecodeOutcome};
use crate::error::{Diagnostics, PipelineError};
use crate::event::{BookOp, Event};
use crate::framer::Framer;
use crate::normalizer::{NormalizedBuf, NormalizedEvent, Normalizer};
use crate::registry::{OrderRegistry, ResolvedEvent, RestingOrder};
use crate::sinks::Sinks;
use crate::symbol::Symbol;
use crate::version::ItchVersion;

pub struct Pipeline<R, S> {
    framer: Framer<R>,
    version: ItchVersion,
    normalizer: Normalizer,
    registry: OrderRegistry,
    books: BookSet,
    sinks: S,
    diagnostics: Diagnostics,
    active: bool,
}

impl<R: Read, S: Sinks> Pipeline<R, S> {
    pub fn new(reader: R, config: &PipelineConfig, sinks: S) -> Self {
        let symbols: Vec<Symbol> = config.symbols.clone();
        Pipeline {
            framer: Framer::new(reader),
            version: config.version,
            normalizer: Normalizer::new(),
            registry: OrderRegistry::new(),
            books: BookSet::new(symbols, config.levels),
            sinks,
            diagnostics: Diagnostics::default(),
            active: false,
        }
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    pub fn sinks(&self) -> &S {
        &self.sinks
    }

    pub fn sinks_mut(&mut self) -> &mut S {
        &mut self.sinks
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Decodes and folds exactly one frame. Returns `Ok(true)` to keep
    /// reading, `Ok(false)` on clean termination (EOF or `SystemEvent
    /// { code: 'C' }`).
    pub fn step(&mut self) -> Result<bool, PipelineError> {
        let frame = self.framer.next_frame()?;
        let (type_byte, payload) = match frame {
            Some(f) => f,
            None => return Ok(false),
        };
        match decode(self.version, type_byte, payload, &mut self.diagnostics)? {
            DecodeOutcome::Skipped => Ok(true),
            DecodeOutcome::Emit(raw) => {
                let mut normalized = NormalizedBuf::new();
                self.normalizer.normalize(raw, &mut normalized);
                for ne in normalized {
                    if !self.handle(ne)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    /// Runs `step` until termination or a fatal error.
    pub fn run_to_completion(&mut self) -> Result<(), PipelineError> {
        while self.step()? {}
        Ok(())
    }

    fn handle(&mut self, ne: NormalizedEvent) -> Result<bool, PipelineError> {
        match ne {
            NormalizedEvent::Ready(event) => self.dispatch_ready(event),
            NormalizedEvent::Pending(pending) => {
                match self.registry.resolve(pending, &mut self.diagnostics) {
                    Some(ResolvedEvent::Message(event, op)) => self.dispatch_resolved(Some(event), op),
                    Some(ResolvedEvent::BookOnly(op)) => self.dispatch_resolved(None, op),
                    None => self.diagnostics.unknown_refno += 1,
                }
                Ok(true)
            }
        }
    }

    /// Events from the normalizer that need no registry lookup.
    fn dispatch_ready(&mut self, event: Event) -> Result<bool, PipelineError> {
        match &event {
            Event::SystemEvent { code, .. } => {
                self.sinks.system_event(&event);
                match *code {
                    b'Q' => {
                        self.active = true;
                        info!("system event Q: entering active write phase");
                    }
                    b'M' => {
                        info!("system event M: market hours end; continuing to read");
                    }
                    b'C' => {
                        info!("system event C: end of messages; stopping");
                        return Ok(false);
                    }
                    _ => {}
                }
            }
            Event::TradingAction { symbol, .. } => {
                if self.books.is_subscribed(symbol) {
                    self.sinks.system_event(&event);
                }
            }
            Event::Add {
                sec,
                nano,
                refno,
                side,
                shares,
                symbol,
                price,
                ..
            } => {
                if self.books.is_subscribed(symbol) {
                    self.registry.add(
                        *refno,
                        RestingOrder {
                            symbol: *symbol,
                            side: *side,
                            price: *price,
                            shares: *shares,
                        },
                        &mut self.diagnostics,
                    );
                    self.sinks.message(&event);
                    let op = BookOp {
                        sec: *sec,
                        nano: *nano,
                        symbol: *symbol,
                        side: *side,
                        price: *price,
                        shares_delta: *shares as i64,
                    };
                    if let Some(snapshot) = self.books.apply(&op, &mut self.diagnostics) {
                        self.sinks.snapshot(&snapshot);
                    }
                }
            }
            Event::Replace { .. } => {
                // Informational marker (§4.3); no symbol to filter on,
                // always forwarded ahead of its two derived events.
                self.sinks.message(&event);
            }
            Event::Trade { symbol, .. } => {
                if self.books.is_subscribed(symbol) {
                    self.sinks.trade(&event);
                }
            }
            Event::CrossTrade { symbol, .. } | Event::NoiiIndicator { symbol, .. } => {
                if self.books.is_subscribed(symbol) {
                    self.sinks.noii(&event);
                }
            }
            Event::Execute { .. }
            | Event::ExecuteWithPrice { .. }
            | Event::Cancel { .. }
            | Event::Delete { .. } => {
                unreachable!("normalizer never emits these as Ready")
            }
        }
        Ok(true)
    }

    /// Events resolved by the registry: Execute/ExecuteWithPrice/Cancel/
    /// Delete and the two replace-halves (§4.6). `event` is `None` for a
    /// replace-half, which drives the book without reaching `MessageSink`
    /// (the informational `Replace` marker already covered that, §8
    /// scenario 4).
    fn dispatch_resolved(&mut self, event: Option<Event>, op: Option<BookOp>) {
        let Some(op) = op else { return };
        if !self.books.is_subscribed(&op.symbol) {
            return;
        }
        if let Some(event) = &event {
            self.sinks.message(event);
        }
        if let Some(snapshot) = self.books.apply(&op, &mut self.diagnostics) {
            self.sinks.snapshot(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::CollectingSinks;

    fn config(symbols: &[&str]) -> PipelineConfig {
        PipelineConfig {
            version: ItchVersion::V40,
            levels: 2,
            symbols: symbols.iter().map(|s| s.parse().unwrap()).collect(),
            date: "2026-01-01".to_string(),
            sink_mode: crate::config::SinkMode::InMemory,
        }
    }

    fn v40_add_frame(refno: u64, side: u8, shares: u32, symbol: &[u8; 6], price: u32) -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend_from_slice(&0u32.to_be_bytes()); // ts
        payload.extend_from_slice(&refno.to_be_bytes());
        payload.push(side);
        payload.extend_from_slice(&shares.to_be_bytes());
        payload.extend_from_slice(symbol);
        payload.extend_from_slice(&price.to_be_bytes());
        frame(b'A', &payload)
    }

    fn frame(type_byte: u8, payload: &[u8]) -> Vec<u8> {
        let mut v = Vec::new();
        let len = (payload.len() + 1) as u16;
        v.extend_from_slice(&len.to_be_bytes());
        v.push(type_byte);
        v.extend_from_slice(payload);
        v
    }

    #[test]
    fn scenario_1_through_3_add_execute_delete() {
        let bytes_add = v40_add_frame(1, b'B', 100, b"GOOG  ", 4_000_000);
        let mut exec_payload = Vec::new();
        exec_payload.extend_from_slice(&0u32.to_be_bytes());
        exec_payload.extend_from_slice(&1u64.to_be_bytes());
        exec_payload.extend_from_slice(&30u32.to_be_bytes());
        exec_payload.extend_from_slice(&0u64.to_be_bytes()); // match number, not surfaced
        let bytes_exec = frame(b'E', &exec_payload);
        let mut del_payload = Vec::new();
        del_payload.extend_from_slice(&0u32.to_be_bytes());
        del_payload.extend_from_slice(&1u64.to_be_bytes());
        let bytes_del = frame(b'D', &del_payload);

        let mut bytes = bytes_add;
        bytes.extend(bytes_exec);
        bytes.extend(bytes_del);

        let cfg = config(&["GOOG"]);
        let mut pipeline = Pipeline::new(std::io::Cursor::new(bytes), &cfg, CollectingSinks::default());
        pipeline.run_to_completion().unwrap();

        let snaps = &pipeline.sinks().snapshots;
        assert_eq!(snaps.len(), 3);
        assert_eq!(snaps[0].bid_shares[0], 100);
        assert_eq!(snaps[1].bid_shares[0], 70);
        assert_eq!(snaps[2].bid_price[0], 0);
        assert_eq!(snaps[2].bid_shares[0], 0);
    }

    #[test]
    fn replace_emits_one_message_not_three() {
        let bytes_add = v40_add_frame(1, b'B', 100, b"GOOG  ", 4_000_000);
        let mut rep_payload = Vec::new();
        rep_payload.extend_from_slice(&0u32.to_be_bytes());
        rep_payload.extend_from_slice(&1u64.to_be_bytes()); // old_refno
        rep_payload.extend_from_slice(&2u64.to_be_bytes()); // new_refno
        rep_payload.extend_from_slice(&50u32.to_be_bytes()); // shares
        rep_payload.extend_from_slice(&4_010_000u32.to_be_bytes()); // price
        let bytes_rep = frame(b'U', &rep_payload);

        let mut bytes = bytes_add;
        bytes.extend(bytes_rep);

        let cfg = config(&["GOOG"]);
        let mut pipeline = Pipeline::new(std::io::Cursor::new(bytes), &cfg, CollectingSinks::default());
        pipeline.run_to_completion().unwrap();

        // Add + the Replace marker itself: two messages total, not three
        // (the synthetic delete/add halves must not reach MessageSink).
        assert_eq!(pipeline.sinks().messages.len(), 2);
        assert!(matches!(pipeline.sinks().messages[1], Event::Replace { old_refno: 1, new_refno: 2, .. }));

        // Both halves still drive the book: old level down, new level up.
        let snaps = &pipeline.sinks().snapshots;
        assert_eq!(snaps.len(), 3);
        assert_eq!(snaps[2].bid_shares[0], 50);
        assert_eq!(snaps[2].bid_price[0], 4_010_000);
    }

    #[test]
    fn unsubscribed_symbol_never_reaches_sinks() {
        let bytes = v40_add_frame(1, b'B', 100, b"AAPL  ", 4_000_000);
        let cfg = config(&["GOOG"]);
        let mut pipeline = Pipeline::new(std::io::Cursor::new(bytes), &cfg, CollectingSinks::default());
        pipeline.run_to_completion().unwrap();
        assert!(pipeline.sinks().snapshots.is_empty());
        assert!(pipeline.sinks().messages.is_empty());
    }

    #[test]
    fn system_event_c_stops_reading() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&0u32.to_be_bytes());
        payload.push(b'C');
        let bytes_c = frame(b'S', &payload);
        let mut bytes = bytes_c.clone();
        bytes.extend(bytes_c); // a second frame the pipeline must never reach
        let cfg = config(&["GOOG"]);
        let mut pipeline = Pipeline::new(std::io::Cursor::new(bytes), &cfg, CollectingSinks::default());
        pipeline.run_to_completion().unwrap();
        assert_eq!(pipeline.sinks().system_events.len(), 1);
    }

    #[test]
    fn system_event_m_does_not_stop_reading() {
        let mut payload_m = Vec::new();
        payload_m.extend_from_slice(&0u32.to_be_bytes());
        payload_m.push(b'M');
        let mut payload_o = Vec::new();
        payload_o.extend_from_slice(&0u32.to_be_bytes());
        payload_o.push(b'O');
        let mut bytes = frame(b'S', &payload_m);
        bytes.extend(frame(b'S', &payload_o));
        let cfg = config(&["GOOG"]);
        let mut pipeline = Pipeline::new(std::io::Cursor::new(bytes), &cfg, CollectingSinks::default());
        pipeline.run_to_completion().unwrap();
        assert_eq!(pipeline.sinks().system_events.len(), 2);
    }
}
