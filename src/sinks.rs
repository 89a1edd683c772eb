//! §6 — the narrow external sink interface. The core depends only on
//! these traits; storage/analytics/plotting back-ends (out of scope,
//! §1) implement them externally.

use crate::book::Snapshot;
use crate::event::Event;

pub trait SystemSink {
    fn system_event(&mut self, event: &Event);
}

pub trait MessageSink {
    fn message(&mut self, event: &Event);
}

pub trait BookSink {
    fn snapshot(&mut self, snapshot: &Snapshot);
}

pub trait TradeSink {
    fn trade(&mut self, event: &Event);
}

pub trait NoiiSink {
    fn noii(&mut self, event: &Event);
}

/// A full set of sinks, grouped for convenience at the pipeline boundary.
pub trait Sinks: SystemSink + MessageSink + BookSink + TradeSink + NoiiSink {}

impl<T> Sinks for T where T: SystemSink + MessageSink + BookSink + TradeSink + NoiiSink {}

/// Discards everything; useful as a default or in benchmarks.
#[derive(Default)]
pub struct NullSinks;

impl SystemSink for NullSinks {
    fn system_event(&mut self, _event: &Event) {}
}
impl MessageSink for NullSinks {
    fn message(&mut self, _event: &Event) {}
}
impl BookSink for NullSinks {
    fn snapshot(&mut self, _snapshot: &Snapshot) {}
}
impl TradeSink for NullSinks {
    fn trade(&mut self, _event: &Event) {}
}
impl NoiiSink for NullSinks {
    fn noii(&mut self, _event: &Event) {}
}

/// Collects everything in memory, in arrival order. Grounded in the
/// teacher's preference for plain owned buffers over mocking frameworks
/// in tests.
#[derive(Default)]
pub struct CollectingSinks {
    pub system_events: Vec<Event>,
    pub messages: Vec<Event>,
    pub snapshots: Vec<Snapshot>,
    pub trades: Vec<Event>,
    pub noii: Vec<Event>,
}

impl SystemSink for CollectingSinks {
    fn system_event(&mut self, event: &Event) {
        self.system_events.push(event.clone());
    }
}
impl MessageSink for CollectingSinks {
    fn message(&mut self, event: &Event) {
        self.messages.push(event.clone());
    }
}
impl BookSink for CollectingSinks {
    fn snapshot(&mut self, snapshot: &Snapshot) {
        self.snapshots.push(snapshot.clone());
    }
}
impl TradeSink for CollectingSinks {
    fn trade(&mut self, event: &Event) {
        self.trades.push(event.clone());
    }
}
impl NoiiSink for CollectingSinks {
    fn noii(&mut self, event: &Event) {
        self.noii.push(event.clone());
    }
}
