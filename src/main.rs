//! Thin non-interactive CLI driver (§9): loads configuration, opens the
//! input stream, and runs the pipeline to completion or until a fatal
//! error. All state lives in the `Pipeline` value; nothing here is
//! global or mutable module state.

use std::fs::File;
use std::path::PathBuf;

use log::{error, info};

use itch_book::config::{PipelineConfig, SinkMode};
use itch_book::event::Event;
use itch_book::book::Snapshot;
use itch_book::pipeline::Pipeline;
use itch_book::sinks::{BookSink, CollectingSinks, MessageSink, NoiiSink, SystemSink, TradeSink};

struct StdoutSinks;

impl SystemSink for StdoutSinks {
    fn system_event(&mut self, event: &Event) {
        println!("system  {event:?}");
    }
}
impl MessageSink for StdoutSinks {
    fn message(&mut self, event: &Event) {
        println!("message {event:?}");
    }
}
impl BookSink for StdoutSinks {
    fn snapshot(&mut self, snapshot: &Snapshot) {
        println!("snapshot {snapshot:?}");
    }
}
impl TradeSink for StdoutSinks {
    fn trade(&mut self, event: &Event) {
        println!("trade   {event:?}");
    }
}
impl NoiiSink for StdoutSinks {
    fn noii(&mut self, event: &Event) {
        println!("noii    {event:?}");
    }
}

fn usage() -> ! {
    eprintln!("usage: itch-book <config.toml> <feed-file>");
    std::process::exit(2);
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .format_timestamp_millis()
        .init();

    let mut args = std::env::args().skip(1);
    let config_path: PathBuf = args.next().unwrap_or_else(|| usage()).into();
    let feed_path: PathBuf = args.next().unwrap_or_else(|| usage()).into();

    let config = PipelineConfig::from_file(&config_path)?;
    info!(
        "loaded config: version={} levels={} symbols={} date={}",
        config.version,
        config.levels,
        config.symbols.len(),
        config.date
    );

    let file = File::open(&feed_path)?;

    let diagnostics = match config.sink_mode {
        SinkMode::Stdout => {
            let mut pipeline = Pipeline::new(file, &config, StdoutSinks);
            run(&mut pipeline)?;
            pipeline.diagnostics()
        }
        SinkMode::InMemory => {
            let mut pipeline = Pipeline::new(file, &config, CollectingSinks::default());
            run(&mut pipeline)?;
            let sinks = pipeline.sinks();
            info!(
                "collected {} messages, {} snapshots, {} trades, {} noii rows",
                sinks.messages.len(),
                sinks.snapshots.len(),
                sinks.trades.len(),
                sinks.noii.len()
            );
            pipeline.diagnostics()
        }
    };

    if diagnostics.total() > 0 {
        info!(
            "run finished with {} recoverable conditions (unknown_type_byte={} duplicate_add={} unknown_refno={} crossed_book={} execute_exceeds_resting={} invalid_enum_byte={})",
            diagnostics.total(),
            diagnostics.unknown_type_byte,
            diagnostics.duplicate_add,
            diagnostics.unknown_refno,
            diagnostics.crossed_book,
            diagnostics.execute_exceeds_resting,
            diagnostics.invalid_enum_byte,
        );
    }

    Ok(())
}

fn run<R: std::io::Read, S: itch_book::sinks::Sinks>(
    pipeline: &mut Pipeline<R, S>,
) -> anyhow::Result<()> {
    if let Err(e) = pipeline.run_to_completion() {
        error!("fatal pipeline error: {e}");
        return Err(e.into());
    }
    Ok(())
}
