//! TotalView-ITCH (4.0/4.1/5.0) binary feed decoder and top-N order book
//! reconstruction: `bytes -> Framer -> Decoder -> Normalizer ->
//! OrderRegistry -> BookSet -> Sinks`, single-threaded and
//! cooperative per input stream.

pub mod book;
pub mod bookset;
pub mod config;
pub mod decoder;
pub mod error;
pub mod event;
pub mod framer;
pub mod normalizer;
pub mod pipeline;
pub mod registry;
pub mod sinks;
pub mod symbol;
pub mod version;
