//! §4.2 — version-dispatched decode table. `decode` is a pure function
//! keyed on `(version, type_byte)`; it never touches clock or registry
//! state. Payload length mismatches are fatal (§7); an unrecognized type
//! byte within the version's accepted set, or an unrecognized enum byte
//! inside an otherwise well-formed payload, is recoverable and reported
//! back as [`DecodeOutcome::Skipped`].

use crate::error::{Diagnostics, PipelineError};
use crate::event::{CrossType, ImbalanceDirection, RawEvent, RawTime, Side, TradingState};
use crate::symbol::Symbol;
use crate::version::ItchVersion;

pub enum DecodeOutcome {
    Emit(RawEvent),
    /// Type byte outside the accepted set for this version, or an
    /// unrecognized enum byte inside a recognized message: recoverable,
    /// already counted in `diag`.
    Skipped,
}

pub fn decode(
    version: ItchVersion,
    type_byte: u8,
    payload: &[u8],
    diag: &mut Diagnostics,
) -> Result<DecodeOutcome, PipelineError> {
    if !accepted(version, type_byte) {
        diag.unknown_type_byte += 1;
        return Ok(DecodeOutcome::Skipped);
    }
    match version {
        ItchVersion::V40 | ItchVersion::V41 => decode_v4(version, type_byte, payload, diag),
        ItchVersion::V50 => decode_v5(type_byte, payload, diag),
    }
}

fn accepted(version: ItchVersion, type_byte: u8) -> bool {
    match type_byte {
        b'T' => version.has_seconds_message(),
        b'S' | b'H' | b'A' | b'F' | b'E' | b'C' | b'X' | b'D' | b'U' => true,
        b'P' | b'Q' | b'I' => version.has_noii_and_cross(),
        _ => false,
    }
}

fn expect_len(type_byte: u8, payload: &[u8], expected: usize) -> Result<(), PipelineError> {
    if payload.len() != expected {
        return Err(PipelineError::PayloadLength {
            type_byte,
            expected,
            got: payload.len(),
        });
    }
    Ok(())
}

fn read_u16(b: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([b[at], b[at + 1]])
}

fn read_u32(b: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([b[at], b[at + 1], b[at + 2], b[at + 3]])
}

fn read_u64(b: &[u8], at: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&b[at..at + 8]);
    u64::from_be_bytes(buf)
}

fn read_price(b: &[u8], at: usize) -> i64 {
    read_u32(b, at) as i64
}

/// Combines the two-word + one-word 48-bit nanosecond field used by v5.0
/// (§4.2: "two 16-bit words plus a 32-bit word, combined `hi<<32 | lo`").
fn read_nanos48(b: &[u8], at: usize) -> u64 {
    let hi = read_u16(b, at) as u64;
    let lo = read_u32(b, at + 2) as u64;
    (hi << 32) | lo
}

fn enum_byte<T, E>(diag: &mut Diagnostics, byte: u8, f: impl Fn(u8) -> Result<T, E>) -> Option<T> {
    match f(byte) {
        Ok(v) => Some(v),
        Err(_) => {
            diag.invalid_enum_byte += 1;
            None
        }
    }
}

// ---------------------------------------------------------------- v4.x --

fn decode_v4(
    version: ItchVersion,
    type_byte: u8,
    p: &[u8],
    diag: &mut Diagnostics,
) -> Result<DecodeOutcome, PipelineError> {
    let sym_len = version.symbol_len();

    if type_byte == b'T' {
        expect_len(type_byte, p, 4)?;
        return Ok(DecodeOutcome::Emit(RawEvent::Clock(read_u32(p, 0))));
    }

    let time = |p: &[u8]| RawTime::SubSecond(read_u32(p, 0));

    match type_byte {
        b'S' => {
            expect_len(type_byte, p, 5)?;
            Ok(DecodeOutcome::Emit(RawEvent::SystemEvent {
                time: time(p),
                code: p[4],
            }))
        }
        b'H' => {
            // Trailing reserved bytes after the state byte (1 + 4) bring
            // the true length to 10 + sym_len, not 5 + sym_len.
            expect_len(type_byte, p, 10 + sym_len)?;
            let symbol = Symbol::from_wire(&p[4..4 + sym_len]);
            match enum_byte(diag, p[4 + sym_len], TradingState::try_from) {
                Some(state) => Ok(DecodeOutcome::Emit(RawEvent::TradingAction {
                    time: time(p),
                    symbol,
                    state,
                })),
                None => Ok(DecodeOutcome::Skipped),
            }
        }
        b'A' | b'F' => {
            let mpid_tail = if type_byte == b'F' && version == ItchVersion::V41 {
                4
            } else {
                0
            };
            expect_len(type_byte, p, 21 + sym_len + mpid_tail)?;
            let refno = read_u64(p, 4);
            match enum_byte(diag, p[12], Side::try_from) {
                Some(side) => {
                    let shares = read_u32(p, 13);
                    let symbol = Symbol::from_wire(&p[17..17 + sym_len]);
                    let price = read_price(p, 17 + sym_len);
                    let mpid = if mpid_tail == 4 {
                        let mut m = [0u8; 4];
                        m.copy_from_slice(&p[17 + sym_len + 4..21 + sym_len + 4]);
                        Some(m)
                    } else {
                        None
                    };
                    Ok(DecodeOutcome::Emit(RawEvent::Add {
                        time: time(p),
                        refno,
                        side,
                        shares,
                        symbol,
                        price,
                        mpid,
                    }))
                }
                None => Ok(DecodeOutcome::Skipped),
            }
        }
        b'E' => {
            // Trailing 8-byte match number after shares; not surfaced.
            expect_len(type_byte, p, 24)?;
            Ok(DecodeOutcome::Emit(RawEvent::Execute {
                time: time(p),
                refno: read_u64(p, 4),
                shares_executed: read_u32(p, 12),
            }))
        }
        b'C' => {
            // Match number (8) then a printable flag (1) precede price.
            expect_len(type_byte, p, 29)?;
            Ok(DecodeOutcome::Emit(RawEvent::ExecuteWithPrice {
                time: time(p),
                refno: read_u64(p, 4),
                shares_executed: read_u32(p, 12),
                price: read_price(p, 25),
            }))
        }
        b'X' => {
            expect_len(type_byte, p, 16)?;
            Ok(DecodeOutcome::Emit(RawEvent::Cancel {
                time: time(p),
                refno: read_u64(p, 4),
                shares_cancelled: read_u32(p, 12),
            }))
        }
        b'D' => {
            expect_len(type_byte, p, 12)?;
            Ok(DecodeOutcome::Emit(RawEvent::Delete {
                time: time(p),
                refno: read_u64(p, 4),
            }))
        }
        b'U' => {
            expect_len(type_byte, p, 28)?;
            Ok(DecodeOutcome::Emit(RawEvent::Replace {
                time: time(p),
                old_refno: read_u64(p, 4),
                new_refno: read_u64(p, 12),
                shares: read_u32(p, 20),
                price: read_price(p, 24),
            }))
        }
        b'P' => {
            // Trailing 8-byte match number after price; not surfaced.
            expect_len(type_byte, p, 37)?;
            match enum_byte(diag, p[12], Side::try_from) {
                Some(side) => Ok(DecodeOutcome::Emit(RawEvent::Trade {
                    time: time(p),
                    refno: read_u64(p, 4),
                    side,
                    shares: read_u32(p, 13),
                    symbol: Symbol::from_wire(&p[17..25]),
                    price: read_price(p, 25),
                })),
                None => Ok(DecodeOutcome::Skipped),
            }
        }
        b'Q' => {
            // An unused 8-byte field sits between price and cross type.
            expect_len(type_byte, p, 33)?;
            match enum_byte(diag, p[32], CrossType::try_from) {
                Some(cross_type) => Ok(DecodeOutcome::Emit(RawEvent::CrossTrade {
                    time: time(p),
                    shares: read_u64(p, 4),
                    symbol: Symbol::from_wire(&p[12..20]),
                    price: read_price(p, 20),
                    cross_type,
                })),
                None => Ok(DecodeOutcome::Skipped),
            }
        }
        b'I' => {
            expect_len(type_byte, p, 42)?;
            let direction = enum_byte(diag, p[20], ImbalanceDirection::try_from);
            let cross_type = enum_byte(diag, p[41], CrossType::try_from);
            match (direction, cross_type) {
                (Some(direction), Some(cross_type)) => {
                    Ok(DecodeOutcome::Emit(RawEvent::NoiiIndicator {
                        time: time(p),
                        paired: read_u64(p, 4),
                        imbalance: read_u64(p, 12),
                        direction,
                        symbol: Symbol::from_wire(&p[21..29]),
                        far: read_price(p, 29),
                        near: read_price(p, 33),
                        current: read_price(p, 37),
                        cross_type,
                    }))
                }
                _ => Ok(DecodeOutcome::Skipped),
            }
        }
        _ => unreachable!("filtered by accepted()"),
    }
}

// ----------------------------------------------------------------- v5 --

fn decode_v5(type_byte: u8, p: &[u8], diag: &mut Diagnostics) -> Result<DecodeOutcome, PipelineError> {
    let time = |p: &[u8]| RawTime::Absolute(read_nanos48(p, 4));

    match type_byte {
        b'S' => {
            expect_len(type_byte, p, 11)?;
            Ok(DecodeOutcome::Emit(RawEvent::SystemEvent {
                time: time(p),
                code: p[10],
            }))
        }
        b'H' => {
            // Trailing reserved bytes after the state byte (1 + 4).
            expect_len(type_byte, p, 24)?;
            let symbol = Symbol::from_wire(&p[10..18]);
            match enum_byte(diag, p[18], TradingState::try_from) {
                Some(state) => Ok(DecodeOutcome::Emit(RawEvent::TradingAction {
                    time: time(p),
                    symbol,
                    state,
                })),
                None => Ok(DecodeOutcome::Skipped),
            }
        }
        b'A' | b'F' => {
            let mpid_tail = if type_byte == b'F' { 4 } else { 0 };
            expect_len(type_byte, p, 35 + mpid_tail)?;
            let refno = read_u64(p, 10);
            match enum_byte(diag, p[18], Side::try_from) {
                Some(side) => {
                    let shares = read_u32(p, 19);
                    let symbol = Symbol::from_wire(&p[23..31]);
                    let price = read_price(p, 31);
                    let mpid = if mpid_tail == 4 {
                        let mut m = [0u8; 4];
                        m.copy_from_slice(&p[35..39]);
                        Some(m)
                    } else {
                        None
                    };
                    Ok(DecodeOutcome::Emit(RawEvent::Add {
                        time: time(p),
                        refno,
                        side,
                        shares,
                        symbol,
                        price,
                        mpid,
                    }))
                }
                None => Ok(DecodeOutcome::Skipped),
            }
        }
        b'E' => {
            // Trailing 8-byte match number after shares; not surfaced.
            expect_len(type_byte, p, 30)?;
            Ok(DecodeOutcome::Emit(RawEvent::Execute {
                time: time(p),
                refno: read_u64(p, 10),
                shares_executed: read_u32(p, 18),
            }))
        }
        b'C' => {
            // Match number (8) then a printable flag (1) precede price.
            expect_len(type_byte, p, 35)?;
            Ok(DecodeOutcome::Emit(RawEvent::ExecuteWithPrice {
                time: time(p),
                refno: read_u64(p, 10),
                shares_executed: read_u32(p, 18),
                price: read_price(p, 31),
            }))
        }
        b'X' => {
            expect_len(type_byte, p, 22)?;
            Ok(DecodeOutcome::Emit(RawEvent::Cancel {
                time: time(p),
                refno: read_u64(p, 10),
                shares_cancelled: read_u32(p, 18),
            }))
        }
        b'D' => {
            expect_len(type_byte, p, 18)?;
            Ok(DecodeOutcome::Emit(RawEvent::Delete {
                time: time(p),
                refno: read_u64(p, 10),
            }))
        }
        b'U' => {
            expect_len(type_byte, p, 34)?;
            Ok(DecodeOutcome::Emit(RawEvent::Replace {
                time: time(p),
                old_refno: read_u64(p, 10),
                new_refno: read_u64(p, 18),
                shares: read_u32(p, 26),
                price: read_price(p, 30),
            }))
        }
        b'P' => {
            // Trailing 8-byte match number after price; not surfaced.
            expect_len(type_byte, p, 43)?;
            match enum_byte(diag, p[18], Side::try_from) {
                Some(side) => Ok(DecodeOutcome::Emit(RawEvent::Trade {
                    time: time(p),
                    refno: read_u64(p, 10),
                    side,
                    shares: read_u32(p, 19),
                    symbol: Symbol::from_wire(&p[23..31]),
                    price: read_price(p, 31),
                })),
                None => Ok(DecodeOutcome::Skipped),
            }
        }
        b'Q' => {
            expect_len(type_byte, p, 31)?;
            match enum_byte(diag, p[30], CrossType::try_from) {
                Some(cross_type) => Ok(DecodeOutcome::Emit(RawEvent::CrossTrade {
                    time: time(p),
                    shares: read_u64(p, 10),
                    symbol: Symbol::from_wire(&p[18..26]),
                    price: read_price(p, 26),
                    cross_type,
                })),
                None => Ok(DecodeOutcome::Skipped),
            }
        }
        b'I' => {
            expect_len(type_byte, p, 48)?;
            let direction = enum_byte(diag, p[26], ImbalanceDirection::try_from);
            let cross_type = enum_byte(diag, p[47], CrossType::try_from);
            match (direction, cross_type) {
                (Some(direction), Some(cross_type)) => {
                    Ok(DecodeOutcome::Emit(RawEvent::NoiiIndicator {
                        time: time(p),
                        paired: read_u64(p, 10),
                        imbalance: read_u64(p, 18),
                        direction,
                        symbol: Symbol::from_wire(&p[27..35]),
                        far: read_price(p, 35),
                        near: read_price(p, 39),
                        current: read_price(p, 43),
                        cross_type,
                    }))
                }
                _ => Ok(DecodeOutcome::Skipped),
            }
        }
        _ => unreachable!("filtered by accepted()"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header5(sec: u32) -> Vec<u8> {
        sec.to_be_bytes().to_vec()
    }

    #[test]
    fn v40_add_round_trips_fields() {
        let mut p = header5(123);
        p.extend_from_slice(&1u64.to_be_bytes()); // refno
        p.push(b'B');
        p.extend_from_slice(&100u32.to_be_bytes()); // shares
        p.extend_from_slice(b"GOOG  "); // 6-byte symbol
        p.extend_from_slice(&4_000_000i64.to_be_bytes()[4..]); // price as u32
        let mut diag = Diagnostics::default();
        let out = decode(ItchVersion::V40, b'A', &p, &mut diag).unwrap();
        match out {
            DecodeOutcome::Emit(RawEvent::Add {
                refno,
                side,
                shares,
                symbol,
                price,
                ..
            }) => {
                assert_eq!(refno, 1);
                assert_eq!(side, Side::Bid);
                assert_eq!(shares, 100);
                assert_eq!(symbol.as_str(), "GOOG");
                assert_eq!(price, 4_000_000);
            }
            _ => panic!("expected Add"),
        }
    }

    #[test]
    fn wrong_length_is_fatal() {
        let p = vec![0u8; 3];
        let mut diag = Diagnostics::default();
        let err = decode(ItchVersion::V40, b'S', &p, &mut diag).unwrap_err();
        assert!(matches!(err, PipelineError::PayloadLength { .. }));
    }

    #[test]
    fn unknown_type_byte_is_recoverable() {
        let mut diag = Diagnostics::default();
        let out = decode(ItchVersion::V40, b'Z', &[], &mut diag).unwrap();
        assert!(matches!(out, DecodeOutcome::Skipped));
        assert_eq!(diag.unknown_type_byte, 1);
    }

    #[test]
    fn v50_splits_48bit_nanos() {
        let mut p = vec![0u8; 4]; // stock_locate + tracking
        let nano: u64 = 34_201_123_456_789;
        p.extend_from_slice(&((nano >> 32) as u16).to_be_bytes());
        p.extend_from_slice(&((nano & 0xFFFF_FFFF) as u32).to_be_bytes());
        p.extend_from_slice(&1u64.to_be_bytes());
        p.push(b'B');
        p.extend_from_slice(&100u32.to_be_bytes());
        p.extend_from_slice(b"GOOG    ");
        p.extend_from_slice(&4_000_000u32.to_be_bytes());
        let mut diag = Diagnostics::default();
        let out = decode(ItchVersion::V50, b'A', &p, &mut diag).unwrap();
        match out {
            DecodeOutcome::Emit(RawEvent::Add {
                time: RawTime::Absolute(n),
                ..
            }) => assert_eq!(n, nano),
            _ => panic!("expected Add with absolute time"),
        }
    }

    #[test]
    fn t_message_not_accepted_in_v50() {
        assert!(!accepted(ItchVersion::V50, b'T'));
        assert!(accepted(ItchVersion::V40, b'T'));
    }

    proptest::proptest! {
        #[test]
        fn decode_never_panics_on_arbitrary_bytes(
            version_idx in 0u8..3,
            type_byte in proptest::prelude::any::<u8>(),
            payload in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..64),
        ) {
            let version = match version_idx {
                0 => ItchVersion::V40,
                1 => ItchVersion::V41,
                _ => ItchVersion::V50,
            };
            let mut diag = Diagnostics::default();
            // Fatal length mismatches are expected `Err`s, not panics.
            let _ = decode(version, type_byte, &payload, &mut diag);
        }
    }
}
