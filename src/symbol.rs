//! Fixed-width, space-padded ASCII symbol, used as a book/registry key.

use std::fmt;
use std::str::FromStr;

pub const SYMBOL_LEN: usize = 8;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol([u8; SYMBOL_LEN]);

impl Symbol {
    /// Builds a symbol from a wire field, right-padding with spaces or
    /// truncating to `SYMBOL_LEN` bytes.
    pub fn from_wire(raw: &[u8]) -> Self {
        let mut buf = [b' '; SYMBOL_LEN];
        let n = raw.len().min(SYMBOL_LEN);
        buf[..n].copy_from_slice(&raw[..n]);
        Symbol(buf)
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(trim_trailing_spaces(&self.0)).unwrap_or("")
    }
}

fn trim_trailing_spaces(buf: &[u8]) -> &[u8] {
    let end = buf
        .iter()
        .rposition(|&b| b != b' ')
        .map(|i| i + 1)
        .unwrap_or(0);
    &buf[..end]
}

#[derive(Debug, thiserror::Error)]
#[error("symbol longer than {SYMBOL_LEN} bytes: {0:?}")]
pub struct SymbolTooLong(String);

impl FromStr for Symbol {
    type Err = SymbolTooLong;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > SYMBOL_LEN {
            return Err(SymbolTooLong(s.to_string()));
        }
        Ok(Symbol::from_wire(s.as_bytes()))
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.as_str())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_and_trims() {
        let s = Symbol::from_wire(b"GOOG");
        assert_eq!(s.as_str(), "GOOG");
    }

    #[test]
    fn truncates_oversized_wire_field() {
        let s = Symbol::from_wire(b"TOOLONGNAME");
        assert_eq!(s.as_str(), "TOOLONGN");
    }

    #[test]
    fn from_str_rejects_oversized() {
        assert!("TOOLONGNAME".parse::<Symbol>().is_err());
        assert!("GOOG".parse::<Symbol>().is_ok());
    }
}
