//! §6, §12 — configuration surface. Mirrors the teacher's
//! `AppConfig::from_file`/`validate` pattern: `serde` + `toml` for
//! parsing, `anyhow` for the fallible outer boundary.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::symbol::Symbol;
use crate::version::ItchVersion;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkMode {
    /// Collect events/snapshots in memory (tests, embedding).
    InMemory,
    /// Hand rows to stdout, one line per event/snapshot (smoke runs).
    Stdout,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub version: ItchVersion,
    pub levels: usize,
    pub symbols: Vec<Symbol>,
    pub date: String,
    pub sink_mode: SinkMode,
}

/// On-disk shape (§6's enumerated options), deserialized then converted
/// and validated into [`PipelineConfig`].
#[derive(Debug, Deserialize)]
struct RawConfig {
    version: ItchVersion,
    levels: usize,
    symbols: Vec<String>,
    date: String,
    sink_mode: SinkMode,
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)?;
        let raw: RawConfig = toml::from_str(&text)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> anyhow::Result<Self> {
        if raw.levels == 0 {
            anyhow::bail!("levels must be > 0");
        }
        if raw.symbols.is_empty() {
            anyhow::bail!("symbols must name at least one subscribed symbol");
        }
        let mut symbols = Vec::with_capacity(raw.symbols.len());
        for s in &raw.symbols {
            let symbol: Symbol = s
                .parse()
                .map_err(|e| anyhow::anyhow!("symbols entry {s:?}: {e}"))?;
            symbols.push(symbol);
        }
        Ok(PipelineConfig {
            version: raw.version,
            levels: raw.levels,
            symbols,
            date: raw.date,
            sink_mode: raw.sink_mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_toml() {
        let toml = r#"
            version = "5.0"
            levels = 5
            symbols = ["GOOG", "AAPL"]
            date = "2026-07-27"
            sink_mode = "in_memory"
        "#;
        let raw: RawConfig = toml::from_str(toml).unwrap();
        let cfg = PipelineConfig::from_raw(raw).unwrap();
        assert_eq!(cfg.levels, 5);
        assert_eq!(cfg.symbols.len(), 2);
        assert_eq!(cfg.version, ItchVersion::V50);
    }

    #[test]
    fn rejects_zero_levels() {
        let toml = r#"
            version = "4.1"
            levels = 0
            symbols = ["GOOG"]
            date = "2026-07-27"
            sink_mode = "stdout"
        "#;
        let raw: RawConfig = toml::from_str(toml).unwrap();
        assert!(PipelineConfig::from_raw(raw).is_err());
    }

    #[test]
    fn rejects_oversized_symbol() {
        let toml = r#"
            version = "4.1"
            levels = 1
            symbols = ["WAYTOOLONGASYM"]
            date = "2026-07-27"
            sink_mode = "stdout"
        "#;
        let raw: RawConfig = toml::from_str(toml).unwrap();
        assert!(PipelineConfig::from_raw(raw).is_err());
    }
}
