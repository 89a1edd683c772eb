//! Protocol version selection.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItchVersion {
    #[serde(rename = "4.0")]
    V40,
    #[serde(rename = "4.1")]
    V41,
    #[serde(rename = "5.0")]
    V50,
}

impl ItchVersion {
    /// Width in bytes of the space-padded ASCII symbol field on the wire.
    pub fn symbol_len(self) -> usize {
        match self {
            ItchVersion::V40 => 6,
            ItchVersion::V41 | ItchVersion::V50 => 8,
        }
    }

    pub fn has_seconds_message(self) -> bool {
        matches!(self, ItchVersion::V40 | ItchVersion::V41)
    }

    pub fn has_noii_and_cross(self) -> bool {
        matches!(self, ItchVersion::V41 | ItchVersion::V50)
    }
}

impl fmt::Display for ItchVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ItchVersion::V40 => "4.0",
            ItchVersion::V41 => "4.1",
            ItchVersion::V50 => "5.0",
        };
        f.write_str(s)
    }
}

impl FromStr for ItchVersion {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "4.0" => Ok(ItchVersion::V40),
            "4.1" => Ok(ItchVersion::V41),
            "5.0" => Ok(ItchVersion::V50),
            other => Err(PipelineError::UnsupportedVersion(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_rejects_unknown_version() {
        let err = "3.9".parse::<ItchVersion>().unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedVersion(v) if v == "3.9"));
    }

    #[test]
    fn from_str_accepts_known_versions() {
        assert_eq!("4.0".parse::<ItchVersion>().unwrap(), ItchVersion::V40);
        assert_eq!("4.1".parse::<ItchVersion>().unwrap(), ItchVersion::V41);
        assert_eq!("5.0".parse::<ItchVersion>().unwrap(), ItchVersion::V50);
    }
}
