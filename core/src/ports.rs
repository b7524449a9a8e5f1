//! Parsing and validation for port specifications.
//!
//! Ports cross the API boundary as strings: either a single port (`"80"`)
//! or an inclusive range (`"80-90"`).

use serde::{Deserialize, Serialize};

/// An inclusive port range; a single port is a range with `start == end`.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize
)]
#[serde(rename_all = "camelCase")]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("empty port spec")]
    Empty,

    #[error("not a valid port number: {0}")]
    NotANumber(String),

    #[error("port must be in 1..=65535")]
    Zero,

    #[error("port range must be increasing")]
    InvertedRange,
}

// === impl PortRange ===

impl PortRange {
    pub fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    pub fn single(port: u16) -> Self {
        Self {
            start: port,
            end: port,
        }
    }

    pub fn validate(&self) -> Result<(), PortError> {
        if self.start == 0 {
            return Err(PortError::Zero);
        }
        if self.start > self.end {
            return Err(PortError::InvertedRange);
        }
        Ok(())
    }
}

/// Reads a single port or an `a-b` range from the given string.
pub fn parse_port_or_range(s: &str) -> Result<PortRange, PortError> {
    match s.split_once('-') {
        None => {
            let port = parse_port(s)?;
            Ok(PortRange::single(port))
        }
        Some((floor, ceil)) => {
            let start = parse_port(floor)?;
            let end = parse_port(ceil)?;
            if start > end {
                return Err(PortError::InvertedRange);
            }
            Ok(PortRange::new(start, end))
        }
    }
}

fn parse_port(s: &str) -> Result<u16, PortError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(PortError::Empty);
    }
    let port: u16 = s.parse().map_err(|_| PortError::NotANumber(s.to_string()))?;
    if port == 0 {
        return Err(PortError::Zero);
    }
    Ok(port)
}
