//! Exchange identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported cryptocurrency exchanges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    /// Binance spot - plain JSON arrays, no envelope
    Binance,
    /// Bybit v5 spot - `{retCode, retMsg, result}` envelope
    Bybit,
}

impl Exchange {
    /// All exchanges in display order
    pub const ALL: [Exchange; 2] = [Exchange::Binance, Exchange::Bybit];

    /// Get the full display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Exchange::Binance => "Binance",
            Exchange::Bybit => "Bybit",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for Exchange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "binance" | "bn" => Ok(Exchange::Binance),
            "bybit" | "by" => Ok(Exchange::Bybit),
            _ => Err(format!("Unknown exchange: {}", s)),
        }
    }
}
