// =============================================================================
// Shared types used across the Signal Desk backend
// =============================================================================

use serde::{Deserialize, Serialize};

/// Tradable symbols offered by the dashboard. Compile-time constant.
pub const SYMBOLS: &[&str] = &[
    "KRW-BTC", "KRW-ETH", "KRW-SOL", "KRW-XRP", "KRW-DOGE", "KRW-ADA", "KRW-AVAX", "KRW-DOT",
    "KRW-MATIC", "KRW-TRX",
];

/// Every selectable chart timeframe, shortest first.
pub const TIMEFRAMES: &[Timeframe] = &[
    Timeframe::M5,
    Timeframe::M15,
    Timeframe::H1,
    Timeframe::H4,
    Timeframe::D1,
];

/// Returns `true` if `symbol` is one of [`SYMBOLS`].
pub fn is_known_symbol(symbol: &str) -> bool {
    SYMBOLS.contains(&symbol)
}

/// Chart timeframe. Only selects the synthetic candle spacing; no real
/// aggregation happens anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    /// Candle spacing in minutes.
    pub fn interval_minutes(self) -> i64 {
        match self {
            Self::M5 => 5,
            Self::M15 => 15,
            Self::H1 => 60,
            Self::H4 => 240,
            Self::D1 => 1440,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::M5 => "5m",
            Self::M15 => "15m",
            Self::H1 => "1h",
            Self::H4 => "4h",
            Self::D1 => "1d",
        }
    }
}

impl Default for Timeframe {
    fn default() -> Self {
        Self::H1
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TIMEFRAMES
            .iter()
            .copied()
            .find(|tf| tf.as_str() == s)
            .ok_or_else(|| format!("unknown timeframe '{s}'"))
    }
}
