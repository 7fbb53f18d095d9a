use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// One OHLCV sample plus the indicator columns drawn on the chart.
///
/// Indicator columns stay `None` (JSON `null`) until enough history exists to
/// compute them. The MACD columns are part of the payload shape but are never
/// filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub datetime: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,

    pub sma: Option<f64>,
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub vwap: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
}

impl Candle {
    /// Raw OHLCV candle with every indicator column empty.
    pub fn new(
        datetime: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            datetime,
            open,
            high,
            low,
            close,
            volume,
            sma: None,
            ema_fast: None,
            ema_slow: None,
            vwap: None,
            rsi: None,
            macd: None,
            macd_signal: None,
            macd_hist: None,
            bb_upper: None,
            bb_middle: None,
            bb_lower: None,
        }
    }
}

/// Typed tooltip / chart row for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Candle time formatted for the chart axis (`MM-DD HH:MM`, UTC).
    pub label: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub vwap: Option<f64>,
    pub rsi: Option<f64>,
}

impl ChartPoint {
    pub fn from_candle(candle: &Candle) -> Self {
        Self {
            label: candle.datetime.format("%m-%d %H:%M").to_string(),
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
            volume: candle.volume,
            vwap: candle.vwap,
            rsi: candle.rsi,
        }
    }
}
