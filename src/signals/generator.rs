// =============================================================================
// Signal Generator — mock "VWAP Gap & Low RSI" detections
// =============================================================================
//
// Each call produces 0–3 signals on random symbols. The batch is independent
// of any candle series and carries no identity across calls.
// =============================================================================

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::{Timeframe, SYMBOLS};

/// Rule text attached to every generated signal.
pub const SIGNAL_RULE: &str = "VWAP Gap & Low RSI";

/// Upper bound (inclusive) on signals per batch.
pub const MAX_SIGNALS_PER_BATCH: usize = 3;

/// Measurements behind a signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalDetails {
    pub vwap_gap_percent: f64,
    pub rsi: f64,
    pub volume_rank: u32,
}

/// A detected trading condition shown in the dashboard's signal list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Unique within one batch only.
    pub id: String,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub datetime: DateTime<Utc>,
    pub rule: String,
    pub details: SignalDetails,
}

/// Round to two decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Generate one batch of signals stamped with `now`.
pub fn generate_signals<R: Rng>(now: DateTime<Utc>, rng: &mut R) -> Vec<Signal> {
    let count = rng.gen_range(0..=MAX_SIGNALS_PER_BATCH);
    let batch_ms = now.timestamp_millis();

    let mut signals = Vec::with_capacity(count);
    for i in 0..count {
        let symbol = SYMBOLS.choose(&mut *rng).copied().unwrap_or(SYMBOLS[0]);
        let vwap_gap_percent = 0.2 + rng.gen::<f64>() * 0.8;
        let rsi = 30.0 + rng.gen::<f64>() * 15.0;
        let volume_rank = rng.gen_range(1..=30);

        signals.push(Signal {
            id: format!("signal-{batch_ms}-{i}"),
            symbol: symbol.to_string(),
            timeframe: Timeframe::M15,
            datetime: now,
            rule: SIGNAL_RULE.to_string(),
            details: SignalDetails {
                vwap_gap_percent: round2(vwap_gap_percent),
                rsi: round2(rsi),
                volume_rank,
            },
        });
    }

    signals
}
