// =============================================================================
// Volume-Weighted Average Price (VWAP) — expanding window
// =============================================================================
//
// vwap[i] = Σ_{j<=i} tp_j * v_j / Σ_{j<=i} v_j,  tp = (high + low + close) / 3
//
// The window always starts at the first candle of the series. When the
// cumulative volume is zero the candle's own close is used instead.
// =============================================================================

use crate::market_data::Candle;

/// Typical price of a candle.
pub fn typical_price(candle: &Candle) -> f64 {
    (candle.high + candle.low + candle.close) / 3.0
}

/// Running VWAP for every candle in `candles`; output has the same length.
pub fn cumulative_vwap(candles: &[Candle]) -> Vec<f64> {
    let mut total_pv = 0.0;
    let mut total_volume = 0.0;

    candles
        .iter()
        .map(|c| {
            total_pv += typical_price(c) * c.volume;
            total_volume += c.volume;
            if total_volume > 0.0 {
                total_pv / total_volume
            } else {
                c.close
            }
        })
        .collect()
}
