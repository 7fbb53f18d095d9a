// =============================================================================
// Indicator Calculator — annotates a candle series for the chart
// =============================================================================
//
// For every candle at index `i >= SMA_PERIOD`:
//   sma / bb_* : 20-close Bollinger Bands (2σ, population stddev)
//   ema_fast   : trailing mean of 12 closes
//   ema_slow   : trailing mean of 26 closes, or of every close so far
//                while fewer than 26 exist (i = 20..=24)
//   rsi        : 14-close windowed RSI
//   vwap       : expanding VWAP from the start of the series
//
// Candles before the warm-up are returned untouched, every indicator column
// `None`. The MACD columns are never written.
// =============================================================================

use crate::indicators::bollinger::calculate_bollinger;
use crate::indicators::rsi::window_rsi;
use crate::indicators::sma::simple_mean;
use crate::indicators::vwap::cumulative_vwap;
use crate::market_data::Candle;

/// Bollinger / SMA window; also the warm-up before any windowed column is set.
pub const SMA_PERIOD: usize = 20;
pub const BOLLINGER_STD: f64 = 2.0;
pub const EMA_FAST_PERIOD: usize = 12;
pub const EMA_SLOW_PERIOD: usize = 26;
pub const RSI_PERIOD: usize = 14;

/// Return a copy of `candles` with the indicator columns filled in.
///
/// The output has the same length and order as the input; OHLCV fields are
/// untouched.
pub fn calculate_indicators(candles: &[Candle]) -> Vec<Candle> {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let vwap = cumulative_vwap(candles);

    candles
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let mut out = c.clone();
            if i < SMA_PERIOD {
                return out;
            }

            out.vwap = Some(vwap[i]);
            let history = &closes[..=i];
            if let Some(bb) = calculate_bollinger(history, SMA_PERIOD, BOLLINGER_STD) {
                out.sma = Some(bb.middle);
                out.bb_middle = Some(bb.middle);
                out.bb_upper = Some(bb.upper);
                out.bb_lower = Some(bb.lower);
            }
            out.ema_fast = simple_mean(history, EMA_FAST_PERIOD);
            out.ema_slow = simple_mean(history, EMA_SLOW_PERIOD.min(history.len()));
            out.rsi = window_rsi(history, RSI_PERIOD);
            out
        })
        .collect()
}
