// =============================================================================
// Mock Market Data Generator
// =============================================================================
//
// Produces a synthetic random-walk OHLCV series for the chart:
//
//   seed close = 50 000 + (symbol[4] - 'A') * 1 000 + U * 5 000
//   open       = previous close
//   close      = open + (U - 0.5) * open * 5%          (step in ±2.5%)
//   high       = max(open, close) + U * open * 1%
//   low        = min(open, close) - U * open * 1%
//   volume     = 50 + U * 100
//
// U is a uniform draw in [0, 1) from the caller-supplied RNG, so a seeded RNG
// gives a reproducible series.
// =============================================================================

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::indicators::calculate_indicators;
use crate::market_data::Candle;
use crate::types::Timeframe;

/// Number of candles returned per chart request.
pub const DEFAULT_CANDLE_COUNT: usize = 200;

/// Upper bound on a configured series length.
pub const MAX_CANDLE_COUNT: usize = 10_000;

/// Starting price for `symbol`. The fifth byte of the symbol (the first
/// letter of the base asset in `KRW-XXX`) shifts the level by 1 000 per letter.
pub fn seed_price<R: Rng>(symbol: &str, rng: &mut R) -> f64 {
    let letter = symbol.as_bytes().get(4).copied().unwrap_or(b'A');
    let offset = (f64::from(letter) - f64::from(b'A')) * 1_000.0;
    50_000.0 + offset + rng.gen::<f64>() * 5_000.0
}

/// Next candle of the random walk, opening at `prev_close`.
pub fn next_candle<R: Rng>(prev_close: f64, at: DateTime<Utc>, rng: &mut R) -> Candle {
    let open = prev_close;
    let change = (rng.gen::<f64>() - 0.5) * open * 0.05;
    let close = open + change;
    let high = open.max(close) + rng.gen::<f64>() * open * 0.01;
    let low = open.min(close) - rng.gen::<f64>() * open * 0.01;
    let volume = rng.gen::<f64>() * 100.0 + 50.0;

    Candle::new(at, open, high, low, close, volume)
}

/// `count` raw candles ending at `now`, spaced by the timeframe interval.
/// Indicator columns are left empty.
pub fn generate_raw_candles<R: Rng>(
    symbol: &str,
    timeframe: Timeframe,
    now: DateTime<Utc>,
    count: usize,
    rng: &mut R,
) -> Vec<Candle> {
    let interval = timeframe.interval_minutes();
    let mut prev_close = seed_price(symbol, rng);
    let mut candles = Vec::with_capacity(count);

    for i in 0..count {
        let back = (count - 1 - i) as i64;
        let at = now - Duration::minutes(interval * back);
        let candle = next_candle(prev_close, at, rng);
        prev_close = candle.close;
        candles.push(candle);
    }

    candles
}

/// Full chart series: raw candles annotated with indicators.
pub fn generate_candle_series<R: Rng>(
    symbol: &str,
    timeframe: Timeframe,
    now: DateTime<Utc>,
    count: usize,
    rng: &mut R,
) -> Vec<Candle> {
    let raw = generate_raw_candles(symbol, timeframe, now, count, rng);
    calculate_indicators(&raw)
}
