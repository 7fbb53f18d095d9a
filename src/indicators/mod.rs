// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator functions over close / candle slices, plus
// the calculator that annotates a whole candle series for the chart. Every
// windowed function returns `Option<T>` so callers handle insufficient data
// explicitly.

pub mod bollinger;
pub mod calculator;
pub mod rsi;
pub mod sma;
pub mod vwap;

pub use calculator::calculate_indicators;
