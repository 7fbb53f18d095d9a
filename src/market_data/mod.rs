pub mod candle;
pub mod feed;
pub mod generator;

// Re-export the Candle struct for convenient access (e.g. `use crate::market_data::Candle`).
pub use candle::{Candle, ChartPoint};
pub use feed::{FeedConfig, MockFeed};
pub use generator::{generate_candle_series, DEFAULT_CANDLE_COUNT, MAX_CANDLE_COUNT};
