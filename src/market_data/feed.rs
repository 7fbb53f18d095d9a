// =============================================================================
// Mock data feed — simulated latency and transient failures
// =============================================================================
//
// Stands in for a remote market-data server. Every attempt sleeps for a
// simulated network delay and then fails with probability `failure_rate`;
// the public fetchers hide those failures behind the retry policy.
//
// The RNG lives behind a parking_lot mutex and is never held across an
// `.await`, so the feed can be shared across tasks via `Arc`.
// =============================================================================

use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument};

use crate::error::FetchError;
use crate::market_data::{generate_candle_series, Candle, DEFAULT_CANDLE_COUNT};
use crate::retry::{with_retry, RetryPolicy};
use crate::signals::{generate_signals, Signal};
use crate::types::Timeframe;

/// Behaviour knobs for [`MockFeed`].
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Probability in [0, 1] that a single attempt fails.
    pub failure_rate: f64,
    /// Inclusive range of simulated candle latency.
    pub candle_latency: (Duration, Duration),
    /// Fixed simulated signal latency.
    pub signal_latency: Duration,
    /// Candles per series.
    pub candle_count: usize,
    pub retry: RetryPolicy,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            failure_rate: 0.1,
            candle_latency: (Duration::from_millis(500), Duration::from_millis(1000)),
            signal_latency: Duration::from_millis(300),
            candle_count: DEFAULT_CANDLE_COUNT,
            retry: RetryPolicy::default(),
        }
    }
}

/// In-process stand-in for the market-data and signal servers.
pub struct MockFeed {
    config: FeedConfig,
    rng: Mutex<StdRng>,
}

impl MockFeed {
    pub fn new(config: FeedConfig) -> Self {
        Self {
            config,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Feed with a fixed RNG seed, for reproducible runs.
    pub fn with_seed(config: FeedConfig, seed: u64) -> Self {
        Self {
            config,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    // -------------------------------------------------------------------------
    // Candles
    // -------------------------------------------------------------------------

    /// Annotated candle series for `symbol` / `timeframe`, retried per policy.
    pub async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<Vec<Candle>, FetchError> {
        with_retry(&self.config.retry, "fetch_candles", || {
            self.fetch_candles_once(symbol, timeframe)
        })
        .await
    }

    /// One unreliable attempt.
    #[instrument(skip(self), name = "feed::fetch_candles_once")]
    pub async fn fetch_candles_once(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<Vec<Candle>, FetchError> {
        let (min, max) = self.config.candle_latency;
        let delay = {
            let mut rng = self.rng.lock();
            rng.gen_range(min..=max.max(min))
        };
        tokio::time::sleep(delay).await;

        let mut rng = self.rng.lock();
        if self.roll_failure(&mut rng) {
            return Err(FetchError::Candles);
        }

        let candles = generate_candle_series(
            symbol,
            timeframe,
            Utc::now(),
            self.config.candle_count,
            &mut *rng,
        );
        debug!(symbol, %timeframe, count = candles.len(), "mock candles generated");
        Ok(candles)
    }

    // -------------------------------------------------------------------------
    // Signals
    // -------------------------------------------------------------------------

    /// Fresh signal batch, retried per policy.
    pub async fn fetch_signals(&self) -> Result<Vec<Signal>, FetchError> {
        with_retry(&self.config.retry, "fetch_signals", || self.fetch_signals_once()).await
    }

    /// One unreliable attempt.
    #[instrument(skip(self), name = "feed::fetch_signals_once")]
    pub async fn fetch_signals_once(&self) -> Result<Vec<Signal>, FetchError> {
        tokio::time::sleep(self.config.signal_latency).await;

        let mut rng = self.rng.lock();
        if self.roll_failure(&mut rng) {
            return Err(FetchError::Signals);
        }

        let signals = generate_signals(Utc::now(), &mut *rng);
        debug!(count = signals.len(), "mock signals generated");
        Ok(signals)
    }

    fn roll_failure(&self, rng: &mut StdRng) -> bool {
        rng.gen::<f64>() < self.config.failure_rate
    }
}
