// =============================================================================
// Runtime Configuration — dashboard backend settings
// =============================================================================
//
// Loaded once at startup from a JSON file. All fields carry
// `#[serde(default)]` so a partial (or empty) file still loads, and a missing
// file falls back to defaults in `main.rs`.
//
// The symbol list and timeframes are compile-time constants (see `types.rs`)
// and deliberately not configurable here. The analysis API key is read from
// the environment only.
// =============================================================================

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::GeminiSettings;
use crate::market_data::{FeedConfig, DEFAULT_CANDLE_COUNT, MAX_CANDLE_COUNT};
use crate::retry::RetryPolicy;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_signal_poll_interval_secs() -> u64 {
    300
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_initial_delay_ms() -> u64 {
    500
}

fn default_mock_failure_rate() -> f64 {
    0.1
}

fn default_candle_latency_min_ms() -> u64 {
    500
}

fn default_candle_latency_max_ms() -> u64 {
    1000
}

fn default_signal_latency_ms() -> u64 {
    300
}

fn default_candle_count() -> usize {
    DEFAULT_CANDLE_COUNT
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Startup configuration for the dashboard backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Address the HTTP / WebSocket API binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Seconds between background signal refreshes.
    #[serde(default = "default_signal_poll_interval_secs")]
    pub signal_poll_interval_secs: u64,

    // --- Retry ----------------------------------------------------------------

    /// Attempts per mock fetch.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Backoff after the first failed attempt; doubles each time.
    #[serde(default = "default_retry_initial_delay_ms")]
    pub retry_initial_delay_ms: u64,

    // --- Mock feed ------------------------------------------------------------

    /// Probability that a single mock fetch attempt fails.
    #[serde(default = "default_mock_failure_rate")]
    pub mock_failure_rate: f64,

    #[serde(default = "default_candle_latency_min_ms")]
    pub candle_latency_min_ms: u64,

    #[serde(default = "default_candle_latency_max_ms")]
    pub candle_latency_max_ms: u64,

    #[serde(default = "default_signal_latency_ms")]
    pub signal_latency_ms: u64,

    /// Candles per chart series, capped at [`MAX_CANDLE_COUNT`].
    #[serde(default = "default_candle_count")]
    pub candle_count: usize,

    // --- Analysis -------------------------------------------------------------

    /// Model, endpoint and sampling settings for the AI summary.
    #[serde(default)]
    pub analysis: GeminiSettings,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            signal_poll_interval_secs: default_signal_poll_interval_secs(),
            retry_attempts: default_retry_attempts(),
            retry_initial_delay_ms: default_retry_initial_delay_ms(),
            mock_failure_rate: default_mock_failure_rate(),
            candle_latency_min_ms: default_candle_latency_min_ms(),
            candle_latency_max_ms: default_candle_latency_max_ms(),
            signal_latency_ms: default_signal_latency_ms(),
            candle_count: default_candle_count(),
            analysis: GeminiSettings::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            bind_addr = %config.bind_addr,
            failure_rate = config.mock_failure_rate,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Apply `SIGNAL_DESK_BIND_ADDR` and `GEMINI_MODEL` overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = lookup("SIGNAL_DESK_BIND_ADDR").filter(|s| !s.trim().is_empty()) {
            self.bind_addr = addr.trim().to_string();
        }
        if let Some(model) = lookup("GEMINI_MODEL").filter(|s| !s.trim().is_empty()) {
            self.analysis.model = model.trim().to_string();
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            Duration::from_millis(self.retry_initial_delay_ms),
        )
    }

    pub fn signal_poll_interval(&self) -> Duration {
        Duration::from_secs(self.signal_poll_interval_secs.max(1))
    }

    pub fn feed_config(&self) -> FeedConfig {
        FeedConfig {
            failure_rate: self.mock_failure_rate.clamp(0.0, 1.0),
            candle_latency: (
                Duration::from_millis(self.candle_latency_min_ms),
                Duration::from_millis(self.candle_latency_max_ms),
            ),
            signal_latency: Duration::from_millis(self.signal_latency_ms),
            candle_count: self.candle_count.min(MAX_CANDLE_COUNT),
            retry: self.retry_policy(),
        }
    }
}
