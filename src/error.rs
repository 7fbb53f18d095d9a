// =============================================================================
// Typed failures surfaced to the dashboard API
// =============================================================================

use thiserror::Error;

/// Failure of one attempt against the mock data source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Failed to fetch candle data from the mock server.")]
    Candles,

    #[error("Failed to fetch signals from the mock server.")]
    Signals,
}

/// Failure of the hosted text-generation call. Never retried.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("analysis request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("analysis API returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("analysis API returned no text")]
    EmptyResponse,
}
