// =============================================================================
// Central Application State — Signal Desk
// =============================================================================
//
// Everything the dashboard sees that outlives a single request: the active
// signal set, the last AI summary and the recent error log. Chart series are
// not stored here; each candle request regenerates its own series.
//
// Thread safety:
//   - Atomic counters for lock-free version tracking.
//   - parking_lot::RwLock for all mutable shared values.
//   - Arc wrapper for the mock feed, which manages its own interior mutability.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::analysis::AnalysisClient;
use crate::market_data::MockFeed;
use crate::runtime_config::RuntimeConfig;
use crate::signals::Signal;

// =============================================================================
// Records
// =============================================================================

/// A recorded error event for the dashboard error banner / log.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    /// Human-readable error message.
    pub message: String,
    /// Optional machine-readable source (e.g. "signals", "analysis").
    pub code: Option<String>,
    /// ISO 8601 timestamp.
    pub at: String,
}

/// The current active signal set. Replaced wholesale on every refresh.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SignalSet {
    pub signals: Vec<Signal>,
    /// `None` until the first successful refresh.
    pub updated_at: Option<DateTime<Utc>>,
}

/// The most recent AI market summary.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRecord {
    pub text: String,
    pub signal_count: usize,
    pub generated_at: DateTime<Utc>,
}

/// Serialisable view of the whole dashboard state.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub state_version: u64,
    pub ws_sequence_number: u64,
    pub server_time: i64,
    pub uptime_secs: u64,
    pub analysis_configured: bool,
    pub active_signals: SignalSet,
    pub last_analysis: Option<AnalysisRecord>,
    pub recent_errors: Vec<ErrorRecord>,
}

// =============================================================================
// AppState
// =============================================================================

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

/// Central application state shared across all async tasks via `Arc<AppState>`.
pub struct AppState {
    // ── Version tracking ────────────────────────────────────────────────
    /// Monotonically increasing version counter. Incremented on every
    /// meaningful state mutation; the WebSocket feed pushes on change.
    pub state_version: AtomicU64,

    /// WebSocket message sequence number (incremented per message sent).
    pub ws_sequence_number: AtomicU64,

    // ── Configuration ───────────────────────────────────────────────────
    pub runtime_config: RuntimeConfig,

    // ── Data sources ────────────────────────────────────────────────────
    pub feed: Arc<MockFeed>,
    pub analysis: AnalysisClient,

    // ── Dashboard data ──────────────────────────────────────────────────
    pub active_signals: RwLock<SignalSet>,
    pub last_analysis: RwLock<Option<AnalysisRecord>>,

    // ── Error Log ───────────────────────────────────────────────────────
    pub recent_errors: RwLock<Vec<ErrorRecord>>,

    // ── Timing ──────────────────────────────────────────────────────────
    /// Instant when the server was started. Used for uptime calculations.
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Construct the shared state. The returned value is typically wrapped in
    /// `Arc` immediately.
    pub fn new(config: RuntimeConfig, feed: Arc<MockFeed>, analysis: AnalysisClient) -> Self {
        Self {
            state_version: AtomicU64::new(1),
            ws_sequence_number: AtomicU64::new(0),
            runtime_config: config,
            feed,
            analysis,
            active_signals: RwLock::new(SignalSet::default()),
            last_analysis: RwLock::new(None),
            recent_errors: RwLock::new(Vec::new()),
            start_time: std::time::Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    /// Atomically increment the state version.
    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    /// Read the current state version without modifying it.
    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Signals ─────────────────────────────────────────────────────────

    /// Replace the active signal set. No identity carries over.
    pub fn replace_signals(&self, signals: Vec<Signal>) {
        *self.active_signals.write() = SignalSet {
            signals,
            updated_at: Some(Utc::now()),
        };
        self.increment_version();
    }

    pub fn signal_set(&self) -> SignalSet {
        self.active_signals.read().clone()
    }

    // ── Analysis ────────────────────────────────────────────────────────

    pub fn record_analysis(&self, text: String, signal_count: usize) {
        *self.last_analysis.write() = Some(AnalysisRecord {
            text,
            signal_count,
            generated_at: Utc::now(),
        });
        self.increment_version();
    }

    // ── Error Logging ───────────────────────────────────────────────────

    /// Record an error with an optional machine-readable code. The log is
    /// capped at [`MAX_RECENT_ERRORS`]; oldest entries are evicted first.
    pub fn push_error_with_code(&self, msg: String, code: Option<String>) {
        let record = ErrorRecord {
            message: msg,
            code,
            at: Utc::now().to_rfc3339(),
        };

        let mut errors = self.recent_errors.write();
        errors.push(record);
        while errors.len() > MAX_RECENT_ERRORS {
            errors.remove(0);
        }
        drop(errors);

        self.increment_version();
    }

    // ── Snapshot Builder ────────────────────────────────────────────────

    /// Build the payload for `GET /api/v1/state` and the WebSocket feed.
    pub fn build_snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            state_version: self.current_state_version(),
            ws_sequence_number: self.ws_sequence_number.load(Ordering::Relaxed),
            server_time: Utc::now().timestamp_millis(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            analysis_configured: self.analysis.is_configured(),
            active_signals: self.signal_set(),
            last_analysis: self.last_analysis.read().clone(),
            recent_errors: self.recent_errors.read().clone(),
        }
    }
}
