// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. Failures are returned as
// `{ "error": "<banner message>" }` with a 4xx / 5xx status so the dashboard
// can show them directly.
//
// CORS is configured permissively; the dashboard is served from a different
// origin during development.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::analysis::ANALYSIS_FAILED_MESSAGE;
use crate::app_state::{AppState, SignalSet};
use crate::market_data::{Candle, ChartPoint};
use crate::signals::poller::SIGNAL_FETCH_FAILED;
use crate::signals::{refresh_signals, Signal};
use crate::types::{is_known_symbol, Timeframe, SYMBOLS, TIMEFRAMES};

/// User-facing message for a failed chart load.
pub const CANDLE_FETCH_FAILED: &str = "Failed to fetch candle data.";

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(serde_json::json!({ "error": message.into() })),
    )
}

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/meta", get(meta))
        .route("/api/v1/state", get(full_state))
        // ── Chart ───────────────────────────────────────────────────
        .route("/api/v1/candles", get(candles))
        .route("/api/v1/chart", get(chart))
        // ── Signals & analysis ──────────────────────────────────────
        .route("/api/v1/signals", get(signals))
        .route("/api/v1/signals/refresh", post(signals_refresh))
        .route("/api/v1/analysis", post(analysis))
        // ── WebSocket (handled separately in ws module but mounted here) ─
        .route("/api/v1/ws", get(crate::api::ws::ws_handler))
        // ── Middleware & State ───────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health & metadata
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        server_time: Utc::now().timestamp_millis(),
    };
    Json(resp)
}

#[derive(Serialize)]
struct MetaResponse {
    symbols: &'static [&'static str],
    timeframes: &'static [Timeframe],
    default_symbol: &'static str,
    default_timeframe: Timeframe,
}

async fn meta() -> impl IntoResponse {
    Json(MetaResponse {
        symbols: SYMBOLS,
        timeframes: TIMEFRAMES,
        default_symbol: SYMBOLS[0],
        default_timeframe: Timeframe::default(),
    })
}

async fn full_state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.build_snapshot())
}

// =============================================================================
// Candles / chart
// =============================================================================

#[derive(Debug, Deserialize)]
struct SeriesQuery {
    symbol: Option<String>,
    timeframe: Option<String>,
}

impl SeriesQuery {
    /// Validate against the fixed symbol / timeframe sets; missing values
    /// take the dashboard defaults.
    fn resolve(&self) -> Result<(String, Timeframe), ApiError> {
        let symbol = self.symbol.as_deref().unwrap_or(SYMBOLS[0]);
        if !is_known_symbol(symbol) {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                format!("Unknown symbol '{symbol}'"),
            ));
        }

        let timeframe = match self.timeframe.as_deref() {
            Some(tf) => tf
                .parse::<Timeframe>()
                .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?,
            None => Timeframe::default(),
        };

        Ok((symbol.to_string(), timeframe))
    }
}

/// Every series response names what it was generated for, so a client that
/// switched symbol mid-flight can drop a stale reply.
#[derive(Debug, Serialize, Deserialize)]
struct CandleSeriesResponse {
    symbol: String,
    timeframe: Timeframe,
    generated_at: DateTime<Utc>,
    candles: Vec<Candle>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChartResponse {
    symbol: String,
    timeframe: Timeframe,
    generated_at: DateTime<Utc>,
    points: Vec<ChartPoint>,
}

async fn load_series(
    state: &AppState,
    query: &SeriesQuery,
) -> Result<(String, Timeframe, Vec<Candle>), ApiError> {
    let (symbol, timeframe) = query.resolve()?;
    info!(symbol = %symbol, timeframe = %timeframe, "loading candle series");

    match state.feed.fetch_candles(&symbol, timeframe).await {
        Ok(candles) => Ok((symbol, timeframe, candles)),
        Err(e) => {
            warn!(symbol = %symbol, timeframe = %timeframe, error = %e, "candle fetch failed");
            state.push_error_with_code(CANDLE_FETCH_FAILED.to_string(), Some("candles".into()));
            Err(api_error(StatusCode::BAD_GATEWAY, CANDLE_FETCH_FAILED))
        }
    }
}

async fn candles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SeriesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (symbol, timeframe, candles) = load_series(&state, &query).await?;
    Ok(Json(CandleSeriesResponse {
        symbol,
        timeframe,
        generated_at: Utc::now(),
        candles,
    }))
}

async fn chart(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SeriesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (symbol, timeframe, candles) = load_series(&state, &query).await?;
    Ok(Json(ChartResponse {
        symbol,
        timeframe,
        generated_at: Utc::now(),
        points: candles.iter().map(ChartPoint::from_candle).collect(),
    }))
}

// =============================================================================
// Signals
// =============================================================================

async fn signals(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.signal_set())
}

async fn signals_refresh(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SignalSet>, ApiError> {
    refresh_signals(&state)
        .await
        .map_err(|_| api_error(StatusCode::BAD_GATEWAY, SIGNAL_FETCH_FAILED))?;
    Ok(Json(state.signal_set()))
}

// =============================================================================
// Analysis
// =============================================================================

/// Optional body: analyse these signals instead of the stored set. A request
/// without a JSON body uses the stored set; a malformed one is rejected.
#[derive(Debug, Deserialize)]
struct AnalysisRequest {
    #[serde(default)]
    signals: Vec<Signal>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AnalysisResponse {
    analysis: String,
    signal_count: usize,
}

async fn analysis(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let signals = match body {
        Ok(Json(req)) => req.signals,
        Err(JsonRejection::MissingJsonContentType(_)) => state.signal_set().signals,
        Err(rejection) => {
            warn!(error = %rejection, "malformed analysis request body");
            return Err(api_error(StatusCode::BAD_REQUEST, rejection.body_text()));
        }
    };

    match state.analysis.analyze_signals(&signals).await {
        Ok(text) => {
            info!(signal_count = signals.len(), "analysis produced");
            state.record_analysis(text.clone(), signals.len());
            Ok(Json(AnalysisResponse {
                analysis: text,
                signal_count: signals.len(),
            }))
        }
        Err(e) => {
            warn!(error = %e, "analysis request failed");
            state.push_error_with_code(ANALYSIS_FAILED_MESSAGE.to_string(), Some("analysis".into()));
            Err(api_error(StatusCode::BAD_GATEWAY, ANALYSIS_FAILED_MESSAGE))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::gemini::stub::{self, StubState};
    use crate::analysis::{AnalysisClient, GeminiSettings, NO_SIGNALS_MESSAGE, UNCONFIGURED_MESSAGE};
    use crate::market_data::{FeedConfig, MockFeed};
    use crate::retry::RetryPolicy;
    use crate::runtime_config::RuntimeConfig;
    use crate::signals::generate_signals;
    use axum::body::Body;
    use axum::http::{header, Request};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;
    use tower::ServiceExt;

    fn feed(failure_rate: f64) -> Arc<MockFeed> {
        let config = FeedConfig {
            failure_rate,
            candle_latency: (Duration::ZERO, Duration::ZERO),
            signal_latency: Duration::ZERO,
            retry: RetryPolicy::new(2, Duration::from_millis(1)),
            ..FeedConfig::default()
        };
        Arc::new(MockFeed::with_seed(config, 99))
    }

    fn state_with(failure_rate: f64, analysis: AnalysisClient) -> Arc<AppState> {
        Arc::new(AppState::new(RuntimeConfig::default(), feed(failure_rate), analysis))
    }

    async fn call(state: Arc<AppState>, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = router(state).oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn some_signals() -> Vec<Signal> {
        let mut rng = StdRng::seed_from_u64(5);
        loop {
            let batch = generate_signals(Utc::now(), &mut rng);
            if !batch.is_empty() {
                return batch;
            }
        }
    }

    #[tokio::test]
    async fn health_and_meta() {
        let state = state_with(0.0, AnalysisClient::Unconfigured);

        let (status, body) = call(state.clone(), get("/api/v1/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = call(state, get("/api/v1/meta")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbols"].as_array().unwrap().len(), 10);
        assert_eq!(body["timeframes"], serde_json::json!(["5m", "15m", "1h", "4h", "1d"]));
        assert_eq!(body["default_timeframe"], "1h");
    }

    #[tokio::test]
    async fn candles_default_request() {
        let state = state_with(0.0, AnalysisClient::Unconfigured);
        let (status, body) = call(state, get("/api/v1/candles")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "KRW-BTC");
        assert_eq!(body["timeframe"], "1h");
        let candles = body["candles"].as_array().unwrap();
        assert_eq!(candles.len(), 200);
        assert!(candles[0]["sma"].is_null());
        assert!(candles[20]["sma"].is_number());
        assert!(candles[199]["macd"].is_null());
    }

    #[tokio::test]
    async fn candles_reject_unknown_inputs() {
        let state = state_with(0.0, AnalysisClient::Unconfigured);

        let (status, body) = call(state.clone(), get("/api/v1/candles?symbol=BTCUSDT")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("BTCUSDT"));

        let (status, _) = call(state, get("/api/v1/candles?symbol=KRW-ETH&timeframe=2h")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn candles_fail_after_retries() {
        let state = state_with(1.0, AnalysisClient::Unconfigured);
        let (status, body) = call(state.clone(), get("/api/v1/candles?symbol=KRW-SOL&timeframe=5m")).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], CANDLE_FETCH_FAILED);
        assert_eq!(state.recent_errors.read().len(), 1);
    }

    #[tokio::test]
    async fn chart_points_carry_tooltip_fields() {
        let state = state_with(0.0, AnalysisClient::Unconfigured);
        let (status, body) = call(state, get("/api/v1/chart?symbol=KRW-ADA&timeframe=1d")).await;

        assert_eq!(status, StatusCode::OK);
        let points = body["points"].as_array().unwrap();
        assert_eq!(points.len(), 200);
        assert!(points[0]["label"].is_string());
        assert!(points[0]["vwap"].is_null());
        assert!(points[0]["rsi"].is_null());
        assert!(points[50]["vwap"].is_number());
        assert!(points[50]["rsi"].is_number());
    }

    #[tokio::test]
    async fn refresh_then_list_signals() {
        let state = state_with(0.0, AnalysisClient::Unconfigured);

        let (status, refreshed) = call(state.clone(), post_json("/api/v1/signals/refresh", serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(refreshed["updated_at"].is_string());

        let (status, listed) = call(state, get("/api/v1/signals")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["signals"], refreshed["signals"]);
    }

    #[tokio::test]
    async fn refresh_failure_is_bad_gateway() {
        let state = state_with(1.0, AnalysisClient::Unconfigured);
        let (status, body) = call(state, post_json("/api/v1/signals/refresh", serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], SIGNAL_FETCH_FAILED);
    }

    #[tokio::test]
    async fn analysis_without_signals() {
        let state = state_with(0.0, AnalysisClient::Unconfigured);
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/analysis")
            .body(Body::empty())
            .unwrap();

        let (status, body) = call(state.clone(), req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analysis"], NO_SIGNALS_MESSAGE);
        assert_eq!(state.build_snapshot().last_analysis.unwrap().text, NO_SIGNALS_MESSAGE);
    }

    #[tokio::test]
    async fn analysis_rejects_malformed_body() {
        let state = state_with(0.0, AnalysisClient::Unconfigured);
        state.replace_signals(some_signals());
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/analysis")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"signals\": [oops"))
            .unwrap();

        let (status, body) = call(state.clone(), req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
        assert!(state.build_snapshot().last_analysis.is_none());
    }

    #[tokio::test]
    async fn analysis_rejects_wrongly_shaped_signals() {
        let state = state_with(0.0, AnalysisClient::Unconfigured);
        let body = serde_json::json!({ "signals": [{ "symbol": "KRW-BTC" }] });

        let (status, _) = call(state.clone(), post_json("/api/v1/analysis", body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(state.build_snapshot().last_analysis.is_none());
    }

    #[tokio::test]
    async fn analysis_unconfigured() {
        let state = state_with(0.0, AnalysisClient::Unconfigured);
        let body = serde_json::json!({ "signals": some_signals() });

        let (status, body) = call(state, post_json("/api/v1/analysis", body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analysis"], UNCONFIGURED_MESSAGE);
    }

    #[tokio::test]
    async fn analysis_uses_stored_signals_and_model() {
        let stub_state = Arc::new(StubState::default());
        *stub_state.reply.lock() = (200, stub::text_reply("Risk-on across majors."));
        let settings = GeminiSettings {
            base_url: stub::spawn(stub_state.clone()).await,
            ..GeminiSettings::default()
        };
        let client = AnalysisClient::new(Some("key".into()), settings).unwrap();
        let state = state_with(0.0, client);
        state.replace_signals(some_signals());

        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/analysis")
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(state, req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analysis"], "Risk-on across majors.");
        assert_eq!(stub_state.requests.lock().len(), 1);
    }

    #[tokio::test]
    async fn analysis_upstream_failure() {
        let stub_state = Arc::new(StubState::default());
        *stub_state.reply.lock() = (500, serde_json::json!({ "error": "internal" }));
        let settings = GeminiSettings {
            base_url: stub::spawn(stub_state.clone()).await,
            ..GeminiSettings::default()
        };
        let client = AnalysisClient::new(Some("key".into()), settings).unwrap();
        let state = state_with(0.0, client);
        let body = serde_json::json!({ "signals": some_signals() });

        let (status, body) = call(state.clone(), post_json("/api/v1/analysis", body)).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], ANALYSIS_FAILED_MESSAGE);
        assert!(state.build_snapshot().last_analysis.is_none());
    }

    #[tokio::test]
    async fn state_snapshot_endpoint() {
        let state = state_with(0.0, AnalysisClient::Unconfigured);
        let (status, body) = call(state, get("/api/v1/state")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analysis_configured"], false);
        assert!(body["active_signals"]["signals"].as_array().unwrap().is_empty());
    }
}
