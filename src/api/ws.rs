// =============================================================================
// WebSocket Handler — Push-based dashboard updates
// =============================================================================
//
// Clients connect to `/api/v1/ws` and receive:
//   1. An immediate full StateSnapshot on connect.
//   2. A fresh snapshot every 500 ms whenever the state_version has changed
//      since the last push (new signals, a new analysis, a logged error).
//
// Ping frames are answered with Pong. Every outbound snapshot bumps the
// shared `ws_sequence_number`.
// =============================================================================

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

use crate::app_state::AppState;

/// How often the push loop checks for a changed state version.
const PUSH_INTERVAL: Duration = Duration::from_millis(500);

/// Axum handler for the WebSocket upgrade request.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    info!("WebSocket connection accepted, upgrading");
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

// =============================================================================
// Connection handler
// =============================================================================

/// Manages a single WebSocket connection lifecycle: a push tick and the
/// inbound frame stream are multiplexed with `tokio::select!`.
async fn handle_ws_connection(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let mut last_sent_version = match send_snapshot(&mut sender, &state).await {
        Ok(version) => version,
        Err(e) => {
            warn!(error = %e, "failed to send initial WebSocket snapshot");
            return;
        }
    };

    let mut push_interval = interval(PUSH_INTERVAL);

    loop {
        tokio::select! {
            _ = push_interval.tick() => {
                if state.current_state_version() == last_sent_version {
                    continue;
                }
                match send_snapshot(&mut sender, &state).await {
                    Ok(version) => last_sent_version = version,
                    Err(e) => {
                        debug!(error = %e, "WebSocket send failed, disconnecting");
                        break;
                    }
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = sender.send(Message::Pong(data)).await {
                            debug!(error = %e, "failed to send Pong, disconnecting");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    // Text, binary and pong frames carry nothing for us.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket receive error, disconnecting");
                        break;
                    }
                }
            }
        }
    }

    info!("WebSocket connection closed");
}

// =============================================================================
// Helpers
// =============================================================================

/// Serialize and send the current StateSnapshot. Returns the state version
/// that was sent.
async fn send_snapshot<S>(sender: &mut S, state: &AppState) -> Result<u64, axum::Error>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    let seq = state.ws_sequence_number.fetch_add(1, Ordering::Relaxed) + 1;
    let snapshot = state.build_snapshot();

    match serde_json::to_string(&snapshot) {
        Ok(json) => {
            sender.send(Message::Text(json)).await?;
            debug!(version = snapshot.state_version, seq, "WebSocket snapshot sent");
        }
        Err(e) => {
            // Not a transport error; keep the connection.
            warn!(error = %e, "failed to serialize snapshot");
        }
    }

    Ok(snapshot.state_version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisClient;
    use crate::market_data::{FeedConfig, MockFeed};
    use crate::runtime_config::RuntimeConfig;
    use parking_lot::Mutex;

    #[tokio::test]
    async fn snapshot_carries_version_and_sequence() {
        let state = AppState::new(
            RuntimeConfig::default(),
            Arc::new(MockFeed::with_seed(FeedConfig::default(), 2)),
            AnalysisClient::Unconfigured,
        );
        state.record_analysis("Flat.".into(), 1);

        let sent = Arc::new(Mutex::new(Vec::new()));
        let sink_sent = sent.clone();
        let mut sink = Box::pin(futures_util::sink::unfold((), move |(), msg: Message| {
            let sink_sent = sink_sent.clone();
            async move {
                sink_sent.lock().push(msg);
                Ok::<_, axum::Error>(())
            }
        }));

        let version = send_snapshot(&mut sink, &state).await.unwrap();
        send_snapshot(&mut sink, &state).await.unwrap();

        assert_eq!(version, state.current_state_version());
        assert_eq!(state.ws_sequence_number.load(Ordering::Relaxed), 2);

        let sent = sent.lock();
        assert_eq!(sent.len(), 2);
        let Message::Text(first) = &sent[0] else {
            panic!("expected a text frame");
        };
        let value: serde_json::Value = serde_json::from_str(first).unwrap();
        assert_eq!(value["state_version"], version);
        assert_eq!(value["ws_sequence_number"], 1);
        assert_eq!(value["last_analysis"]["text"], "Flat.");
    }
}
