// =============================================================================
// WebSocket Handler — push-based dashboard updates
// =============================================================================
//
// Clients connect to `/api/v1/ws` and receive:
//   1. An immediate full StateView on connect.
//   2. A fresh StateView every 500 ms whenever the state_version has changed
//      since the last push.
//
// Ping frames are answered with Pong; text frames are ignored.
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
use futures_util::{SinkExt, StreamExt};
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

use crate::app_state::AppState;

const PUSH_INTERVAL_MS: u64 = 500;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    info!("WebSocket connection accepted — upgrading");
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

async fn handle_ws_connection(socket: WebSocket, state: Arc<AppState>) {
    let clients = state.ws_clients.fetch_add(1, Ordering::SeqCst) + 1;
    info!(clients, "WebSocket client connected");

    let (mut sender, mut receiver) = socket.split();

    let mut last_sent_version = match send_state(&mut sender, &state).await {
        Ok(version) => version,
        Err(e) => {
            warn!(error = %e, "Failed to send initial WebSocket state");
            cleanup(&state);
            return;
        }
    };

    let mut push_interval = interval(Duration::from_millis(PUSH_INTERVAL_MS));

    loop {
        tokio::select! {
            _ = push_interval.tick() => {
                if state.current_state_version() != last_sent_version {
                    match send_state(&mut sender, &state).await {
                        Ok(version) => last_sent_version = version,
                        Err(e) => {
                            debug!(error = %e, "WebSocket send failed — disconnecting");
                            break;
                        }
                    }
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = sender.send(Message::Pong(data)).await {
                            debug!(error = %e, "Failed to send Pong — disconnecting");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("WebSocket Close frame received — disconnecting");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket receive error — disconnecting");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    cleanup(&state);
}

/// Serialize and send the current StateView. Returns the version of the view
/// that was sent.
async fn send_state<S>(sender: &mut S, state: &AppState) -> Result<u64, S::Error>
where
    S: futures_util::Sink<Message> + Unpin,
{
    let view = state.build_state_view();

    match serde_json::to_string(&view) {
        Ok(json) => {
            sender.send(Message::Text(json)).await?;
            debug!(version = view.state_version, "WebSocket state sent");
        }
        Err(e) => {
            // Not a network error; keep the connection.
            warn!(error = %e, "Failed to serialize state view");
        }
    }
    Ok(view.state_version)
}

fn cleanup(state: &Arc<AppState>) {
    let remaining = state.ws_clients.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
    info!(remaining, "WebSocket connection closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::DashboardEvent;
    use crate::market_data::HistoryClient;
    use crate::runtime_config::RuntimeConfig;

    fn test_state() -> AppState {
        AppState::new(
            RuntimeConfig::default(),
            HistoryClient::new(None, 10, true).unwrap(),
        )
    }

    fn sent_view(msg: &Message) -> serde_json::Value {
        match msg {
            Message::Text(text) => serde_json::from_str(text).unwrap(),
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_state_reports_version_of_the_view_it_sent() {
        let state = test_state();
        let mut sink: Vec<Message> = Vec::new();

        let sent = send_state(&mut sink, &state).await.unwrap();
        assert_eq!(sink.len(), 1);
        assert_eq!(sent_view(&sink[0])["state_version"], sent);

        // An event landing after the send leaves the recorded version behind,
        // so the next push tick resends.
        state.dispatch(DashboardEvent::add_holding("AAPL", 1.0, 100.0)).unwrap();
        assert_ne!(state.current_state_version(), sent);

        let resent = send_state(&mut sink, &state).await.unwrap();
        assert_eq!(resent, state.current_state_version());
        let view = sent_view(&sink[1]);
        assert_eq!(view["portfolio"]["holdings"].as_array().unwrap().len(), 1);
    }
}
