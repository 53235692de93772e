//! WebSocket push channel.
//!
//! A new connection first receives the current status (and the latest
//! enrollment message when enrolling), then every push as it happens.
//! Subscription and snapshot are taken atomically, so nothing is missed or
//! sent twice. Incoming frames other than close are ignored.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use kiosk_controller::{Orchestrator, PushMessage};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

/// `GET /ws`
pub async fn push_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state.orchestrator))
}

async fn handle_socket(socket: WebSocket, orchestrator: Arc<Orchestrator>) {
    let mut subscription = orchestrator.subscribe();
    let (mut sender, mut receiver) = socket.split();
    debug!("Push client connected");

    for message in subscription.snapshot() {
        if sender.send(encode(&message)).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            pushed = subscription.receiver.recv() => match pushed {
                Ok(message) => {
                    if sender.send(encode(&message)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "Push client lagging"),
                Err(RecvError::Closed) => break,
            },

            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    warn!("WebSocket error: {}", e);
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }

    debug!("Push client disconnected");
}

fn encode(message: &PushMessage) -> Message {
    // PushMessage holds only strings and enums; serialisation cannot fail.
    let json = serde_json::to_string(message).unwrap_or_default();
    Message::Text(json.into())
}
