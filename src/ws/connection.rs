//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered events.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::app_state::AppState;
use crate::domain::{FeedChannel, FeedEvent};

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<FeedEvent>,
    state: AppState,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &mut subs, &state);
                        if let Ok(resp_json) = serde_json::to_string(&response)
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            // Event from EventBus
            event = event_rx.recv() => {
                match event {
                    Ok(feed_event) => {
                        if !subs.matches(feed_event.channel()) {
                            continue;
                        }
                        let Ok(payload) = serde_json::to_value(&feed_event) else {
                            tracing::warn!(
                                event = feed_event.event_type_str(),
                                "unserializable feed event"
                            );
                            continue;
                        };
                        let msg = WsMessage::new(
                            uuid::Uuid::new_v4().to_string(),
                            WsMessageType::Event,
                            payload,
                        );
                        if let Ok(json) = serde_json::to_string(&msg)
                            && ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Splits client channel names into known channels, the wildcard flag and
/// names that matched nothing.
fn parse_channels(names: &[String]) -> (Vec<FeedChannel>, bool, Vec<String>) {
    let mut channels = Vec::new();
    let mut wildcard = false;
    let mut unknown = Vec::new();
    for name in names {
        if name == "*" {
            wildcard = true;
        } else if let Some(channel) = FeedChannel::parse(name) {
            channels.push(channel);
        } else {
            unknown.push(name.clone());
        }
    }
    (channels, wildcard, unknown)
}

/// Handles a text message from the client and returns the reply.
fn handle_text_message(text: &str, subs: &mut SubscriptionManager, state: &AppState) -> WsMessage {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return WsMessage::error(String::new(), 400, "malformed JSON");
    };
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return WsMessage::error(msg.id, 404, "unknown command");
    };

    let payload = match command {
        WsCommand::Subscribe { channels } => {
            let (parsed, wildcard, unknown) = parse_channels(&channels);
            subs.subscribe(&parsed, wildcard);
            let mut payload = serde_json::json!({
                "subscribed": parsed,
                "ignored": unknown,
                "count": subs.count(),
                "wildcard": subs.is_subscribed_all(),
            });
            // New alert subscribers start from the current list.
            if (wildcard || parsed.contains(&FeedChannel::Alerts))
                && let Some(obj) = payload.as_object_mut()
            {
                obj.insert("alerts".to_string(), alerts_json(state));
            }
            if (wildcard || parsed.contains(&FeedChannel::Connection))
                && let Some(obj) = payload.as_object_mut()
            {
                obj.insert("connection".to_string(), connection_json(state));
            }
            payload
        }
        WsCommand::Unsubscribe { channels } => {
            let (parsed, wildcard, unknown) = parse_channels(&channels);
            subs.unsubscribe(&parsed, wildcard);
            serde_json::json!({
                "unsubscribed": parsed,
                "ignored": unknown,
                "remaining_count": subs.count(),
                "wildcard": subs.is_subscribed_all(),
            })
        }
        WsCommand::GetAlerts => serde_json::json!({ "alerts": alerts_json(state) }),
        WsCommand::GetConnection => serde_json::json!({ "connection": connection_json(state) }),
    };

    WsMessage::new(msg.id, WsMessageType::Response, payload)
}

fn alerts_json(state: &AppState) -> serde_json::Value {
    serde_json::to_value(state.feed.snapshot()).unwrap_or_default()
}

fn connection_json(state: &AppState) -> serde_json::Value {
    let current = state.connection_state();
    serde_json::json!({ "state": current, "connected": current.is_connected() })
}
