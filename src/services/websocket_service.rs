//! WebSocket connection lifecycle for quiz clients.

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::ws::{ClientMessage, ServerMessage},
    error::EventError,
    services::room_service,
    state::SharedState,
};

/// Handle the full lifecycle for an individual quiz WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let connection_id = Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    info!(connection = %connection_id, "client connected");

    let mut forwarder: Option<JoinHandle<()>> = None;

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match ClientMessage::from_json_str(&text) {
                Ok(ClientMessage::Join { room, name }) => {
                    let joined = room_service::join(&state, connection_id, &room, &name).await;
                    // A rejoin replaces the previous room subscription.
                    if let Some(task) = forwarder.take() {
                        task.abort();
                    }
                    forwarder = Some(spawn_forwarder(joined.events, outbound_tx.clone()));
                    for message in &joined.direct {
                        send_message_to_websocket(&outbound_tx, message);
                    }
                }
                Ok(ClientMessage::Answer {
                    question_id,
                    answer,
                }) => {
                    if let Err(err) =
                        room_service::submit_answer(&state, connection_id, question_id, &answer)
                            .await
                    {
                        warn!(connection = %connection_id, error = %err, "dropping answer event");
                    }
                }
                Ok(ClientMessage::Chat { text }) => {
                    if let Err(err) = room_service::post_chat(&state, connection_id, &text).await {
                        warn!(connection = %connection_id, error = %err, "dropping chat event");
                    }
                }
                Ok(ClientMessage::Unknown) => {
                    warn!(connection = %connection_id, "ignoring unknown message type");
                }
                Err(err) => {
                    let err = EventError::from(err);
                    warn!(connection = %connection_id, error = %err, "failed to parse or validate client message");
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(connection = %connection_id, "client closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(connection = %connection_id, error = %err, "websocket error");
                break;
            }
        }
    }

    room_service::disconnect(&state, connection_id).await;
    if let Some(task) = forwarder.take() {
        task.abort();
    }
    info!(connection = %connection_id, "client disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Forward room broadcast events into this connection's writer queue.
fn spawn_forwarder(
    mut events: broadcast::Receiver<ServerMessage>,
    tx: mpsc::UnboundedSender<Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if !send_message_to_websocket(&tx, &event) {
                        break;
                    }
                }
                // The room was torn down; nothing more will arrive.
                Err(broadcast::error::RecvError::Closed) => break,
                // This connection fell behind; skip to the live stream.
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "connection lagged behind room broadcast");
                }
            }
        }
    })
}

/// Serialize a payload and queue it on the connection's writer.
///
/// Delivery is best effort: a serialization failure is logged and the event
/// skipped; a closed writer returns false so the caller stops forwarding.
fn send_message_to_websocket<T>(tx: &mpsc::UnboundedSender<Message>, value: &T) -> bool
where
    T: ?Sized + serde::Serialize + std::fmt::Debug,
{
    let payload = match serde_json::to_string(value) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "failed to serialize outbound message `{value:?}`");
            return true;
        }
    };

    tx.send(Message::Text(payload.into())).is_ok()
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
