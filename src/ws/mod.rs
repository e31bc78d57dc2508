pub mod handlers;
mod host;
mod player;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::protocol::{ClientMessage, RoomEvent, ServerMessage};
use crate::state::{normalize_room_code, AppState};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub room: String,
    pub player: String,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!(
        "WebSocket connection request: room={}, player={}",
        params.room,
        params.player
    );

    ws.on_upgrade(move |socket| handle_socket(socket, params, state))
}

async fn send_json(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize server message: {}", e);
            true
        }
    }
}

/// Handle one player's connection to one room
async fn handle_socket(socket: WebSocket, params: WsQuery, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let room_code = normalize_room_code(&params.room);
    let player_id = params.player;

    // Subscribe before the welcome snapshot so nothing falls in between
    let mut broadcast_rx = state.subscribe();

    let room = match state.room_view(&room_code, &player_id).await {
        Ok(room) => room,
        Err(e) => {
            tracing::warn!("Rejected socket for {} in room {}: {}", player_id, room_code, e);
            let _ = send_json(&mut sender, &ServerMessage::error(&e)).await;
            return;
        }
    };

    let welcome = ServerMessage::Welcome {
        player_id: player_id.clone(),
        room,
        server_now: chrono::Utc::now().to_rfc3339(),
    };
    if !send_json(&mut sender, &welcome).await {
        tracing::error!("Failed to send welcome message");
        return;
    }

    tracing::info!("WebSocket connected: room={}, player={}", room_code, player_id);

    let mut left = false;
    loop {
        tokio::select! {
            broadcast_msg = broadcast_rx.recv() => {
                match broadcast_msg {
                    Ok(msg) if msg.room_code == room_code => {
                        let closed = matches!(
                            msg.event,
                            RoomEvent::Message(ServerMessage::RoomClosed { .. })
                        );
                        if !send_json(&mut sender, &msg.event.render(&player_id)).await || closed {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Socket lagged by {} events, resyncing", skipped);
                        if let Ok(room) = state.room_view(&room_code, &player_id).await {
                            if !send_json(&mut sender, &ServerMessage::RoomUpdated { room }).await {
                                break;
                            }
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message: {}", text);

                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                let leaving = matches!(client_msg, ClientMessage::LeaveRoom);
                                if let Some(response) =
                                    handlers::handle_message(client_msg, &room_code, &player_id, &state).await
                                {
                                    left = leaving && matches!(response, ServerMessage::Left);
                                    if !send_json(&mut sender, &response).await {
                                        tracing::error!("Failed to send response");
                                        break;
                                    }
                                }
                                if left {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::warn!("Failed to parse client message: {}", e);
                                let error = ServerMessage::Error {
                                    code: "PARSE_ERROR".to_string(),
                                    msg: format!("Invalid message format: {}", e),
                                };
                                let _ = send_json(&mut sender, &error).await;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    // A dropped socket counts as leaving the room
    if !left {
        if let Err(e) = state.leave_room(&room_code, &player_id).await {
            tracing::debug!("Disconnect after room closed: {}", e);
        }
    }

    tracing::info!("WebSocket connection closed: room={}, player={}", room_code, player_id);
}
