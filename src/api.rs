//! HTTP API endpoints.
//!
//! Rooms are created and joined over HTTP; after that a client either opens
//! the WebSocket or keeps driving the room through the command route.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::RoomError;
use crate::protocol::{ClientMessage, RoomView, ServerMessage};
use crate::state::AppState;
use crate::types::{Customization, PlayerId};
use crate::words;
use crate::ws::handlers;

impl IntoResponse for RoomError {
    fn into_response(self) -> Response {
        (self.status(), Json(ServerMessage::error(&self))).into_response()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub player_name: String,
    #[serde(default)]
    pub customization: Customization,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub player_id: PlayerId,
    pub room: RoomView,
}

#[derive(Debug, Deserialize)]
pub struct ViewerQuery {
    pub player: String,
}

/// Create a room hosted by the caller.
///
/// POST /api/rooms
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(req): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, RoomError> {
    let (player_id, room) = state.create_room(&req.player_name, req.customization).await?;
    Ok(Json(JoinResponse { player_id, room }))
}

/// Join a room that is still in its lobby.
///
/// POST /api/rooms/{code}/join
pub async fn join_room(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Json(req): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, RoomError> {
    let (player_id, room) = state
        .join_room(&code, &req.player_name, req.customization)
        .await?;
    Ok(Json(JoinResponse { player_id, room }))
}

/// Snapshot of a room as one of its players sees it.
///
/// GET /api/rooms/{code}?player={id}
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Query(viewer): Query<ViewerQuery>,
) -> Result<Json<RoomView>, RoomError> {
    Ok(Json(state.room_view(&code, &viewer.player).await?))
}

/// Run a command on behalf of a player, same envelope as the WebSocket.
///
/// POST /api/rooms/{code}/players/{id}/commands
pub async fn room_command(
    State(state): State<Arc<AppState>>,
    Path((code, player_id)): Path<(String, String)>,
    Json(msg): Json<ClientMessage>,
) -> Response {
    match handlers::handle_message(msg, &code, &player_id, &state).await {
        Some(reply) => Json(reply).into_response(),
        None => axum::http::StatusCode::NO_CONTENT.into_response(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordPackInfo {
    pub name: String,
    pub word_count: usize,
    pub is_default: bool,
}

/// List the built-in word packs.
///
/// GET /api/word-packs
pub async fn list_word_packs() -> Json<Vec<WordPackInfo>> {
    Json(
        words::WORD_PACKS
            .iter()
            .map(|(name, words)| WordPackInfo {
                name: name.to_string(),
                word_count: words.len(),
                is_default: *name == words::DEFAULT_WORD_PACK,
            })
            .collect(),
    )
}
