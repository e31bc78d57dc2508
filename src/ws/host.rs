//! Host message handlers
//!
//! Lobby setup and phase control. The room rejects these with
//! `NOT_AUTHORIZED` unless the sender currently holds the host flag.

use super::handlers::rejected;
use crate::protocol::ServerMessage;
use crate::state::AppState;
use std::sync::Arc;

pub async fn handle_change_word_pack(
    state: &Arc<AppState>,
    room_code: &str,
    player_id: &str,
    pack: &str,
) -> Option<ServerMessage> {
    match state.change_word_pack(room_code, player_id, pack).await {
        Ok(room) => Some(ServerMessage::RoomUpdated { room }),
        Err(e) => rejected("word pack change", player_id, e),
    }
}

pub async fn handle_start_game(
    state: &Arc<AppState>,
    room_code: &str,
    player_id: &str,
) -> Option<ServerMessage> {
    tracing::info!("Host starting game in room {}", room_code);
    match state.start_game(room_code, player_id).await {
        Ok(room) => Some(ServerMessage::GameStarted { room }),
        Err(e) => rejected("start game", player_id, e),
    }
}

pub async fn handle_add_bot(
    state: &Arc<AppState>,
    room_code: &str,
    player_id: &str,
) -> Option<ServerMessage> {
    match state.add_bot(room_code, player_id).await {
        Ok(room) => Some(ServerMessage::RoomUpdated { room }),
        Err(e) => rejected("add bot", player_id, e),
    }
}

pub async fn handle_begin_voting(
    state: &Arc<AppState>,
    room_code: &str,
    player_id: &str,
) -> Option<ServerMessage> {
    match state.begin_voting(room_code, player_id).await {
        Ok(room) => Some(ServerMessage::RoomUpdated { room }),
        Err(e) => rejected("begin voting", player_id, e),
    }
}

pub async fn handle_end_voting(
    state: &Arc<AppState>,
    room_code: &str,
    player_id: &str,
) -> Option<ServerMessage> {
    tracing::info!("Host ending vote early in room {}", room_code);
    match state.force_resolve_voting(room_code, player_id).await {
        Ok(resolution) => Some(ServerMessage::VoteResolved {
            eliminated: resolution.eliminated,
            tally: resolution.tally,
            skips: resolution.skips,
        }),
        Err(e) => rejected("end voting", player_id, e),
    }
}

pub async fn handle_return_to_lobby(
    state: &Arc<AppState>,
    room_code: &str,
    player_id: &str,
) -> Option<ServerMessage> {
    match state.return_to_lobby(room_code, player_id).await {
        Ok(room) => Some(ServerMessage::RoomUpdated { room }),
        Err(e) => rejected("return to lobby", player_id, e),
    }
}
