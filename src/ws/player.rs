//! Player message handlers
//!
//! Statements, votes, the imposter's guess, leaving and resyncing.

use super::handlers::rejected;
use crate::protocol::ServerMessage;
use crate::state::AppState;
use std::sync::Arc;

pub async fn handle_submit_statement(
    state: &Arc<AppState>,
    room_code: &str,
    player_id: &str,
    text: &str,
) -> Option<ServerMessage> {
    match state.submit_statement(room_code, player_id, text).await {
        Ok(outcome) => Some(ServerMessage::StatementAccepted {
            trigger_voting: outcome.trigger_voting,
        }),
        Err(e) => rejected("statement", player_id, e),
    }
}

pub async fn handle_cast_vote(
    state: &Arc<AppState>,
    room_code: &str,
    player_id: &str,
    target: &str,
) -> Option<ServerMessage> {
    tracing::debug!("Vote from {} in room {}: {}", player_id, room_code, target);
    match state.cast_vote(room_code, player_id, target).await {
        Ok(outcome) => Some(ServerMessage::VoteAccepted {
            voted: outcome.voted,
            alive: outcome.alive,
        }),
        Err(e) => rejected("vote", player_id, e),
    }
}

pub async fn handle_guess_word(
    state: &Arc<AppState>,
    room_code: &str,
    player_id: &str,
    guess: &str,
) -> Option<ServerMessage> {
    match state.guess_word(room_code, player_id, guess).await {
        Ok(outcome) => Some(ServerMessage::GuessResult {
            correct: outcome.correct,
            attempts_left: outcome.attempts_left,
        }),
        Err(e) => rejected("guess", player_id, e),
    }
}

pub async fn handle_leave_room(
    state: &Arc<AppState>,
    room_code: &str,
    player_id: &str,
) -> Option<ServerMessage> {
    tracing::info!("Player {} leaving room {}", player_id, room_code);
    match state.leave_room(room_code, player_id).await {
        Ok(_) => Some(ServerMessage::Left),
        Err(e) => rejected("leave", player_id, e),
    }
}

pub async fn handle_sync(
    state: &Arc<AppState>,
    room_code: &str,
    player_id: &str,
) -> Option<ServerMessage> {
    match state.room_view(room_code, player_id).await {
        Ok(room) => Some(ServerMessage::RoomUpdated { room }),
        Err(e) => rejected("sync", player_id, e),
    }
}
