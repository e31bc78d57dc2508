//! WebSocket message dispatch
//!
//! This module provides the main entry point for handling client messages.
//! The acting player comes from the connection; host-only commands are
//! authorized by the room itself.

use crate::error::RoomError;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use std::sync::Arc;

use super::{host, player};

/// Handle client messages and return optional response
pub async fn handle_message(
    msg: ClientMessage,
    room_code: &str,
    player_id: &str,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        // Host-only commands
        ClientMessage::ChangeWordPack { pack } => {
            host::handle_change_word_pack(state, room_code, player_id, &pack).await
        }
        ClientMessage::StartGame => host::handle_start_game(state, room_code, player_id).await,
        ClientMessage::AddBot => host::handle_add_bot(state, room_code, player_id).await,
        ClientMessage::BeginVoting => host::handle_begin_voting(state, room_code, player_id).await,
        ClientMessage::EndVoting => host::handle_end_voting(state, room_code, player_id).await,
        ClientMessage::ReturnToLobby => {
            host::handle_return_to_lobby(state, room_code, player_id).await
        }

        // Player messages
        ClientMessage::SubmitStatement { text } => {
            player::handle_submit_statement(state, room_code, player_id, &text).await
        }
        ClientMessage::CastVote { target } => {
            player::handle_cast_vote(state, room_code, player_id, &target).await
        }
        ClientMessage::GuessWord { guess } => {
            player::handle_guess_word(state, room_code, player_id, &guess).await
        }
        ClientMessage::LeaveRoom => player::handle_leave_room(state, room_code, player_id).await,
        ClientMessage::Sync => player::handle_sync(state, room_code, player_id).await,
    }
}

/// Log a rejected command and turn it into the error reply
pub(super) fn rejected(action: &str, player_id: &str, err: RoomError) -> Option<ServerMessage> {
    tracing::warn!("Rejected {} from {}: {}", action, player_id, err);
    Some(ServerMessage::error(&err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Customization, GameState};

    async fn lobby(state: &Arc<AppState>, n: usize) -> (String, Vec<String>) {
        let (host, view) = state
            .create_room("Host", Customization::default())
            .await
            .unwrap();
        let mut ids = vec![host];
        for i in 1..n {
            let (id, _) = state
                .join_room(&view.room_code, &format!("P{}", i), Customization::default())
                .await
                .unwrap();
            ids.push(id);
        }
        (view.room_code, ids)
    }

    fn error_code(msg: Option<ServerMessage>) -> String {
        match msg {
            Some(ServerMessage::Error { code, .. }) => code,
            other => panic!("expected an error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_host_cannot_start() {
        let state = Arc::new(AppState::new());
        let (code, ids) = lobby(&state, 3).await;

        let response = handle_message(ClientMessage::StartGame, &code, &ids[1], &state).await;
        assert_eq!(error_code(response), "NOT_AUTHORIZED");
    }

    #[tokio::test]
    async fn test_start_with_too_few_players() {
        let state = Arc::new(AppState::new());
        let (code, ids) = lobby(&state, 2).await;

        let response = handle_message(ClientMessage::StartGame, &code, &ids[0], &state).await;
        assert_eq!(error_code(response), "NOT_ENOUGH_PLAYERS");
    }

    #[tokio::test]
    async fn test_start_game_replies_with_snapshot() {
        let state = Arc::new(AppState::new());
        let (code, ids) = lobby(&state, 3).await;

        match handle_message(ClientMessage::StartGame, &code, &ids[0], &state).await {
            Some(ServerMessage::GameStarted { room }) => {
                assert_eq!(room.game_state, GameState::Playing);
                assert_eq!(room.current_speaker.as_deref(), Some(ids[0].as_str()));
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_word_pack() {
        let state = Arc::new(AppState::new());
        let (code, ids) = lobby(&state, 1).await;

        let msg = ClientMessage::ChangeWordPack {
            pack: "Nope".to_string(),
        };
        let response = handle_message(msg, &code, &ids[0], &state).await;
        assert_eq!(error_code(response), "INVALID_WORD_PACK");
    }

    #[tokio::test]
    async fn test_statement_out_of_turn() {
        let state = Arc::new(AppState::new());
        let (code, ids) = lobby(&state, 3).await;
        handle_message(ClientMessage::StartGame, &code, &ids[0], &state).await;

        let msg = ClientMessage::SubmitStatement {
            text: "me first".to_string(),
        };
        let response = handle_message(msg, &code, &ids[2], &state).await;
        assert_eq!(error_code(response), "NOT_YOUR_TURN");
    }

    #[tokio::test]
    async fn test_sync_unknown_room() {
        let state = Arc::new(AppState::new());
        let response = handle_message(ClientMessage::Sync, "ZZZZZZ", "p", &state).await;
        assert_eq!(error_code(response), "ROOM_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_leave_replies_left() {
        let state = Arc::new(AppState::new());
        let (code, ids) = lobby(&state, 2).await;

        let response = handle_message(ClientMessage::LeaveRoom, &code, &ids[1], &state).await;
        assert!(matches!(response, Some(ServerMessage::Left)));
        assert_eq!(state.get_room(&code).await.unwrap().players.len(), 1);
    }
}
