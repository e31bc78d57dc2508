//! Failures of room commands.
//!
//! Every variant is recoverable: the room is left untouched and the caller
//! turns the error into a rejection for the requesting client.

use crate::types::{GameState, PlayerId, RoomCode};
use axum::http::StatusCode;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoomError {
    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    #[error("only the host can do that")]
    NotAuthorized,

    #[error("not allowed while the room is in {actual} (expected {expected})")]
    InvalidPhase {
        expected: &'static str,
        actual: GameState,
    },

    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("unknown word pack: {0}")]
    InvalidWordPack(String),

    #[error("it is not your turn")]
    NotYourTurn,

    #[error("eliminated players cannot do that")]
    PlayerNotAlive,

    #[error("player {0} is not in this room")]
    PlayerNotFound(PlayerId),

    #[error("room is full")]
    RoomFull,

    #[error("need at least {required} players to start (have {actual})")]
    NotEnoughPlayers { required: usize, actual: usize },

    #[error("player name must not be empty")]
    InvalidName,
}

impl RoomError {
    /// Stable code sent to clients in `Error` messages
    pub fn code(&self) -> &'static str {
        match self {
            Self::RoomNotFound(_) => "ROOM_NOT_FOUND",
            Self::NotAuthorized => "NOT_AUTHORIZED",
            Self::InvalidPhase { .. } => "INVALID_PHASE",
            Self::InvalidTarget(_) => "INVALID_TARGET",
            Self::InvalidWordPack(_) => "INVALID_WORD_PACK",
            Self::NotYourTurn => "NOT_YOUR_TURN",
            Self::PlayerNotAlive => "PLAYER_NOT_ALIVE",
            Self::PlayerNotFound(_) => "PLAYER_NOT_FOUND",
            Self::RoomFull => "ROOM_FULL",
            Self::NotEnoughPlayers { .. } => "NOT_ENOUGH_PLAYERS",
            Self::InvalidName => "INVALID_NAME",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::RoomNotFound(_) | Self::PlayerNotFound(_) => StatusCode::NOT_FOUND,
            Self::NotAuthorized | Self::NotYourTurn | Self::PlayerNotAlive => {
                StatusCode::FORBIDDEN
            }
            Self::InvalidPhase { .. } | Self::RoomFull => StatusCode::CONFLICT,
            Self::InvalidTarget(_)
            | Self::InvalidWordPack(_)
            | Self::NotEnoughPlayers { .. }
            | Self::InvalidName => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_and_status() {
        let err = RoomError::RoomNotFound("ABC123".to_string());
        assert_eq!(err.code(), "ROOM_NOT_FOUND");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "room ABC123 not found");

        assert_eq!(RoomError::NotYourTurn.status(), StatusCode::FORBIDDEN);
        assert_eq!(RoomError::RoomFull.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_invalid_phase_message() {
        let err = RoomError::InvalidPhase {
            expected: "voting",
            actual: GameState::Playing,
        };
        assert_eq!(
            err.to_string(),
            "not allowed while the room is in playing (expected voting)"
        );
    }
}
