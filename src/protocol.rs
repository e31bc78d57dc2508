use crate::room::Room;
use crate::types::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Commands a connected player can send. The acting player is implied by the
/// connection (or the HTTP route), never by the message body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    // Host-only messages
    ChangeWordPack {
        pack: String,
    },
    StartGame,
    AddBot,
    /// Close the meeting window early
    BeginVoting,
    /// Close the vote now, counting missing ballots as skips
    EndVoting,
    ReturnToLobby,

    SubmitStatement {
        text: String,
    },
    /// `target` is a player id or `"skip"`
    CastVote {
        target: String,
    },
    GuessWord {
        guess: String,
    },
    LeaveRoom,
    /// Request a fresh snapshot
    Sync,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EliminationReason {
    VotedOut,
    Left,
    FailedGuess,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    Welcome {
        player_id: PlayerId,
        room: RoomView,
        server_now: String,
    },
    RoomUpdated {
        room: RoomView,
    },
    GameStarted {
        room: RoomView,
    },
    /// An accepted statement
    Chat {
        message: ChatMessage,
    },
    VotingStarted {
        deadline: Option<DateTime<Utc>>,
    },
    VoteResolved {
        eliminated: Option<PlayerId>,
        tally: HashMap<PlayerId, u32>,
        skips: u32,
    },
    PlayerEliminated {
        player_id: PlayerId,
        player_name: String,
        reason: EliminationReason,
    },
    GameOver {
        winner: Winner,
        imposter_id: Option<PlayerId>,
        secret_word: Option<String>,
    },
    /// The room no longer exists
    RoomClosed {
        room_code: RoomCode,
    },
    /// Sent to the speaker when their statement is accepted
    StatementAccepted {
        trigger_voting: bool,
    },
    VoteAccepted {
        voted: usize,
        alive: usize,
    },
    /// Sent to the imposter only
    GuessResult {
        correct: bool,
        attempts_left: u32,
    },
    Left,
    Error {
        code: String,
        msg: String,
    },
}

impl ServerMessage {
    pub fn error(err: &crate::error::RoomError) -> Self {
        Self::Error {
            code: err.code().to_string(),
            msg: err.to_string(),
        }
    }
}

/// Player as seen by a particular viewer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub customization: Customization,
    pub is_host: bool,
    pub is_alive: bool,
    /// Only true for the viewer themself, or for everyone once the game is over
    pub is_imposter: bool,
    pub has_spoken: bool,
    pub is_bot: bool,
    pub has_left: bool,
}

/// Room snapshot redacted for one viewer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub room_code: RoomCode,
    pub players: Vec<PlayerView>,
    pub host_id: PlayerId,
    pub game_state: GameState,
    pub current_turn: usize,
    pub current_speaker: Option<PlayerId>,
    /// Hidden from the imposter until the game is over
    pub secret_word: Option<String>,
    pub selected_word_pack: String,
    pub round_count: u32,
    pub votes: HashMap<PlayerId, VoteChoice>,
    pub winner: Option<Winner>,
    pub game_history: Vec<ChatMessage>,
    pub phase_deadline: Option<DateTime<Utc>>,
    /// The viewer's own role and guess budget
    pub you_are_imposter: bool,
    pub guess_attempts: Option<u32>,
}

impl RoomView {
    pub fn for_viewer(room: &Room, viewer_id: &str) -> Self {
        let viewer = room.player(viewer_id);
        let revealed = room.game_state == GameState::GameOver;
        let you_are_imposter = viewer.is_some_and(|p| p.is_imposter);
        let can_see_word = revealed || viewer.is_some_and(|p| !p.is_imposter);

        let players = room
            .players
            .iter()
            .map(|p| PlayerView {
                id: p.id.clone(),
                name: p.name.clone(),
                customization: p.customization.clone(),
                is_host: p.is_host,
                is_alive: p.is_alive,
                is_imposter: p.is_imposter && (revealed || p.id == viewer_id),
                has_spoken: p.has_spoken,
                is_bot: p.is_bot,
                has_left: p.has_left,
            })
            .collect();

        Self {
            room_code: room.room_code.clone(),
            players,
            host_id: room.host_id.clone(),
            game_state: room.game_state,
            current_turn: room.current_turn,
            current_speaker: room.current_speaker().map(|p| p.id.clone()),
            secret_word: room.secret_word.clone().filter(|_| can_see_word),
            selected_word_pack: room.selected_word_pack.clone(),
            round_count: room.round_count,
            votes: room.votes.clone(),
            winner: room.winner,
            game_history: room.game_history.clone(),
            phase_deadline: room.phase_deadline,
            you_are_imposter,
            guess_attempts: viewer
                .filter(|p| p.is_imposter)
                .map(|p| p.guess_attempts),
        }
    }
}

/// Something that happened in a room, fanned out to every connection of that
/// room. Snapshots are rendered per viewer on the way out.
#[derive(Debug, Clone)]
pub enum RoomEvent {
    Snapshot { room: Arc<Room>, started: bool },
    Message(ServerMessage),
}

impl RoomEvent {
    pub fn render(&self, viewer_id: &str) -> ServerMessage {
        match self {
            Self::Snapshot {
                room,
                started: true,
            } => ServerMessage::GameStarted {
                room: RoomView::for_viewer(room, viewer_id),
            },
            Self::Snapshot { room, .. } => ServerMessage::RoomUpdated {
                room: RoomView::for_viewer(room, viewer_id),
            },
            Self::Message(msg) => msg.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoomBroadcast {
    pub room_code: RoomCode,
    pub event: RoomEvent,
}
