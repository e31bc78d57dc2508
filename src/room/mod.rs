//! The authoritative model of a single game room.
//!
//! Every operation here is synchronous and validates before it mutates, so a
//! returned `Err` always leaves the room as it was. Callers are responsible
//! for serializing access (see `state::AppState`) and for delivering the
//! resulting snapshots to clients.

mod guess;
mod leave;
mod lobby;
mod outcome;
mod turn;
mod vote;

pub use guess::GuessOutcome;
pub use leave::LeaveOutcome;
pub use turn::StatementOutcome;
pub use vote::{VoteOutcome, VoteResolution};

use crate::error::RoomError;
use crate::types::*;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Room {
    pub room_code: RoomCode,
    /// Join order; also the speaking order
    pub players: Vec<Player>,
    pub host_id: PlayerId,
    pub game_state: GameState,
    pub current_turn: usize,
    pub secret_word: Option<String>,
    pub selected_word_pack: String,
    pub round_count: u32,
    pub votes: HashMap<PlayerId, VoteChoice>,
    pub winner: Option<Winner>,
    pub game_history: Vec<ChatMessage>,
    /// When the running clock (turn, meeting or voting) expires
    pub phase_deadline: Option<DateTime<Utc>>,
    pub config: GameConfig,
}

/// Identifies "whose clock is running": changes whenever a new deadline is due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnKey {
    pub state: GameState,
    pub turn: usize,
    pub round: u32,
}

impl Room {
    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_index(&self, player_id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.id == player_id)
    }

    pub(crate) fn player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == player_id)
    }

    pub fn alive_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_alive)
    }

    pub fn alive_count(&self) -> usize {
        self.alive_players().count()
    }

    pub fn imposter(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_imposter)
    }

    /// The player whose statement is awaited, if a round is in progress
    pub fn current_speaker(&self) -> Option<&Player> {
        if self.game_state != GameState::Playing {
            return None;
        }
        self.players.get(self.current_turn).filter(|p| p.is_alive)
    }

    /// No human player remains who hasn't left; the room should be dropped
    pub fn is_closed(&self) -> bool {
        self.players.iter().all(|p| p.has_left || p.is_bot)
    }

    /// Earliest-joined human still present, the next host if one is needed
    pub(crate) fn host_candidate(&self) -> Option<&Player> {
        self.players.iter().find(|p| !p.has_left && !p.is_bot)
    }

    pub fn turn_key(&self) -> TurnKey {
        TurnKey {
            state: self.game_state,
            turn: self.current_turn,
            round: self.round_count,
        }
    }

    pub(crate) fn require_state(
        &self,
        expected: GameState,
        label: &'static str,
    ) -> Result<(), RoomError> {
        if self.game_state != expected {
            return Err(RoomError::InvalidPhase {
                expected: label,
                actual: self.game_state,
            });
        }
        Ok(())
    }

    pub(crate) fn require_host(&self, requester_id: &str) -> Result<(), RoomError> {
        if self.player(requester_id).is_none() {
            return Err(RoomError::PlayerNotFound(requester_id.to_string()));
        }
        if self.host_id != requester_id {
            return Err(RoomError::NotAuthorized);
        }
        Ok(())
    }

    /// Move the host flag so exactly one player carries it
    pub(crate) fn set_host(&mut self, player_id: &str) {
        self.host_id = player_id.to_string();
        for player in &mut self.players {
            player.is_host = player.id == player_id;
        }
    }

    /// First alive player at or after `start`, wrapping around once
    pub(crate) fn next_alive_from(&self, start: usize) -> Option<usize> {
        let len = self.players.len();
        (0..len)
            .map(|offset| (start + offset) % len)
            .find(|&idx| self.players[idx].is_alive)
    }

    /// Drop ballots cast by players who are no longer alive
    pub(crate) fn prune_votes(&mut self) {
        let players = &self.players;
        self.votes.retain(|voter_id, _| {
            players
                .iter()
                .any(|p| p.id == *voter_id && p.is_alive)
        });
    }

    /// Number of alive players who have a ballot recorded
    pub fn alive_voted_count(&self) -> usize {
        self.alive_players()
            .filter(|p| self.votes.contains_key(&p.id))
            .count()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_next_alive_wraps() {
        let mut room = started(4, 0);
        room.players[3].is_alive = false;
        room.players[0].is_alive = false;
        assert_eq!(room.next_alive_from(3), Some(1));
        assert_eq!(room.next_alive_from(1), Some(1));
    }

    #[test]
    fn test_next_alive_none_when_all_dead() {
        let mut room = started(3, 0);
        for p in &mut room.players {
            p.is_alive = false;
        }
        assert_eq!(room.next_alive_from(0), None);
    }

    #[test]
    fn test_prune_votes_drops_dead_voters() {
        let mut room = started(4, 0);
        room.votes.insert("p1".to_string(), VoteChoice::Skip);
        room.votes.insert("p2".to_string(), VoteChoice::Skip);
        room.players[2].is_alive = false;
        room.prune_votes();
        assert!(room.votes.contains_key("p1"));
        assert!(!room.votes.contains_key("p2"));
    }

    #[test]
    fn test_current_speaker_only_while_playing() {
        let mut room = started(3, 1);
        assert_eq!(room.current_speaker().unwrap().id, "p0");
        room.game_state = GameState::Voting;
        assert!(room.current_speaker().is_none());
    }

    #[test]
    fn test_require_host() {
        let room = lobby(3);
        assert!(room.require_host("p0").is_ok());
        assert_eq!(room.require_host("p1"), Err(RoomError::NotAuthorized));
        assert_eq!(
            room.require_host("ghost"),
            Err(RoomError::PlayerNotFound("ghost".to_string()))
        );
    }
}
