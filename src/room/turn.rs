use super::Room;
use crate::error::RoomError;
use crate::types::*;

#[derive(Debug, Clone, PartialEq)]
pub struct StatementOutcome {
    /// Chat echo of the accepted statement
    pub message: ChatMessage,
    /// The round is complete and the room moved on to meeting/voting
    pub trigger_voting: bool,
}

impl Room {
    /// Accept the current speaker's statement and pass the turn on
    pub fn submit_statement(
        &mut self,
        player_id: &str,
        text: &str,
    ) -> Result<StatementOutcome, RoomError> {
        self.require_state(GameState::Playing, "playing")?;
        let idx = self
            .player_index(player_id)
            .ok_or_else(|| RoomError::PlayerNotFound(player_id.to_string()))?;
        if !self.players[idx].is_alive {
            return Err(RoomError::PlayerNotAlive);
        }
        if idx != self.current_turn {
            return Err(RoomError::NotYourTurn);
        }

        let text = normalize_statement(text, self.config.max_statement_chars);
        let player = &mut self.players[idx];
        player.has_spoken = true;
        let message = ChatMessage {
            player_id: player.id.clone(),
            player_name: player.name.clone(),
            text,
            timestamp: chrono::Utc::now().timestamp_millis(),
            round: self.round_count,
        };
        self.game_history.push(message.clone());

        self.advance_turn();
        let trigger_voting = self.complete_round_if_done();

        Ok(StatementOutcome {
            message,
            trigger_voting,
        })
    }

    /// Move `current_turn` to the next alive player after the current one
    pub(crate) fn advance_turn(&mut self) {
        if self.players.is_empty() {
            return;
        }
        let start = (self.current_turn + 1) % self.players.len();
        if let Some(next) = self.next_alive_from(start) {
            self.current_turn = next;
        }
    }

    /// Every alive player has spoken: close the round and open the meeting or
    /// the vote. Returns whether the round was closed.
    pub(crate) fn complete_round_if_done(&mut self) -> bool {
        if self.game_state != GameState::Playing {
            return false;
        }
        let all_spoken = self.alive_count() > 0 && self.alive_players().all(|p| p.has_spoken);
        if !all_spoken {
            return false;
        }

        self.votes.clear();
        self.game_state = if self.config.meeting_seconds > 0 {
            GameState::Meeting
        } else {
            GameState::Voting
        };
        tracing::debug!(
            "Round {} complete in room {}, now {}",
            self.round_count,
            self.room_code,
            self.game_state
        );
        true
    }

    /// End the discussion window and open the vote
    pub fn begin_voting(&mut self) -> Result<(), RoomError> {
        self.require_state(GameState::Meeting, "meeting")?;
        self.votes.clear();
        self.game_state = GameState::Voting;
        Ok(())
    }

    /// Start the next round of statements from the top of the order
    pub(crate) fn start_next_round(&mut self) {
        self.game_state = GameState::Playing;
        self.votes.clear();
        for player in self.players.iter_mut().filter(|p| p.is_alive) {
            player.has_spoken = false;
        }
        self.round_count += 1;
        self.current_turn = self.next_alive_from(0).unwrap_or(0);
    }
}

fn normalize_statement(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return DEFAULT_STATEMENT.to_string();
    }
    trimmed.chars().take(max_chars).collect()
}
