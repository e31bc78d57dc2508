use super::Room;
use crate::error::RoomError;
use crate::types::*;

#[derive(Debug, Clone, PartialEq)]
pub struct GuessOutcome {
    pub correct: bool,
    pub attempts_left: u32,
    /// Set when this guess ended the game
    pub winner: Option<Winner>,
}

impl Room {
    /// The imposter names the secret word. A hit wins the game for the
    /// imposters; running out of attempts eliminates the imposter.
    pub fn guess_word(
        &mut self,
        player_id: &str,
        guess: &str,
    ) -> Result<GuessOutcome, RoomError> {
        if !self.game_state.is_in_game() {
            return Err(RoomError::InvalidPhase {
                expected: "playing",
                actual: self.game_state,
            });
        }
        let player = self
            .player(player_id)
            .ok_or_else(|| RoomError::PlayerNotFound(player_id.to_string()))?;
        if !player.is_imposter {
            return Err(RoomError::NotAuthorized);
        }
        if !player.is_alive {
            return Err(RoomError::PlayerNotAlive);
        }
        let guess = guess.trim();
        if guess.is_empty() {
            return Err(RoomError::InvalidTarget("empty guess".to_string()));
        }

        let correct = self
            .secret_word
            .as_deref()
            .is_some_and(|word| word.trim().eq_ignore_ascii_case(guess));

        if correct {
            let attempts_left = player.guess_attempts;
            tracing::info!("Imposter {} guessed the word in room {}", player_id, self.room_code);
            self.finish(Winner::Imposters);
            return Ok(GuessOutcome {
                correct,
                attempts_left,
                winner: Some(Winner::Imposters),
            });
        }

        let Some(player) = self.player_mut(player_id) else {
            return Err(RoomError::PlayerNotFound(player_id.to_string()));
        };
        player.guess_attempts = player.guess_attempts.saturating_sub(1);
        let attempts_left = player.guess_attempts;
        if attempts_left == 0 {
            player.is_alive = false;
        }
        tracing::debug!("Wrong guess in room {}, {} attempts left", self.room_code, attempts_left);

        let winner = if attempts_left == 0 {
            self.prune_votes();
            self.finish(Winner::Crew);
            Some(Winner::Crew)
        } else {
            None
        };

        Ok(GuessOutcome {
            correct,
            attempts_left,
            winner,
        })
    }
}
