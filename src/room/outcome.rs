use super::Room;
use crate::types::*;

impl Room {
    /// Who has won given the current alive set, if anyone
    ///
    /// Checked after every elimination, skip/tie resolution and mid-game leave:
    /// - the imposter is no longer alive: crew
    /// - no alive crew remain: imposters
    /// - exactly two alive, one of them the imposter: imposters (a lone
    ///   accuser can never reach a plurality)
    pub fn evaluate_winner(&self) -> Option<Winner> {
        let imposter_alive = self.players.iter().any(|p| p.is_imposter && p.is_alive);
        if !imposter_alive {
            return Some(Winner::Crew);
        }

        let alive = self.alive_count();
        let alive_crew = self.alive_players().filter(|p| !p.is_imposter).count();
        if alive_crew == 0 || alive == 2 {
            return Some(Winner::Imposters);
        }
        None
    }

    /// End the game if a win condition holds; returns the winner if so
    pub(crate) fn check_game_over(&mut self) -> Option<Winner> {
        if !self.game_state.is_in_game() {
            return None;
        }
        let winner = self.evaluate_winner()?;
        self.finish(winner);
        Some(winner)
    }

    pub(crate) fn finish(&mut self, winner: Winner) {
        self.game_state = GameState::GameOver;
        self.winner = Some(winner);
        self.phase_deadline = None;
        self.prune_votes();
        tracing::info!(
            "Game over in room {}: {:?} win after {} rounds",
            self.room_code,
            winner,
            self.round_count
        );
    }
}
