use super::{Room, VoteResolution};
use crate::types::*;

/// What a departure did to the room
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaveOutcome {
    /// The player was present and has been removed or eliminated
    pub removed: bool,
    /// Mid-game departure: the player stays in the list but is out
    pub eliminated: bool,
    /// Nobody is left; the registry should drop the room
    pub room_deleted: bool,
    pub new_host: Option<PlayerId>,
    pub winner: Option<Winner>,
    /// The departure completed the round
    pub trigger_voting: bool,
    /// The departure completed the vote
    pub resolution: Option<VoteResolution>,
}

impl Room {
    /// A player left or disconnected. In the lobby (and after the game) they
    /// are spliced out; mid-game they are soft-eliminated so turn order and
    /// history stay intact. Unknown or already departed players are a no-op.
    pub fn handle_player_left(&mut self, player_id: &str) -> LeaveOutcome {
        match self.player(player_id) {
            Some(player) if !player.has_left => {}
            _ => return LeaveOutcome::default(),
        }
        if self.game_state.is_in_game() {
            self.eliminate_departed(player_id)
        } else {
            self.remove_player(player_id)
        }
    }

    /// Splice a player out of the room entirely
    pub fn remove_player(&mut self, player_id: &str) -> LeaveOutcome {
        let Some(idx) = self.player_index(player_id) else {
            return LeaveOutcome::default();
        };
        let removed = self.players.remove(idx);
        self.votes.remove(player_id);
        self.prune_votes();

        let mut outcome = LeaveOutcome {
            removed: true,
            ..Default::default()
        };

        if idx < self.current_turn {
            self.current_turn -= 1;
        }
        if self.current_turn >= self.players.len() {
            self.current_turn = 0;
        }

        if self.is_closed() {
            outcome.room_deleted = true;
            return outcome;
        }
        if removed.is_host {
            outcome.new_host = self.reassign_host();
        }
        tracing::debug!("Player {} removed from room {}", player_id, self.room_code);
        outcome
    }

    fn eliminate_departed(&mut self, player_id: &str) -> LeaveOutcome {
        let was_turn = self.game_state == GameState::Playing
            && self.player_index(player_id) == Some(self.current_turn);

        let Some(player) = self.player_mut(player_id) else {
            return LeaveOutcome::default();
        };
        // Players voted out earlier only change `has_left`
        let was_alive = player.is_alive;
        player.is_alive = false;
        player.has_left = true;
        let was_host = player.is_host;
        self.votes.remove(player_id);
        self.prune_votes();

        let mut outcome = LeaveOutcome {
            removed: true,
            eliminated: was_alive,
            ..Default::default()
        };
        if was_alive {
            tracing::info!("Player {} left room {} mid-game", player_id, self.room_code);
        } else {
            tracing::debug!("Eliminated player {} left room {}", player_id, self.room_code);
        }

        if self.is_closed() {
            outcome.room_deleted = true;
            return outcome;
        }
        if was_host {
            outcome.new_host = self.reassign_host();
        }
        if was_turn {
            self.advance_turn();
        }

        if let Some(winner) = self.check_game_over() {
            outcome.winner = Some(winner);
            return outcome;
        }

        match self.game_state {
            GameState::Playing => {
                outcome.trigger_voting = self.complete_round_if_done();
            }
            GameState::Voting if self.alive_voted_count() >= self.alive_count() => {
                let resolution = self.resolve_voting();
                outcome.winner = resolution.winner;
                outcome.resolution = Some(resolution);
            }
            _ => {}
        }
        outcome
    }

    fn reassign_host(&mut self) -> Option<PlayerId> {
        let next = self.host_candidate()?.id.clone();
        self.set_host(&next);
        tracing::info!("Host of room {} reassigned to {}", self.room_code, next);
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn test_unknown_player_is_noop() {
        let mut room = lobby(3);
        let outcome = room.handle_player_left("ghost");
        assert_eq!(outcome, LeaveOutcome::default());
        assert_eq!(room.players.len(), 3);
    }

    #[test]
    fn test_lobby_leave_removes_player() {
        let mut room = lobby(3);
        let outcome = room.handle_player_left("p1");
        assert!(outcome.removed);
        assert!(!outcome.eliminated);
        assert!(outcome.new_host.is_none());
        assert_eq!(room.players.len(), 2);
        assert!(room.player("p1").is_none());
        assert_host_invariant(&room);
    }

    #[test]
    fn test_lobby_host_leave_promotes_next() {
        let mut room = lobby(3);
        let outcome = room.handle_player_left("p0");
        assert_eq!(outcome.new_host.as_deref(), Some("p1"));
        assert_eq!(room.host_id, "p1");
        assert_host_invariant(&room);
    }

    #[test]
    fn test_last_player_deletes_room() {
        let mut room = lobby(1);
        let outcome = room.handle_player_left("p0");
        assert!(outcome.room_deleted);
        assert!(room.players.is_empty());
    }

    #[test]
    fn test_only_bots_left_deletes_room() {
        let mut room = lobby(1);
        let mut bot = player("bot");
        bot.is_bot = true;
        room.add_player(bot).unwrap();
        let outcome = room.handle_player_left("p0");
        assert!(outcome.room_deleted);
    }

    #[test]
    fn test_mid_game_bots_do_not_keep_room_alive() {
        let mut room = started(4, 2);
        for p in room.players.iter_mut().skip(1) {
            p.is_bot = true;
        }
        let outcome = room.handle_player_left("p0");
        assert!(outcome.eliminated);
        assert!(outcome.room_deleted);
        assert!(outcome.winner.is_none());
        assert!(room.is_closed());
    }

    #[test]
    fn test_remove_player_renormalizes_turn() {
        let mut room = lobby(4);
        room.current_turn = 2;
        room.remove_player("p0");
        assert_eq!(room.current_turn, 1);
        room.remove_player("p3");
        assert_eq!(room.current_turn, 1);
        room.remove_player("p2");
        assert_eq!(room.current_turn, 0);
    }

    #[test]
    fn test_imposter_disconnect_crew_wins() {
        let mut room = started(4, 2);
        let outcome = room.handle_player_left("p2");

        assert!(outcome.eliminated);
        assert_eq!(outcome.winner, Some(Winner::Crew));
        assert_eq!(room.game_state, GameState::GameOver);
        let imposter = room.player("p2").unwrap();
        assert!(!imposter.is_alive);
        assert!(imposter.has_left);
        // Soft elimination keeps the player in place
        assert_eq!(room.players.len(), 4);
    }

    #[test]
    fn test_voted_out_player_leaving_is_not_eliminated_again() {
        let mut room = started(5, 4);
        finish_round(&mut room);
        for voter in ["p0", "p1", "p2", "p3", "p4"] {
            room.cast_vote(voter, VoteChoice::Player("p1".to_string()))
                .unwrap();
        }
        assert!(!room.player("p1").unwrap().is_alive);
        assert_eq!(room.game_state, GameState::Playing);

        let outcome = room.handle_player_left("p1");
        assert!(outcome.removed);
        assert!(!outcome.eliminated);
        assert!(outcome.winner.is_none());
        assert!(room.player("p1").unwrap().has_left);
        assert_eq!(room.alive_count(), 4);
        assert_eq!(room.game_state, GameState::Playing);
    }

    #[test]
    fn test_mid_game_leave_is_noop_twice() {
        let mut room = started(5, 4);
        room.handle_player_left("p1");
        let again = room.handle_player_left("p1");
        assert!(!again.removed);
        assert_eq!(room.alive_count(), 4);
    }

    #[test]
    fn test_current_speaker_leaving_passes_turn() {
        let mut room = started(4, 3);
        room.submit_statement("p0", "clue").unwrap();
        assert_eq!(room.current_turn, 1);

        let outcome = room.handle_player_left("p1");
        assert!(outcome.winner.is_none());
        assert_eq!(room.current_turn, 2);
        assert_eq!(room.game_state, GameState::Playing);
    }

    #[test]
    fn test_last_silent_player_leaving_completes_round() {
        let mut room = started(4, 0);
        room.submit_statement("p0", "a").unwrap();
        room.submit_statement("p1", "b").unwrap();
        room.submit_statement("p2", "c").unwrap();

        let outcome = room.handle_player_left("p3");
        assert!(outcome.trigger_voting);
        assert_eq!(room.game_state, GameState::Voting);
    }

    #[test]
    fn test_last_voter_leaving_resolves_vote() {
        let mut room = started(5, 4);
        finish_round(&mut room);
        room.cast_vote("p0", VoteChoice::parse("p1")).unwrap();
        room.cast_vote("p1", VoteChoice::parse("p2")).unwrap();
        room.cast_vote("p2", VoteChoice::parse("p1")).unwrap();
        room.cast_vote("p4", VoteChoice::parse("p1")).unwrap();

        let outcome = room.handle_player_left("p3");
        let resolution = outcome.resolution.unwrap();
        assert_eq!(resolution.eliminated.as_deref(), Some("p1"));
        // p0, p2 and the imposter remain
        assert_eq!(room.alive_count(), 3);
        assert_eq!(room.game_state, GameState::Playing);
    }

    #[test]
    fn test_departed_voter_ballot_dropped() {
        let mut room = started(5, 4);
        finish_round(&mut room);
        room.cast_vote("p1", VoteChoice::parse("p0")).unwrap();
        room.handle_player_left("p1");
        assert!(!room.votes.contains_key("p1"));
    }

    #[test]
    fn test_host_leaving_mid_game_hands_over() {
        let mut room = started(4, 3);
        let outcome = room.handle_player_left("p0");
        assert_eq!(outcome.new_host.as_deref(), Some("p1"));
        assert_host_invariant(&room);
        assert_eq!(room.current_turn, 1);
    }

    #[test]
    fn test_crew_leaving_down_to_two_imposters_win() {
        let mut room = started(3, 0);
        let outcome = room.handle_player_left("p2");
        assert_eq!(outcome.winner, Some(Winner::Imposters));
    }

    #[test]
    fn test_game_over_leave_is_hard_removal() {
        let mut room = started(4, 3);
        room.handle_player_left("p3");
        assert_eq!(room.game_state, GameState::GameOver);

        let outcome = room.handle_player_left("p1");
        assert!(outcome.removed);
        assert!(!outcome.eliminated);
        assert!(room.player("p1").is_none());
    }
}
