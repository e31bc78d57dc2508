use super::Room;
use crate::error::RoomError;
use crate::types::*;
use std::collections::HashMap;

/// Result of closing a vote
#[derive(Debug, Clone, PartialEq)]
pub struct VoteResolution {
    pub eliminated: Option<PlayerId>,
    pub eliminated_was_imposter: bool,
    /// Votes per accused player (skips excluded)
    pub tally: HashMap<PlayerId, u32>,
    pub skips: u32,
    pub winner: Option<Winner>,
}

impl VoteResolution {
    pub fn is_game_over(&self) -> bool {
        self.winner.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoteOutcome {
    /// Ballots recorded and alive players at the time of this vote
    pub voted: usize,
    pub alive: usize,
    /// Set once the last alive player has voted
    pub resolution: Option<VoteResolution>,
}

impl VoteOutcome {
    pub fn is_game_over(&self) -> bool {
        self.resolution
            .as_ref()
            .is_some_and(VoteResolution::is_game_over)
    }
}

impl Room {
    /// Record (or replace) a ballot; resolves the vote once every alive
    /// player has one
    pub fn cast_vote(
        &mut self,
        voter_id: &str,
        choice: VoteChoice,
    ) -> Result<VoteOutcome, RoomError> {
        self.require_state(GameState::Voting, "voting")?;
        let voter = self
            .player(voter_id)
            .ok_or_else(|| RoomError::PlayerNotFound(voter_id.to_string()))?;
        if !voter.is_alive {
            return Err(RoomError::PlayerNotAlive);
        }
        if let VoteChoice::Player(target_id) = &choice {
            match self.player(target_id) {
                Some(target) if target.is_alive => {}
                Some(_) => {
                    return Err(RoomError::InvalidTarget(format!(
                        "{} is already out",
                        target_id
                    )))
                }
                None => {
                    return Err(RoomError::InvalidTarget(format!(
                        "unknown player {}",
                        target_id
                    )))
                }
            }
        }

        self.votes.insert(voter_id.to_string(), choice);
        self.prune_votes();

        let voted = self.alive_voted_count();
        let alive = self.alive_count();
        let resolution = (voted >= alive).then(|| self.resolve_voting());
        Ok(VoteOutcome {
            voted,
            alive,
            resolution,
        })
    }

    /// Close the vote now (voting clock expired): every alive player without
    /// a ballot is counted as a skip
    pub fn force_resolve_voting(&mut self) -> Result<VoteResolution, RoomError> {
        self.require_state(GameState::Voting, "voting")?;
        self.prune_votes();
        let missing: Vec<PlayerId> = self
            .alive_players()
            .filter(|p| !self.votes.contains_key(&p.id))
            .map(|p| p.id.clone())
            .collect();
        for voter_id in missing {
            self.votes.insert(voter_id, VoteChoice::Skip);
        }
        Ok(self.resolve_voting())
    }

    /// Tally ballots and apply the result. A single strict plurality leader is
    /// eliminated; ties eliminate nobody and skip is never eliminated.
    pub(crate) fn resolve_voting(&mut self) -> VoteResolution {
        self.prune_votes();

        let mut tally: HashMap<PlayerId, u32> = HashMap::new();
        let mut skips = 0;
        for choice in self.votes.values() {
            match choice {
                VoteChoice::Player(target_id) => {
                    if self.player(target_id).is_some_and(|p| p.is_alive) {
                        *tally.entry(target_id.clone()).or_insert(0) += 1;
                    }
                }
                VoteChoice::Skip => skips += 1,
            }
        }

        let eliminated = plurality_leader(&tally);
        let mut eliminated_was_imposter = false;
        if let Some(target_id) = &eliminated {
            if let Some(target) = self.player_mut(target_id) {
                target.is_alive = false;
                eliminated_was_imposter = target.is_imposter;
            }
            self.prune_votes();
            tracing::info!(
                "Player {} voted out of room {} (imposter: {})",
                target_id,
                self.room_code,
                eliminated_was_imposter
            );
        } else {
            tracing::info!(
                "Vote in room {} ended without elimination ({} skips)",
                self.room_code,
                skips
            );
        }

        let winner = self.check_game_over();
        if winner.is_none() {
            self.start_next_round();
        }

        VoteResolution {
            eliminated,
            eliminated_was_imposter,
            tally,
            skips,
            winner,
        }
    }
}

/// The only target holding the maximum count, if exactly one does
fn plurality_leader(tally: &HashMap<PlayerId, u32>) -> Option<PlayerId> {
    let max = tally.values().copied().max().filter(|&m| m > 0)?;
    let mut leaders = tally.iter().filter(|(_, &count)| count == max);
    let (leader, _) = leaders.next()?;
    if leaders.next().is_some() {
        return None;
    }
    Some(leader.clone())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    fn voting(n: usize, imposter_idx: usize) -> Room {
        let mut room = started(n, imposter_idx);
        finish_round(&mut room);
        assert_eq!(room.game_state, GameState::Voting);
        room
    }

    fn vote(room: &mut Room, voter: &str, target: &str) -> VoteOutcome {
        room.cast_vote(voter, VoteChoice::parse(target)).unwrap()
    }

    #[test]
    fn test_vote_waits_for_everyone() {
        let mut room = voting(4, 3);
        let outcome = vote(&mut room, "p0", "p3");
        assert!(outcome.resolution.is_none());
        assert!(!outcome.is_game_over());
        assert_eq!((outcome.voted, outcome.alive), (1, 4));
        assert_eq!(room.game_state, GameState::Voting);
        assert_eq!(room.votes.len(), 1);
    }

    #[test]
    fn test_vote_requires_voting_phase() {
        let mut room = started(3, 0);
        assert!(matches!(
            room.cast_vote("p0", VoteChoice::Skip),
            Err(RoomError::InvalidPhase { .. })
        ));
    }

    #[test]
    fn test_dead_voter_rejected() {
        let mut room = voting(4, 3);
        room.players[1].is_alive = false;
        assert_eq!(
            room.cast_vote("p1", VoteChoice::Skip),
            Err(RoomError::PlayerNotAlive)
        );
    }

    #[test]
    fn test_invalid_targets_rejected() {
        let mut room = voting(4, 3);
        room.players[2].is_alive = false;
        assert!(matches!(
            room.cast_vote("p0", VoteChoice::parse("nobody")),
            Err(RoomError::InvalidTarget(_))
        ));
        assert!(matches!(
            room.cast_vote("p0", VoteChoice::parse("p2")),
            Err(RoomError::InvalidTarget(_))
        ));
        assert!(room.votes.is_empty());
    }

    #[test]
    fn test_changed_vote_only_counts_once() {
        let mut room = voting(4, 3);
        vote(&mut room, "p0", "p1");
        vote(&mut room, "p0", "p3");
        assert_eq!(room.votes.len(), 1);
        assert_eq!(room.votes["p0"], VoteChoice::Player("p3".to_string()));

        vote(&mut room, "p1", "p3");
        vote(&mut room, "p2", "skip");
        let outcome = vote(&mut room, "p3", "p1");
        let resolution = outcome.resolution.unwrap();
        assert_eq!(resolution.tally.get("p3"), Some(&2));
        assert_eq!(resolution.tally.get("p1"), Some(&1));
        assert_eq!(resolution.eliminated.as_deref(), Some("p3"));
    }

    #[test]
    fn test_imposter_voted_out_crew_wins() {
        let mut room = voting(4, 2);
        vote(&mut room, "p0", "p2");
        vote(&mut room, "p1", "p2");
        vote(&mut room, "p2", "p0");
        let outcome = vote(&mut room, "p3", "p2");

        assert!(outcome.is_game_over());
        let resolution = outcome.resolution.unwrap();
        assert!(resolution.eliminated_was_imposter);
        assert_eq!(room.game_state, GameState::GameOver);
        assert_eq!(room.winner, Some(Winner::Crew));
        assert!(!room.players[2].is_alive);
    }

    #[test]
    fn test_tie_eliminates_nobody() {
        let mut room = voting(4, 3);
        vote(&mut room, "p0", "p1");
        vote(&mut room, "p1", "p0");
        vote(&mut room, "p2", "p1");
        let outcome = vote(&mut room, "p3", "p0");

        let resolution = outcome.resolution.unwrap();
        assert!(resolution.eliminated.is_none());
        assert!(resolution.winner.is_none());
        assert_eq!(room.game_state, GameState::Playing);
        assert_eq!(room.alive_count(), 4);
        assert_eq!(room.round_count, 2);
        assert!(room.votes.is_empty());
        assert_eq!(room.current_turn, 0);
        assert!(room.players.iter().all(|p| !p.has_spoken));
    }

    #[test]
    fn test_skips_do_not_block_plurality() {
        let mut room = voting(4, 3);
        vote(&mut room, "p0", "skip");
        vote(&mut room, "p1", "skip");
        vote(&mut room, "p2", "skip");
        let outcome = vote(&mut room, "p3", "p0");

        // A single vote is still a unique plurality among players
        let resolution = outcome.resolution.unwrap();
        assert_eq!(resolution.skips, 3);
        assert_eq!(resolution.eliminated.as_deref(), Some("p0"));
    }

    #[test]
    fn test_all_skip_continues() {
        let mut room = voting(3, 0);
        for id in ["p0", "p1", "p2"] {
            vote(&mut room, id, "skip");
        }
        assert_eq!(room.game_state, GameState::Playing);
        assert_eq!(room.alive_count(), 3);
    }

    #[test]
    fn test_last_crew_voted_out_imposters_win() {
        // 4 players, imposter p3; eliminating a crewmate leaves 3 alive,
        // a second one leaves imposter + 1 crew
        let mut room = voting(4, 3);
        vote(&mut room, "p0", "p1");
        vote(&mut room, "p1", "p2");
        vote(&mut room, "p2", "p1");
        vote(&mut room, "p3", "p1");
        assert!(!room.players[1].is_alive);
        assert_eq!(room.game_state, GameState::Playing);

        finish_round(&mut room);
        vote(&mut room, "p0", "p3");
        vote(&mut room, "p2", "p0");
        let outcome = vote(&mut room, "p3", "p0");

        assert!(outcome.is_game_over());
        assert_eq!(room.winner, Some(Winner::Imposters));
        assert_eq!(room.alive_count(), 2);
    }

    #[test]
    fn test_three_player_crew_elimination_ends_game() {
        let mut room = voting(3, 2);
        vote(&mut room, "p0", "p1");
        vote(&mut room, "p1", "p0");
        let outcome = vote(&mut room, "p2", "p0");
        assert!(outcome.is_game_over());
        assert_eq!(room.winner, Some(Winner::Imposters));
    }

    #[test]
    fn test_force_resolve_fills_skips() {
        let mut room = voting(4, 3);
        vote(&mut room, "p0", "p1");
        let resolution = room.force_resolve_voting().unwrap();

        assert_eq!(resolution.skips, 3);
        assert_eq!(resolution.eliminated.as_deref(), Some("p1"));
        assert_eq!(room.game_state, GameState::Playing);
    }

    #[test]
    fn test_force_resolve_prunes_dead_voters() {
        let mut room = voting(5, 4);
        vote(&mut room, "p1", "p0");
        vote(&mut room, "p2", "p0");
        room.players[1].is_alive = false;
        room.players[2].is_alive = false;

        let resolution = room.force_resolve_voting().unwrap();
        assert!(resolution.eliminated.is_none());
        assert_eq!(resolution.skips, 3);
        assert!(room
            .votes
            .keys()
            .all(|id| room.player(id).unwrap().is_alive));
    }

    #[test]
    fn test_force_resolve_requires_voting() {
        let mut room = started(3, 0);
        assert!(matches!(
            room.force_resolve_voting(),
            Err(RoomError::InvalidPhase { .. })
        ));
    }

    #[test]
    fn test_plurality_leader() {
        let mut tally = HashMap::new();
        assert_eq!(plurality_leader(&tally), None);
        tally.insert("a".to_string(), 2);
        tally.insert("b".to_string(), 1);
        assert_eq!(plurality_leader(&tally), Some("a".to_string()));
        tally.insert("c".to_string(), 2);
        assert_eq!(plurality_leader(&tally), None);
    }
}
