use super::AppState;
use crate::error::RoomError;
use crate::protocol::{EliminationReason, RoomView, ServerMessage};
use crate::room::{
    GuessOutcome, LeaveOutcome, Room, StatementOutcome, TurnKey, VoteOutcome, VoteResolution,
};
use crate::types::*;
use chrono::{DateTime, Utc};

impl AppState {
    pub async fn change_word_pack(
        &self,
        room_code: &str,
        requester_id: &str,
        pack: &str,
    ) -> Result<RoomView, RoomError> {
        let mut room = self.lock_room(room_code).await?;
        room.change_word_pack(requester_id, pack)?;
        tracing::info!("Word pack of room {} changed to {}", room.room_code, pack);
        self.publish_snapshot(&room, false);
        Ok(RoomView::for_viewer(&room, requester_id))
    }

    pub async fn start_game(
        &self,
        room_code: &str,
        requester_id: &str,
    ) -> Result<RoomView, RoomError> {
        let mut room = self.lock_room(room_code).await?;
        let before = room.turn_key();
        room.start_game(requester_id)?;
        self.settle(&mut room, before, true);
        Ok(RoomView::for_viewer(&room, requester_id))
    }

    pub async fn submit_statement(
        &self,
        room_code: &str,
        player_id: &str,
        text: &str,
    ) -> Result<StatementOutcome, RoomError> {
        let mut room = self.lock_room(room_code).await?;
        self.apply_statement(&mut room, player_id, text)
    }

    /// Accept a statement on an already locked room and fan out the results
    pub(crate) fn apply_statement(
        &self,
        room: &mut Room,
        player_id: &str,
        text: &str,
    ) -> Result<StatementOutcome, RoomError> {
        let before = room.turn_key();
        let outcome = room.submit_statement(player_id, text)?;
        tracing::debug!(
            "Statement from {} accepted in room {}",
            player_id,
            room.room_code
        );
        self.publish(
            &room.room_code,
            ServerMessage::Chat {
                message: outcome.message.clone(),
            },
        );
        self.settle(room, before, false);
        Ok(outcome)
    }

    /// Host closes the meeting window early
    pub async fn begin_voting(
        &self,
        room_code: &str,
        requester_id: &str,
    ) -> Result<RoomView, RoomError> {
        let mut room = self.lock_room(room_code).await?;
        room.require_host(requester_id)?;
        let before = room.turn_key();
        room.begin_voting()?;
        self.settle(&mut room, before, false);
        Ok(RoomView::for_viewer(&room, requester_id))
    }

    pub async fn cast_vote(
        &self,
        room_code: &str,
        voter_id: &str,
        target: &str,
    ) -> Result<VoteOutcome, RoomError> {
        let mut room = self.lock_room(room_code).await?;
        let before = room.turn_key();
        let outcome = room.cast_vote(voter_id, VoteChoice::parse(target.trim()))?;
        if let Some(resolution) = &outcome.resolution {
            self.publish_resolution(&room, resolution);
        }
        self.settle(&mut room, before, false);
        Ok(outcome)
    }

    /// Host ends the vote before everyone has voted
    pub async fn force_resolve_voting(
        &self,
        room_code: &str,
        requester_id: &str,
    ) -> Result<VoteResolution, RoomError> {
        let mut room = self.lock_room(room_code).await?;
        room.require_host(requester_id)?;
        self.apply_force_resolve(&mut room)
    }

    fn apply_force_resolve(&self, room: &mut Room) -> Result<VoteResolution, RoomError> {
        let before = room.turn_key();
        let resolution = room.force_resolve_voting()?;
        self.publish_resolution(room, &resolution);
        self.settle(room, before, false);
        Ok(resolution)
    }

    pub async fn guess_word(
        &self,
        room_code: &str,
        player_id: &str,
        guess: &str,
    ) -> Result<GuessOutcome, RoomError> {
        let mut room = self.lock_room(room_code).await?;
        let before = room.turn_key();
        let outcome = room.guess_word(player_id, guess)?;
        if outcome.winner == Some(Winner::Crew) {
            self.publish_elimination(&room, player_id, EliminationReason::FailedGuess);
        }
        self.settle(&mut room, before, false);
        Ok(outcome)
    }

    pub async fn return_to_lobby(
        &self,
        room_code: &str,
        requester_id: &str,
    ) -> Result<RoomView, RoomError> {
        let mut room = self.lock_room(room_code).await?;
        let before = room.turn_key();
        room.return_to_lobby(requester_id)?;
        tracing::info!("Room {} back in lobby", room.room_code);
        self.settle(&mut room, before, false);
        Ok(RoomView::for_viewer(&room, requester_id))
    }

    /// Voluntary leave or socket disconnect
    pub async fn leave_room(
        &self,
        room_code: &str,
        player_id: &str,
    ) -> Result<LeaveOutcome, RoomError> {
        let mut room = self.lock_room(room_code).await?;
        let before = room.turn_key();
        let outcome = room.handle_player_left(player_id);
        if !outcome.removed {
            return Ok(outcome);
        }

        if outcome.room_deleted {
            let code = room.room_code.clone();
            drop(room);
            self.remove_room(&code).await;
            self.publish(&code, ServerMessage::RoomClosed { room_code: code.clone() });
            return Ok(outcome);
        }

        if outcome.eliminated {
            self.publish_elimination(&room, player_id, EliminationReason::Left);
        }
        if let Some(resolution) = &outcome.resolution {
            self.publish_resolution(&room, resolution);
        }
        self.settle(&mut room, before, false);
        Ok(outcome)
    }

    /// Fire every phase clock that has run out. Returns how many fired.
    pub async fn tick_deadlines(&self, now: DateTime<Utc>) -> usize {
        let mut fired = 0;
        for shared in self.all_rooms().await {
            let mut room = shared.lock().await;
            let due = room.phase_deadline.is_some_and(|deadline| deadline <= now);
            if !due || room.is_closed() {
                continue;
            }
            // Cleared before acting so a deadline can only fire once
            room.phase_deadline = None;
            fired += 1;
            if let Err(e) = self.expire_phase(&mut room) {
                tracing::warn!("Deadline action in room {} failed: {}", room.room_code, e);
            }
        }
        fired
    }

    fn expire_phase(&self, room: &mut Room) -> Result<(), RoomError> {
        tracing::debug!("Clock expired in room {} ({})", room.room_code, room.game_state);
        match room.game_state {
            GameState::Playing => {
                let speaker = room
                    .current_speaker()
                    .map(|p| p.id.clone())
                    .ok_or(RoomError::NotYourTurn)?;
                self.apply_statement(room, &speaker, DEFAULT_STATEMENT)?;
            }
            GameState::Meeting => {
                let before = room.turn_key();
                room.begin_voting()?;
                self.settle(room, before, false);
            }
            GameState::Voting => {
                self.apply_force_resolve(room)?;
            }
            GameState::Lobby | GameState::GameOver => {}
        }
        Ok(())
    }

    /// Bring everything derived from the room's phase up to date after a
    /// mutation: phase clock, voting/game-over notices, bot actions, and
    /// finally a snapshot to every client.
    pub(crate) fn settle(&self, room: &mut Room, mut before: TurnKey, started: bool) {
        loop {
            let key = room.turn_key();
            if key == before {
                break;
            }
            room.phase_deadline = room
                .config
                .phase_duration(key.state)
                .and_then(|d| chrono::Duration::from_std(d).ok())
                .map(|d| Utc::now() + d);

            match key.state {
                GameState::Voting if before.state != GameState::Voting => {
                    self.publish(
                        &room.room_code,
                        ServerMessage::VotingStarted {
                            deadline: room.phase_deadline,
                        },
                    );
                    if let Some(resolution) = self.cast_bot_votes(room) {
                        self.publish_resolution(room, &resolution);
                    }
                }
                GameState::Playing => self.schedule_bot_turn(room),
                GameState::GameOver => {
                    if let Some(winner) = room.winner {
                        self.publish(
                            &room.room_code,
                            ServerMessage::GameOver {
                                winner,
                                imposter_id: room.imposter().map(|p| p.id.clone()),
                                secret_word: room.secret_word.clone(),
                            },
                        );
                    }
                }
                _ => {}
            }
            before = key;
        }
        self.publish_snapshot(room, started);
    }

    fn publish_resolution(&self, room: &Room, resolution: &VoteResolution) {
        self.publish(
            &room.room_code,
            ServerMessage::VoteResolved {
                eliminated: resolution.eliminated.clone(),
                tally: resolution.tally.clone(),
                skips: resolution.skips,
            },
        );
        if let Some(player_id) = &resolution.eliminated {
            self.publish_elimination(room, player_id, EliminationReason::VotedOut);
        }
    }

    fn publish_elimination(&self, room: &Room, player_id: &str, reason: EliminationReason) {
        let player_name = room
            .player(player_id)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        self.publish(
            &room.room_code,
            ServerMessage::PlayerEliminated {
                player_id: player_id.to_string(),
                player_name,
                reason,
            },
        );
    }
}
