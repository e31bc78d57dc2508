use super::registry::new_player_id;
use super::AppState;
use crate::bot::{self, BotContext};
use crate::error::RoomError;
use crate::protocol::RoomView;
use crate::room::{Room, TurnKey, VoteResolution};
use crate::types::*;
use rand::Rng;
use std::time::Duration;

impl AppState {
    /// Host adds a server-driven player while in the lobby
    pub async fn add_bot(&self, room_code: &str, requester_id: &str) -> Result<RoomView, RoomError> {
        let mut room = self.lock_room(room_code).await?;
        room.require_host(requester_id)?;
        room.check_joinable()?;

        let mut player = Player::new(
            new_player_id(),
            bot::bot_name(&room),
            bot::random_customization(),
            room.config.guess_attempts,
        );
        player.is_bot = true;
        let bot_id = player.id.clone();
        let bot_name = player.name.clone();
        room.add_player(player)?;

        tracing::info!("Bot {} ({}) added to room {}", bot_name, bot_id, room.room_code);
        self.publish_snapshot(&room, false);
        Ok(RoomView::for_viewer(&room, requester_id))
    }

    /// If the current speaker is a bot, let it answer after a short think
    pub(crate) fn schedule_bot_turn(&self, room: &Room) {
        let Some(speaker) = room.current_speaker().filter(|p| p.is_bot) else {
            return;
        };
        let (min, max) = (room.config.bot_think_min_ms, room.config.bot_think_max_ms);
        let delay = rand::rng().random_range(min.min(max)..=min.max(max));

        let state = self.clone();
        let room_code = room.room_code.clone();
        let bot_id = speaker.id.clone();
        let expected = room.turn_key();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if let Err(e) = state.run_bot_turn(&room_code, &bot_id, expected).await {
                tracing::warn!("Bot turn for {} in room {} dropped: {}", bot_id, room_code, e);
            }
        });
    }

    /// Speak for a bot, unless the turn moved on in the meantime (clock,
    /// departure or a reset). The room lock is not held while the LLM runs.
    async fn run_bot_turn(
        &self,
        room_code: &str,
        bot_id: &str,
        expected: TurnKey,
    ) -> Result<(), RoomError> {
        let ctx = {
            let room = self.lock_room(room_code).await?;
            if room.turn_key() != expected {
                return Ok(());
            }
            match BotContext::from_room(&room, bot_id) {
                Some(ctx) => ctx,
                None => return Ok(()),
            }
        };

        let text = bot::generate_statement(self.llm.as_deref(), &self.llm_config, &ctx).await;

        let mut room = self.lock_room(room_code).await?;
        if room.turn_key() != expected {
            tracing::debug!("Bot {} in room {} answered too late", bot_id, room_code);
            return Ok(());
        }
        self.apply_statement(&mut room, bot_id, &text)?;
        Ok(())
    }

    /// Every alive bot votes as soon as voting opens. Returns the resolution
    /// if the bots' ballots completed the vote.
    pub(crate) fn cast_bot_votes(&self, room: &mut Room) -> Option<VoteResolution> {
        let bot_ids: Vec<PlayerId> = room
            .alive_players()
            .filter(|p| p.is_bot && !room.votes.contains_key(&p.id))
            .map(|p| p.id.clone())
            .collect();

        for bot_id in bot_ids {
            let choice = bot::pick_vote(room, &bot_id);
            match room.cast_vote(&bot_id, choice) {
                Ok(outcome) => {
                    if outcome.resolution.is_some() {
                        return outcome.resolution;
                    }
                }
                Err(e) => {
                    tracing::warn!("Bot vote from {} rejected: {}", bot_id, e);
                    return None;
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_bots() -> GameConfig {
        GameConfig {
            bot_think_min_ms: 0,
            bot_think_max_ms: 0,
            ..GameConfig::default()
        }
    }

    async fn wait_for_state(state: &AppState, code: &str, wanted: GameState) -> Room {
        for _ in 0..200 {
            let room = state.get_room(code).await.unwrap();
            if room.game_state == wanted {
                return room;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("room never reached {}", wanted);
    }

    #[tokio::test]
    async fn test_add_bot() {
        let state = AppState::new();
        let (host, view) = state
            .create_room("Host", Customization::default())
            .await
            .unwrap();

        let view = state.add_bot(&view.room_code, &host).await.unwrap();
        assert_eq!(view.players.len(), 2);
        let bot = &view.players[1];
        assert!(bot.is_bot);
        assert!(!bot.is_host);
        assert!(bot.name.starts_with("Bot"));
    }

    #[tokio::test]
    async fn test_add_bot_host_only_and_lobby_only() {
        let state = AppState::new();
        let (host, view) = state
            .create_room("Host", Customization::default())
            .await
            .unwrap();
        let code = view.room_code;
        let (guest, _) = state
            .join_room(&code, "Guest", Customization::default())
            .await
            .unwrap();

        assert_eq!(
            state.add_bot(&code, &guest).await,
            Err(RoomError::NotAuthorized)
        );

        state.add_bot(&code, &host).await.unwrap();
        state.start_game(&code, &host).await.unwrap();
        assert!(matches!(
            state.add_bot(&code, &host).await,
            Err(RoomError::InvalidPhase { .. })
        ));
    }

    #[tokio::test]
    async fn test_bots_speak_and_vote() {
        let state = AppState::with_config(quick_bots());
        let (host, view) = state
            .create_room("Host", Customization::default())
            .await
            .unwrap();
        let code = view.room_code;
        state.add_bot(&code, &host).await.unwrap();
        state.add_bot(&code, &host).await.unwrap();
        state.start_game(&code, &host).await.unwrap();

        // Host opens the round, the bots follow on their own
        state.submit_statement(&code, &host, "hmm").await.unwrap();
        let room = wait_for_state(&state, &code, GameState::Voting).await;
        assert_eq!(room.game_history.len(), 3);
        assert_eq!(room.game_history[1].player_id, room.players[1].id);
        assert_eq!(room.game_history[2].player_id, room.players[2].id);

        // Both bots voted the moment voting opened
        assert_eq!(room.votes.len(), 2);
        let outcome = state.cast_vote(&code, &host, "skip").await.unwrap();
        assert!(outcome.resolution.is_some());
    }

    #[tokio::test]
    async fn test_stale_bot_turn_is_dropped() {
        let state = AppState::with_config(quick_bots());
        let (host, view) = state
            .create_room("Host", Customization::default())
            .await
            .unwrap();
        let code = view.room_code;
        state.add_bot(&code, &host).await.unwrap();
        state.add_bot(&code, &host).await.unwrap();
        state.start_game(&code, &host).await.unwrap();

        let room = state.get_room(&code).await.unwrap();
        let bot_id = room.players[1].id.clone();
        let stale = TurnKey {
            round: room.round_count + 1,
            ..room.turn_key()
        };
        state.run_bot_turn(&code, &bot_id, stale).await.unwrap();
        assert!(state.get_room(&code).await.unwrap().game_history.is_empty());
    }

    #[tokio::test]
    async fn test_room_with_only_bots_left_is_closed() {
        let state = AppState::new();
        let (host, view) = state
            .create_room("Host", Customization::default())
            .await
            .unwrap();
        let code = view.room_code;
        state.add_bot(&code, &host).await.unwrap();

        let outcome = state.leave_room(&code, &host).await.unwrap();
        assert!(outcome.room_deleted);
        assert_eq!(state.room_count().await, 0);
    }
}
