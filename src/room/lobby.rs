use super::Room;
use crate::error::RoomError;
use crate::types::*;
use crate::words;
use rand::Rng;
use std::collections::HashMap;

impl Room {
    /// Create a room seeded with its host
    pub fn new(room_code: RoomCode, mut host: Player, config: GameConfig) -> Self {
        host.is_host = true;
        host.guess_attempts = config.guess_attempts;
        Self {
            room_code,
            host_id: host.id.clone(),
            players: vec![host],
            game_state: GameState::Lobby,
            current_turn: 0,
            secret_word: None,
            selected_word_pack: words::DEFAULT_WORD_PACK.to_string(),
            round_count: 0,
            votes: HashMap::new(),
            winner: None,
            game_history: Vec::new(),
            phase_deadline: None,
            config,
        }
    }

    /// Join policy: only in the lobby and only below the player cap
    pub fn check_joinable(&self) -> Result<(), RoomError> {
        self.require_state(GameState::Lobby, "lobby")?;
        if self.players.len() >= self.config.max_players {
            return Err(RoomError::RoomFull);
        }
        Ok(())
    }

    /// Append a non-host player; `check_joinable` must pass first
    pub fn add_player(&mut self, mut player: Player) -> Result<(), RoomError> {
        if self.player(&player.id).is_some() {
            return Err(RoomError::InvalidTarget(format!(
                "player {} already joined",
                player.id
            )));
        }
        player.is_host = false;
        player.is_alive = true;
        player.is_imposter = false;
        player.has_spoken = false;
        player.has_left = false;
        player.guess_attempts = self.config.guess_attempts;
        self.players.push(player);
        Ok(())
    }

    pub fn change_word_pack(&mut self, requester_id: &str, pack_name: &str) -> Result<(), RoomError> {
        self.require_host(requester_id)?;
        self.require_state(GameState::Lobby, "lobby")?;
        if words::pack(pack_name).is_none() {
            return Err(RoomError::InvalidWordPack(pack_name.to_string()));
        }
        self.selected_word_pack = pack_name.to_string();
        Ok(())
    }

    /// Pick the imposter and the secret word and open the first round
    pub fn start_game(&mut self, requester_id: &str) -> Result<(), RoomError> {
        self.require_host(requester_id)?;
        self.require_state(GameState::Lobby, "lobby")?;
        if self.players.len() < self.config.min_players {
            return Err(RoomError::NotEnoughPlayers {
                required: self.config.min_players,
                actual: self.players.len(),
            });
        }
        let secret_word = words::random_word(&self.selected_word_pack)
            .ok_or_else(|| RoomError::InvalidWordPack(self.selected_word_pack.clone()))?;

        let imposter_idx = rand::rng().random_range(0..self.players.len());
        let attempts = self.config.guess_attempts;
        for (idx, player) in self.players.iter_mut().enumerate() {
            player.is_imposter = idx == imposter_idx;
            player.is_alive = true;
            player.has_spoken = false;
            player.guess_attempts = attempts;
        }

        self.secret_word = Some(secret_word.to_string());
        self.game_state = GameState::Playing;
        self.current_turn = 0;
        self.round_count = 1;
        self.votes.clear();
        self.winner = None;
        self.game_history.clear();

        tracing::info!(
            "Game started in room {} with {} players (pack: {})",
            self.room_code,
            self.players.len(),
            self.selected_word_pack
        );
        Ok(())
    }

    /// Host brings a finished room back to the lobby for another game
    pub fn return_to_lobby(&mut self, requester_id: &str) -> Result<(), RoomError> {
        self.require_host(requester_id)?;
        self.require_state(GameState::GameOver, "gameOver")?;

        self.players.retain(|p| !p.has_left);
        let attempts = self.config.guess_attempts;
        for player in &mut self.players {
            player.is_alive = true;
            player.is_imposter = false;
            player.has_spoken = false;
            player.guess_attempts = attempts;
        }

        self.game_state = GameState::Lobby;
        self.current_turn = 0;
        self.secret_word = None;
        self.round_count = 0;
        self.votes.clear();
        self.winner = None;
        self.game_history.clear();
        self.phase_deadline = None;
        Ok(())
    }
}
