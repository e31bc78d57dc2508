use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Opaque ID types for type safety
pub type PlayerId = String;
pub type RoomCode = String;

/// Reserved vote value meaning "no elimination preference"
pub const SKIP_VOTE: &str = "skip";

/// Statement recorded when a player submits nothing (or their clock runs out)
pub const DEFAULT_STATEMENT: &str = "...";

/// Hard upper bound on room size, whatever the configuration says
pub const MAX_PLAYERS_CAP: usize = 10;

pub const SKINS: &[&str] = &[
    "Skin_black",
    "Skin_brown",
    "Skin_green",
    "Skin_peach",
    "Skin_white",
];
pub const FACES: &[&str] = &["Face_1", "Face_2", "Face_3", "Face_4", "Face_5"];
pub const HATS: &[&str] = &["Hat_1", "Hat_2", "Hat_3", "Hat_4", "Hat_5"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum GameState {
    Lobby,
    Playing,
    /// Optional timed discussion window between the last statement and voting
    Meeting,
    Voting,
    GameOver,
}

impl GameState {
    /// A game is underway (imposter assigned, players can be eliminated)
    pub fn is_in_game(&self) -> bool {
        matches!(self, Self::Playing | Self::Meeting | Self::Voting)
    }
}

impl std::fmt::Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "lobby"),
            Self::Playing => write!(f, "playing"),
            Self::Meeting => write!(f, "meeting"),
            Self::Voting => write!(f, "voting"),
            Self::GameOver => write!(f, "gameOver"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Imposters,
    Crew,
}

/// Cosmetic look of a player; never inspected by game logic
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Customization {
    pub skin: String,
    pub face: String,
    pub hat: String,
}

impl Default for Customization {
    fn default() -> Self {
        Self {
            skin: "Skin_peach".to_string(),
            face: "Face_1".to_string(),
            hat: "Hat_1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub customization: Customization,
    pub is_host: bool,
    pub is_alive: bool,
    pub is_imposter: bool,
    pub has_spoken: bool,
    pub guess_attempts: u32,
    /// Server-driven player (statements come from the LLM or the heuristic)
    #[serde(default)]
    pub is_bot: bool,
    /// Left or disconnected mid-game; kept in place so turn order stays stable
    #[serde(default)]
    pub has_left: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: String, customization: Customization, guess_attempts: u32) -> Self {
        Self {
            id,
            name,
            customization,
            is_host: false,
            is_alive: true,
            is_imposter: false,
            has_spoken: false,
            guess_attempts,
            is_bot: false,
            has_left: false,
        }
    }
}

/// A vote is either a player id or a skip
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VoteChoice {
    Player(PlayerId),
    Skip,
}

impl VoteChoice {
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case(SKIP_VOTE) {
            Self::Skip
        } else {
            Self::Player(raw.to_string())
        }
    }
}

// Serialized as a bare string so the votes map reads `{"voter": "target" | "skip"}`
impl Serialize for VoteChoice {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Player(id) => serializer.serialize_str(id),
            Self::Skip => serializer.serialize_str(SKIP_VOTE),
        }
    }
}

impl<'de> Deserialize<'de> for VoteChoice {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// A statement echoed to the room
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub player_id: PlayerId,
    pub player_name: String,
    pub text: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub round: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub turn_seconds: u32,
    pub voting_seconds: u32,
    /// 0 skips the meeting window and opens voting immediately
    pub meeting_seconds: u32,
    pub guess_attempts: u32,
    pub min_players: usize,
    pub max_players: usize,
    pub max_statement_chars: usize,
    pub bot_think_min_ms: u64,
    pub bot_think_max_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            turn_seconds: 20,
            voting_seconds: 20,
            meeting_seconds: 0,
            guess_attempts: 3,
            min_players: 3,
            max_players: 10,
            max_statement_chars: 200,
            bot_think_min_ms: 1000,
            bot_think_max_ms: 3500,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl GameConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let min_players = env_or("MIN_PLAYERS", defaults.min_players).clamp(3, MAX_PLAYERS_CAP);
        let config = Self {
            turn_seconds: env_or("TURN_SECONDS", defaults.turn_seconds),
            voting_seconds: env_or("VOTING_SECONDS", defaults.voting_seconds),
            meeting_seconds: env_or("MEETING_SECONDS", defaults.meeting_seconds),
            guess_attempts: env_or("GUESS_ATTEMPTS", defaults.guess_attempts).max(1),
            min_players,
            max_players: env_or("MAX_PLAYERS", defaults.max_players)
                .clamp(min_players, MAX_PLAYERS_CAP),
            max_statement_chars: env_or("MAX_STATEMENT_CHARS", defaults.max_statement_chars),
            bot_think_min_ms: env_or("BOT_THINK_MIN_MS", defaults.bot_think_min_ms),
            bot_think_max_ms: env_or("BOT_THINK_MAX_MS", defaults.bot_think_max_ms),
        };

        tracing::info!(
            "Game config loaded: turn={}s, voting={}s, meeting={}s, guesses={}",
            config.turn_seconds,
            config.voting_seconds,
            config.meeting_seconds,
            config.guess_attempts
        );
        config
    }

    /// Clock length for a phase, `None` when that clock is disabled
    pub fn phase_duration(&self, state: GameState) -> Option<Duration> {
        let seconds = match state {
            GameState::Playing => self.turn_seconds,
            GameState::Meeting => self.meeting_seconds,
            GameState::Voting => self.voting_seconds,
            GameState::Lobby | GameState::GameOver => 0,
        };
        (seconds > 0).then(|| Duration::from_secs(seconds as u64))
    }
}
