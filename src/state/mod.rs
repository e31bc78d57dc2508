mod bots;
mod game;
mod registry;

use crate::llm::{LlmConfig, LlmManager};
use crate::protocol::{RoomBroadcast, RoomEvent, ServerMessage};
use crate::room::Room;
use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};

pub use registry::{normalize_room_code, validate_name, MAX_NAME_CHARS, ROOM_CODE_LENGTH};

/// A room behind its own lock; every command on it runs under this mutex
pub type SharedRoom = Arc<Mutex<Room>>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RwLock<HashMap<RoomCode, SharedRoom>>>,
    /// Fan-out of room events to every connected socket
    pub broadcast: broadcast::Sender<RoomBroadcast>,
    /// Settings applied to newly created rooms
    pub config: GameConfig,
    pub llm: Option<Arc<LlmManager>>,
    pub llm_config: LlmConfig,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_config(GameConfig::default())
    }

    pub fn with_config(config: GameConfig) -> Self {
        Self::new_with_llm(config, None, LlmConfig::default())
    }

    pub fn new_with_llm(
        config: GameConfig,
        llm: Option<LlmManager>,
        llm_config: LlmConfig,
    ) -> Self {
        let (tx, _rx) = broadcast::channel(256);
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            broadcast: tx,
            config,
            llm: llm.map(Arc::new),
            llm_config,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RoomBroadcast> {
        self.broadcast.subscribe()
    }

    pub(crate) fn publish(&self, room_code: &str, msg: ServerMessage) {
        self.send(room_code, RoomEvent::Message(msg));
    }

    pub(crate) fn publish_snapshot(&self, room: &Room, started: bool) {
        self.send(
            &room.room_code,
            RoomEvent::Snapshot {
                room: Arc::new(room.clone()),
                started,
            },
        );
    }

    fn send(&self, room_code: &str, event: RoomEvent) {
        // Ignore send errors (no receivers connected is fine)
        let _ = self.broadcast.send(RoomBroadcast {
            room_code: room_code.to_string(),
            event,
        });
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
