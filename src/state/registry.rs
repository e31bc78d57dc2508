use super::{AppState, SharedRoom};
use crate::error::RoomError;
use crate::protocol::RoomView;
use crate::room::Room;
use crate::types::*;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

const CODE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const ROOM_CODE_LENGTH: usize = 6;
pub const MAX_NAME_CHARS: usize = 24;

/// Generate a random room code (6 uppercase alphanumerics)
fn generate_room_code() -> RoomCode {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

/// Room codes are case-insensitive
pub fn normalize_room_code(code: &str) -> RoomCode {
    code.trim().to_uppercase()
}

/// Trim and cap a display name; blank names are rejected
pub fn validate_name(name: &str) -> Result<String, RoomError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RoomError::InvalidName);
    }
    Ok(trimmed.chars().take(MAX_NAME_CHARS).collect())
}

pub(super) fn new_player_id() -> PlayerId {
    ulid::Ulid::new().to_string()
}

impl AppState {
    /// Open a new room hosted by the caller
    pub async fn create_room(
        &self,
        host_name: &str,
        customization: Customization,
    ) -> Result<(PlayerId, RoomView), RoomError> {
        let name = validate_name(host_name)?;
        let host_id = new_player_id();
        let host = Player::new(
            host_id.clone(),
            name,
            customization,
            self.config.guess_attempts,
        );

        let mut rooms = self.rooms.write().await;
        let room_code = loop {
            let code = generate_room_code();
            if !rooms.contains_key(&code) {
                break code;
            }
            // Collision - try again (36^6 codes)
        };
        let room = Room::new(room_code.clone(), host, self.config.clone());
        let view = RoomView::for_viewer(&room, &host_id);
        rooms.insert(room_code.clone(), Arc::new(Mutex::new(room)));
        drop(rooms);

        tracing::info!("Room {} created by {}", room_code, host_id);
        Ok((host_id, view))
    }

    /// Join an existing room in its lobby
    pub async fn join_room(
        &self,
        room_code: &str,
        player_name: &str,
        customization: Customization,
    ) -> Result<(PlayerId, RoomView), RoomError> {
        let name = validate_name(player_name)?;
        let mut room = self.lock_room(room_code).await?;
        room.check_joinable()?;

        let player_id = new_player_id();
        let attempts = room.config.guess_attempts;
        room.add_player(Player::new(
            player_id.clone(),
            name,
            customization,
            attempts,
        ))?;

        tracing::info!("Player {} joined room {}", player_id, room.room_code);
        self.publish_snapshot(&room, false);
        let view = RoomView::for_viewer(&room, &player_id);
        Ok((player_id, view))
    }

    pub(crate) async fn find_room(&self, room_code: &str) -> Option<SharedRoom> {
        let code = normalize_room_code(room_code);
        self.rooms.read().await.get(&code).cloned()
    }

    /// Take a room's lock. The registry lock is released before the room lock
    /// is awaited, so no code path ever waits on the registry while holding a
    /// room.
    pub async fn lock_room(&self, room_code: &str) -> Result<OwnedMutexGuard<Room>, RoomError> {
        let not_found = || RoomError::RoomNotFound(normalize_room_code(room_code));
        let shared = self.find_room(room_code).await.ok_or_else(not_found)?;
        let room = shared.lock_owned().await;
        // Closed while we were waiting for the lock
        if room.is_closed() {
            return Err(not_found());
        }
        Ok(room)
    }

    /// Viewer-specific snapshot; the viewer must be a member of the room
    pub async fn room_view(
        &self,
        room_code: &str,
        viewer_id: &str,
    ) -> Result<RoomView, RoomError> {
        let room = self.lock_room(room_code).await?;
        if room.player(viewer_id).is_none() {
            return Err(RoomError::PlayerNotFound(viewer_id.to_string()));
        }
        Ok(RoomView::for_viewer(&room, viewer_id))
    }

    /// Unredacted copy of a room
    pub async fn get_room(&self, room_code: &str) -> Option<Room> {
        let room = self.lock_room(room_code).await.ok()?;
        Some(room.clone())
    }

    pub(crate) async fn remove_room(&self, room_code: &str) {
        let code = normalize_room_code(room_code);
        if self.rooms.write().await.remove(&code).is_some() {
            tracing::info!("Room {} deleted", code);
        }
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub(crate) async fn all_rooms(&self) -> Vec<SharedRoom> {
        self.rooms.read().await.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_code_shape() {
        for _ in 0..100 {
            let code = generate_room_code();
            assert_eq!(code.len(), ROOM_CODE_LENGTH);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Alice "), Ok("Alice".to_string()));
        assert_eq!(validate_name("   "), Err(RoomError::InvalidName));
        let long = "x".repeat(100);
        assert_eq!(validate_name(&long).unwrap().len(), MAX_NAME_CHARS);
    }

    #[tokio::test]
    async fn test_create_room() {
        let state = AppState::new();
        let (host_id, view) = state
            .create_room("Host", Customization::default())
            .await
            .unwrap();

        assert_eq!(view.room_code.len(), ROOM_CODE_LENGTH);
        assert_eq!(view.host_id, host_id);
        assert_eq!(view.players.len(), 1);
        assert!(view.players[0].is_host);
        assert_eq!(state.room_count().await, 1);
    }

    #[tokio::test]
    async fn test_join_is_case_insensitive() {
        let state = AppState::new();
        let (_, view) = state
            .create_room("Host", Customization::default())
            .await
            .unwrap();
        let lower = view.room_code.to_lowercase();

        let (player_id, joined) = state
            .join_room(&lower, "Alice", Customization::default())
            .await
            .unwrap();
        assert_eq!(joined.players.len(), 2);
        assert!(!joined.players[1].is_host);
        assert_eq!(joined.players[1].id, player_id);
    }

    #[tokio::test]
    async fn test_join_unknown_room() {
        let state = AppState::new();
        let result = state
            .join_room("nope42", "Alice", Customization::default())
            .await;
        assert_eq!(result, Err(RoomError::RoomNotFound("NOPE42".to_string())));
    }

    #[tokio::test]
    async fn test_join_full_room() {
        let state = AppState::new();
        let (_, view) = state
            .create_room("Host", Customization::default())
            .await
            .unwrap();
        for i in 1..10 {
            state
                .join_room(&view.room_code, &format!("P{}", i), Customization::default())
                .await
                .unwrap();
        }
        let result = state
            .join_room(&view.room_code, "Late", Customization::default())
            .await;
        assert_eq!(result, Err(RoomError::RoomFull));
    }

    #[tokio::test]
    async fn test_room_view_requires_membership() {
        let state = AppState::new();
        let (_, view) = state
            .create_room("Host", Customization::default())
            .await
            .unwrap();
        let result = state.room_view(&view.room_code, "stranger").await;
        assert_eq!(
            result,
            Err(RoomError::PlayerNotFound("stranger".to_string()))
        );
    }
}
