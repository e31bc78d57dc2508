// Public API for integration tests and the server binary

pub mod api;
pub mod bot;
pub mod broadcast;
pub mod error;
pub mod llm;
pub mod protocol;
pub mod room;
pub mod state;
pub mod types;
pub mod words;
pub mod ws;

use axum::{
    routing::{get, post},
    Router,
};
use state::AppState;
use std::sync::Arc;

/// HTTP + WebSocket routes, without static files or middleware layers
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/api/rooms", post(api::create_room))
        .route("/api/rooms/{code}", get(api::get_room))
        .route("/api/rooms/{code}/join", post(api::join_room))
        .route(
            "/api/rooms/{code}/players/{player_id}/commands",
            post(api::room_command),
        )
        .route("/api/word-packs", get(api::list_word_packs))
        .with_state(state)
}
