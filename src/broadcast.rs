use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;

const TICK: Duration = Duration::from_millis(250);

/// Spawn a background task that fires expired turn, meeting and voting clocks
pub fn spawn_deadline_watcher(state: Arc<AppState>) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(TICK).await;

            let fired = state.tick_deadlines(chrono::Utc::now()).await;
            if fired > 0 {
                tracing::debug!("{} phase deadlines fired", fired);
            }
        }
    });
}
