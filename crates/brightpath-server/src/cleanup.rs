use std::time::Duration;

use tracing::{info, warn};

use brightpath_api::AppState;

/// Background task that prunes expired sessions.
///
/// Expired sessions are already rejected at lookup, so this only keeps the
/// `sessions` table from growing.
pub async fn run_session_cleanup(state: AppState, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        let db_state = state.clone();
        match tokio::task::spawn_blocking(move || db_state.db.purge_expired_sessions()).await {
            Ok(Ok(count)) => {
                if count > 0 {
                    info!("Cleanup: pruned {} expired sessions", count);
                }
            }
            Ok(Err(e)) => warn!("Cleanup error: {}", e),
            Err(e) => warn!("Cleanup task join error: {}", e),
        }
    }
}
