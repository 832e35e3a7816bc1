// Optional session expiry — a background sweeper that removes sessions older
// than a configured TTL. This is an extension over the original
// manual-cleanup-only behavior and is off unless a TTL is configured.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::session::SessionStore;

/// Spawn the sweeper. Each tick removes every session whose age exceeds
/// `ttl`: the store entry goes first so no new request can resolve the
/// session, then its staging directory. Archives are not expired; they stay
/// until an explicit purge.
pub fn spawn_expiry_sweeper(
    store: Arc<SessionStore>,
    ttl: Duration,
    interval: Duration,
) -> JoinHandle<()> {
    info!("session expiry enabled: ttl={}s", ttl.as_secs());
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            sweep(&store, ttl);
        }
    })
}

fn sweep(store: &SessionStore, ttl: Duration) {
    let expired: Vec<(String, PathBuf)> = store
        .all()
        .into_iter()
        .filter(|s| s.created_at.elapsed() > ttl)
        .map(|s| (s.id.clone(), s.staging_path.clone()))
        .collect();

    for (id, staging_path) in expired {
        store.remove(&id);
        match std::fs::remove_dir_all(&staging_path) {
            Ok(()) => debug!("expired session {} removed", id),
            Err(e) => warn!(
                "expired session {} staging dir {} not removed: {}",
                id,
                staging_path.display(),
                e
            ),
        }
    }
}
