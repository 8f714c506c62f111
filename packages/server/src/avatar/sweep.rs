use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::manager::AvatarManager;

/// Periodically reclaim blobs left behind by interrupted avatar writes.
pub fn spawn_sweep_task(
    manager: Arc<AvatarManager>,
    interval: Duration,
    grace: Duration,
) -> JoinHandle<()> {
    info!(
        interval_secs = interval.as_secs(),
        grace_secs = grace.as_secs(),
        "Starting avatar orphan sweep"
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if let Err(e) = manager.sweep_orphans(grace).await {
                warn!(error = %e, "Avatar orphan sweep failed");
            }
        }
    })
}
