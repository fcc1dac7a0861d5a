// peacepod-moderation/src/tasks/ban_maintenance.rs

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info};

use crate::services::ModerationService;

/// Spawns a background task that periodically sweeps expired ban rows.
/// Individual status checks already delete lazily; this keeps rows for
/// users who never come back from piling up.
pub fn spawn_ban_cleanup_task(
    service: Arc<ModerationService>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            sleep(interval).await;
            match service.cleanup_expired_bans().await {
                Ok(0) => {}
                Ok(removed) => info!("Ban cleanup removed {} expired ban(s)", removed),
                Err(e) => error!("Ban cleanup failed: {:?}", e),
            }
        }
    })
}
