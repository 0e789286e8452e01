//! Background recomputation of case statuses.
//!
//! Some statuses depend on the current date (a 12-week deadline passing),
//! so cached statuses are refreshed periodically as well as on every save.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{error, info};

use crate::db::DbPool;
use crate::services::case_workflow::refresh_all_statuses;

#[derive(Debug, Clone, Copy)]
pub struct StatusRefreshConfig {
    /// How often to run the refresh (in seconds)
    pub interval_secs: u64,
}

/// Start the status refresh background task. An interval of zero disables it.
pub fn start_status_refresh_task(pool: Arc<DbPool>, config: StatusRefreshConfig) {
    if config.interval_secs == 0 {
        info!("Status refresh disabled");
        return;
    }

    tokio::spawn(async move {
        info!(
            interval_secs = config.interval_secs,
            "Starting case status refresh"
        );

        let mut ticker = interval(Duration::from_secs(config.interval_secs));

        loop {
            ticker.tick().await;

            match refresh_all_statuses(&pool).await {
                Ok(0) => {}
                Ok(changed) => info!(changed, "Case statuses refreshed"),
                Err(e) => error!("Status refresh error: {}", e),
            }
        }
    });
}
