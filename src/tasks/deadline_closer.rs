use crate::db::Database;
use crate::error::{GovernanceError, Result};
use crate::voting::workflow::{ClosureDecision, ResolutionWorkflow};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

/// Closes every open resolution whose deadline is before `now`.
///
/// A resolution that someone else closed in the meantime is skipped; other
/// per-resolution failures are logged and do not stop the sweep.
pub async fn close_expired_resolutions(
    database: &Database,
    workflow: &ResolutionWorkflow,
    now: DateTime<Utc>,
) -> Result<Vec<ClosureDecision>> {
    let expired = database.get_expired_resolutions(now).await?;
    if expired.is_empty() {
        return Ok(Vec::new());
    }

    info!("Found {} resolution(s) past their voting deadline.", expired.len());
    let mut decisions = Vec::with_capacity(expired.len());

    for resolution_id in expired {
        match database.close_resolution(&resolution_id, workflow, now).await {
            Ok(decision) => {
                info!(
                    "Auto-closed resolution {}: {}",
                    resolution_id, decision.resolution.status
                );
                decisions.push(decision);
            }
            Err(GovernanceError::InvalidStateTransition { from, .. }) => {
                warn!("Resolution {} was already {}; skipping", resolution_id, from);
            }
            Err(e) => error!("Error closing expired resolution {}: {}", resolution_id, e),
        }
    }

    Ok(decisions)
}

pub async fn check_expired_resolutions_task(
    database: Arc<Database>,
    workflow: ResolutionWorkflow,
    every: Duration,
) {
    info!("Starting background task to close resolutions past their deadline...");
    let mut interval = interval(every);

    loop {
        interval.tick().await;
        let now = Utc::now();

        if let Err(e) = close_expired_resolutions(&database, &workflow, now).await {
            error!("Failed to query for expired resolutions: {}", e);
        }
    }
}
