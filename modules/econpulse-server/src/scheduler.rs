//! Daily collection schedule.
//!
//! `start` registers the collection job and returns the owned scheduler
//! handle; stopping the scheduler requires calling `shutdown` on that
//! handle. The scheduled trigger logs outcomes and never re-raises; the
//! manual trigger is the path that surfaces failures to a caller.

use std::sync::Arc;

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

use crate::notify;
use crate::AppState;

/// Start the scheduler with the daily collection job registered.
/// The cron expression is six-field and evaluated in UTC.
pub async fn start(state: Arc<AppState>, cron: &str) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let job_state = state.clone();
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let state = job_state.clone();
        Box::pin(async move {
            run_scheduled_collection(state).await;
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    info!(cron, "Scheduler started");
    Ok(scheduler)
}

async fn run_scheduled_collection(state: Arc<AppState>) {
    info!("Scheduler triggered: starting news collection and analysis");

    match state.collector.run(None).await {
        Ok(summary) => {
            info!(
                status = %summary.status,
                collected = summary.collected,
                analyzed = summary.analyzed,
                tokens = summary.total_tokens,
                "Scheduled collection finished"
            );

            if summary.analyzed > 0 {
                if let Some(fcm) = &state.fcm {
                    if let Err(e) = notify::send_daily_digest(fcm, &summary).await {
                        warn!(error = %e, "Failed to send daily digest push");
                    }
                    notify::push_to_devices(fcm, &state.devices, &summary).await;
                }
            }
        }
        Err(e) => {
            error!(error = %e, "Scheduled collection failed");
        }
    }
}
