use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::api::imports::AppState;
use crate::services::registration::ExerciseStore;

pub async fn start_scheduler(state: AppState) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let schedule = state.config.library_refresh_cron.clone();
    scheduler
        .add(Job::new_async(schedule.as_str(), move |_uuid, _l| {
            let state = state.clone();
            Box::pin(async move {
                if let Err(e) = refresh_library(&state).await {
                    tracing::error!(error = %e, "cron.library_refresh_failed");
                }
                evict_stale_sessions(&state);
            })
        })?)
        .await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Replaces the shared snapshot with the active library, freshest first.
pub async fn refresh_library(state: &AppState) -> anyhow::Result<()> {
    let started = Utc::now();
    let mut records = state.library_client.fetch_active_exercises().await?;

    // Freshest first; rows without a timestamp go last
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    records.retain(|record| record.is_active);

    let record_count = records.len();
    state.replace_library(records);

    tracing::info!(
        record_count,
        elapsed_ms = (Utc::now() - started).num_milliseconds(),
        "library.refreshed"
    );
    Ok(())
}

/// Discards abandoned imports so their library copies are released.
pub fn evict_stale_sessions(state: &AppState) {
    let evicted = state.evict_stale_sessions(Utc::now());
    if evicted > 0 {
        tracing::info!(evicted, "import.sessions_evicted");
    }
}
