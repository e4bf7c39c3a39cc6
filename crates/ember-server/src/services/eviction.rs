//! Background eviction of expired focus sessions and ratings.

use ember_core::FocusEngine;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{debug, error, info};

/// Spawn a task that runs an eviction pass every `interval_secs`.
///
/// The first pass runs one interval after start.
pub fn spawn_eviction_task(engine: Arc<FocusEngine>, interval_secs: u64) -> JoinHandle<()> {
    info!(interval_secs, "Starting focus session eviction");

    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            run_pass(&engine);
        }
    })
}

fn run_pass(engine: &FocusEngine) {
    match engine.evict_expired() {
        Ok(stats) => debug!(
            workflows = stats.workflows,
            rated_sessions = stats.rated_sessions,
            "Eviction pass finished"
        ),
        Err(e) => error!(error = %e, "Eviction pass failed"),
    }
}
