//! Scheduled full sweeps

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::Error;
use crate::state::AppState;

/// Run a full sweep now and then every `every`. A tick that finds a sweep
/// still running is skipped.
pub fn spawn_scheduled_sweeps(state: AppState, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let state = state.clone();
            match tokio::task::spawn_blocking(move || state.run_sweep()).await {
                Ok(Ok(_)) => {}
                Ok(Err(Error::SweepInProgress)) => {
                    tracing::debug!("Previous sweep still running; skipping tick");
                }
                Ok(Err(e)) => tracing::error!(error = %e, "Scheduled sweep failed"),
                Err(e) => tracing::error!(error = %e, "Scheduled sweep task failed"),
            }
        }
    })
}
