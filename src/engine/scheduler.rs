use super::manager::RefreshReport;
use super::state::RefreshState;
use super::traits::ListManager;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::info;

/// Drives refresh cycles: once on demand, then every `period`, plus any
/// forced refresh sent over the trigger channel.
pub struct Scheduler {
    manager: Arc<dyn ListManager>,
    state: RefreshState,
    period: Duration,
    align_to_wall_clock: bool,
}

impl Scheduler {
    pub fn new(
        manager: Arc<dyn ListManager>,
        state: RefreshState,
        period: Duration,
        align_to_wall_clock: bool,
    ) -> Self {
        Self {
            manager,
            state,
            period,
            align_to_wall_clock,
        }
    }

    /// Runs one full cycle, Idle -> Refreshing -> Idle.
    pub async fn run_cycle(&self) -> RefreshReport {
        self.state.begin();
        let report = self.manager.refresh().await;
        self.state.finish(report.clone());
        report
    }

    fn first_delay(&self) -> Duration {
        if self.align_to_wall_clock {
            delay_until_next_boundary(SystemTime::now(), self.period)
        } else {
            self.period
        }
    }

    /// Periodic loop. Does not run a cycle up front; the caller is expected to
    /// have awaited `run_cycle` at startup.
    pub async fn run(self, mut refresh_rx: mpsc::Receiver<()>) {
        let start = Instant::now() + self.first_delay();
        let mut interval = time::interval_at(start, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut trigger_open = true;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    info!("Scheduled proxy list refresh...");
                }
                msg = refresh_rx.recv(), if trigger_open => {
                    if msg.is_none() {
                        info!("Refresh trigger closed; continuing on schedule only");
                        trigger_open = false;
                        continue;
                    }
                    info!("Forced proxy list refresh triggered via API...");
                    if !self.align_to_wall_clock {
                        interval.reset(); // Reset timer to avoid double update
                    }
                }
            }
            self.run_cycle().await;
        }
    }

    pub fn spawn(self, refresh_rx: mpsc::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(refresh_rx))
    }
}

/// Time from `now` until the next multiple of `period` since the Unix epoch,
/// e.g. the top of the next hour for a one hour period.
pub fn delay_until_next_boundary(now: SystemTime, period: Duration) -> Duration {
    let period_secs = period.as_secs().max(1);
    let since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or_default();
    let into_period = since_epoch.as_secs() % period_secs;
    Duration::from_secs(period_secs - into_period)
        .saturating_sub(Duration::from_nanos(u64::from(since_epoch.subsec_nanos())))
}
