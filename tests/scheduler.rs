use async_trait::async_trait;
use proxy_shelf::engine::{ListManager, RefreshReport, RefreshState, Scheduler};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const HOUR: Duration = Duration::from_secs(3600);

#[derive(Default)]
struct CountingManager {
    cycles: AtomicUsize,
}

impl CountingManager {
    fn cycles(&self) -> usize {
        self.cycles.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ListManager for CountingManager {
    async fn refresh(&self) -> RefreshReport {
        self.cycles.fetch_add(1, Ordering::SeqCst);
        RefreshReport::default()
    }
}

fn scheduler(manager: Arc<CountingManager>, state: RefreshState) -> Scheduler {
    Scheduler::new(manager, state, HOUR, false)
}

#[tokio::test(start_paused = true)]
async fn test_refreshes_once_per_period() {
    let manager = Arc::new(CountingManager::default());
    let state = RefreshState::new();
    let (_tx, rx) = mpsc::channel(1);
    let handle = scheduler(manager.clone(), state.clone()).spawn(rx);

    // The startup cycle belongs to the caller; the loop waits a full period.
    tokio::time::sleep(HOUR - Duration::from_secs(1)).await;
    assert_eq!(manager.cycles(), 0);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(manager.cycles(), 1);

    tokio::time::sleep(HOUR * 2).await;
    assert_eq!(manager.cycles(), 3);
    assert_eq!(state.cycles_completed(), 3);

    handle.abort();
}

#[tokio::test(start_paused = true)]
async fn test_forced_refresh_runs_now_and_restarts_period() {
    let manager = Arc::new(CountingManager::default());
    let (tx, rx) = mpsc::channel(1);
    let handle = scheduler(manager.clone(), RefreshState::new()).spawn(rx);

    tokio::time::sleep(HOUR / 2).await;
    tx.send(()).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(manager.cycles(), 1);

    // The original one-hour mark passes without a second cycle.
    tokio::time::sleep(Duration::from_secs(2000)).await;
    assert_eq!(manager.cycles(), 1);

    // One period after the forced refresh.
    tokio::time::sleep(Duration::from_secs(1700)).await;
    assert_eq!(manager.cycles(), 2);

    handle.abort();
}

#[tokio::test(start_paused = true)]
async fn test_closed_trigger_keeps_schedule() {
    let manager = Arc::new(CountingManager::default());
    let (tx, rx) = mpsc::channel(1);
    let handle = scheduler(manager.clone(), RefreshState::new()).spawn(rx);
    drop(tx);

    tokio::time::sleep(HOUR + Duration::from_secs(1)).await;
    assert_eq!(manager.cycles(), 1);

    handle.abort();
}
