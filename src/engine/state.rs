use super::manager::RefreshReport;
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Refreshing,
}

#[derive(Debug)]
struct Inner {
    phase: Phase,
    cycles_completed: u64,
    last_report: Option<RefreshReport>,
}

/// Shared view of the refresh scheduler, read by the status endpoint.
#[derive(Debug, Clone)]
pub struct RefreshState {
    inner: Arc<RwLock<Inner>>,
}

impl RefreshState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                phase: Phase::Idle,
                cycles_completed: 0,
                last_report: None,
            })),
        }
    }

    pub fn phase(&self) -> Phase {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .phase
    }

    pub fn cycles_completed(&self) -> u64 {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .cycles_completed
    }

    pub fn last_report(&self) -> Option<RefreshReport> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .last_report
            .clone()
    }

    pub(crate) fn begin(&self) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.phase = Phase::Refreshing;
    }

    pub(crate) fn finish(&self, report: RefreshReport) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.phase = Phase::Idle;
        guard.cycles_completed += 1;
        guard.last_report = Some(report);
    }
}

impl Default for RefreshState {
    fn default() -> Self {
        Self::new()
    }
}
