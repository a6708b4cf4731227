use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::HarvestResult;

/// Process-wide record of the harvest lifecycle, as seen by callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HarvestStatus {
    pub is_running: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub last_run: Option<DateTime<Utc>>,
    pub last_result: Option<HarvestResult>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("a harvest is already in progress (started {started_at:?})")]
pub struct AlreadyRunning {
    pub started_at: Option<DateTime<Utc>>,
}

/// Lock-guarded status shared between the harvester and whatever boundary
/// reports on it. Cloning yields another handle to the same record.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    inner: Arc<Mutex<HarvestStatus>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check-and-set under a single lock: either this call marks the harvest
    /// as running and gets the permit, or it observes a running harvest and
    /// is refused without touching the record.
    pub fn try_begin(&self) -> Result<HarvestPermit, AlreadyRunning> {
        let mut status = self.lock();
        if status.is_running {
            return Err(AlreadyRunning {
                started_at: status.started_at,
            });
        }
        status.is_running = true;
        status.started_at = Some(Utc::now());
        status.last_error = None;
        Ok(HarvestPermit {
            board: self.clone(),
            finished: false,
        })
    }

    pub fn snapshot(&self) -> HarvestStatus {
        self.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.lock().is_running
    }

    fn lock(&self) -> MutexGuard<'_, HarvestStatus> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Proof that the holder owns the single in-flight harvest slot.
///
/// Dropping the permit without calling [`HarvestPermit::complete`] or
/// [`HarvestPermit::fail`] still releases the slot.
#[derive(Debug)]
#[must_use = "dropping the permit immediately releases the harvest slot"]
pub struct HarvestPermit {
    board: StatusBoard,
    finished: bool,
}

impl HarvestPermit {
    pub fn complete(mut self, result: &HarvestResult) {
        let mut status = self.board.lock();
        status.is_running = false;
        status.last_run = Some(result.scraped_at);
        status.last_result = Some(result.clone());
        status.last_error = None;
        self.finished = true;
    }

    pub fn fail(mut self, error: impl fmt::Display) {
        let mut status = self.board.lock();
        status.is_running = false;
        status.last_error = Some(error.to_string());
        self.finished = true;
    }
}

impl Drop for HarvestPermit {
    fn drop(&mut self) {
        if !self.finished {
            self.board.lock().is_running = false;
        }
    }
}
