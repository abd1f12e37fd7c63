//! Monitoring board
//!
//! A display-side view of running processes. The board owns its records and
//! moves their step counters forward on a timer; it never writes the
//! document store. Runs in `error` or `retry` condition stay as they are.

use crate::store::DocumentStore;
use parking_lot::Mutex;
use pir_model::DocumentId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Condition of a monitored run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunCondition {
    /// Progressing on every tick
    Running,
    /// Last step passed
    Completed,
    /// Failed; left untouched
    Error,
    /// Waiting for a retry; left untouched
    Retry,
}

/// One row on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoredRun {
    /// Monitored document
    pub document_id: DocumentId,
    /// Process shown on the board
    pub process_name: String,
    /// Step counter (board-local)
    pub current_step: u32,
    /// Step count
    pub total_steps: u32,
    /// Run condition
    pub condition: RunCondition,
}

impl MonitoredRun {
    /// New run in `Running` condition
    #[must_use]
    pub fn running(
        document_id: DocumentId,
        process_name: impl Into<String>,
        current_step: u32,
        total_steps: u32,
    ) -> Self {
        Self {
            document_id,
            process_name: process_name.into(),
            current_step,
            total_steps,
            condition: RunCondition::Running,
        }
    }

    /// Same run in another condition
    #[must_use]
    pub fn with_condition(mut self, condition: RunCondition) -> Self {
        self.condition = condition;
        self
    }

    fn tick(&mut self) -> bool {
        if self.condition != RunCondition::Running {
            return false;
        }
        if self.current_step >= self.total_steps {
            self.condition = RunCondition::Completed;
        } else {
            self.current_step += 1;
        }
        true
    }
}

/// Board of monitored runs; clones share the same rows
#[derive(Debug, Clone, Default)]
pub struct MonitorBoard {
    runs: Arc<Mutex<Vec<MonitoredRun>>>,
}

impl MonitorBoard {
    /// Board over the given rows
    #[must_use]
    pub fn new(runs: Vec<MonitoredRun>) -> Self {
        Self {
            runs: Arc::new(Mutex::new(runs)),
        }
    }

    /// Copy every on-approval document of `store` onto a new board
    #[must_use]
    pub fn from_store(store: &DocumentStore) -> Self {
        let runs = store
            .list()
            .into_iter()
            .filter_map(|doc| {
                let info = doc.process_info()?;
                Some(MonitoredRun::running(
                    doc.id.clone(),
                    info.process_name(),
                    info.current_step(),
                    info.total_steps(),
                ))
            })
            .collect();
        Self::new(runs)
    }

    /// Add a row
    pub fn track(&self, run: MonitoredRun) {
        self.runs.lock().push(run);
    }

    /// Rows as of now
    #[must_use]
    pub fn snapshot(&self) -> Vec<MonitoredRun> {
        self.runs.lock().clone()
    }

    /// Move every running row one step; returns how many rows changed
    pub fn tick(&self) -> usize {
        self.runs
            .lock()
            .iter_mut()
            .map(MonitoredRun::tick)
            .filter(|changed| *changed)
            .count()
    }

    /// Tick every `period` on a background task until the handle is shut
    /// down or dropped
    #[must_use]
    pub fn spawn(&self, period: Duration) -> MonitorHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let board = self.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick fires immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let changed = board.tick();
                        tracing::debug!(changed, "monitor tick");
                    }
                    _ = stop_rx.changed() => {
                        tracing::debug!("monitor stopped");
                        break;
                    }
                }
            }
        });

        MonitorHandle {
            stop: stop_tx,
            task: Some(task),
        }
    }
}

/// Running ticker; aborted on drop
#[derive(Debug)]
pub struct MonitorHandle {
    stop: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Stop ticking and wait for the task to end
    pub async fn shutdown(mut self) {
        let _ = self.stop.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
