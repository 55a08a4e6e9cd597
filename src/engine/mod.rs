//! Execution-window scheduling engine.
//!
//! Three pieces: the frequency [`policy`] (derive the next window from a
//! cadence), the [`overlap`] detector (compare a candidate against open
//! windows), and the [`Engine`] reconciler, which matches reported
//! executions to open windows and transitions their status.

pub mod error;
pub mod overlap;
pub mod policy;

use chrono::NaiveDateTime;
use tracing::{debug, info};

pub use error::EngineError;

use crate::model::{
    Cadence, Execution, ExecutionWindow, Frequency, Task, TaskDetail, WindowCandidate,
    WindowStatus,
};
use crate::storage::Storage;

/// Outcome of a scheduling attempt: either the candidate was persisted, or
/// an already-open window overlaps it and covers the need.
#[derive(Debug, Clone)]
pub enum Scheduled {
    Created(ExecutionWindow),
    Overlapping(ExecutionWindow),
}

impl Scheduled {
    pub fn window(&self) -> &ExecutionWindow {
        match self {
            Scheduled::Created(w) | Scheduled::Overlapping(w) => w,
        }
    }
}

/// Stateless front door to the scheduling core. Holds an injected storage
/// handle; every operation is a single command-scoped round of reads and
/// writes (no background work, no locking beyond SQLite transactions).
#[derive(Clone)]
pub struct Engine {
    storage: Storage,
}

impl Engine {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Create a task with the default daily frequency attached.
    pub async fn create_task(&self, name: &str) -> Result<Task, EngineError> {
        let task = self.storage.create_task(name).await?;
        info!(task_id = task.id, name = %task.name, "task created");
        Ok(task)
    }

    pub async fn list_tasks(&self) -> Result<Vec<Task>, EngineError> {
        Ok(self.storage.list_tasks().await?)
    }

    /// Eager-loaded task view (frequency, windows, executions).
    pub async fn task_detail(&self, task_id: i64) -> Result<TaskDetail, EngineError> {
        self.storage
            .task_detail(task_id)
            .await?
            .ok_or(EngineError::TaskNotFound(task_id))
    }

    /// Record that `task_id` was performed at `now` and reconcile against
    /// open windows.
    ///
    /// An open window "contains" `now` when `start <= now <= end` — inclusive
    /// on both bounds, deliberately wider than the strict half-open overlap
    /// test, since a single instant is compared rather than an interval. At
    /// most one containing window is expected (the overlap detector preserves
    /// that invariant); if storage holds several anyway, the earliest `start`
    /// wins. The window transition and the execution insert commit as one
    /// transaction.
    pub async fn record_execution(
        &self,
        task_id: i64,
        now: NaiveDateTime,
    ) -> Result<Execution, EngineError> {
        self.require_task(task_id).await?;

        let containing = self.storage.windows_containing(task_id, now).await?;
        let hit = containing.first();

        let execution = self
            .storage
            .commit_execution(task_id, now, hit.map(|w| w.id))
            .await?;

        match hit {
            Some(w) => info!(
                task_id,
                window_id = w.id,
                executed_at = %now,
                "execution recorded, window hit"
            ),
            None => info!(task_id, executed_at = %now, "execution recorded outside any window"),
        }
        Ok(execution)
    }

    /// Derive the next execution window from the task's configured frequency.
    ///
    /// The candidate is not persisted; pass it to [`Engine::schedule_window`].
    pub async fn generate_next_window(
        &self,
        task_id: i64,
        from: NaiveDateTime,
    ) -> Result<WindowCandidate, EngineError> {
        self.require_task(task_id).await?;
        let frequency = self
            .storage
            .frequency(task_id)
            .await?
            .ok_or(EngineError::FrequencyNotFound(task_id))?;
        let (start, end) = policy::next_window(&frequency.cadence, from)?;
        Ok(WindowCandidate {
            task_id,
            start,
            end,
        })
    }

    /// Read-only overlap probe: first open window intersecting `candidate`,
    /// if any.
    pub async fn check_overlap(
        &self,
        candidate: &WindowCandidate,
    ) -> Result<Option<ExecutionWindow>, EngineError> {
        let open = self.storage.open_windows(candidate.task_id).await?;
        Ok(overlap::find_overlap(&open, candidate).cloned())
    }

    /// Persist `candidate` as an `Open` window unless an existing open window
    /// already overlaps it, in which case the existing window is returned
    /// unmodified and nothing is written.
    pub async fn schedule_window(
        &self,
        candidate: WindowCandidate,
    ) -> Result<Scheduled, EngineError> {
        if let Some(existing) = self.check_overlap(&candidate).await? {
            debug!(
                task_id = candidate.task_id,
                window_id = existing.id,
                "candidate overlaps an open window, not persisting"
            );
            return Ok(Scheduled::Overlapping(existing));
        }
        let window = self.storage.save_window(&candidate).await?;
        info!(
            task_id = window.task_id,
            window_id = window.id,
            start = %window.start,
            end = %window.end,
            "execution window scheduled"
        );
        Ok(Scheduled::Created(window))
    }

    /// Generate the next window from the task's frequency and schedule it.
    pub async fn schedule_next_window(
        &self,
        task_id: i64,
        from: NaiveDateTime,
    ) -> Result<Scheduled, EngineError> {
        let candidate = self.generate_next_window(task_id, from).await?;
        self.schedule_window(candidate).await
    }

    /// Replace the task's frequency with `cadence`.
    ///
    /// The cadence is a closed polymorphic type, so a variant change deletes
    /// the old row and inserts a fresh one; both steps run in one transaction.
    pub async fn replace_frequency(
        &self,
        task_id: i64,
        cadence: Cadence,
    ) -> Result<Frequency, EngineError> {
        self.require_task(task_id).await?;
        let frequency = self.storage.replace_frequency(task_id, cadence).await?;
        info!(task_id, kind = frequency.cadence.kind(), "frequency replaced");
        Ok(frequency)
    }

    /// Transition an `Open` window to a terminal state without an execution
    /// (manual skip/miss bookkeeping). Terminal windows never reopen, so the
    /// update only applies while the window is still open.
    pub async fn close_window(
        &self,
        window_id: i64,
        status: WindowStatus,
    ) -> Result<ExecutionWindow, EngineError> {
        self.storage
            .close_open_window(window_id, status)
            .await?
            .ok_or(EngineError::WindowNotOpen(window_id))
    }

    async fn require_task(&self, task_id: i64) -> Result<Task, EngineError> {
        self.storage
            .task(task_id)
            .await?
            .ok_or(EngineError::TaskNotFound(task_id))
    }
}
