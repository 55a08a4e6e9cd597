//! Taskmaster data model types.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub created_at: NaiveDateTime,
}

/// Cadence variants a task's frequency can take.
///
/// Closed set: switching a task between variants is delete-then-insert at
/// the storage layer, never an in-place update of the discriminant.
/// `Weekly.day_of_week` (1–7, Monday=1) is stored but no window-generation
/// rule consumes it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Cadence {
    Daily,
    Weekly { day_of_week: i64 },
}

impl Cadence {
    pub fn kind(&self) -> &'static str {
        match self {
            Cadence::Daily => "daily",
            Cadence::Weekly { .. } => "weekly",
        }
    }

    pub fn day_of_week(&self) -> Option<i64> {
        match self {
            Cadence::Daily => None,
            Cadence::Weekly { day_of_week } => Some(*day_of_week),
        }
    }
}

/// A task's configured frequency. At most one row per task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frequency {
    pub id: i64,
    pub task_id: i64,
    #[serde(flatten)]
    pub cadence: Cadence,
}

impl FromRow<'_, SqliteRow> for Frequency {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let kind: String = row.try_get("kind")?;
        let cadence = match kind.as_str() {
            "daily" => Cadence::Daily,
            "weekly" => Cadence::Weekly {
                day_of_week: row.try_get::<Option<i64>, _>("day_of_week")?.unwrap_or(1),
            },
            other => {
                return Err(sqlx::Error::ColumnDecode {
                    index: "kind".into(),
                    source: format!("unknown frequency kind '{other}'").into(),
                })
            }
        };
        Ok(Self {
            id: row.try_get("id")?,
            task_id: row.try_get("task_id")?,
            cadence,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WindowStatus {
    Open,
    Hit,
    Skipped,
    Missed,
}

impl WindowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowStatus::Open => "open",
            WindowStatus::Hit => "hit",
            WindowStatus::Skipped => "skipped",
            WindowStatus::Missed => "missed",
        }
    }
}

impl fmt::Display for WindowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A half-open interval `[start, end)` during which an execution is expected.
///
/// Only `Open` windows participate in overlap checks and reconciliation;
/// `Hit`/`Skipped`/`Missed` are terminal.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExecutionWindow {
    pub id: i64,
    pub task_id: i64,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub status: WindowStatus,
}

/// A proposed window that has not been persisted yet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WindowCandidate {
    pub task_id: i64,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Append-only record that a task was performed. `execution_window_id` is
/// set when the execution satisfied an open window, NULL otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Execution {
    pub id: i64,
    pub task_id: i64,
    pub executed_at: NaiveDateTime,
    pub execution_window_id: Option<i64>,
}

/// Eager-loaded view of a task for presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDetail {
    pub task: Task,
    pub frequency: Option<Frequency>,
    pub windows: Vec<ExecutionWindow>,
    pub executions: Vec<Execution>,
}
