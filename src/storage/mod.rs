//! SQLite repository for tasks, frequencies, windows, and executions.

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context as _, Result};
use chrono::NaiveDateTime;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::model::{
    Cadence, Execution, ExecutionWindow, Frequency, Task, TaskDetail, WindowCandidate,
    WindowStatus,
};

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// Open (or create) `{data_dir}/taskmaster.db` and run migrations.
    pub async fn new(data_dir: &Path) -> Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let db_path = data_dir.join("taskmaster.db");
        let opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .foreign_keys(true)
                .create_if_missing(true);

        let pool = SqlitePool::connect_with(opts).await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    /// In-memory database for tests. Capped at one connection — each new
    /// `:memory:` connection would otherwise be a fresh, empty database.
    pub async fn in_memory() -> Result<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    async fn migrate(pool: &SqlitePool) -> Result<()> {
        sqlx::migrate!("src/storage/migrations")
            .run(pool)
            .await
            .context("failed to run database migrations")?;
        Ok(())
    }

    // ─── Tasks ────────────────────────────────────────────────────────────

    /// Insert a task together with its default daily frequency, atomically.
    pub async fn create_task(&self, name: &str) -> sqlx::Result<Task> {
        let now = chrono::Utc::now().naive_utc();
        let mut tx = self.pool.begin().await?;
        let task_id = sqlx::query("INSERT INTO tasks (name, created_at) VALUES (?, ?)")
            .bind(name)
            .bind(now)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();
        sqlx::query("INSERT INTO frequencies (task_id, kind) VALUES (?, 'daily')")
            .bind(task_id)
            .execute(&mut *tx)
            .await?;
        let task = sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(task_id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(task)
    }

    pub async fn task(&self, id: i64) -> sqlx::Result<Option<Task>> {
        sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn list_tasks(&self) -> sqlx::Result<Vec<Task>> {
        sqlx::query_as("SELECT * FROM tasks ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await
    }

    /// Eager-load a task with its frequency, windows, and executions.
    pub async fn task_detail(&self, id: i64) -> sqlx::Result<Option<TaskDetail>> {
        let Some(task) = self.task(id).await? else {
            return Ok(None);
        };
        let frequency = self.frequency(id).await?;
        let windows = sqlx::query_as(
            "SELECT * FROM execution_windows WHERE task_id = ? ORDER BY start ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        let executions = self.executions(id).await?;
        Ok(Some(TaskDetail {
            task,
            frequency,
            windows,
            executions,
        }))
    }

    // ─── Frequencies ──────────────────────────────────────────────────────

    pub async fn frequency(&self, task_id: i64) -> sqlx::Result<Option<Frequency>> {
        sqlx::query_as("SELECT * FROM frequencies WHERE task_id = ?")
            .bind(task_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Delete the task's existing frequency (if any) and insert `cadence` as
    /// a brand-new row, in one transaction. The `kind` discriminant is never
    /// updated in place.
    pub async fn replace_frequency(
        &self,
        task_id: i64,
        cadence: Cadence,
    ) -> sqlx::Result<Frequency> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM frequencies WHERE task_id = ?")
            .bind(task_id)
            .execute(&mut *tx)
            .await?;
        let id = sqlx::query("INSERT INTO frequencies (task_id, kind, day_of_week) VALUES (?, ?, ?)")
            .bind(task_id)
            .bind(cadence.kind())
            .bind(cadence.day_of_week())
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();
        let frequency = sqlx::query_as("SELECT * FROM frequencies WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(frequency)
    }

    // ─── Execution windows ────────────────────────────────────────────────

    pub async fn open_windows(&self, task_id: i64) -> sqlx::Result<Vec<ExecutionWindow>> {
        sqlx::query_as(
            "SELECT * FROM execution_windows WHERE task_id = ? AND status = ? ORDER BY start ASC",
        )
        .bind(task_id)
        .bind(WindowStatus::Open)
        .fetch_all(&self.pool)
        .await
    }

    /// Open windows whose interval contains `at`, inclusive on both bounds,
    /// earliest `start` first.
    pub async fn windows_containing(
        &self,
        task_id: i64,
        at: NaiveDateTime,
    ) -> sqlx::Result<Vec<ExecutionWindow>> {
        sqlx::query_as(
            "SELECT * FROM execution_windows \
             WHERE task_id = ? AND status = ? AND start <= ? AND \"end\" >= ? \
             ORDER BY start ASC",
        )
        .bind(task_id)
        .bind(WindowStatus::Open)
        .bind(at)
        .bind(at)
        .fetch_all(&self.pool)
        .await
    }

    /// Persist a candidate window with status `Open`.
    pub async fn save_window(&self, candidate: &WindowCandidate) -> sqlx::Result<ExecutionWindow> {
        let id = sqlx::query(
            "INSERT INTO execution_windows (task_id, start, \"end\", status) VALUES (?, ?, ?, ?)",
        )
        .bind(candidate.task_id)
        .bind(candidate.start)
        .bind(candidate.end)
        .bind(WindowStatus::Open)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();
        self.window(id).await
    }

    pub async fn window(&self, id: i64) -> sqlx::Result<ExecutionWindow> {
        sqlx::query_as("SELECT * FROM execution_windows WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn update_window_status(
        &self,
        id: i64,
        status: WindowStatus,
    ) -> sqlx::Result<()> {
        sqlx::query("UPDATE execution_windows SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Conditionally transition a window out of `Open`. Returns the updated
    /// row, or `None` when the window does not exist or is already terminal.
    pub async fn close_open_window(
        &self,
        id: i64,
        status: WindowStatus,
    ) -> sqlx::Result<Option<ExecutionWindow>> {
        let rows_affected =
            sqlx::query("UPDATE execution_windows SET status = ? WHERE id = ? AND status = ?")
                .bind(status)
                .bind(id)
                .bind(WindowStatus::Open)
                .execute(&self.pool)
                .await?
                .rows_affected();
        if rows_affected == 0 {
            return Ok(None);
        }
        self.window(id).await.map(Some)
    }

    // ─── Executions ───────────────────────────────────────────────────────

    /// Insert an execution and, when `hit_window_id` is set, flip that window
    /// to `Hit` — both in a single transaction so a partial write cannot
    /// leave the window updated without its execution (or vice versa).
    pub async fn commit_execution(
        &self,
        task_id: i64,
        executed_at: NaiveDateTime,
        hit_window_id: Option<i64>,
    ) -> sqlx::Result<Execution> {
        let mut tx = self.pool.begin().await?;
        if let Some(window_id) = hit_window_id {
            sqlx::query("UPDATE execution_windows SET status = ? WHERE id = ?")
                .bind(WindowStatus::Hit)
                .bind(window_id)
                .execute(&mut *tx)
                .await?;
        }
        let id = sqlx::query(
            "INSERT INTO executions (task_id, executed_at, execution_window_id) VALUES (?, ?, ?)",
        )
        .bind(task_id)
        .bind(executed_at)
        .bind(hit_window_id)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();
        let execution = sqlx::query_as("SELECT * FROM executions WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(execution)
    }

    pub async fn executions(&self, task_id: i64) -> sqlx::Result<Vec<Execution>> {
        sqlx::query_as("SELECT * FROM executions WHERE task_id = ? ORDER BY executed_at ASC")
            .bind(task_id)
            .fetch_all(&self.pool)
            .await
    }
}
