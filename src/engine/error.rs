use thiserror::Error;

/// Errors surfaced by engine operations. All are local to a single
/// operation; the engine never retries or recovers silently.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("task not found: {0}")]
    TaskNotFound(i64),

    #[error("no frequency configured for task {0}")]
    FrequencyNotFound(i64),

    #[error("no window rule for '{0}' frequency")]
    UnsupportedFrequency(&'static str),

    #[error("window {0} not found or not open")]
    WindowNotOpen(i64),

    #[error(transparent)]
    Storage(#[from] sqlx::Error),
}
