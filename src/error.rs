use thiserror::Error;

/// Failures raised by a store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    /// A referenced catalog row vanished between check and write.
    #[error("missing referenced row")]
    MissingReference,
    /// A uniqueness race the store could not absorb.
    #[error("conflicting write: {0}")]
    Conflict(String),
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },
    /// Retryable; every write behind it is idempotent.
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Store(StoreError),
}

impl CoreError {
    pub fn course(id: i64) -> Self {
        CoreError::NotFound { kind: "course", id }
    }

    pub fn module(id: i64) -> Self {
        CoreError::NotFound { kind: "module", id }
    }

    /// Lifts a store failure, attributing a vanished reference to `missing`.
    pub fn from_store(e: StoreError, missing: CoreError) -> Self {
        match e {
            StoreError::MissingReference => missing,
            StoreError::Conflict(msg) => CoreError::Conflict(msg),
            other => CoreError::Store(other),
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(msg) => CoreError::Conflict(msg),
            other => CoreError::Store(other),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
