//! Error types for the gamification engine

/// Failure raised by a [`GamificationStore`](crate::store::GamificationStore)
/// implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store connection lock poisoned")]
    LockPoisoned,

    #[error("Corrupt row in {table}: {detail}")]
    Corrupt { table: &'static str, detail: String },
}

/// Terminal outcomes returned to the caller of an engine operation.
#[derive(Debug, thiserror::Error)]
pub enum GamificationError {
    #[error("Mission not found")]
    NotFound,

    #[error("Mission is not completed yet")]
    NotCompleted,

    #[error("Mission reward was already claimed")]
    AlreadyClaimed,

    #[error("Unknown mission template: {0}")]
    UnknownMission(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

pub type Result<T, E = GamificationError> = std::result::Result<T, E>;
