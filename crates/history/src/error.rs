use thiserror::Error;

pub type Result<T> = std::result::Result<T, HistoryError>;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Store error: {0}")]
    StoreError(#[from] ctc_store::StoreError),

    #[error("Invalid identity {0:?}: expected an email address")]
    InvalidIdentity(String),

    #[error("Unknown lookup kind {0:?} (expected vin, entity, trucrs or owner)")]
    UnknownKind(String),

    #[error("Unknown sort mode {0:?} (expected newest, oldest or value)")]
    UnknownSortMode(String),

    #[error("Unknown theme {0:?} (expected light or dark)")]
    UnknownTheme(String),

    #[error("Unknown bucket policy {0:?} (expected per_user or global)")]
    UnknownBucketPolicy(String),
}
