use thiserror::Error;

/// Failure kinds shared by the fetcher, store, and orchestrators.
///
/// Only [`SyncError::NotFound`] may drive deletion. A [`SyncError::Transient`]
/// failure leaves stored data untouched so the next pass can retry.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("remote document not found: {0}")]
    NotFound(String),
    #[error("transient failure fetching {target}: {reason}")]
    Transient { target: String, reason: String },
    #[error("link target '{0}' does not map to a known category")]
    MalformedReference(String),
    #[error("store failure: {0}")]
    StoreFailure(String),
}

impl SyncError {
    pub fn transient(target: impl Into<String>, reason: impl ToString) -> Self {
        SyncError::Transient {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    pub fn store(reason: impl ToString) -> Self {
        SyncError::StoreFailure(reason.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::NotFound(_))
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, SyncError::Transient { .. })
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
