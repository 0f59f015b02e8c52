use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum QuotaStoreError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("daily limit reached while committing")]
    LimitReached,
    #[error("account not found")]
    AccountNotFound,
    #[error("{0} identities are not handled by this store")]
    WrongIdentity(&'static str),
}

impl From<AppError> for QuotaStoreError {
    fn from(err: AppError) -> Self {
        QuotaStoreError::Storage(err.to_string())
    }
}
