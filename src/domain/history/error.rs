use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("dependency error: {0}")]
    Dependency(String),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("history entry not found")]
    NotFound,
    #[error("{0} identities are not handled by this store")]
    WrongIdentity(&'static str),
}

impl From<HistoryError> for AppError {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::Invalid(msg) => AppError::BadRequest(msg),
            HistoryError::NotFound => AppError::NotFound("History entry not found".to_string()),
            HistoryError::Dependency(msg) => AppError::Internal(msg),
            HistoryError::WrongIdentity(kind) => {
                AppError::Internal(format!("history store misrouted a {} identity", kind))
            }
        }
    }
}
