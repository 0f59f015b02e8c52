use super::service::PendingCommit;
use crate::domain::usage::Tier;
use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("the reply generator returned an empty reply")]
    Empty,
    #[error("the reply generator did not answer within {0} seconds")]
    Timeout(u64),
    #[error("upstream error: {0}")]
    Upstream(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("no text could be read from the image")]
    Empty,
    #[error("text extraction did not finish within {0} seconds")]
    Timeout(u64),
    #[error("upstream error: {0}")]
    Upstream(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ReplyError {
    #[error("{reason}")]
    QuotaBlocked {
        tier: Tier,
        used: u32,
        limit: u32,
        reason: String,
    },
    #[error("watch a rewarded ad to unlock this reply")]
    AdDeclined,
    #[error("reply generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error("text extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("reply generated but usage could not be recorded: {message}")]
    QuotaCommit {
        pending: Box<PendingCommit>,
        message: String,
    },
    #[error("usage unavailable: {0}")]
    QuotaUnavailable(String),
    #[error("invalid input: {0}")]
    Invalid(String),
}

impl From<ReplyError> for AppError {
    fn from(err: ReplyError) -> Self {
        match err {
            ReplyError::QuotaBlocked { tier, reason, .. } => match tier {
                Tier::Free => AppError::PaymentRequired(reason),
                Tier::Premium => AppError::RateLimitExceeded(reason),
            },
            ReplyError::AdDeclined => AppError::AdRequired(err.to_string()),
            ReplyError::Generation(_) | ReplyError::Extraction(_) => {
                AppError::Upstream(err.to_string())
            }
            ReplyError::QuotaCommit { message, .. } => AppError::QuotaCommit(message),
            ReplyError::QuotaUnavailable(msg) => AppError::Internal(msg),
            ReplyError::Invalid(msg) => AppError::BadRequest(msg),
        }
    }
}
