use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    domain::reply::{
        CreateReplyRequest, ReplyError, ReplyResponse, ReplySessionApi, ReplySessionService,
    },
    error::{AppError, AppResult},
    infrastructure::{ads::ClientAdReceipt, auth::Caller},
};

pub struct ReplyController {
    reply_service: Arc<ReplySessionService>,
    commit_retry_attempts: u32,
}

impl ReplyController {
    pub fn new(reply_service: Arc<ReplySessionService>, commit_retry_attempts: u32) -> Self {
        Self {
            reply_service,
            commit_retry_attempts,
        }
    }

    /// POST /api/replies - Run one metered reply attempt
    pub async fn create_reply(
        State(controller): State<Arc<ReplyController>>,
        Extension(caller): Extension<Caller>,
        Json(body): Json<CreateReplyRequest>,
    ) -> AppResult<Json<ReplyResponse>> {
        let ads = ClientAdReceipt::new(body.ad_watched);
        let request = body.into_request().map_err(AppError::BadRequest)?;

        let mut result = controller
            .reply_service
            .request_reply(&caller.identity, request, &ads)
            .await;

        // Only the commit is retried; the reply is never generated twice
        let mut attempt = 0;
        let outcome = loop {
            match result {
                Err(ReplyError::QuotaCommit { pending, message })
                    if attempt < controller.commit_retry_attempts =>
                {
                    attempt += 1;
                    tracing::warn!(attempt, error = %message, "Usage commit failed, retrying");
                    result = controller.reply_service.retry_commit(*pending, &ads).await;
                }
                other => break other,
            }
        }?;

        Ok(Json(outcome.into()))
    }
}
