use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    domain::reply::{ReplySessionApi, ReplySessionService, UsageResponse},
    error::AppResult,
    infrastructure::auth::Caller,
};

pub struct UsageController {
    reply_service: Arc<ReplySessionService>,
}

impl UsageController {
    pub fn new(reply_service: Arc<ReplySessionService>) -> Self {
        Self { reply_service }
    }

    /// GET /api/usage - Today's counters and whether the next reply needs an ad
    pub async fn get_usage(
        State(controller): State<Arc<UsageController>>,
        Extension(caller): Extension<Caller>,
    ) -> AppResult<Json<UsageResponse>> {
        let status = controller
            .reply_service
            .usage_status(&caller.identity)
            .await?;
        Ok(Json(status.into()))
    }
}
