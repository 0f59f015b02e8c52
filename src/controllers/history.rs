use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::history::{
        service::DEFAULT_PAGE_SIZE, HistoryPageResponse, HistoryQuery, HistoryRecorder,
        HistoryService,
    },
    error::AppResult,
    infrastructure::auth::Caller,
};

pub struct HistoryController {
    history_service: Arc<HistoryService>,
}

impl HistoryController {
    pub fn new(history_service: Arc<HistoryService>) -> Self {
        Self { history_service }
    }

    /// GET /api/history - Newest-first page of generated replies
    pub async fn list_history(
        State(controller): State<Arc<HistoryController>>,
        Extension(caller): Extension<Caller>,
        Query(query): Query<HistoryQuery>,
    ) -> AppResult<Json<HistoryPageResponse>> {
        let page = query.page.unwrap_or(0);
        let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE);

        let entries = controller
            .history_service
            .list(&caller.identity, page, page_size)
            .await?;
        Ok(Json(HistoryPageResponse::new(entries, page, page_size)))
    }

    /// DELETE /api/history/{entryId} - Delete one of the caller's entries
    pub async fn delete_entry(
        State(controller): State<Arc<HistoryController>>,
        Extension(caller): Extension<Caller>,
        Path(entry_id): Path<Uuid>,
    ) -> AppResult<StatusCode> {
        controller
            .history_service
            .delete(&caller.identity, entry_id)
            .await?;
        Ok(StatusCode::NO_CONTENT)
    }
}
