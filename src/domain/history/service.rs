use super::{HistoryEntry, HistoryError, HistoryPage, HistoryRecorder, NewHistoryEntry};
use crate::domain::quota::QuotaIdentity;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

/// Validates paging and routes history calls to the guest or account backend
pub struct HistoryService {
    guest_history: Arc<dyn HistoryRecorder>,
    account_history: Arc<dyn HistoryRecorder>,
}

impl HistoryService {
    pub fn new(
        guest_history: Arc<dyn HistoryRecorder>,
        account_history: Arc<dyn HistoryRecorder>,
    ) -> Self {
        Self {
            guest_history,
            account_history,
        }
    }

    fn backend_for(&self, identity: &QuotaIdentity) -> &dyn HistoryRecorder {
        match identity {
            QuotaIdentity::Account(_) => self.account_history.as_ref(),
            QuotaIdentity::Guest(_) => self.guest_history.as_ref(),
        }
    }
}

#[async_trait]
impl HistoryRecorder for HistoryService {
    async fn save(
        &self,
        identity: &QuotaIdentity,
        entry: NewHistoryEntry,
    ) -> Result<HistoryEntry, HistoryError> {
        if entry.response.trim().is_empty() {
            return Err(HistoryError::Invalid(
                "History entries need a non-empty response".to_string(),
            ));
        }
        self.backend_for(identity).save(identity, entry).await
    }

    async fn list(
        &self,
        identity: &QuotaIdentity,
        page: u32,
        page_size: u32,
    ) -> Result<HistoryPage, HistoryError> {
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(HistoryError::Invalid(format!(
                "page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        tracing::debug!(identity = %identity, page, page_size, "Listing reply history");

        self.backend_for(identity)
            .list(identity, page, page_size)
            .await
    }

    async fn delete(&self, identity: &QuotaIdentity, entry_id: Uuid) -> Result<(), HistoryError> {
        self.backend_for(identity).delete(identity, entry_id).await?;
        tracing::info!(identity = %identity, entry_id = %entry_id, "History entry deleted");
        Ok(())
    }
}
