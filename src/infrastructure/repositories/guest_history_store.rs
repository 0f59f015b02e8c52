use crate::domain::history::{
    HistoryEntry, HistoryError, HistoryPage, HistoryRecorder, NewHistoryEntry,
};
use crate::domain::quota::{GuestId, QuotaIdentity};
use crate::domain::reply::ReplyStyle;
use crate::infrastructure::storage::KeyValueStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const GUEST_HISTORY_CAP: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GuestHistoryRecord {
    id: Uuid,
    response: String,
    original_text: String,
    response_type: ReplyStyle,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_uri: Option<String>,
}

impl From<GuestHistoryRecord> for HistoryEntry {
    fn from(record: GuestHistoryRecord) -> Self {
        HistoryEntry {
            id: record.id,
            response: record.response,
            original_text: record.original_text,
            response_type: record.response_type,
            created_at: record.created_at,
            image_ref: record.image_uri,
        }
    }
}

fn history_key(guest: &GuestId) -> String {
    format!("guest:{}:history", guest.as_str())
}

/// Newest-first list of a guest's last replies, capped at [`GUEST_HISTORY_CAP`]
pub struct GuestHistoryStore {
    storage: Arc<dyn KeyValueStore>,
    write_lock: Mutex<()>,
}

impl GuestHistoryStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    fn guest_id(identity: &QuotaIdentity) -> Result<&GuestId, HistoryError> {
        match identity {
            QuotaIdentity::Guest(id) => Ok(id),
            QuotaIdentity::Account(_) => Err(HistoryError::WrongIdentity(identity.kind())),
        }
    }

    async fn read(&self, guest: &GuestId) -> Vec<GuestHistoryRecord> {
        let raw = match self.storage.get(&history_key(guest)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(guest_id = %guest, error = %e, "Failed to read guest history");
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(guest_id = %guest, error = %e, "Guest history is corrupt, ignoring it");
            Vec::new()
        })
    }

    async fn write(
        &self,
        guest: &GuestId,
        records: &[GuestHistoryRecord],
    ) -> Result<(), HistoryError> {
        let json = serde_json::to_string(records)
            .map_err(|e| HistoryError::Dependency(e.to_string()))?;
        self.storage
            .set(&history_key(guest), json)
            .await
            .map_err(|e| HistoryError::Dependency(e.to_string()))
    }
}

#[async_trait]
impl HistoryRecorder for GuestHistoryStore {
    async fn save(
        &self,
        identity: &QuotaIdentity,
        entry: NewHistoryEntry,
    ) -> Result<HistoryEntry, HistoryError> {
        let guest = Self::guest_id(identity)?;
        let _guard = self.write_lock.lock().await;

        let record = GuestHistoryRecord {
            id: Uuid::new_v4(),
            response: entry.response,
            original_text: entry.original_text,
            response_type: entry.response_type,
            created_at: Utc::now(),
            image_uri: entry.image_ref,
        };

        let mut records = self.read(guest).await;
        records.insert(0, record.clone());
        records.truncate(GUEST_HISTORY_CAP);
        self.write(guest, &records).await?;

        Ok(record.into())
    }

    async fn list(
        &self,
        identity: &QuotaIdentity,
        page: u32,
        _page_size: u32,
    ) -> Result<HistoryPage, HistoryError> {
        let guest = Self::guest_id(identity)?;
        if page > 0 {
            return Ok(HistoryPage::empty());
        }

        Ok(HistoryPage {
            entries: self.read(guest).await.into_iter().map(Into::into).collect(),
            has_more: false,
        })
    }

    async fn delete(&self, identity: &QuotaIdentity, entry_id: Uuid) -> Result<(), HistoryError> {
        let guest = Self::guest_id(identity)?;
        let _guard = self.write_lock.lock().await;

        let mut records = self.read(guest).await;
        let before = records.len();
        records.retain(|record| record.id != entry_id);
        if records.len() == before {
            return Err(HistoryError::NotFound);
        }

        self.write(guest, &records).await
    }
}
