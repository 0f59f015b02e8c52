pub mod dto;
pub mod error;
pub mod service;

pub use dto::{HistoryPageResponse, HistoryQuery};
pub use error::HistoryError;
pub use service::HistoryService;

use crate::domain::quota::QuotaIdentity;
use crate::domain::reply::ReplyStyle;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A generated reply as shown in the history screen.
///
/// Guest and account backends both convert into this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub response: String,
    pub original_text: String,
    pub response_type: ReplyStyle,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

/// Entry data before a backend assigns it an id and timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryEntry {
    pub response: String,
    pub original_text: String,
    pub response_type: ReplyStyle,
    pub image_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPage {
    pub entries: Vec<HistoryEntry>,
    pub has_more: bool,
}

impl HistoryPage {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            has_more: false,
        }
    }
}

/// Persistence of generated replies. Pages are zero-based and newest-first.
#[async_trait]
pub trait HistoryRecorder: Send + Sync {
    async fn save(
        &self,
        identity: &QuotaIdentity,
        entry: NewHistoryEntry,
    ) -> Result<HistoryEntry, HistoryError>;

    async fn list(
        &self,
        identity: &QuotaIdentity,
        page: u32,
        page_size: u32,
    ) -> Result<HistoryPage, HistoryError>;

    /// Remove one entry owned by `identity`; entries of other owners are `NotFound`
    async fn delete(&self, identity: &QuotaIdentity, entry_id: Uuid) -> Result<(), HistoryError>;
}
