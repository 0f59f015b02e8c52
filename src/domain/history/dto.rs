use super::{HistoryEntry, HistoryPage};
use serde::{Deserialize, Serialize};

/// Query for GET /api/history; pages are zero-based
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryPageResponse {
    pub entries: Vec<HistoryEntry>,
    pub page: u32,
    pub page_size: u32,
    pub has_more: bool,
}

impl HistoryPageResponse {
    pub fn new(page: HistoryPage, page_number: u32, page_size: u32) -> Self {
        Self {
            entries: page.entries,
            page: page_number,
            page_size,
            has_more: page.has_more,
        }
    }
}
