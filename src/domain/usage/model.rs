use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily usage counters for one account or one guest device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageCounters {
    pub daily_replies: u32,
    pub ad_free_replies: u32,
    pub ad_replies: u32,
    pub total_actions: u32,
    pub last_reset_date: NaiveDate,
}

impl UsageCounters {
    /// Zeroed counters for a window starting on `today`
    pub fn fresh(today: NaiveDate) -> Self {
        Self {
            daily_replies: 0,
            ad_free_replies: 0,
            ad_replies: 0,
            total_actions: 0,
            last_reset_date: today,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "text")]
#[sqlx(rename_all = "lowercase")]
pub enum Tier {
    #[serde(rename = "free")]
    Free,
    #[serde(rename = "premium")]
    Premium,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Free => write!(f, "free"),
            Tier::Premium => write!(f, "premium"),
        }
    }
}

/// Outcome of evaluating a request against the current counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageDecision {
    pub can_use: bool,
    pub needs_ad: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl UsageDecision {
    pub fn allowed() -> Self {
        Self {
            can_use: true,
            needs_ad: false,
            reason: None,
        }
    }

    pub fn ad_gated() -> Self {
        Self {
            can_use: true,
            needs_ad: true,
            reason: None,
        }
    }

    pub fn blocked(reason: String) -> Self {
        Self {
            can_use: false,
            needs_ad: false,
            reason: Some(reason),
        }
    }
}
