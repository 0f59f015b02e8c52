use super::{ImageSource, ReplyOutcome, ReplyRequest, ReplyStyle, UsageStatus};
use crate::domain::usage::{Tier, UsageCounters};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request for POST /api/replies
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateReplyRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_base64: Option<String>,
    pub style: ReplyStyle,
    /// Set by the client once the rewarded ad finished playing
    #[serde(default)]
    pub ad_watched: bool,
}

impl CreateReplyRequest {
    pub fn into_request(self) -> Result<ReplyRequest, String> {
        let image = match (self.image_url, self.image_base64) {
            (Some(_), Some(_)) => {
                return Err("Send either image_url or image_base64, not both".to_string())
            }
            (Some(url), None) => Some(ImageSource::Url(url)),
            (None, Some(data)) => Some(ImageSource::Base64(data)),
            (None, None) => None,
        };

        Ok(ReplyRequest {
            text: self.text.filter(|t| !t.trim().is_empty()),
            image,
            style: self.style,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub tier: Tier,
    pub daily_replies: u32,
    pub ad_free_replies: u32,
    pub ad_replies: u32,
    pub total_actions: u32,
    pub remaining: u32,
}

impl UsageSnapshot {
    fn new(tier: Tier, counters: &UsageCounters, remaining: u32) -> Self {
        Self {
            tier,
            daily_replies: counters.daily_replies,
            ad_free_replies: counters.ad_free_replies,
            ad_replies: counters.ad_replies,
            total_actions: counters.total_actions,
            remaining,
        }
    }
}

/// Response for POST /api/replies
#[derive(Debug, Serialize, Deserialize)]
pub struct ReplyResponse {
    pub reply: String,
    pub style: ReplyStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_id: Option<Uuid>,
    pub usage: UsageSnapshot,
    pub show_interstitial: bool,
}

impl From<ReplyOutcome> for ReplyResponse {
    fn from(outcome: ReplyOutcome) -> Self {
        Self {
            usage: UsageSnapshot::new(outcome.tier, &outcome.counters, outcome.remaining),
            reply: outcome.reply,
            style: outcome.style,
            history_id: outcome.history_entry.map(|entry| entry.id),
            show_interstitial: outcome.interstitial_requested,
        }
    }
}

/// Response for GET /api/usage
#[derive(Debug, Serialize, Deserialize)]
pub struct UsageResponse {
    pub usage: UsageSnapshot,
    pub daily_limit: u32,
    pub ad_free_limit: u32,
    pub can_use: bool,
    pub needs_ad: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// First day of the next window, in the server's local calendar
    pub resets_on: NaiveDate,
}

impl From<UsageStatus> for UsageResponse {
    fn from(status: UsageStatus) -> Self {
        Self {
            usage: UsageSnapshot::new(status.tier, &status.counters, status.remaining),
            daily_limit: status.daily_limit,
            ad_free_limit: status.ad_free_limit,
            can_use: status.decision.can_use,
            needs_ad: status.decision.needs_ad,
            reason: status.decision.reason,
            resets_on: status
                .counters
                .last_reset_date
                .succ_opt()
                .unwrap_or(status.counters.last_reset_date),
        }
    }
}
