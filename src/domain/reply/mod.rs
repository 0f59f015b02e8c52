pub mod dto;
pub mod error;
pub mod service;
pub mod session;

pub use dto::{CreateReplyRequest, ReplyResponse, UsageResponse};
pub use error::{ExtractionError, GenerationError, ReplyError};
pub use service::{PendingCommit, ReplyOutcome, ReplySessionApi, ReplySessionService, UsageStatus};
pub use session::SessionPhase;

use crate::domain::quota::QuotaStoreError;
use crate::domain::usage::Tier;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tone of the generated reply; stored as `response_type` in history
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "text")]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReplyStyle {
    Flirty,
    Witty,
    Savage,
}

impl std::fmt::Display for ReplyStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplyStyle::Flirty => write!(f, "flirty"),
            ReplyStyle::Witty => write!(f, "witty"),
            ReplyStyle::Savage => write!(f, "savage"),
        }
    }
}

/// Chat screenshot handed to the text extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Url(String),
    Base64(String),
}

impl ImageSource {
    /// Reference worth keeping in history; inline image data is not kept
    pub fn reference(&self) -> Option<&str> {
        match self {
            ImageSource::Url(url) => Some(url),
            ImageSource::Base64(_) => None,
        }
    }
}

/// One "give me a reply" action from the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRequest {
    pub text: Option<String>,
    pub image: Option<ImageSource>,
    pub style: ReplyStyle,
}

#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate_reply(
        &self,
        text: &str,
        style: ReplyStyle,
    ) -> Result<String, GenerationError>;
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, image: &ImageSource) -> Result<String, ExtractionError>;
}

/// Ad surface of the calling client, scoped to one request
#[async_trait]
pub trait AdPresenter: Send + Sync {
    /// True when the rewarded ad was watched to completion
    async fn show_rewarded_ad(&self) -> bool;

    /// Best-effort; must return without waiting on the ad
    fn show_interstitial_ad(&self);
}

#[async_trait]
pub trait TierResolver: Send + Sync {
    async fn tier_for(&self, user_id: Uuid) -> Result<Tier, QuotaStoreError>;
}
