use super::error::{ExtractionError, GenerationError, ReplyError};
use super::session::{PhaseTracker, SessionPhase};
use super::{
    AdPresenter, ImageSource, ReplyGenerator, ReplyRequest, ReplyStyle, TextExtractor, TierResolver,
};
use crate::domain::history::{HistoryEntry, HistoryRecorder, NewHistoryEntry};
use crate::domain::quota::{QuotaCommit, QuotaIdentity, QuotaStore, QuotaStoreError};
use crate::domain::usage::{DateProvider, Tier, UsageCounters, UsageDecision, UsagePolicy};
use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

/// Free-tier users see an interstitial after every Nth metered action
const INTERSTITIAL_EVERY: u32 = 5;
const MAX_INPUT_CHARS: usize = 4000;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// A generated reply whose usage commit has not been persisted yet
#[derive(Debug, Clone)]
pub struct PendingCommit {
    pub identity: QuotaIdentity,
    pub tier: Tier,
    pub commit: QuotaCommit,
    pub reply: String,
    pub original_text: String,
    pub style: ReplyStyle,
    pub image_ref: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReplyOutcome {
    pub reply: String,
    pub style: ReplyStyle,
    pub tier: Tier,
    pub counters: UsageCounters,
    pub remaining: u32,
    pub history_entry: Option<HistoryEntry>,
    pub interstitial_requested: bool,
}

/// Snapshot of a caller's quota, as shown before they ask for a reply
#[derive(Debug, Clone, Serialize)]
pub struct UsageStatus {
    pub tier: Tier,
    pub counters: UsageCounters,
    pub decision: UsageDecision,
    pub daily_limit: u32,
    pub ad_free_limit: u32,
    pub remaining: u32,
}

pub struct ReplySessionService {
    quota_store: Arc<dyn QuotaStore>,
    policy: UsagePolicy,
    history: Arc<dyn HistoryRecorder>,
    generator: Arc<dyn ReplyGenerator>,
    extractor: Arc<dyn TextExtractor>,
    tiers: Arc<dyn TierResolver>,
    clock: Arc<dyn DateProvider>,
    upstream_timeout: Duration,
}

impl ReplySessionService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        quota_store: Arc<dyn QuotaStore>,
        policy: UsagePolicy,
        history: Arc<dyn HistoryRecorder>,
        generator: Arc<dyn ReplyGenerator>,
        extractor: Arc<dyn TextExtractor>,
        tiers: Arc<dyn TierResolver>,
        clock: Arc<dyn DateProvider>,
        upstream_timeout: Duration,
    ) -> Self {
        Self {
            quota_store,
            policy,
            history,
            generator,
            extractor,
            tiers,
            clock,
            upstream_timeout,
        }
    }
}

#[async_trait]
pub trait ReplySessionApi: Send + Sync {
    /// Run one reply attempt for `identity`
    ///
    /// This operation:
    /// - Evaluates the caller's quota and shows a rewarded ad when required
    /// - Re-checks the quota after the ad, then extracts text and generates the reply
    /// - Commits usage only once a non-empty reply exists, then records history
    async fn request_reply(
        &self,
        identity: &QuotaIdentity,
        request: ReplyRequest,
        ads: &dyn AdPresenter,
    ) -> Result<ReplyOutcome, ReplyError>;

    /// Persist a commit that failed after generation, without generating again
    async fn retry_commit(
        &self,
        pending: PendingCommit,
        ads: &dyn AdPresenter,
    ) -> Result<ReplyOutcome, ReplyError>;

    async fn usage_status(&self, identity: &QuotaIdentity) -> Result<UsageStatus, ReplyError>;
}

#[async_trait]
impl ReplySessionApi for ReplySessionService {
    async fn request_reply(
        &self,
        identity: &QuotaIdentity,
        request: ReplyRequest,
        ads: &dyn AdPresenter,
    ) -> Result<ReplyOutcome, ReplyError> {
        validate_request(&request)?;

        tracing::info!(
            identity = %identity,
            style = %request.style,
            has_image = request.image.is_some(),
            "Reply requested"
        );

        let mut phase = PhaseTracker::new(identity, SessionPhase::Idle);
        phase.advance(SessionPhase::Evaluating);

        let (tier, mut counters, decision) = match self.evaluate(identity).await {
            Ok(evaluation) => evaluation,
            Err(e) => {
                phase.advance(SessionPhase::Failed);
                return Err(e);
            }
        };

        if !decision.can_use {
            phase.advance(SessionPhase::Blocked);
            return Err(self.blocked(tier, &counters, decision));
        }

        let mut watched_ad = false;
        if decision.needs_ad {
            phase.advance(SessionPhase::AdRequired);
            if !ads.show_rewarded_ad().await {
                tracing::info!(identity = %identity, "Rewarded ad declined, nothing consumed");
                phase.advance(SessionPhase::Blocked);
                return Err(ReplyError::AdDeclined);
            }
            watched_ad = true;
            phase.advance(SessionPhase::Ready);

            // Counters may have moved on another device while the ad played
            let (_, fresh, recheck) = match self.evaluate(identity).await {
                Ok(evaluation) => evaluation,
                Err(e) => {
                    phase.advance(SessionPhase::Failed);
                    return Err(e);
                }
            };
            if !recheck.can_use {
                phase.advance(SessionPhase::Blocked);
                return Err(self.blocked(tier, &fresh, recheck));
            }
            counters = fresh;
        } else {
            phase.advance(SessionPhase::Ready);
        }

        phase.advance(SessionPhase::Generating);
        let (original_text, reply) = match self.generate(&request).await {
            Ok(generated) => generated,
            Err(e) => {
                tracing::warn!(
                    identity = %identity,
                    error = %e,
                    "Reply attempt failed before commit"
                );
                phase.advance(SessionPhase::Failed);
                return Err(e);
            }
        };

        phase.advance(SessionPhase::Committing);
        let next = self.policy.apply(&counters, tier, watched_ad);
        let pending = PendingCommit {
            identity: identity.clone(),
            tier,
            commit: QuotaCommit {
                previous: counters,
                next,
                daily_limit: self.policy.limits().daily_limit(tier),
            },
            reply,
            original_text,
            style: request.style,
            image_ref: request
                .image
                .as_ref()
                .and_then(|image| image.reference().map(str::to_string)),
        };

        let result = self.commit_and_finish(pending, ads).await;
        match &result {
            Ok(_) => phase.advance(SessionPhase::Done),
            Err(_) => phase.advance(SessionPhase::Failed),
        }
        debug_assert!(phase.phase().is_terminal());
        tracing::debug!(identity = %identity, phase = ?phase.phase(), "Reply attempt finished");
        result
    }

    async fn retry_commit(
        &self,
        pending: PendingCommit,
        ads: &dyn AdPresenter,
    ) -> Result<ReplyOutcome, ReplyError> {
        tracing::info!(identity = %pending.identity, "Retrying usage commit");
        self.commit_and_finish(pending, ads).await
    }

    async fn usage_status(&self, identity: &QuotaIdentity) -> Result<UsageStatus, ReplyError> {
        let (tier, counters, decision) = self.evaluate(identity).await?;
        let limits = self.policy.limits();

        Ok(UsageStatus {
            tier,
            remaining: self.policy.remaining(&counters, tier),
            daily_limit: limits.daily_limit(tier),
            ad_free_limit: limits.ad_free_limit(tier),
            counters,
            decision,
        })
    }
}

impl ReplySessionService {
    async fn resolve_tier(&self, identity: &QuotaIdentity) -> Result<Tier, ReplyError> {
        match identity {
            QuotaIdentity::Guest(_) => Ok(Tier::Free),
            QuotaIdentity::Account(user_id) => self
                .tiers
                .tier_for(*user_id)
                .await
                .map_err(|e| ReplyError::QuotaUnavailable(e.to_string())),
        }
    }

    async fn evaluate(
        &self,
        identity: &QuotaIdentity,
    ) -> Result<(Tier, UsageCounters, UsageDecision), ReplyError> {
        let tier = self.resolve_tier(identity).await?;
        let counters = self
            .quota_store
            .load(identity, self.clock.today())
            .await
            .map_err(|e| ReplyError::QuotaUnavailable(e.to_string()))?;
        let decision = self.policy.evaluate(&counters, tier);

        tracing::debug!(
            identity = %identity,
            tier = %tier,
            daily_replies = counters.daily_replies,
            can_use = decision.can_use,
            needs_ad = decision.needs_ad,
            "Usage evaluated"
        );

        Ok((tier, counters, decision))
    }

    fn blocked(&self, tier: Tier, counters: &UsageCounters, decision: UsageDecision) -> ReplyError {
        let limit = self.policy.limits().daily_limit(tier);
        ReplyError::QuotaBlocked {
            tier,
            used: counters.daily_replies,
            limit,
            reason: decision.reason.unwrap_or_else(|| {
                format!("Daily limit reached ({}/{})", counters.daily_replies, limit)
            }),
        }
    }

    /// Returns the text the reply was written for, and the reply
    async fn generate(&self, request: &ReplyRequest) -> Result<(String, String), ReplyError> {
        let text = match (request.text.as_deref().map(str::trim), &request.image) {
            (Some(text), _) if !text.is_empty() => text.to_string(),
            (_, Some(image)) => self.extract(image).await?,
            _ => {
                return Err(ReplyError::Invalid(
                    "Provide a chat message or a screenshot".to_string(),
                ))
            }
        };

        let secs = self.upstream_timeout.as_secs();
        let reply = tokio::time::timeout(
            self.upstream_timeout,
            self.generator.generate_reply(&text, request.style),
        )
        .await
        .map_err(|_| GenerationError::Timeout(secs))??;

        let reply = reply.trim().to_string();
        if reply.is_empty() {
            return Err(GenerationError::Empty.into());
        }

        Ok((text, reply))
    }

    async fn extract(&self, image: &ImageSource) -> Result<String, ReplyError> {
        let secs = self.upstream_timeout.as_secs();
        let raw = tokio::time::timeout(self.upstream_timeout, self.extractor.extract_text(image))
            .await
            .map_err(|_| ExtractionError::Timeout(secs))??;

        let text = normalize_whitespace(&raw);
        if text.is_empty() {
            return Err(ExtractionError::Empty.into());
        }

        tracing::debug!(extracted_length = text.len(), "Text extracted from screenshot");
        Ok(text)
    }

    async fn commit_and_finish(
        &self,
        pending: PendingCommit,
        ads: &dyn AdPresenter,
    ) -> Result<ReplyOutcome, ReplyError> {
        let stored = match self
            .quota_store
            .commit(&pending.identity, &pending.commit, self.clock.today())
            .await
        {
            Ok(stored) => stored,
            Err(QuotaStoreError::LimitReached) => {
                let limit = pending.commit.daily_limit;
                return Err(ReplyError::QuotaBlocked {
                    tier: pending.tier,
                    used: limit,
                    limit,
                    reason: format!(
                        "Daily limit reached ({}/{} replies used) on another device.",
                        limit, limit
                    ),
                });
            }
            Err(e) => {
                tracing::error!(
                    identity = %pending.identity,
                    tier = %pending.tier,
                    error = %e,
                    "Usage commit failed after reply generation; quota not recorded"
                );
                let message = e.to_string();
                return Err(ReplyError::QuotaCommit {
                    pending: Box::new(pending),
                    message,
                });
            }
        };

        let history_entry = match self
            .history
            .save(
                &pending.identity,
                NewHistoryEntry {
                    response: pending.reply.clone(),
                    original_text: pending.original_text.clone(),
                    response_type: pending.style,
                    image_ref: pending.image_ref.clone(),
                },
            )
            .await
        {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(
                    identity = %pending.identity,
                    error = %e,
                    "Failed to save reply history"
                );
                None
            }
        };

        let interstitial_requested =
            pending.tier == Tier::Free && stored.total_actions % INTERSTITIAL_EVERY == 0;
        if interstitial_requested {
            ads.show_interstitial_ad();
        }

        tracing::info!(
            identity = %pending.identity,
            tier = %pending.tier,
            daily_replies = stored.daily_replies,
            total_actions = stored.total_actions,
            "Reply committed"
        );

        Ok(ReplyOutcome {
            remaining: self.policy.remaining(&stored, pending.tier),
            reply: pending.reply,
            style: pending.style,
            tier: pending.tier,
            counters: stored,
            history_entry,
            interstitial_requested,
        })
    }
}

fn validate_request(request: &ReplyRequest) -> Result<(), ReplyError> {
    let text = request.text.as_deref().map(str::trim).unwrap_or("");
    if text.is_empty() && request.image.is_none() {
        return Err(ReplyError::Invalid(
            "Provide a chat message or a screenshot".to_string(),
        ));
    }
    if text.chars().count() > MAX_INPUT_CHARS {
        return Err(ReplyError::Invalid(format!(
            "Chat message must be {} characters or less",
            MAX_INPUT_CHARS
        )));
    }
    Ok(())
}

fn normalize_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}
