use super::model::{Tier, UsageCounters, UsageDecision};
use chrono::NaiveDate;

const FREE_DAILY_REPLIES: u32 = 50;
const PREMIUM_AD_FREE_REPLIES: u32 = 30;
const PREMIUM_AD_GATED_REPLIES: u32 = 50;

/// Per-tier daily allotments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaLimits {
    pub free_daily_replies: u32,
    pub premium_ad_free_replies: u32,
    pub premium_ad_gated_replies: u32,
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            free_daily_replies: FREE_DAILY_REPLIES,
            premium_ad_free_replies: PREMIUM_AD_FREE_REPLIES,
            premium_ad_gated_replies: PREMIUM_AD_GATED_REPLIES,
        }
    }
}

impl QuotaLimits {
    /// Total replies a tier may commit in one daily window
    pub fn daily_limit(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Free => self.free_daily_replies,
            Tier::Premium => self.premium_ad_free_replies + self.premium_ad_gated_replies,
        }
    }

    /// Replies a tier may commit without watching an ad
    pub fn ad_free_limit(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Free => 0,
            Tier::Premium => self.premium_ad_free_replies,
        }
    }
}

/// Result of reconciling stored counters with the current day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyWindow {
    pub counters: UsageCounters,
    pub was_reset: bool,
}

/// Zero the counters when they belong to an earlier calendar day.
///
/// The window never moves backwards: counters dated after `today` are kept.
/// Callers that get `was_reset == true` must persist the result before using it.
pub fn reconcile_daily_window(counters: UsageCounters, today: NaiveDate) -> DailyWindow {
    if counters.last_reset_date >= today {
        return DailyWindow {
            counters,
            was_reset: false,
        };
    }

    tracing::debug!(
        last_reset_date = %counters.last_reset_date,
        today = %today,
        "Daily window rolled over, zeroing usage counters"
    );

    DailyWindow {
        counters: UsageCounters::fresh(today),
        was_reset: true,
    }
}

/// Decides admissibility and ad gating for reply generation. Holds no state
/// besides the limits; every method is a pure function of its inputs.
#[derive(Debug, Clone, Default)]
pub struct UsagePolicy {
    limits: QuotaLimits,
}

impl UsagePolicy {
    pub fn new(limits: QuotaLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &QuotaLimits {
        &self.limits
    }

    pub fn evaluate(&self, counters: &UsageCounters, tier: Tier) -> UsageDecision {
        let daily_limit = self.limits.daily_limit(tier);

        match tier {
            Tier::Premium => {
                if counters.daily_replies >= daily_limit {
                    return UsageDecision::blocked(format!(
                        "Daily limit reached ({}/{} replies used). Your replies reset tomorrow.",
                        counters.daily_replies, daily_limit
                    ));
                }
                if counters.ad_free_replies >= self.limits.premium_ad_free_replies {
                    return UsageDecision::ad_gated();
                }
                UsageDecision::allowed()
            }
            Tier::Free => {
                if counters.daily_replies >= daily_limit {
                    return UsageDecision::blocked(format!(
                        "Daily limit reached ({}/{} replies used). \
                         Upgrade to Premium for more replies.",
                        counters.daily_replies, daily_limit
                    ));
                }
                UsageDecision::ad_gated()
            }
        }
    }

    /// Counters after one successful generation
    pub fn apply(&self, counters: &UsageCounters, tier: Tier, watched_ad: bool) -> UsageCounters {
        let mut next = counters.clone();
        next.daily_replies += 1;
        next.total_actions += 1;

        if tier == Tier::Premium && counters.ad_free_replies < self.limits.premium_ad_free_replies {
            next.ad_free_replies += 1;
        } else if watched_ad {
            next.ad_replies += 1;
        } else {
            tracing::warn!(
                tier = %tier,
                daily_replies = next.daily_replies,
                "Reply committed without ad confirmation after ad-free budget was exhausted"
            );
        }

        next
    }

    pub fn remaining(&self, counters: &UsageCounters, tier: Tier) -> u32 {
        self.limits
            .daily_limit(tier)
            .saturating_sub(counters.daily_replies)
    }
}
