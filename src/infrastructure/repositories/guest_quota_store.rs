use crate::domain::quota::{GuestId, QuotaCommit, QuotaIdentity, QuotaStore, QuotaStoreError};
use crate::domain::usage::{reconcile_daily_window, UsageCounters};
use crate::infrastructure::storage::KeyValueStore;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Guest profile blob as kept in the device's key-value storage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GuestProfile {
    identity: GuestId,
    usage_stats: UsageCounters,
    #[serde(default)]
    is_premium: bool,
}

pub(crate) fn profile_key(guest: &GuestId) -> String {
    format!("guest:{}:profile", guest.as_str())
}

/// Counters of unauthenticated devices.
///
/// Storage trouble never blocks a guest: unreadable profiles load as fresh
/// counters and failed writes are logged and dropped.
pub struct GuestQuotaStore {
    storage: Arc<dyn KeyValueStore>,
    commit_lock: Mutex<()>,
}

impl GuestQuotaStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            commit_lock: Mutex::new(()),
        }
    }

    fn guest_id(identity: &QuotaIdentity) -> Result<&GuestId, QuotaStoreError> {
        match identity {
            QuotaIdentity::Guest(id) => Ok(id),
            QuotaIdentity::Account(_) => Err(QuotaStoreError::WrongIdentity(identity.kind())),
        }
    }

    async fn read_counters(&self, guest: &GuestId) -> Option<UsageCounters> {
        let raw = match self.storage.get(&profile_key(guest)).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(guest_id = %guest, error = %e, "Failed to read guest profile");
                return None;
            }
        };

        match serde_json::from_str::<GuestProfile>(&raw) {
            Ok(profile) => Some(profile.usage_stats),
            Err(e) => {
                tracing::warn!(
                    guest_id = %guest,
                    error = %e,
                    "Guest profile is corrupt, starting fresh"
                );
                None
            }
        }
    }

    async fn write_counters(&self, guest: &GuestId, counters: &UsageCounters) {
        let profile = GuestProfile {
            identity: guest.clone(),
            usage_stats: counters.clone(),
            is_premium: false,
        };

        let result = match serde_json::to_string(&profile) {
            Ok(json) => self
                .storage
                .set(&profile_key(guest), json)
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        if let Err(e) = result {
            tracing::warn!(guest_id = %guest, error = %e, "Failed to persist guest usage");
        }
    }

    async fn load_reconciled(&self, guest: &GuestId, today: NaiveDate) -> UsageCounters {
        let stored = match self.read_counters(guest).await {
            Some(counters) => counters,
            None => return UsageCounters::fresh(today),
        };

        let window = reconcile_daily_window(stored, today);
        if window.was_reset {
            self.write_counters(guest, &window.counters).await;
        }
        window.counters
    }
}

/// Replays the step from `previous` to `next` on top of `current`, for when
/// another request committed in between or the day rolled over since the load.
/// The result always stays in `current`'s window.
fn rebase(current: &UsageCounters, commit: &QuotaCommit) -> UsageCounters {
    if *current == commit.previous {
        return commit.next.clone();
    }

    let step = |next: u32, previous: u32, base: u32| base + next.saturating_sub(previous);
    UsageCounters {
        daily_replies: step(
            commit.next.daily_replies,
            commit.previous.daily_replies,
            current.daily_replies,
        ),
        ad_free_replies: step(
            commit.next.ad_free_replies,
            commit.previous.ad_free_replies,
            current.ad_free_replies,
        ),
        ad_replies: step(commit.next.ad_replies, commit.previous.ad_replies, current.ad_replies),
        total_actions: step(
            commit.next.total_actions,
            commit.previous.total_actions,
            current.total_actions,
        ),
        last_reset_date: current.last_reset_date,
    }
}

#[async_trait]
impl QuotaStore for GuestQuotaStore {
    async fn load(
        &self,
        identity: &QuotaIdentity,
        today: NaiveDate,
    ) -> Result<UsageCounters, QuotaStoreError> {
        let guest = Self::guest_id(identity)?;
        Ok(self.load_reconciled(guest, today).await)
    }

    async fn commit(
        &self,
        identity: &QuotaIdentity,
        commit: &QuotaCommit,
        today: NaiveDate,
    ) -> Result<UsageCounters, QuotaStoreError> {
        let guest = Self::guest_id(identity)?;
        let _guard = self.commit_lock.lock().await;

        let current = self.load_reconciled(guest, today).await;
        if current != commit.previous && current.daily_replies >= commit.daily_limit {
            return Err(QuotaStoreError::LimitReached);
        }

        let next = rebase(&current, commit);
        self.write_counters(guest, &next).await;

        tracing::debug!(
            guest_id = %guest,
            daily_replies = next.daily_replies,
            total_actions = next.total_actions,
            "Guest usage committed"
        );
        Ok(next)
    }
}
