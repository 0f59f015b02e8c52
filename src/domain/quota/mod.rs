pub mod error;

pub use error::QuotaStoreError;

use crate::domain::usage::UsageCounters;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

const MAX_GUEST_ID_LEN: usize = 128;

/// Locally generated installation id of an unauthenticated device
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestId(String);

impl GuestId {
    /// Accepts 1-128 characters of `[A-Za-z0-9_-]`
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let valid = !raw.is_empty()
            && raw.len() <= MAX_GUEST_ID_LEN
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GuestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Owner of a usage record: a signed-in account or a guest device
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QuotaIdentity {
    Account(Uuid),
    Guest(GuestId),
}

impl QuotaIdentity {
    pub fn kind(&self) -> &'static str {
        match self {
            QuotaIdentity::Account(_) => "account",
            QuotaIdentity::Guest(_) => "guest",
        }
    }
}

impl std::fmt::Display for QuotaIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuotaIdentity::Account(id) => write!(f, "account:{}", id),
            QuotaIdentity::Guest(id) => write!(f, "guest:{}", id),
        }
    }
}

/// One metered action to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaCommit {
    pub previous: UsageCounters,
    pub next: UsageCounters,
    /// Cap for the caller's tier; remote stores refuse to increment past it
    pub daily_limit: u32,
}

/// Durable per-identity usage counters.
///
/// Implementations must reconcile the daily window on `load` and persist a
/// reset before returning it.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    async fn load(
        &self,
        identity: &QuotaIdentity,
        today: NaiveDate,
    ) -> Result<UsageCounters, QuotaStoreError>;

    /// Persist a commit and return the counters as stored afterwards.
    ///
    /// `today` is the date the commit lands, which can be later than the day
    /// `commit` was computed on; the step is then applied to the current window.
    async fn commit(
        &self,
        identity: &QuotaIdentity,
        commit: &QuotaCommit,
        today: NaiveDate,
    ) -> Result<UsageCounters, QuotaStoreError>;
}

/// Routes quota calls to the guest or account store by identity
pub struct QuotaLedger {
    guest_store: Arc<dyn QuotaStore>,
    account_store: Arc<dyn QuotaStore>,
}

impl QuotaLedger {
    pub fn new(guest_store: Arc<dyn QuotaStore>, account_store: Arc<dyn QuotaStore>) -> Self {
        Self {
            guest_store,
            account_store,
        }
    }

    fn store_for(&self, identity: &QuotaIdentity) -> &dyn QuotaStore {
        match identity {
            QuotaIdentity::Account(_) => self.account_store.as_ref(),
            QuotaIdentity::Guest(_) => self.guest_store.as_ref(),
        }
    }
}

#[async_trait]
impl QuotaStore for QuotaLedger {
    async fn load(
        &self,
        identity: &QuotaIdentity,
        today: NaiveDate,
    ) -> Result<UsageCounters, QuotaStoreError> {
        self.store_for(identity).load(identity, today).await
    }

    async fn commit(
        &self,
        identity: &QuotaIdentity,
        commit: &QuotaCommit,
        today: NaiveDate,
    ) -> Result<UsageCounters, QuotaStoreError> {
        self.store_for(identity).commit(identity, commit, today).await
    }
}
