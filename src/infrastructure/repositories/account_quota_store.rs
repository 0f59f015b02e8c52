use super::user_repository::UserRepository;
use crate::domain::quota::{QuotaCommit, QuotaIdentity, QuotaStore, QuotaStoreError};
use crate::domain::usage::{QuotaLimits, UsageCounters};
use crate::domain::user::User;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

/// Server-authoritative counters of signed-in accounts.
///
/// Only `usage_count` is stored; the ad-free/ad split is derived from it,
/// since the ad-free budget is always spent first.
pub struct AccountQuotaStore {
    user_repo: Arc<UserRepository>,
    limits: QuotaLimits,
}

impl AccountQuotaStore {
    pub fn new(user_repo: Arc<UserRepository>, limits: QuotaLimits) -> Self {
        Self { user_repo, limits }
    }

    fn account_id(identity: &QuotaIdentity) -> Result<Uuid, QuotaStoreError> {
        match identity {
            QuotaIdentity::Account(id) => Ok(*id),
            QuotaIdentity::Guest(_) => Err(QuotaStoreError::WrongIdentity(identity.kind())),
        }
    }
}

pub(crate) fn counters_from_user(user: &User, limits: &QuotaLimits) -> UsageCounters {
    let used = user.usage_count.max(0) as u32;
    let ad_free = used.min(limits.ad_free_limit(user.plan_type));

    UsageCounters {
        daily_replies: used,
        ad_free_replies: ad_free,
        ad_replies: used - ad_free,
        total_actions: used,
        last_reset_date: user.usage_reset_date,
    }
}

#[async_trait]
impl QuotaStore for AccountQuotaStore {
    async fn load(
        &self,
        identity: &QuotaIdentity,
        today: NaiveDate,
    ) -> Result<UsageCounters, QuotaStoreError> {
        let user_id = Self::account_id(identity)?;
        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(QuotaStoreError::AccountNotFound)?;

        if user.usage_reset_date >= today {
            return Ok(counters_from_user(&user, &self.limits));
        }

        let user = match self.user_repo.reset_usage_if_stale(user_id, today).await? {
            Some(reset) => {
                tracing::info!(
                    user_id = %user_id,
                    previous_date = %user.usage_reset_date,
                    today = %today,
                    "Account usage reset for new day"
                );
                reset
            }
            // Another request reset it first
            None => self
                .user_repo
                .find_by_id(user_id)
                .await?
                .ok_or(QuotaStoreError::AccountNotFound)?,
        };

        Ok(counters_from_user(&user, &self.limits))
    }

    async fn commit(
        &self,
        identity: &QuotaIdentity,
        commit: &QuotaCommit,
        today: NaiveDate,
    ) -> Result<UsageCounters, QuotaStoreError> {
        let user_id = Self::account_id(identity)?;
        let daily_limit = i32::try_from(commit.daily_limit).unwrap_or(i32::MAX);

        match self
            .user_repo
            .increment_usage(user_id, today, daily_limit)
            .await?
        {
            Some(user) => {
                tracing::debug!(
                    user_id = %user_id,
                    usage_count = user.usage_count,
                    daily_limit,
                    "Account usage incremented"
                );
                Ok(counters_from_user(&user, &self.limits))
            }
            None => match self.user_repo.find_by_id(user_id).await? {
                Some(_) => {
                    tracing::warn!(
                        user_id = %user_id,
                        daily_limit,
                        "Account reached its daily limit before the commit landed"
                    );
                    Err(QuotaStoreError::LimitReached)
                }
                None => Err(QuotaStoreError::AccountNotFound),
            },
        }
    }
}
