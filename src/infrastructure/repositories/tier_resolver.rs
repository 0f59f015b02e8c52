use super::user_repository::UserRepository;
use crate::domain::quota::QuotaStoreError;
use crate::domain::reply::TierResolver;
use crate::domain::usage::Tier;
use crate::domain::user::User;
use crate::error::AppResult;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Plan changes that bypass `change_plan` show up within this window
const TIER_CACHE_TTL: Duration = Duration::from_secs(60);

/// Reads `plan_type` from the account record, optionally through a short-lived cache
pub struct CachedTierResolver {
    user_repo: Arc<UserRepository>,
    cache: Option<Cache<Uuid, Tier>>,
}

impl CachedTierResolver {
    pub fn new(user_repo: Arc<UserRepository>, cache_enabled: bool) -> Self {
        let cache = if cache_enabled {
            Some(
                Cache::builder()
                    .max_capacity(10_000)
                    .time_to_live(TIER_CACHE_TTL)
                    .build(),
            )
        } else {
            None
        };

        Self { user_repo, cache }
    }

    /// Persist a new plan and drop the cached tier so the next lookup
    /// reads it back
    pub async fn change_plan(&self, user_id: Uuid, plan_type: Tier) -> AppResult<Option<User>> {
        let user = self.user_repo.update_plan(user_id, plan_type).await?;

        if let Some(cache) = &self.cache {
            cache.invalidate(&user_id).await;
        }

        tracing::info!(user_id = %user_id, plan = ?plan_type, "Plan changed");
        Ok(user)
    }
}

#[async_trait]
impl TierResolver for CachedTierResolver {
    async fn tier_for(&self, user_id: Uuid) -> Result<Tier, QuotaStoreError> {
        if let Some(cache) = &self.cache {
            if let Some(tier) = cache.get(&user_id).await {
                return Ok(tier);
            }
        }

        let tier = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .map(|user| user.plan_type)
            .ok_or(QuotaStoreError::AccountNotFound)?;

        if let Some(cache) = &self.cache {
            cache.insert(user_id, tier).await;
        }

        Ok(tier)
    }
}
