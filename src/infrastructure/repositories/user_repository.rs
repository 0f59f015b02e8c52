use crate::domain::usage::Tier;
use crate::infrastructure::db::DbPool;
use crate::{domain::user::User, error::AppResult};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

pub struct UserRepository {
    pool: Arc<DbPool>,
}

impl UserRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let pool = self.pool.as_ref();
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn create(&self, email: &str, plan_type: Tier, today: NaiveDate) -> AppResult<User> {
        let pool = self.pool.as_ref();
        let now = Utc::now();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users
                (id, email, plan_type, usage_count, usage_reset_date, created_at, updated_at)
            VALUES ($1, $2, $3, 0, $4, $5, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(plan_type)
        .bind(today)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    pub async fn update_plan(&self, user_id: Uuid, plan_type: Tier) -> AppResult<Option<User>> {
        let pool = self.pool.as_ref();

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET plan_type = $1, updated_at = $2
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(plan_type)
        .bind(Utc::now())
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Zero the counter when it belongs to an earlier day.
    ///
    /// Returns `None` when the user does not exist or the counter is already current.
    pub async fn reset_usage_if_stale(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> AppResult<Option<User>> {
        let pool = self.pool.as_ref();

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET usage_count = 0, usage_reset_date = $2, updated_at = $3
            WHERE id = $1 AND usage_reset_date < $2
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(today)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Count one reply for `today`, as a single conditional statement.
    ///
    /// A counter from an earlier day restarts at 1; the stored date never moves
    /// backwards. Returns `None` when the user does not exist or the current
    /// count has already reached `daily_limit`.
    pub async fn increment_usage(
        &self,
        user_id: Uuid,
        today: NaiveDate,
        daily_limit: i32,
    ) -> AppResult<Option<User>> {
        let pool = self.pool.as_ref();

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET usage_count = CASE WHEN usage_reset_date < $2 THEN 1 ELSE usage_count + 1 END,
                usage_reset_date = GREATEST(usage_reset_date, $2),
                updated_at = $4
            WHERE id = $1
              AND (usage_reset_date < $2 OR usage_count < $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(today)
        .bind(daily_limit)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }
}
