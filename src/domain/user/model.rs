use crate::domain::usage::Tier;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Signed-in account, the server-authoritative owner of a usage counter
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub plan_type: Tier,
    /// Replies committed during the window starting at `usage_reset_date`
    pub usage_count: i32,
    pub usage_reset_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
