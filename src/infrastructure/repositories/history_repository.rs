use crate::domain::history::{
    HistoryEntry, HistoryError, HistoryPage, HistoryRecorder, NewHistoryEntry,
};
use crate::domain::quota::QuotaIdentity;
use crate::domain::reply::ReplyStyle;
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, FromRow)]
struct ReplyHistoryRow {
    id: Uuid,
    #[allow(dead_code)]
    user_id: Uuid,
    response: String,
    original_text: String,
    response_type: ReplyStyle,
    image_uri: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ReplyHistoryRow> for HistoryEntry {
    fn from(row: ReplyHistoryRow) -> Self {
        HistoryEntry {
            id: row.id,
            response: row.response,
            original_text: row.original_text,
            response_type: row.response_type,
            created_at: row.created_at,
            image_ref: row.image_uri,
        }
    }
}

impl From<sqlx::Error> for HistoryError {
    fn from(err: sqlx::Error) -> Self {
        HistoryError::Dependency(err.to_string())
    }
}

/// `reply_history` rows of signed-in accounts
pub struct HistoryRepository {
    pool: Arc<DbPool>,
}

impl HistoryRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    fn account_id(identity: &QuotaIdentity) -> Result<Uuid, HistoryError> {
        match identity {
            QuotaIdentity::Account(id) => Ok(*id),
            QuotaIdentity::Guest(_) => Err(HistoryError::WrongIdentity(identity.kind())),
        }
    }
}

#[async_trait]
impl HistoryRecorder for HistoryRepository {
    async fn save(
        &self,
        identity: &QuotaIdentity,
        entry: NewHistoryEntry,
    ) -> Result<HistoryEntry, HistoryError> {
        let user_id = Self::account_id(identity)?;
        let pool = self.pool.as_ref();

        let row = sqlx::query_as::<_, ReplyHistoryRow>(
            r#"
            INSERT INTO reply_history
                (id, user_id, response, original_text, response_type, image_uri, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&entry.response)
        .bind(&entry.original_text)
        .bind(entry.response_type)
        .bind(&entry.image_ref)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;

        Ok(row.into())
    }

    async fn list(
        &self,
        identity: &QuotaIdentity,
        page: u32,
        page_size: u32,
    ) -> Result<HistoryPage, HistoryError> {
        let user_id = Self::account_id(identity)?;
        let pool = self.pool.as_ref();
        let offset = i64::from(page) * i64::from(page_size);

        // One extra row tells whether another page exists
        let mut rows = sqlx::query_as::<_, ReplyHistoryRow>(
            r#"
            SELECT * FROM reply_history
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(i64::from(page_size) + 1)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        let has_more = rows.len() > page_size as usize;
        rows.truncate(page_size as usize);

        Ok(HistoryPage {
            entries: rows.into_iter().map(Into::into).collect(),
            has_more,
        })
    }

    async fn delete(&self, identity: &QuotaIdentity, entry_id: Uuid) -> Result<(), HistoryError> {
        let user_id = Self::account_id(identity)?;
        let pool = self.pool.as_ref();

        let result = sqlx::query("DELETE FROM reply_history WHERE id = $1 AND user_id = $2")
            .bind(entry_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(HistoryError::NotFound);
        }

        Ok(())
    }
}
