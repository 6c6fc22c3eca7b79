use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use trail_core::{NewQuery, QueryEntry, QueryStatus, QueryUpdate};

use super::{EntryStore, StoreError};

#[derive(Debug, Clone, FromRow)]
struct TrailQueryRow {
    id: i64,
    latitude: f64,
    longitude: f64,
    user_question: String,
    context_tag: String,
    #[sqlx(try_from = "String")]
    status: QueryStatus,
    llm_response: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<TrailQueryRow> for QueryEntry {
    fn from(row: TrailQueryRow) -> Self {
        QueryEntry {
            id: row.id,
            latitude: row.latitude,
            longitude: row.longitude,
            user_question: row.user_question,
            context_tag: row.context_tag,
            status: row.status,
            llm_response: row.llm_response,
            created_at: row.created_at,
        }
    }
}

/// Entry store backed by the `trail_queries` table.
#[derive(Clone)]
pub struct PgEntryStore {
    pool: PgPool,
}

impl PgEntryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntryStore for PgEntryStore {
    async fn create(&self, query: &NewQuery) -> Result<i64, StoreError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO trail_queries (latitude, longitude, user_question, context_tag, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(query.coordinates.latitude)
        .bind(query.coordinates.longitude)
        .bind(&query.user_question)
        .bind(&query.context_tag)
        .bind(QueryStatus::Ready.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn read(&self, id: i64) -> Result<Option<QueryEntry>, StoreError> {
        let row = sqlx::query_as::<_, TrailQueryRow>(
            r#"
            SELECT id, latitude, longitude, user_question, context_tag,
                   status, llm_response, created_at
            FROM trail_queries
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(QueryEntry::from))
    }

    async fn update(&self, update: &QueryUpdate) -> Result<u64, StoreError> {
        let result =
            sqlx::query("UPDATE trail_queries SET llm_response = $1, status = $2 WHERE id = $3")
                .bind(&update.llm_response)
                .bind(update.status.as_str())
                .bind(update.id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
