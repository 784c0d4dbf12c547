//! # PostgreSQL Like Repository
//!
//! PostgreSQL implementation of [`QuoteLikeRepository`]. Each unit of work wraps
//! a `sqlx::Transaction`; dropping it without commit rolls the transaction back.

use crate::domain::entities::{NewQuoteLike, QuoteLike};
use crate::domain::value_objects::{LikeId, QuoteId, UserId};
use crate::infrastructure::persistence::postgres::{
    decrement_likes, increment_likes, map_sqlx_error,
};
use crate::infrastructure::persistence::traits::{
    LikeUnitOfWork, QuoteLikeRepository, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};

/// PostgreSQL implementation of [`QuoteLikeRepository`].
#[derive(Debug, Clone)]
pub struct PostgresQuoteLikeRepository {
    pool: PgPool,
}

impl PostgresQuoteLikeRepository {
    /// Creates a new repository on the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const FIND_LIKE: &str = r#"
    SELECT id, user_id, quote_id, liked_at
    FROM quote_like
    WHERE user_id = $1 AND quote_id = $2
"#;

/// Same lookup, holding a row lock until the transaction ends so concurrent
/// unlikes of one pair serialize.
const FIND_LIKE_FOR_UPDATE: &str = r#"
    SELECT id, user_id, quote_id, liked_at
    FROM quote_like
    WHERE user_id = $1 AND quote_id = $2
    FOR UPDATE
"#;

async fn find_like<'e>(
    executor: impl PgExecutor<'e>,
    sql: &'static str,
    user_id: &UserId,
    quote_id: QuoteId,
) -> RepositoryResult<Option<QuoteLike>> {
    let row: Option<LikeRow> = sqlx::query_as(sql)
    .bind(user_id.as_str())
    .bind(quote_id.get())
    .fetch_optional(executor)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, user_id = %user_id, quote_id = %quote_id, "failed to find like");
        map_sqlx_error(e)
    })?;

    row.map(LikeRow::try_into_like).transpose()
}

#[async_trait]
impl QuoteLikeRepository for PostgresQuoteLikeRepository {
    async fn find_like(
        &self,
        user_id: &UserId,
        quote_id: QuoteId,
    ) -> RepositoryResult<Option<QuoteLike>> {
        find_like(&self.pool, FIND_LIKE, user_id, quote_id).await
    }

    async fn begin(&self) -> RepositoryResult<Box<dyn LikeUnitOfWork>> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(Box::new(PostgresLikeUnitOfWork { tx }))
    }
}

/// Unit of work backed by a database transaction.
#[derive(Debug)]
struct PostgresLikeUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LikeUnitOfWork for PostgresLikeUnitOfWork {
    async fn find_like(
        &mut self,
        user_id: &UserId,
        quote_id: QuoteId,
    ) -> RepositoryResult<Option<QuoteLike>> {
        find_like(&mut *self.tx, FIND_LIKE_FOR_UPDATE, user_id, quote_id).await
    }

    async fn insert_like(&mut self, like: NewQuoteLike) -> RepositoryResult<QuoteLike> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO quote_like (user_id, quote_id, liked_at)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(like.user_id.as_str())
        .bind(like.quote_id.get())
        .bind(like.liked_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::duplicate(
                "QuoteLike",
                format!("({}, {})", like.user_id, like.quote_id),
            ),
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                RepositoryError::not_found("Quote", like.quote_id.to_string())
            }
            _ => {
                tracing::error!(error = %e, "failed to insert like");
                map_sqlx_error(e)
            }
        })?;

        Ok(QuoteLike::persisted(LikeId::new(id), like))
    }

    async fn delete_like(&mut self, user_id: &UserId, quote_id: QuoteId) -> RepositoryResult<bool> {
        let result = sqlx::query("DELETE FROM quote_like WHERE user_id = $1 AND quote_id = $2")
            .bind(user_id.as_str())
            .bind(quote_id.get())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, user_id = %user_id, quote_id = %quote_id, "failed to delete like");
                map_sqlx_error(e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_likes(&mut self, quote_id: QuoteId) -> RepositoryResult<bool> {
        increment_likes(&mut *self.tx, quote_id).await
    }

    async fn decrement_likes(&mut self, quote_id: QuoteId) -> RepositoryResult<bool> {
        decrement_likes(&mut *self.tx, quote_id).await
    }

    async fn commit(self: Box<Self>) -> RepositoryResult<()> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }
}

/// Row type for like queries.
#[derive(Debug, sqlx::FromRow)]
struct LikeRow {
    id: i64,
    user_id: String,
    quote_id: i64,
    liked_at: DateTime<Utc>,
}

impl LikeRow {
    fn try_into_like(self) -> RepositoryResult<QuoteLike> {
        let user_id =
            UserId::new(self.user_id).map_err(|e| RepositoryError::serialization(e.to_string()))?;
        let quote_id =
            QuoteId::new(self.quote_id).map_err(|e| RepositoryError::serialization(e.to_string()))?;
        Ok(QuoteLike::from_parts(
            LikeId::new(self.id),
            user_id,
            quote_id,
            self.liked_at,
        ))
    }
}
