//! # PostgreSQL Quote Repository
//!
//! PostgreSQL implementation of [`QuoteRepository`] using sqlx.
//!
//! Counter updates are single conditional `UPDATE` statements, so concurrent
//! likes and unlikes on the same quote never lose an update.

use crate::domain::entities::Quote;
use crate::domain::value_objects::{ContentHash, QuoteId};
use crate::infrastructure::persistence::postgres::{
    decrement_likes, increment_likes, map_sqlx_error,
};
use crate::infrastructure::persistence::traits::{
    QuoteRepository, RepositoryError, RepositoryResult,
};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

/// Rows per `INSERT` statement; keeps bind parameters well under the protocol limit.
const INSERT_CHUNK_SIZE: usize = 1000;

/// PostgreSQL implementation of [`QuoteRepository`].
///
/// # Examples
///
/// ```ignore
/// use sqlx::PgPool;
/// use random_quotes::infrastructure::persistence::postgres::PostgresQuoteRepository;
///
/// let pool = PgPool::connect("postgres://...").await?;
/// let repository = PostgresQuoteRepository::new(pool);
/// ```
#[derive(Debug, Clone)]
pub struct PostgresQuoteRepository {
    pool: PgPool,
}

impl PostgresQuoteRepository {
    /// Creates a new repository on the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl QuoteRepository for PostgresQuoteRepository {
    async fn bulk_insert_ignoring_conflicts(
        &self,
        quotes: &[Quote],
        provider: &str,
    ) -> RepositoryResult<()> {
        if quotes.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        for chunk in quotes.chunks(INSERT_CHUNK_SIZE) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO quotes (author, text, likes, text_author_hash, provider) ",
            );
            builder.push_values(chunk, |mut row, quote| {
                row.push_bind(quote.author().to_string())
                    .push_bind(quote.text().to_string())
                    .push_bind(0_i32)
                    .push_bind(quote.content_hash().as_str().to_string())
                    .push_bind(provider.to_string());
            });
            builder.push(" ON CONFLICT (text_author_hash, provider) DO NOTHING");

            builder.build().execute(&mut *tx).await.map_err(|e| {
                tracing::error!(
                    error = %e,
                    provider,
                    count = quotes.len(),
                    "bulk quote insert failed"
                );
                map_sqlx_error(e)
            })?;
        }
        tx.commit().await.map_err(map_sqlx_error)
    }

    async fn find_by_content_hash(&self, hash: &ContentHash) -> RepositoryResult<Option<Quote>> {
        let row: Option<QuoteRow> = sqlx::query_as(
            r#"
            SELECT id, author, text, likes
            FROM quotes
            WHERE text_author_hash = $1
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(hash.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to find quote by content hash");
            map_sqlx_error(e)
        })?;

        row.map(QuoteRow::try_into_quote).transpose()
    }

    async fn find_by_id(&self, id: QuoteId) -> RepositoryResult<Option<Quote>> {
        let row: Option<QuoteRow> =
            sqlx::query_as("SELECT id, author, text, likes FROM quotes WHERE id = $1")
                .bind(id.get())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, quote_id = %id, "failed to find quote by id");
                    map_sqlx_error(e)
                })?;

        row.map(QuoteRow::try_into_quote).transpose()
    }

    async fn save(&self, quote: &Quote) -> RepositoryResult<Quote> {
        let hash = quote.content_hash();
        let row: Option<QuoteRow> = match quote.id() {
            None => sqlx::query_as(
                r#"
                INSERT INTO quotes (author, text, likes, text_author_hash)
                VALUES ($1, $2, 0, $3)
                RETURNING id, author, text, likes
                "#,
            )
            .bind(quote.author())
            .bind(quote.text())
            .bind(hash.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?,
            Some(id) => sqlx::query_as(
                r#"
                UPDATE quotes
                SET author = $2, text = $3, text_author_hash = $4
                WHERE id = $1
                RETURNING id, author, text, likes
                "#,
            )
            .bind(id.get())
            .bind(quote.author())
            .bind(quote.text())
            .bind(hash.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?,
        };

        match row {
            Some(row) => row.try_into_quote(),
            None => Err(RepositoryError::not_found(
                "Quote",
                quote.id().map(|id| id.to_string()).unwrap_or_default(),
            )),
        }
    }

    async fn increment_likes(&self, id: QuoteId) -> RepositoryResult<bool> {
        increment_likes(&self.pool, id).await
    }

    async fn decrement_likes(&self, id: QuoteId) -> RepositoryResult<bool> {
        decrement_likes(&self.pool, id).await
    }

    async fn count(&self) -> RepositoryResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM quotes")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "failed to count quotes");
                map_sqlx_error(e)
            })?;

        Ok(count as u64)
    }

    async fn count_by_provider(&self, provider: &str) -> RepositoryResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM quotes WHERE provider = $1")
            .bind(provider)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, provider, "failed to count quotes for provider");
                map_sqlx_error(e)
            })?;

        Ok(count as u64)
    }

    async fn find_all(&self, limit: usize) -> RepositoryResult<Vec<Quote>> {
        let rows: Vec<QuoteRow> =
            sqlx::query_as("SELECT id, author, text, likes FROM quotes ORDER BY id ASC LIMIT $1")
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        rows.into_iter().map(QuoteRow::try_into_quote).collect()
    }

    async fn find_random_sample(&self, limit: usize) -> RepositoryResult<Vec<Quote>> {
        if limit == 0 {
            return Err(RepositoryError::invalid_argument(
                "sample limit must be positive",
            ));
        }

        let rows: Vec<QuoteRow> = sqlx::query_as(
            "SELECT id, author, text, likes FROM quotes ORDER BY RANDOM() LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, limit, "failed to fetch random quotes");
            map_sqlx_error(e)
        })?;

        rows.into_iter().map(QuoteRow::try_into_quote).collect()
    }
}

/// Row type for quote queries.
#[derive(Debug, sqlx::FromRow)]
struct QuoteRow {
    id: i64,
    author: String,
    text: String,
    likes: i32,
}

impl QuoteRow {
    /// Converts the row into a Quote.
    fn try_into_quote(self) -> RepositoryResult<Quote> {
        let id = QuoteId::new(self.id).map_err(|e| RepositoryError::serialization(e.to_string()))?;
        let likes = u32::try_from(self.likes).map_err(|_| {
            RepositoryError::serialization(format!("negative like count on quote {id}"))
        })?;
        Ok(Quote::from_parts(id, self.author, self.text, likes))
    }
}
