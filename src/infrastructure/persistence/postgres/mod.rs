//! # PostgreSQL Repositories
//!
//! `sqlx` implementations of the persistence ports.
//!
//! - [`PostgresQuoteRepository`]: quotes and atomic counter updates
//! - [`PostgresQuoteLikeRepository`]: like rows, written inside a database transaction
//!
//! The schema lives in `migrations/` and is applied with [`run_migrations`].

pub mod like_repository;
pub mod quote_repository;

pub use like_repository::PostgresQuoteLikeRepository;
pub use quote_repository::PostgresQuoteRepository;

use crate::domain::value_objects::QuoteId;
use crate::infrastructure::persistence::traits::{RepositoryError, RepositoryResult};
use sqlx::{PgExecutor, PgPool};

/// Applies the embedded schema migrations.
///
/// # Errors
///
/// Returns `RepositoryError::Connection` if a migration cannot be applied.
pub async fn run_migrations(pool: &PgPool) -> RepositoryResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| RepositoryError::connection(format!("migration failed: {e}")))
}

/// Maps a driver error to a repository error.
pub(crate) fn map_sqlx_error(error: sqlx::Error) -> RepositoryError {
    match error {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            RepositoryError::connection(error.to_string())
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            RepositoryError::serialization(error.to_string())
        }
        other => RepositoryError::query(other.to_string()),
    }
}

/// `likes = likes + 1`, executed store-side.
pub(crate) async fn increment_likes<'e>(
    executor: impl PgExecutor<'e>,
    id: QuoteId,
) -> RepositoryResult<bool> {
    let result = sqlx::query("UPDATE quotes SET likes = likes + 1 WHERE id = $1")
        .bind(id.get())
        .execute(executor)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, quote_id = %id, "failed to increment likes");
            map_sqlx_error(e)
        })?;
    Ok(result.rows_affected() > 0)
}

/// `likes = likes - 1` guarded by `likes > 0`, executed store-side.
pub(crate) async fn decrement_likes<'e>(
    executor: impl PgExecutor<'e>,
    id: QuoteId,
) -> RepositoryResult<bool> {
    let result = sqlx::query("UPDATE quotes SET likes = likes - 1 WHERE id = $1 AND likes > 0")
        .bind(id.get())
        .execute(executor)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, quote_id = %id, "failed to decrement likes");
            map_sqlx_error(e)
        })?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_errors_are_connection_errors() {
        assert!(matches!(
            map_sqlx_error(sqlx::Error::PoolTimedOut),
            RepositoryError::Connection(_)
        ));
    }

    #[test]
    fn missing_rows_are_query_errors() {
        assert!(matches!(
            map_sqlx_error(sqlx::Error::RowNotFound),
            RepositoryError::Query(_)
        ));
    }
}
