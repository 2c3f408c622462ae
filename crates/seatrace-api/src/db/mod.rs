//! # Database Persistence
//!
//! Optional PostgreSQL persistence behind the in-memory store. The pool is
//! created from `DATABASE_URL` on startup; when the variable is absent the
//! API runs in in-memory-only mode.
//!
//! Write paths are strict: serialization or query failures abort the
//! request. Read paths are lenient: a malformed stored row is logged at
//! ERROR and skipped rather than taking the whole service down.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub mod products;

/// Create the PostgreSQL connection pool from `DATABASE_URL`.
///
/// Returns `Ok(None)` when the variable is not set (in-memory-only mode).
/// Returns `Err` when the variable is set but the pool cannot be created,
/// so a misconfigured deployment fails fast instead of silently dropping
/// persistence.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!("DATABASE_URL not set — running without database persistence");
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await?;

    tracing::info!("database pool initialized");
    Ok(Some(pool))
}
