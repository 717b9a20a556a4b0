//! # PostgreSQL Connection Pool
//!
//! Pool management for the repositories. The SSO core is read-mostly: realms,
//! clients, groups, and provider registrations are only read at
//! authentication time; writes happen on user registration.
//!
//! ## Sizing
//!
//! Rule of thumb: `max_connections = (2 x cpu_cores) + disk_spindles`.
//! Authentication traffic is bursty but each request holds a connection
//! only for one or two short queries, so the default of 10 goes far.

use crate::config::DatabaseConfig;
use crate::errors::AuthError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

/// Creates a PostgreSQL connection pool.
///
/// Called once at application startup; the returned `PgPool` is `Arc`-based
/// and cheap to clone into each repository.
///
/// # Errors
///
/// Returns `AuthError::Database` when the URL is invalid, the server is
/// unreachable, or authentication fails.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, AuthError> {
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Creating database connection pool"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
        .max_lifetime(Duration::from_secs(config.max_lifetime_seconds))
        .test_before_acquire(true)
        .connect(&config.connection_url())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create database pool");
            AuthError::Database(e)
        })?;

    info!("Database connection pool created");

    Ok(pool)
}

/// Verifies database connectivity with a trivial query.
///
/// Used by the health endpoint.
pub async fn health_check(pool: &PgPool) -> Result<(), AuthError> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map_err(AuthError::Database)?;

    Ok(())
}
