//! Shared Test Helpers for Cross-Crate Use
//!
//! Connection and logging setup used by the `relquery` test suites, so each
//! suite talks to the database the same way.

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::sync::Once;

static TRACING: Once = Once::new();

/// Get an in-memory SQLite database URL for unit tests
pub fn get_test_in_memory_database_url() -> String {
    "sqlite::memory:".to_string()
}

/// Get the test database URL from environment or fall back to in-memory SQLite
pub fn get_test_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| get_test_in_memory_database_url())
}

/// Open a fresh database connection for one test.
///
/// The pool is pinned to a single connection: every pooled connection to
/// `sqlite::memory:` would otherwise see its own empty database.
pub async fn create_test_connection() -> Result<DatabaseConnection, DbErr> {
    create_connection(&get_test_in_memory_database_url()).await
}

pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url);
    opt.min_connections(1)
        .max_connections(1)
        .sqlx_logging(false);
    Database::connect(opt).await
}

/// Route `tracing` output through the test harness writer.
///
/// Safe to call from every test; only the first call installs the subscriber.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}
