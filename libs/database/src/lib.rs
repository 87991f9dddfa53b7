//! Persistence plumbing for the user service.
//!
//! - [`common`] holds the typed error taxonomy, the retry classifier and the
//!   backoff executor every store operation runs through.
//! - [`postgres`] (default feature) connects SeaORM with retry, runs
//!   migrations and answers health checks.
//!
//! # Features
//!
//! - `postgres` (default) - PostgreSQL support with SeaORM
//! - `config` - Configuration support with `core_config::FromEnv`
//!
//! # Example
//!
//! ```ignore
//! use database::common::{RetryExecutor, RetryPolicy};
//! use database::postgres::{self, PostgresConfig};
//!
//! let executor = RetryExecutor::default();
//! let db = postgres::connect_with_retry(PostgresConfig::from_env()?, &executor, &RetryPolicy::default()).await?;
//! postgres::run_migrations::<Migrator>(&db, "users_api").await?;
//! ```

pub mod common;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use common::{
    Classification, DatabaseError, DatabaseErrorClassifier, DatabaseResult, ErrorCategory,
    ErrorClassifier, RetryError, RetryExecutor, RetryPolicy,
};
