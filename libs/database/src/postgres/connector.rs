use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use super::PostgresConfig;
use crate::common::{DatabaseError, DatabaseResult, RetryExecutor, RetryPolicy};

async fn connect_once(options: ConnectOptions) -> DatabaseResult<DatabaseConnection> {
    let db = Database::connect(options)
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;
    info!("Successfully connected to PostgreSQL database");
    Ok(db)
}

/// Connect from config, retrying connection failures under `policy`.
///
/// Connection failures classify as retryable, so the executor keeps trying
/// until the policy is exhausted.
///
/// # Example
/// ```ignore
/// use database::postgres::{PostgresConfig, connect_with_retry};
/// use database::common::{RetryExecutor, RetryPolicy};
///
/// let config = PostgresConfig::from_env()?;
/// let db = connect_with_retry(config, &RetryExecutor::default(), &RetryPolicy::default()).await?;
/// ```
pub async fn connect_with_retry(
    config: PostgresConfig,
    executor: &RetryExecutor,
    policy: &RetryPolicy,
) -> DatabaseResult<DatabaseConnection> {
    let options = config.into_connect_options();

    let db = executor
        .execute("connect", policy, || connect_once(options.clone()))
        .await?;

    Ok(db)
}

/// Run database migrations using the provided Migrator
///
/// # Example
/// ```ignore
/// use migration::Migrator;
/// use database::postgres::run_migrations;
///
/// run_migrations::<Migrator>(&db, "users_api").await?;
/// ```
pub async fn run_migrations<M: MigratorTrait>(
    db: &DatabaseConnection,
    app_name: &str,
) -> DatabaseResult<()> {
    info!("Running {} database migrations...", app_name);
    M::up(db, None)
        .await
        .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;
    info!("Migrations completed successfully for {}", app_name);
    Ok(())
}
