use axum::{Router, middleware, routing::get};
use axum_helpers::{JwtAuth, ShutdownCoordinator, create_app, create_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use database::{DatabaseErrorClassifier, RetryExecutor};
use domain_users::{
    Argon2Hasher, InMemoryUserStore, PostgresUserStore, UserDataAccess, UserService, UserStore,
    handlers,
};
use eyre::WrapErr;
use migration::Migrator;
use observability::{PrometheusSink, metrics_handler, metrics_middleware};
use std::sync::Arc;
use tonic::transport::Server;
use tracing::info;

mod config;

use config::Config;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    let config = Config::from_env()?;

    init_tracing(&config.environment);
    observability::init_metrics().wrap_err("Failed to install metrics recorder")?;

    let executor = RetryExecutor::new(DatabaseErrorClassifier, Arc::new(PrometheusSink));

    match config.database.clone() {
        Some(db_config) => {
            info!(database = ?db_config, "Connecting to PostgreSQL");
            let db = database::postgres::connect_with_retry(db_config, &executor, &config.retry)
                .await
                .wrap_err("PostgreSQL connection failed")?;
            database::postgres::run_migrations::<Migrator>(&db, "users_api")
                .await
                .wrap_err("Migrations failed")?;

            serve(PostgresUserStore::new(db), executor, config).await
        }
        None => {
            tracing::warn!("DATABASE_URL is not set, users are kept in memory only");
            serve(InMemoryUserStore::new(), executor, config).await
        }
    }
}

/// Build the single service instance and run both surfaces until shutdown
async fn serve<S: UserStore + 'static>(
    store: S,
    executor: RetryExecutor,
    config: Config,
) -> eyre::Result<()> {
    let hasher = Argon2Hasher::new(&config.hashing)
        .map_err(|e| eyre::eyre!("Invalid password hashing parameters: {}", e))?;
    let data = UserDataAccess::new(store, executor, config.retry.clone());
    let service = UserService::new(data, Arc::new(hasher));
    let auth = JwtAuth::new(&config.jwt);

    let routes = Router::new()
        .merge(handlers::router(service.clone(), auth))
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(metrics_middleware));
    let router = create_router(routes, config.request_timeout);

    let grpc_addr = config
        .grpc
        .socket_addr()
        .wrap_err("Invalid gRPC listener address")?;

    let shutdown = ShutdownCoordinator::new();
    let signal_listener = shutdown.clone();
    tokio::spawn(async move { signal_listener.wait_for_signal().await });

    let http = {
        let shutdown = shutdown.clone();
        async move {
            create_app(router, &config.server, shutdown)
                .await
                .wrap_err("HTTP server failed")
        }
    };

    // No bearer-token gate on this surface
    let grpc = {
        let shutdown = shutdown.clone();
        let grpc_service = handlers::UserGrpcService::new(service).into_server();
        async move {
            info!("gRPC server starting on {}", grpc_addr);
            Server::builder()
                .add_service(grpc_service)
                .serve_with_shutdown(grpc_addr, async move { shutdown.wait_for_shutdown().await })
                .await
                .wrap_err("gRPC server failed")?;
            info!("gRPC server stopped");
            Ok::<(), eyre::Report>(())
        }
    };

    tokio::try_join!(http, grpc)?;

    info!("Users API shutdown complete");
    Ok(())
}
