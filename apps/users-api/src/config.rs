use axum_helpers::JwtConfig;
use core_config::{FromEnv, env_parse, grpc::GrpcServerConfig, server::ServerConfig};
use database::RetryPolicy;
use database::postgres::PostgresConfig;
use domain_users::HashingConfig;
use std::time::Duration;

pub use core_config::Environment;

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    pub server: ServerConfig,
    pub grpc: GrpcServerConfig,
    /// `None` when `DATABASE_URL` is unset: users are kept in memory
    pub database: Option<PostgresConfig>,
    pub retry: RetryPolicy,
    pub jwt: JwtConfig,
    pub hashing: HashingConfig,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // Uses defaults: HOST=0.0.0.0, PORT=8080
        let grpc = GrpcServerConfig::from_env()?; // Uses defaults: GRPC_HOST=0.0.0.0, GRPC_PORT=50051
        let database = match std::env::var("DATABASE_URL") {
            Ok(_) => Some(PostgresConfig::from_env()?),
            Err(_) => None,
        };
        let retry = RetryPolicy::from_env()?;
        let jwt = JwtConfig::from_env()?; // Required - will fail if JWT_SECRET is not set
        let hashing = HashingConfig::from_env()?;
        let request_timeout = Duration::from_secs(env_parse("REQUEST_TIMEOUT_SECS", "30")?);

        Ok(Self {
            environment,
            server,
            grpc,
            database,
            retry,
            jwt,
            hashing,
            request_timeout,
        })
    }
}
