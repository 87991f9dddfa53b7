use sea_orm::ConnectOptions;
use std::fmt;
use std::time::Duration;
use tracing::log::LevelFilter;

#[cfg(feature = "config")]
use core_config::{env_parse, env_required, invalid_value, ConfigError, FromEnv};

/// PostgreSQL connection and pool settings.
///
/// `Debug` output masks the password part of the URL, so the config can be
/// logged at startup.
///
/// ```ignore
/// let config = PostgresConfig::new("postgresql://users:secret@db/users").with_pool_size(10, 1);
/// let db = connect_with_retry(config, &executor, &policy).await?;
/// ```
#[derive(Clone)]
pub struct PostgresConfig {
    url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    /// How long a caller waits for a free pooled connection
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
    /// Log every statement at `info`
    pub log_statements: bool,
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(300),
            max_lifetime: Duration::from_secs(1800),
            log_statements: false,
        }
    }

    pub fn with_pool_size(mut self, max_connections: u32, min_connections: u32) -> Self {
        self.max_connections = max_connections;
        self.min_connections = min_connections;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The URL with any password replaced by `***`
    pub fn redacted_url(&self) -> String {
        let Some((scheme, rest)) = self.url.split_once("://") else {
            return self.url.clone();
        };
        let Some((userinfo, host)) = rest.rsplit_once('@') else {
            return self.url.clone();
        };
        match userinfo.split_once(':') {
            Some((user, _)) => format!("{}://{}:***@{}", scheme, user, host),
            None => self.url.clone(),
        }
    }

    pub fn into_connect_options(self) -> ConnectOptions {
        let mut opt = ConnectOptions::new(self.url);
        opt.max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(self.connect_timeout)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(self.max_lifetime)
            .sqlx_logging(self.log_statements)
            .sqlx_logging_level(LevelFilter::Info);
        opt
    }
}

impl fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("url", &self.redacted_url())
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("connect_timeout", &self.connect_timeout)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("idle_timeout", &self.idle_timeout)
            .field("max_lifetime", &self.max_lifetime)
            .field("log_statements", &self.log_statements)
            .finish()
    }
}

/// Environment variables:
/// - `DATABASE_URL` (required)
/// - `DB_MAX_CONNECTIONS` (10), `DB_MIN_CONNECTIONS` (1)
/// - `DB_CONNECT_TIMEOUT_SECS` (5), `DB_ACQUIRE_TIMEOUT_SECS` (5)
/// - `DB_IDLE_TIMEOUT_SECS` (300), `DB_MAX_LIFETIME_SECS` (1800)
/// - `DB_LOG_STATEMENTS` (false)
#[cfg(feature = "config")]
impl FromEnv for PostgresConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secs = |key: &str, default: &str| env_parse::<u64>(key, default).map(Duration::from_secs);

        let config = Self {
            url: env_required("DATABASE_URL")?,
            max_connections: env_parse("DB_MAX_CONNECTIONS", "10")?,
            min_connections: env_parse("DB_MIN_CONNECTIONS", "1")?,
            connect_timeout: secs("DB_CONNECT_TIMEOUT_SECS", "5")?,
            acquire_timeout: secs("DB_ACQUIRE_TIMEOUT_SECS", "5")?,
            idle_timeout: secs("DB_IDLE_TIMEOUT_SECS", "300")?,
            max_lifetime: secs("DB_MAX_LIFETIME_SECS", "1800")?,
            log_statements: env_parse("DB_LOG_STATEMENTS", "false")?,
        };

        if config.max_connections == 0 {
            return Err(invalid_value("DB_MAX_CONNECTIONS", "must be at least 1"));
        }
        if config.min_connections > config.max_connections {
            return Err(invalid_value(
                "DB_MIN_CONNECTIONS",
                format!("must not exceed DB_MAX_CONNECTIONS ({})", config.max_connections),
            ));
        }

        Ok(config)
    }
}
