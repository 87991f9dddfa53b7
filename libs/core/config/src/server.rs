use crate::{env_or_default, env_parse, invalid_value, ConfigError, FromEnv};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Listener configuration for the HTTP surface
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn new(host: String, port: u16) -> Self {
        Self { host, port }
    }

    /// Get the server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resolve the listener address; `host` must be an IP literal.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        socket_addr("HOST", &self.host, self.port)
    }
}

/// Joins an IP literal and a port, naming `key` when the host is not an IP.
pub(crate) fn socket_addr(key: &str, host: &str, port: u16) -> Result<SocketAddr, ConfigError> {
    host.parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, port))
        .map_err(|e| invalid_value(key, format!("'{}' is not an IP address: {}", host, e)))
}

impl FromEnv for ServerConfig {
    /// Reads from environment variables:
    /// - HOST: defaults to 0.0.0.0 (all interfaces)
    /// - PORT: defaults to 8080
    fn from_env() -> Result<Self, ConfigError> {
        let host = env_or_default("HOST", &Ipv4Addr::UNSPECIFIED.to_string());
        let port = env_parse("PORT", "8080")?;

        Ok(Self { host, port })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::UNSPECIFIED.to_string(),
            port: 8080,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_defaults() {
        temp_env::with_vars([("HOST", None::<&str>), ("PORT", None::<&str>)], || {
            let config = ServerConfig::from_env().unwrap();
            assert_eq!(config.address(), "0.0.0.0:8080");
        });
    }

    #[test]
    fn test_server_config_overrides() {
        temp_env::with_vars(
            [("HOST", Some("127.0.0.1")), ("PORT", Some("3000"))],
            || {
                let config = ServerConfig::from_env().unwrap();
                assert_eq!(config.host, "127.0.0.1");
                assert_eq!(config.port, 3000);
            },
        );
    }

    #[test]
    fn test_server_config_rejects_bad_port() {
        for port in ["not_a_number", "99999"] {
            temp_env::with_var("PORT", Some(port), || {
                let err = ServerConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("PORT"), "{port}");
            });
        }
    }

    #[test]
    fn test_socket_addr_from_ip_literal() {
        let config = ServerConfig::new("::1".to_string(), 9000);
        assert_eq!(
            config.socket_addr().unwrap(),
            "[::1]:9000".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_socket_addr_rejects_hostname() {
        let err = ServerConfig::new("localhost".to_string(), 8080)
            .socket_addr()
            .unwrap_err();
        assert!(err.to_string().contains("HOST"));
    }
}
