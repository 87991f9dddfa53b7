use crate::{env_or_default, env_parse, ConfigError, FromEnv};
use std::net::{Ipv4Addr, SocketAddr};

/// Listener configuration for the gRPC surface
#[derive(Clone, Debug)]
pub struct GrpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl GrpcServerConfig {
    pub fn new(host: String, port: u16) -> Self {
        Self { host, port }
    }

    /// Get the server address as "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Resolve the listener address; `host` must be an IP literal.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        crate::server::socket_addr("GRPC_HOST", &self.host, self.port)
    }
}

impl FromEnv for GrpcServerConfig {
    /// Reads from environment variables:
    /// - GRPC_HOST: defaults to 0.0.0.0
    /// - GRPC_PORT: defaults to 50051
    fn from_env() -> Result<Self, ConfigError> {
        let host = env_or_default("GRPC_HOST", &Ipv4Addr::UNSPECIFIED.to_string());
        let port = env_parse("GRPC_PORT", "50051")?;

        Ok(Self { host, port })
    }
}

impl Default for GrpcServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::UNSPECIFIED.to_string(),
            port: 50051,
        }
    }
}
