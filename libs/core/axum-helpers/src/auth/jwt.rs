use super::config::JwtConfig;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String, // Subject (user ID)
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
    pub jti: String, // JWT ID
}

/// Stateless HS256 token issuer and verifier
#[derive(Clone)]
pub struct JwtAuth {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    ttl_secs: i64,
}

impl JwtAuth {
    /// # Example
    /// ```ignore
    /// use axum_helpers::{JwtAuth, JwtConfig};
    /// use core_config::FromEnv;
    ///
    /// let auth = JwtAuth::new(&JwtConfig::from_env()?);
    /// let token = auth.issue("42")?;
    /// ```
    pub fn new(config: &JwtConfig) -> Self {
        tracing::info!(ttl_secs = config.ttl_secs, "JWT auth initialized");
        Self {
            encoding_key: Arc::new(EncodingKey::from_secret(config.secret.as_bytes())),
            decoding_key: Arc::new(DecodingKey::from_secret(config.secret.as_bytes())),
            ttl_secs: config.ttl_secs,
        }
    }

    /// Issue a signed token for `subject` that expires after the configured TTL
    pub fn issue(&self, subject: &str) -> eyre::Result<String> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: subject.to_string(),
            exp: (now + Duration::seconds(self.ttl_secs)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let header = Header::new(Algorithm::HS256);
        let token = encode(&header, &claims, &self.encoding_key)?;

        Ok(token)
    }

    /// Verify signature and expiry, returning the decoded claims
    pub fn verify(&self, token: &str) -> eyre::Result<JwtClaims> {
        let validation = Validation::new(Algorithm::HS256);
        let token_data = decode::<JwtClaims>(token, &self.decoding_key, &validation)?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_with_ttl(ttl_secs: i64) -> JwtAuth {
        let config = JwtConfig::new("test-secret-that-is-long-enough-for-hs256")
            .unwrap()
            .with_ttl_secs(ttl_secs);
        JwtAuth::new(&config)
    }

    #[test]
    fn test_issue_then_verify_returns_subject() {
        let auth = auth_with_ttl(3600);
        let token = auth.issue("42").unwrap();

        let claims = auth.verify(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // Beyond the default 60s leeway.
        let auth = auth_with_ttl(-120);
        let token = auth.issue("42").unwrap();

        assert!(auth.verify(&token).is_err());
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let other = JwtAuth::new(
            &JwtConfig::new("another-secret-that-is-long-enough-too").unwrap(),
        );
        let token = other.issue("42").unwrap();

        assert!(auth_with_ttl(3600).verify(&token).is_err());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(auth_with_ttl(3600).verify("not.a.jwt").is_err());
    }
}
