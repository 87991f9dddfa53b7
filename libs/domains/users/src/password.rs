//! One-way password digests.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use core_config::{ConfigError, FromEnv, env_parse, invalid_value};

use crate::error::{UserError, UserResult};

/// Hashing collaborator used by [`crate::UserService`]
pub trait PasswordHashing: Send + Sync {
    /// Produce a salted, self-describing digest of `plaintext`
    fn hash(&self, plaintext: &str) -> UserResult<String>;

    /// Constant-time check of `plaintext` against `digest`.
    /// A malformed digest never matches.
    fn verify(&self, digest: &str, plaintext: &str) -> bool;
}

/// Argon2id work factor.
///
/// Loaded from environment variables:
/// - `PASSWORD_HASH_MEMORY_KIB` (default: 19456)
/// - `PASSWORD_HASH_ITERATIONS` (default: 2)
/// - `PASSWORD_HASH_PARALLELISM` (default: 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl HashingConfig {
    pub fn params(&self) -> Result<Params, argon2::Error> {
        Params::new(self.memory_kib, self.iterations, self.parallelism, None)
    }
}

impl FromEnv for HashingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            memory_kib: env_parse("PASSWORD_HASH_MEMORY_KIB", &Params::DEFAULT_M_COST.to_string())?,
            iterations: env_parse("PASSWORD_HASH_ITERATIONS", &Params::DEFAULT_T_COST.to_string())?,
            parallelism: env_parse(
                "PASSWORD_HASH_PARALLELISM",
                &Params::DEFAULT_P_COST.to_string(),
            )?,
        };

        config
            .params()
            .map_err(|e| invalid_value("PASSWORD_HASH_*", e.to_string()))?;

        Ok(config)
    }
}

/// Argon2id hasher producing PHC strings
#[derive(Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    pub fn new(config: &HashingConfig) -> Result<Self, argon2::Error> {
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, config.params()?),
        })
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
        }
    }
}

impl std::fmt::Debug for Argon2Hasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2Hasher").finish_non_exhaustive()
    }
}

impl PasswordHashing for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> UserResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| UserError::PasswordHash(e.to_string()))
    }

    fn verify(&self, digest: &str, plaintext: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(digest) else {
            tracing::warn!("Stored password digest is not a valid PHC string");
            return false;
        };

        self.argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok()
    }
}

/// Minimal work factor for unit tests
#[cfg(test)]
pub(crate) fn fast_hasher() -> Argon2Hasher {
    Argon2Hasher::new(&HashingConfig {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    })
    .expect("valid argon2 test params")
}
