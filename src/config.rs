//! Configuration for token issuance and password handling.
//!
//! # Example
//!
//! ```rust
//! use authgate::config::{AuthGateConfig, TokenConfig};
//! use chrono::Duration;
//!
//! let config = AuthGateConfig {
//!     tokens: TokenConfig {
//!         access_token_expiry: Duration::hours(1),
//!     },
//!     ..Default::default()
//! };
//! assert_eq!(config.token_length, 32);
//! ```

use chrono::Duration;

use crate::crypto::Argon2Hasher;
use crate::validators::PasswordPolicy;

/// Top-level configuration shared by the token action and the user endpoints.
#[derive(Debug, Clone)]
pub struct AuthGateConfig {
    pub tokens: TokenConfig,

    pub password: PasswordConfig,

    /// Length of generated access tokens, in characters.
    pub token_length: usize,
}

impl Default for AuthGateConfig {
    fn default() -> Self {
        Self {
            tokens: TokenConfig::default(),
            password: PasswordConfig::default(),
            token_length: 32,
        }
    }
}

impl AuthGateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Long-lived tokens and cheap hashing, for local work and tests.
    pub fn development() -> Self {
        Self {
            tokens: TokenConfig {
                access_token_expiry: Duration::days(30),
            },
            password: PasswordConfig {
                memory_cost: 4096,
                time_cost: 1,
                parallelism: 1,
                min_length: 8,
            },
            token_length: 32,
        }
    }

    /// Short token lifetimes and OWASP-grade argon2 parameters.
    pub fn strict() -> Self {
        Self {
            tokens: TokenConfig {
                access_token_expiry: Duration::hours(1),
            },
            password: PasswordConfig {
                memory_cost: 65536,
                time_cost: 3,
                parallelism: 4,
                min_length: 12,
            },
            token_length: 48,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// How long access tokens remain valid after creation.
    ///
    /// Default: 7 days
    pub access_token_expiry: Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_token_expiry: Duration::days(7),
        }
    }
}

/// Argon2 parameters and the minimum accepted password length.
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    pub time_cost: u32,
    pub parallelism: u32,
    pub min_length: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_cost: 19456,
            time_cost: 2,
            parallelism: 1,
            min_length: 8,
        }
    }
}

impl PasswordConfig {
    pub fn hasher(&self) -> Argon2Hasher {
        Argon2Hasher::new(self.memory_cost, self.time_cost, self.parallelism)
    }

    pub fn policy(&self) -> PasswordPolicy {
        PasswordPolicy::default().min(self.min_length)
    }
}
