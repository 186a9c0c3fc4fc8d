//! Bearer token issuance and verification.
//!
//! Tokens are HS256 JWTs carrying `{id, RUT, rol, iat, exp}`. The login
//! service signs them and the gateway verifies them with the same secret.

use std::time::Duration;

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    get_current_timestamp,
};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::config::AuthConfig;

/// Claims embedded in every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Internal user id
    pub id: i64,
    /// Login identifier
    #[serde(rename = "RUT")]
    pub rut: String,
    /// Role
    pub rol: String,
    /// Issued at (Unix seconds)
    pub iat: u64,
    /// Expiry (Unix seconds)
    pub exp: u64,
}

/// The user fields a token is issued for.
#[derive(Debug, Clone, Copy)]
pub struct Subject<'a> {
    /// Internal user id
    pub id: i64,
    /// Login identifier
    pub rut: &'a str,
    /// Role
    pub rol: &'a str,
}

/// Signs tokens for authenticated users.
pub struct TokenIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Create an issuer from a shared secret
    #[must_use]
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Create an issuer using the configured lifetime
    #[must_use]
    pub fn from_config(secret: &str, config: &AuthConfig) -> Self {
        Self::new(secret, config.token_ttl)
    }

    /// Sign a token valid from now until now + ttl
    pub fn issue(&self, subject: Subject<'_>) -> Result<String> {
        self.issue_at(subject, get_current_timestamp())
    }

    /// Sign a token as if issued at `now` (Unix seconds)
    pub fn issue_at(&self, subject: Subject<'_>, now: u64) -> Result<String> {
        let claims = Claims {
            id: subject.id,
            rut: subject.rut.to_string(),
            rol: subject.rol.to_string(),
            iat: now,
            exp: now + self.ttl.as_secs(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.key)?)
    }
}

/// Checks token signatures and expiry.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("leeway", &self.validation.leeway)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    /// Create a verifier from a shared secret
    #[must_use]
    pub fn new(secret: &str, leeway: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = leeway.as_secs();
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Create a verifier using the configured leeway
    #[must_use]
    pub fn from_config(secret: &str, config: &AuthConfig) -> Self {
        Self::new(secret, config.leeway)
    }

    /// Decode and validate a token
    pub fn verify(&self, token: &str) -> Result<Claims> {
        Ok(decode::<Claims>(token, &self.key, &self.validation)?.claims)
    }
}
