//! Comparison of submitted secrets with stored ones
//!
//! `bcrypt` is the default. `plaintext` exists only for stores that still
//! keep secrets unhashed; migrate them with `clinic-gateway hash-password`.

use subtle::ConstantTimeEq;
use tracing::error;

use crate::config::PasswordScheme;
use crate::{Error, Result};

/// Checks submitted secrets against stored values
#[derive(Debug, Clone, Copy)]
pub struct PasswordVerifier {
    scheme: PasswordScheme,
}

impl PasswordVerifier {
    /// Create a verifier for `scheme`
    #[must_use]
    pub fn new(scheme: PasswordScheme) -> Self {
        Self { scheme }
    }

    /// The configured scheme
    #[must_use]
    pub fn scheme(&self) -> PasswordScheme {
        self.scheme
    }

    /// Whether `submitted` matches `stored`.
    ///
    /// Bcrypt runs on the blocking pool. A stored value that is not a bcrypt
    /// hash is an error, not a mismatch.
    pub async fn verify(&self, submitted: &str, stored: &str) -> Result<bool> {
        match self.scheme {
            PasswordScheme::Plaintext => Ok(submitted.as_bytes().ct_eq(stored.as_bytes()).into()),
            PasswordScheme::Bcrypt => {
                let submitted = submitted.to_string();
                let stored = stored.to_string();
                tokio::task::spawn_blocking(move || bcrypt::verify(submitted, &stored))
                    .await
                    .map_err(|e| Error::Internal(format!("Task join error: {e}")))?
                    .map_err(|e| {
                        error!(
                            error = %e,
                            "Stored secret is not a bcrypt hash; use password_scheme = plaintext for legacy stores"
                        );
                        Error::from(e)
                    })
            }
        }
    }
}

/// Hash a secret with bcrypt for storage
pub async fn hash_password(secret: &str, cost: u32) -> Result<String> {
    let secret = secret.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(secret, cost))
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {e}")))?
        .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Lowest cost bcrypt accepts; keeps tests fast
    const TEST_COST: u32 = 4;

    #[tokio::test]
    async fn test_plaintext_equality() {
        let verifier = PasswordVerifier::new(PasswordScheme::Plaintext);
        assert!(verifier.verify("correct", "correct").await.unwrap());
        assert!(!verifier.verify("wrong", "correct").await.unwrap());
        assert!(!verifier.verify("correct ", "correct").await.unwrap());
        assert!(!verifier.verify("", "correct").await.unwrap());
    }

    #[tokio::test]
    async fn test_bcrypt_roundtrip() {
        let stored = hash_password("correct", TEST_COST).await.unwrap();
        assert!(stored.starts_with("$2"));

        let verifier = PasswordVerifier::new(PasswordScheme::Bcrypt);
        assert!(verifier.verify("correct", &stored).await.unwrap());
        assert!(!verifier.verify("wrong", &stored).await.unwrap());
    }

    #[tokio::test]
    async fn test_bcrypt_rejects_plaintext_store() {
        let verifier = PasswordVerifier::new(PasswordScheme::Bcrypt);
        let err = verifier.verify("correct", "correct").await.unwrap_err();
        assert!(matches!(err, Error::Password(_)));
    }
}
