use crate::application_port::{AuthError, CredentialHasher};
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use tracing::warn;

/// bcrypt only looks at the first 72 bytes of its input.
pub const BCRYPT_MAX_SECRET_LEN: usize = 72;
pub const DEFAULT_BCRYPT_COST: u32 = 10;

pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(DEFAULT_BCRYPT_COST)
    }
}

// Both hashers run bcrypt/argon2 on the blocking pool.
#[async_trait::async_trait]
impl CredentialHasher for BcryptHasher {
    async fn hash_secret(&self, secret: &str) -> Result<String, AuthError> {
        if secret.len() > BCRYPT_MAX_SECRET_LEN {
            return Err(AuthError::Hashing(format!(
                "secret is {} bytes, bcrypt accepts at most {}",
                secret.len(),
                BCRYPT_MAX_SECRET_LEN
            )));
        }
        let secret = secret.to_owned();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(secret, cost))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    async fn verify_secret(&self, secret: &str, digest: &str) -> bool {
        let secret = secret.to_owned();
        let digest = digest.to_owned();
        match tokio::task::spawn_blocking(move || bcrypt::verify(secret, &digest)).await {
            Ok(Ok(matches)) => matches,
            Ok(Err(e)) => {
                warn!("bcrypt verify failed: {}", e);
                false
            }
            Err(e) => {
                warn!("bcrypt verify task failed: {}", e);
                false
            }
        }
    }
}

pub struct Argon2Hasher;

#[async_trait::async_trait]
impl CredentialHasher for Argon2Hasher {
    async fn hash_secret(&self, secret: &str) -> Result<String, AuthError> {
        let secret = secret.to_owned();
        tokio::task::spawn_blocking(move || {
            let salt = argon2::password_hash::SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(secret.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| AuthError::Hashing(e.to_string()))
        })
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
    }

    async fn verify_secret(&self, secret: &str, digest: &str) -> bool {
        let secret = secret.to_owned();
        let digest = digest.to_owned();
        let outcome = tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&digest)?;
            Argon2::default().verify_password(secret.as_bytes(), &parsed)
        })
        .await;

        match outcome {
            Ok(Ok(())) => true,
            Ok(Err(argon2::password_hash::Error::Password)) => false,
            Ok(Err(e)) => {
                warn!("argon2 verify failed: {}", e);
                false
            }
            Err(e) => {
                warn!("argon2 verify task failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    // Lowest cost bcrypt accepts, keeps the suite fast.
    fn fast_bcrypt() -> BcryptHasher {
        BcryptHasher::new(4)
    }

    #[tokio::test]
    async fn bcrypt_verifies_its_own_digest() {
        let hasher = fast_bcrypt();
        let digest = hasher.hash_secret("refresh-secret").await.unwrap();

        assert_ne!(digest, "refresh-secret");
        assert!(digest.starts_with("$2"));
        assert!(hasher.verify_secret("refresh-secret", &digest).await);
    }

    #[tokio::test]
    async fn bcrypt_rejects_other_secret() {
        let hasher = fast_bcrypt();
        let digest = hasher.hash_secret("refresh-secret").await.unwrap();

        assert!(!hasher.verify_secret("refresh-secreT", &digest).await);
    }

    #[tokio::test]
    async fn bcrypt_salts_every_digest() {
        let hasher = fast_bcrypt();
        let first = hasher.hash_secret("same").await.unwrap();
        let second = hasher.hash_secret("same").await.unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify_secret("same", &first).await);
        assert!(hasher.verify_secret("same", &second).await);
    }

    #[tokio::test]
    async fn bcrypt_refuses_oversized_secret() {
        let hasher = fast_bcrypt();
        let long = "x".repeat(BCRYPT_MAX_SECRET_LEN + 1);

        let result = hasher.hash_secret(&long).await;
        assert!(matches!(result, Err(AuthError::Hashing(_))));
    }

    #[tokio::test]
    async fn bcrypt_malformed_digest_is_a_mismatch() {
        let hasher = fast_bcrypt();
        assert!(!hasher.verify_secret("anything", "not-a-bcrypt-digest").await);
    }

    #[tokio::test]
    async fn argon2_round_trip() {
        let hasher = Argon2Hasher;
        let digest = hasher.hash_secret("refresh-secret").await.unwrap();

        assert!(digest.starts_with("$argon2"));
        assert!(hasher.verify_secret("refresh-secret", &digest).await);
        assert!(!hasher.verify_secret("other", &digest).await);
        assert!(!hasher.verify_secret("refresh-secret", "garbage").await);
    }

    // Counts how often a sibling future resumes while a hash is in flight.
    // A hash computed inside the poll finishes before the sibling is polled again.
    async fn sibling_resumes_during(hasher: &dyn CredentialHasher) -> usize {
        let done = AtomicBool::new(false);
        let hashing = async {
            let digest = hasher.hash_secret("refresh-secret").await;
            done.store(true, Ordering::SeqCst);
            digest
        };
        let sibling = async {
            let mut resumes = 0;
            loop {
                tokio::task::yield_now().await;
                if done.load(Ordering::SeqCst) {
                    break resumes;
                }
                resumes += 1;
            }
        };

        let (digest, resumes) = tokio::join!(hashing, sibling);
        assert!(digest.is_ok());
        resumes
    }

    #[tokio::test]
    async fn bcrypt_leaves_the_runtime_free_while_hashing() {
        let hasher = BcryptHasher::default();
        assert!(sibling_resumes_during(&hasher).await > 0);
    }

    #[tokio::test]
    async fn argon2_leaves_the_runtime_free_while_hashing() {
        assert!(sibling_resumes_during(&Argon2Hasher).await > 0);
    }
}
