/// Password hashing collaborator (Argon2id)
use crate::{
    config::PasswordConfig,
    error::{AdminError, AdminResult},
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use async_trait::async_trait;

/// Hash and compare secrets
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, secret: &str) -> AdminResult<String>;

    async fn verify(&self, secret: &str, digest: &str) -> AdminResult<bool>;
}

/// Argon2id hasher; work runs on the blocking pool
#[derive(Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    pub fn new(memory_kib: u32, iterations: u32) -> AdminResult<Self> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| AdminError::Validation(format!("Invalid hashing parameters: {}", e)))?;

        Ok(Self { params })
    }

    pub fn from_config(config: &PasswordConfig) -> AdminResult<Self> {
        Self::new(config.memory_kib, config.iterations)
    }

    fn argon2(params: Params) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    }
}

#[async_trait]
impl PasswordHasher for Argon2Hasher {
    async fn hash(&self, secret: &str) -> AdminResult<String> {
        let params = self.params.clone();
        let secret = secret.to_owned();

        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Self::argon2(params)
                .hash_password(secret.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| AdminError::Hashing(format!("Password hashing failed: {}", e)))
        })
        .await
        .map_err(|e| AdminError::Internal(format!("Hashing task failed: {}", e)))?
    }

    async fn verify(&self, secret: &str, digest: &str) -> AdminResult<bool> {
        let params = self.params.clone();
        let secret = secret.to_owned();
        let digest = digest.to_owned();

        tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&digest)
                .map_err(|e| AdminError::Hashing(format!("Stored hash is malformed: {}", e)))?;

            match Self::argon2(params).verify_password(secret.as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(e) => Err(AdminError::Hashing(format!(
                    "Password verification failed: {}",
                    e
                ))),
            }
        })
        .await
        .map_err(|e| AdminError::Internal(format!("Hashing task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hasher = Argon2Hasher::new(8, 1).unwrap();

        let digest = hasher.hash("ADMIN-AB3X9KPQ").await.unwrap();
        assert!(digest.starts_with("$argon2id$"));

        assert!(hasher.verify("ADMIN-AB3X9KPQ", &digest).await.unwrap());
        assert!(!hasher.verify("ADMIN-AB3X9KPZ", &digest).await.unwrap());
    }

    #[tokio::test]
    async fn test_hashes_are_salted() {
        let hasher = Argon2Hasher::new(8, 1).unwrap();

        let a = hasher.hash("same secret").await.unwrap();
        let b = hasher.hash("same secret").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_malformed_digest_is_an_error() {
        let hasher = Argon2Hasher::new(8, 1).unwrap();
        assert!(matches!(
            hasher.verify("secret", "not-a-hash").await,
            Err(AdminError::Hashing(_))
        ));
    }

    #[test]
    fn test_invalid_params_rejected() {
        assert!(Argon2Hasher::new(1, 1).is_err());
    }
}
