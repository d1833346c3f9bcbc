use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    /// The stored hash could not be parsed. This means corrupt data, not a
    /// wrong password.
    #[error("malformed password hash: {0}")]
    MalformedHash(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("credential task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Hashes and verifies passwords with Argon2id.
///
/// Every hash gets a fresh salt from the OS RNG, so hashing the same password
/// twice yields two different PHC strings that both verify.
#[derive(Clone)]
pub struct CredentialService {
    argon2: Argon2<'static>,
}

impl Default for CredentialService {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialService")
            .field("algorithm", &Algorithm::Argon2id)
            .finish()
    }
}

impl CredentialService {
    /// Fixed cost parameters (Argon2id, 19 MiB, 2 passes, 1 lane).
    pub fn new() -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default()),
        }
    }

    /// Hash a password into a PHC string.
    pub fn hash(&self, plaintext: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| CredentialError::Hashing(e.to_string()))
    }

    /// Check a password against a stored hash.
    ///
    /// Returns `Ok(false)` for any mismatch; only an unparseable hash is an
    /// error.
    pub fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, CredentialError> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| CredentialError::MalformedHash(e.to_string()))?;

        match self.argon2.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(CredentialError::MalformedHash(e.to_string())),
        }
    }

    /// [`hash`](Self::hash) on the blocking pool.
    pub async fn hash_async(&self, plaintext: String) -> Result<String, CredentialError> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.hash(&plaintext)).await?
    }

    /// [`verify`](Self::verify) on the blocking pool.
    pub async fn verify_async(
        &self,
        plaintext: String,
        hash: String,
    ) -> Result<bool, CredentialError> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.verify(&plaintext, &hash)).await?
    }
}
