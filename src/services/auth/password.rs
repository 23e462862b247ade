use std::sync::OnceLock;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    Hash(String),
    #[error("stored password hash is not a valid PHC string")]
    InvalidHash,
    #[error("password mismatch")]
    Mismatch,
}

/// Hash a password with Argon2id and a random salt (PHC string).
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<(), PasswordError> {
    let parsed = PasswordHash::new(password_hash).map_err(|_| PasswordError::InvalidHash)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|err| {
            tracing::trace!(error = %err, "password verification failed");
            PasswordError::Mismatch
        })
}

/// Hash of a throwaway password, computed once. Verified against for logins of
/// unknown users so they cost one Argon2 run like a wrong password does.
fn unknown_user_hash() -> Option<&'static str> {
    static HASH: OnceLock<Option<String>> = OnceLock::new();
    HASH.get_or_init(|| hash_password("qa-user-service:unknown-user").ok())
        .as_deref()
}

/// Spend one Argon2 verification for a username with no account. Never succeeds.
pub fn verify_unknown_user(password: &str) -> PasswordError {
    let Some(hash) = unknown_user_hash() else {
        return PasswordError::Mismatch;
    };
    match verify_password(password, hash) {
        Err(PasswordError::InvalidHash) => PasswordError::InvalidHash,
        _ => PasswordError::Mismatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("correct horse").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("battery staple", &hash),
            Err(PasswordError::Mismatch)
        ));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_hash_is_reported() {
        assert!(matches!(
            verify_password("pw", "not_a_phc_string"),
            Err(PasswordError::InvalidHash)
        ));
    }

    #[test]
    fn unknown_user_runs_a_real_verification() {
        let hash = unknown_user_hash().unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(PasswordHash::new(hash).is_ok());

        // Mismatch (not InvalidHash) means Argon2 actually ran against the hash.
        assert!(matches!(
            verify_unknown_user("whatever"),
            PasswordError::Mismatch
        ));
        assert!(matches!(
            verify_unknown_user("qa-user-service:unknown-user"),
            PasswordError::Mismatch
        ));
    }
}
