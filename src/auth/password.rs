//! Password hashing and verification using Argon2
//!
//! Uses the argon2id variant with default parameters. Hashes are stored in
//! PHC string format so salt and parameters travel with the hash.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::types::FraError;

/// Minimum accepted password length at registration
pub const MIN_PASSWORD_LEN: usize = 8;

/// Hash a password using Argon2id
pub fn hash_password(password: &str) -> Result<String, FraError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| FraError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a stored hash
///
/// A stored hash that is not valid PHC is an error, not a mismatch.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, FraError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| FraError::Internal(format!("Invalid password hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("admin123").unwrap();

        assert!(hash.starts_with("$argon2id"));
        assert!(verify_password("admin123", &hash).unwrap());
        assert!(!verify_password("admin124", &hash).unwrap());
    }

    #[test]
    fn test_salted() {
        let hash1 = hash_password("forest-officer").unwrap();
        let hash2 = hash_password("forest-officer").unwrap();

        assert_ne!(hash1, hash2);
        assert!(verify_password("forest-officer", &hash1).unwrap());
        assert!(verify_password("forest-officer", &hash2).unwrap());
    }

    #[test]
    fn test_invalid_hash_format() {
        assert!(verify_password("password", "plain-text-password").is_err());
    }
}
