//! Password hashing

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use sa_core::SaError;

/// Hash a plaintext password into a PHC string
pub fn hash_password(plaintext: &str) -> Result<String, SaError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| SaError::Internal(format!("password hashing failed: {}", e)))
}

#[cfg(test)]
pub(crate) fn verify_password(plaintext: &str, stored_hash: &str) -> bool {
    use argon2::password_hash::{PasswordHash, PasswordVerifier};

    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cret!").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret!", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cret!", "not-a-hash"));
    }
}
