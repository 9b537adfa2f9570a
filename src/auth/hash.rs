//! Password hashing

use crate::error::Result;

/// bcrypt wrapper with a configurable work factor
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a plaintext password into a salted bcrypt digest
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        Ok(bcrypt::hash(plaintext, self.cost)?)
    }

    /// Check a plaintext password against a digest.
    ///
    /// A malformed digest is a failed match, not an error.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        match bcrypt::verify(plaintext, digest) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::debug!("Password digest rejected: {}", e);
                false
            }
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(4)
    }

    #[test]
    fn test_hash_differs_from_plaintext() {
        let digest = hasher().hash("hunter22").unwrap();
        assert_ne!(digest, "hunter22");
        assert!(digest.starts_with("$2"));
    }

    #[test]
    fn test_verify_matching_password() {
        let h = hasher();
        let digest = h.hash("correct horse").unwrap();
        assert!(h.verify("correct horse", &digest));
        assert!(!h.verify("correct hors", &digest));
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let h = hasher();
        let a = h.hash("repeat").unwrap();
        let b = h.hash("repeat").unwrap();
        assert_ne!(a, b);
        assert!(h.verify("repeat", &a));
        assert!(h.verify("repeat", &b));
    }

    #[test]
    fn test_malformed_digest_fails_verification() {
        assert!(!hasher().verify("anything", "not-a-bcrypt-digest"));
        assert!(!hasher().verify("anything", ""));
    }
}
