//! Password hashing.

use crate::{Result, ServiceError};

/// Hashes and verifies user passwords.
pub trait PasswordManager: Send + Sync {
    fn hash(&self, password: &str) -> Result<String>;

    /// Returns true if `password` matches `hash`.
    fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

/// bcrypt-based password manager.
#[derive(Debug, Clone)]
pub struct BcryptPasswordManager {
    cost: u32,
}

impl BcryptPasswordManager {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptPasswordManager {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordManager for BcryptPasswordManager {
    fn hash(&self, password: &str) -> Result<String> {
        bcrypt::hash(password, self.cost).map_err(|e| ServiceError::PasswordHashing(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        bcrypt::verify(password, hash).map_err(|e| ServiceError::PasswordHashing(e.to_string()))
    }
}

/// Reversible stand-in for tests: the "hash" is the password with a prefix.
#[derive(Debug, Clone, Default)]
pub struct PlainPasswordManager;

impl PlainPasswordManager {
    const PREFIX: &'static str = "plain$";
}

impl PasswordManager for PlainPasswordManager {
    fn hash(&self, password: &str) -> Result<String> {
        Ok(format!("{}{}", Self::PREFIX, password))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        Ok(hash.strip_prefix(Self::PREFIX) == Some(password))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bcrypt_round_trip() {
        let manager = BcryptPasswordManager::new(4);
        let hash = manager.hash("Passw0rd1").unwrap();

        assert_ne!(hash, "Passw0rd1");
        assert!(manager.verify("Passw0rd1", &hash).unwrap());
        assert!(!manager.verify("Passw0rd2", &hash).unwrap());
    }

    #[test]
    fn bcrypt_rejects_garbage_hash() {
        let manager = BcryptPasswordManager::new(4);
        assert!(manager.verify("Passw0rd1", "not-a-hash").is_err());
    }

    #[test]
    fn plain_manager_verifies_its_own_hashes() {
        let manager = PlainPasswordManager;
        let hash = manager.hash("Passw0rd1").unwrap();
        assert!(manager.verify("Passw0rd1", &hash).unwrap());
        assert!(!manager.verify("other", &hash).unwrap());
    }
}
