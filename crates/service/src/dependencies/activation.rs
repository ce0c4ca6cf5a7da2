//! Activation codes: generation and storage.

use common::Username;
use dashmap::DashMap;
use rand::Rng;

/// Creates the codes users type in to activate their account.
pub trait ActivationCodeGenerator: Send + Sync {
    fn create_code(&self) -> String;
}

/// Uniformly random 8-digit codes.
#[derive(Debug, Clone, Default)]
pub struct RandomActivationCodeGenerator;

impl ActivationCodeGenerator for RandomActivationCodeGenerator {
    fn create_code(&self) -> String {
        rand::thread_rng()
            .gen_range(10_000_000..100_000_000u32)
            .to_string()
    }
}

/// Always produces the same code.
#[derive(Debug, Clone)]
pub struct FixedActivationCodeGenerator {
    code: String,
}

impl FixedActivationCodeGenerator {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

impl ActivationCodeGenerator for FixedActivationCodeGenerator {
    fn create_code(&self) -> String {
        self.code.clone()
    }
}

/// Remembers the activation code most recently issued to each user.
pub trait ActivationCodeStorage: Send + Sync {
    fn get(&self, username: &Username) -> Option<String>;

    /// Stores `code`, replacing any earlier code of the user.
    fn save(&self, username: &Username, code: &str);

    fn remove(&self, username: &Username) -> Option<String>;
}

/// Concurrent in-process code storage.
#[derive(Debug, Default)]
pub struct InMemoryActivationCodeStorage {
    codes: DashMap<Username, String>,
}

impl InMemoryActivationCodeStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ActivationCodeStorage for InMemoryActivationCodeStorage {
    fn get(&self, username: &Username) -> Option<String> {
        self.codes.get(username).map(|code| code.value().clone())
    }

    fn save(&self, username: &Username, code: &str) {
        self.codes.insert(username.clone(), code.to_string());
    }

    fn remove(&self, username: &Username) -> Option<String> {
        self.codes.remove(username).map(|(_, code)| code)
    }
}
