//! Collaborators the handlers are bound to.
//!
//! Each concern has a trait, a production implementation and, where tests
//! need to observe or steer it, a fake.

mod activation;
mod ids;
mod notificator;
mod password;
mod token;

use std::sync::Arc;

pub use activation::{
    ActivationCodeGenerator, ActivationCodeStorage, FixedActivationCodeGenerator,
    InMemoryActivationCodeStorage, RandomActivationCodeGenerator,
};
pub use ids::{IdGenerator, SequentialIdGenerator, UuidGenerator};
pub use notificator::{LoggingNotificator, Notificator, RecordingNotificator, SentNotification};
pub use password::{BcryptPasswordManager, PasswordManager, PlainPasswordManager};
pub use token::{JwtTokenManager, TokenManager};

use crate::config::Config;

/// The set of collaborators handed to [`bootstrap`](crate::bootstrap::bootstrap).
#[derive(Clone)]
pub struct Dependencies {
    pub password_manager: Arc<dyn PasswordManager>,
    pub token_manager: Arc<dyn TokenManager>,
    pub notificator: Arc<dyn Notificator>,
    pub id_generator: Arc<dyn IdGenerator>,
    pub code_generator: Arc<dyn ActivationCodeGenerator>,
    pub code_storage: Arc<dyn ActivationCodeStorage>,
}

impl Dependencies {
    /// Real implementations configured from `config`.
    pub fn production(config: &Config) -> Self {
        Self {
            password_manager: Arc::new(BcryptPasswordManager::new(config.bcrypt_cost)),
            token_manager: Arc::new(JwtTokenManager::new(&config.secret_key)),
            notificator: Arc::new(LoggingNotificator),
            id_generator: Arc::new(UuidGenerator),
            code_generator: Arc::new(RandomActivationCodeGenerator),
            code_storage: Arc::new(InMemoryActivationCodeStorage::new()),
        }
    }

    /// Fast, deterministic implementations for tests.
    ///
    /// Tokens are still real JWTs signed with a fixed secret.
    pub fn fake() -> Self {
        Self {
            password_manager: Arc::new(PlainPasswordManager),
            token_manager: Arc::new(JwtTokenManager::new("test-secret")),
            notificator: Arc::new(RecordingNotificator::new()),
            id_generator: Arc::new(SequentialIdGenerator::new()),
            code_generator: Arc::new(FixedActivationCodeGenerator::new("12345678")),
            code_storage: Arc::new(InMemoryActivationCodeStorage::new()),
        }
    }
}
