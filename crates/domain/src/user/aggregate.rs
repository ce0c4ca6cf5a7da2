//! User aggregate implementation.

use common::{RoleName, Username};
use serde::{Deserialize, Serialize};

use crate::aggregate::{AggregateRoot, EventBuffer};
use crate::error::DomainError;

use super::events::{
    EmailChanged, PasswordChanged, RoleAddedToUser, RoleRemovedFromUser, UserActivated,
    UserCreated, UserDeactivated,
};

const MIN_PASSWORD_LENGTH: usize = 8;

/// User aggregate root.
///
/// New users start inactive and become active through one of the activation
/// commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    username: Username,
    email: String,
    password_hash: String,
    is_active: bool,
    #[serde(default)]
    roles: Vec<RoleName>,

    #[serde(skip)]
    events: EventBuffer,
}

impl AggregateRoot for User {
    type Id = Username;

    fn aggregate_type() -> &'static str {
        "User"
    }

    fn id(&self) -> &Username {
        &self.username
    }

    fn events(&self) -> &EventBuffer {
        &self.events
    }

    fn events_mut(&mut self) -> &mut EventBuffer {
        &mut self.events
    }
}

// Query methods
impl User {
    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns the names of the roles granted to the user, oldest first.
    pub fn roles(&self) -> &[RoleName] {
        &self.roles
    }

    pub fn has_role(&self, role_name: &RoleName) -> bool {
        self.roles.contains(role_name)
    }
}

// Behaviour methods (mutate and record)
impl User {
    /// Registers a new inactive user and records `UserCreated`.
    pub fn register(
        username: impl Into<Username>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let email = email.into();
        validate_email(&email)?;

        let mut user = Self {
            username: username.into(),
            email,
            password_hash: password_hash.into(),
            is_active: false,
            roles: Vec::new(),
            events: EventBuffer::default(),
        };
        user.events.record(UserCreated {
            username: user.username.clone(),
            email: user.email.clone(),
        });
        Ok(user)
    }

    /// Checks a plaintext password against the password policy:
    /// at least 8 characters, one digit and one uppercase letter.
    pub fn validate_password(password: &str) -> Result<(), DomainError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(DomainError::PasswordValidation {
                reason: "must be at least 8 characters long",
            });
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(DomainError::PasswordValidation {
                reason: "must contain a digit",
            });
        }
        if !password.chars().any(char::is_uppercase) {
            return Err(DomainError::PasswordValidation {
                reason: "must contain an uppercase letter",
            });
        }
        Ok(())
    }

    pub fn activate(&mut self) -> Result<(), DomainError> {
        if self.is_active {
            return Err(DomainError::UserAlreadyActive {
                username: self.username.clone(),
            });
        }
        self.is_active = true;
        self.events.record(UserActivated {
            username: self.username.clone(),
        });
        Ok(())
    }

    pub fn deactivate(&mut self) -> Result<(), DomainError> {
        if !self.is_active {
            return Err(DomainError::UserNotActive {
                username: self.username.clone(),
            });
        }
        self.is_active = false;
        self.events.record(UserDeactivated {
            username: self.username.clone(),
        });
        Ok(())
    }

    pub fn change_password_hash(&mut self, password_hash: impl Into<String>) {
        self.password_hash = password_hash.into();
        self.events.record(PasswordChanged {
            username: self.username.clone(),
        });
    }

    pub fn change_email(&mut self, email: impl Into<String>) -> Result<(), DomainError> {
        let email = email.into();
        validate_email(&email)?;
        self.email = email.clone();
        self.events.record(EmailChanged {
            username: self.username.clone(),
            new_email: email,
        });
        Ok(())
    }

    pub fn add_role(&mut self, role_name: RoleName) -> Result<(), DomainError> {
        if self.has_role(&role_name) {
            return Err(DomainError::UserAlreadyHasRole {
                username: self.username.clone(),
                role_name,
            });
        }
        self.roles.push(role_name.clone());
        self.events.record(RoleAddedToUser {
            username: self.username.clone(),
            role_name,
        });
        Ok(())
    }

    pub fn remove_role(&mut self, role_name: &RoleName) -> Result<(), DomainError> {
        let Some(position) = self.roles.iter().position(|role| role == role_name) else {
            return Err(DomainError::UserDoesNotHaveRole {
                username: self.username.clone(),
                role_name: role_name.clone(),
            });
        };
        self.roles.remove(position);
        self.events.record(RoleRemovedFromUser {
            username: self.username.clone(),
            role_name: role_name.clone(),
        });
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<(), DomainError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(DomainError::InvalidEmail {
            email: email.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::DomainEvent;

    fn registered() -> User {
        User::register("alice", "a@x.com", "hash").unwrap()
    }

    #[test]
    fn register_records_user_created() {
        let user = registered();
        assert!(!user.is_active());
        assert_eq!(user.events().len(), 1);
        assert_eq!(
            user.events().iter().next().unwrap().event_type(),
            "UserCreated"
        );
    }

    #[test]
    fn register_rejects_malformed_email() {
        let result = User::register("alice", "not-an-email", "hash");
        assert!(matches!(result, Err(DomainError::InvalidEmail { .. })));

        let result = User::register("alice", "a@b@c", "hash");
        assert!(matches!(result, Err(DomainError::InvalidEmail { .. })));
    }

    #[test]
    fn activate_twice_fails_without_recording() {
        let mut user = registered();
        user.activate().unwrap();
        assert_eq!(user.events().len(), 2);

        let result = user.activate();
        assert!(matches!(result, Err(DomainError::UserAlreadyActive { .. })));
        assert_eq!(user.events().len(), 2);
    }

    #[test]
    fn deactivate_inactive_user_fails() {
        let mut user = registered();
        let result = user.deactivate();
        assert!(matches!(result, Err(DomainError::UserNotActive { .. })));
        assert!(!user.is_active());
    }

    #[test]
    fn change_password_hash_records_event() {
        let mut user = registered();
        user.change_password_hash("new-hash");
        assert_eq!(user.password_hash(), "new-hash");
        assert_eq!(user.events().iter().last().unwrap().name(), "PasswordChanged");
    }

    #[test]
    fn change_email_validates_before_mutating() {
        let mut user = registered();
        assert!(user.change_email("broken").is_err());
        assert_eq!(user.email(), "a@x.com");
        assert_eq!(user.events().len(), 1);

        user.change_email("new@x.com").unwrap();
        assert_eq!(user.email(), "new@x.com");
        assert_eq!(user.events().len(), 2);
    }

    #[test]
    fn roles_are_granted_once_and_revoked_once() {
        let mut user = registered();
        let editor = RoleName::from("editor");

        user.add_role(editor.clone()).unwrap();
        assert!(user.has_role(&editor));
        assert!(matches!(
            user.add_role(editor.clone()),
            Err(DomainError::UserAlreadyHasRole { .. })
        ));

        user.remove_role(&editor).unwrap();
        assert!(user.roles().is_empty());
        assert!(matches!(
            user.remove_role(&editor),
            Err(DomainError::UserDoesNotHaveRole { .. })
        ));

        let names: Vec<_> = user.events().iter().map(|e| e.name()).collect();
        assert_eq!(
            names,
            vec!["UserCreated", "RoleAddedToUser", "RoleRemovedFromUser"]
        );
    }

    #[test]
    fn rows_without_roles_still_load() {
        let json = serde_json::json!({
            "username": "alice",
            "email": "a@x.com",
            "password_hash": "hash",
            "is_active": true,
        });
        let user: User = serde_json::from_value(json).unwrap();
        assert!(user.roles().is_empty());
    }

    #[test]
    fn password_policy() {
        assert!(User::validate_password("Passw0rd1").is_ok());
        assert!(User::validate_password("Sh0rt").is_err());
        assert!(User::validate_password("NoDigitsHere").is_err());
        assert!(User::validate_password("lowercase1").is_err());
    }

    #[test]
    fn serialized_state_excludes_pending_events() {
        let user = registered();
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("events").is_none());

        let restored: User = serde_json::from_value(json).unwrap();
        assert_eq!(restored.username(), user.username());
        assert!(!restored.has_pending_events());
    }
}
