//! Command and event handlers of the user feature.

use std::sync::Arc;
use std::time::Duration;

use common::Username;
use domain::{
    ActivateUser, ActivateUserWithCode, ActivateUserWithToken, AddRoleToUser, ChangeEmail,
    ChangePassword, CommandMetadata, CreateUser, DeactivateUser, DomainError, EmailChanged,
    GenerateAuthToken, PasswordChanged, Permission, RemoveRoleFromUser, ResendActivationCode,
    RoleAddedToUser, RoleRemovedFromUser, User, UserActivated, UserCreated,
};
use store::Backend;

use super::roles::authorize_role_management;
use super::{authorize, require_superuser};
use crate::Result;
use crate::config::Config;
use crate::dependencies::{
    ActivationCodeGenerator, ActivationCodeStorage, Dependencies, Notificator, PasswordManager,
    TokenManager,
};
use crate::messagebus::CommandOutput;
use crate::registry::HandlerRegistryBuilder;
use crate::unit_of_work::{Transaction, UnitOfWork};

/// Binds every user command and event handler.
pub fn register<B: Backend + 'static>(
    builder: HandlerRegistryBuilder<B>,
    deps: &Dependencies,
    config: &Config,
) -> HandlerRegistryBuilder<B> {
    let passwords = Arc::clone(&deps.password_manager);
    let builder = builder.command(move |command: CreateUser, uow: &mut UnitOfWork<B>| {
        create_user(uow, command, passwords.as_ref())
    });

    let passwords = Arc::clone(&deps.password_manager);
    let tokens = Arc::clone(&deps.token_manager);
    let lifetime = config.auth_token_lifetime;
    let builder = builder.command(move |command: GenerateAuthToken, uow: &mut UnitOfWork<B>| {
        generate_auth_token(uow, command, passwords.as_ref(), tokens.as_ref(), lifetime)
    });

    let builder = builder.command(|command: ActivateUser, uow: &mut UnitOfWork<B>| {
        let mut tx = uow.enter()?;
        let check = require_superuser(&command.metadata, "activate user");
        authorize(&mut tx, &command.metadata, check, Permission::MANAGE_USERS)?;
        tx.users().get(&command.username)?.activate()?;
        tx.commit()?;
        Ok(CommandOutput::None)
    });

    let tokens = Arc::clone(&deps.token_manager);
    let builder =
        builder.command(move |command: ActivateUserWithToken, uow: &mut UnitOfWork<B>| {
            let username = tokens.validate(&command.token)?;
            let mut tx = uow.enter()?;
            tx.users().get(&username)?.activate()?;
            tx.commit()?;
            Ok(CommandOutput::None)
        });

    let storage = Arc::clone(&deps.code_storage);
    let builder =
        builder.command(move |command: ActivateUserWithCode, uow: &mut UnitOfWork<B>| {
            activate_user_with_code(uow, command, storage.as_ref())
        });

    let passwords = Arc::clone(&deps.password_manager);
    let generator = Arc::clone(&deps.code_generator);
    let storage = Arc::clone(&deps.code_storage);
    let notificator = Arc::clone(&deps.notificator);
    let builder =
        builder.command(move |command: ResendActivationCode, uow: &mut UnitOfWork<B>| {
            resend_activation_code(
                uow,
                command,
                passwords.as_ref(),
                generator.as_ref(),
                storage.as_ref(),
                notificator.as_ref(),
            )
        });

    let passwords = Arc::clone(&deps.password_manager);
    let builder = builder.command(move |command: ChangePassword, uow: &mut UnitOfWork<B>| {
        change_password(uow, command, passwords.as_ref())
    });

    let builder = builder.command(|command: ChangeEmail, uow: &mut UnitOfWork<B>| {
        let mut tx = uow.enter()?;
        authorize_on_user(&mut tx, &command.metadata, &command.username, "change email")?;
        tx.users().get(&command.username)?.change_email(command.new_email)?;
        tx.commit()?;
        Ok(CommandOutput::None)
    });

    let builder = builder.command(|command: DeactivateUser, uow: &mut UnitOfWork<B>| {
        let mut tx = uow.enter()?;
        authorize_on_user(&mut tx, &command.metadata, &command.username, "deactivate user")?;
        tx.users().get(&command.username)?.deactivate()?;
        tx.commit()?;
        Ok(CommandOutput::None)
    });

    let builder = builder.command(|command: AddRoleToUser, uow: &mut UnitOfWork<B>| {
        let mut tx = uow.enter()?;
        authorize_role_management(&mut tx, &command.metadata, "grant roles")?;
        if !tx.roles().contains(&command.role_name)? {
            return Err(DomainError::RoleNotFound {
                role_name: command.role_name,
            }
            .into());
        }
        tx.users().get(&command.username)?.add_role(command.role_name)?;
        tx.commit()?;
        Ok(CommandOutput::None)
    });

    let builder = builder.command(|command: RemoveRoleFromUser, uow: &mut UnitOfWork<B>| {
        let mut tx = uow.enter()?;
        authorize_role_management(&mut tx, &command.metadata, "revoke roles")?;
        tx.users()
            .get(&command.username)?
            .remove_role(&command.role_name)?;
        tx.commit()?;
        Ok(CommandOutput::None)
    });

    let generator = Arc::clone(&deps.code_generator);
    let storage = Arc::clone(&deps.code_storage);
    let notificator = Arc::clone(&deps.notificator);
    let builder = builder.event(
        "send_activation_code",
        move |event: &UserCreated, _: &mut UnitOfWork<B>| {
            send_activation_code(
                event,
                generator.as_ref(),
                storage.as_ref(),
                notificator.as_ref(),
            )
        },
    );

    let tokens = Arc::clone(&deps.token_manager);
    let notificator = Arc::clone(&deps.notificator);
    let config = config.clone();
    let builder = builder.event(
        "send_activation_link",
        move |event: &UserCreated, _: &mut UnitOfWork<B>| {
            let token = tokens.issue(&event.username, config.activation_token_lifetime)?;
            notificator.send_activation_link(&event.email, &config.activation_link(&token))?;
            Ok(())
        },
    );

    let notificator = Arc::clone(&deps.notificator);
    let builder = builder.event(
        "notify_password_changed",
        move |event: &PasswordChanged, uow: &mut UnitOfWork<B>| {
            let email = {
                let mut tx = uow.enter()?;
                tx.users().get(&event.username)?.email().to_string()
            };
            notificator.send_password_changed(&email)?;
            Ok(())
        },
    );

    let notificator = Arc::clone(&deps.notificator);
    builder
        .event(
            "notify_email_changed",
            move |event: &EmailChanged, _: &mut UnitOfWork<B>| {
                notificator.send_email_changed(&event.new_email)?;
                Ok(())
            },
        )
        .no_event_handlers::<UserActivated>()
        .no_event_handlers::<RoleAddedToUser>()
        .no_event_handlers::<RoleRemovedFromUser>()
}

/// Passes for the user themselves, superusers, internal callers and holders
/// of the `manage_users` permission.
fn authorize_on_user<B: Backend>(
    tx: &mut Transaction<'_, B>,
    metadata: &CommandMetadata,
    username: &Username,
    action: &'static str,
) -> Result<()> {
    let check = metadata.authorize(username, action);
    authorize(tx, metadata, check, Permission::MANAGE_USERS)
}

#[tracing::instrument(skip_all, fields(username = %command.username))]
fn create_user<B: Backend>(
    uow: &mut UnitOfWork<B>,
    command: CreateUser,
    passwords: &dyn PasswordManager,
) -> Result<CommandOutput> {
    User::validate_password(&command.password)?;

    let mut tx = uow.enter()?;
    if tx.users().contains(&command.username)? {
        return Err(DomainError::UserExists {
            username: command.username,
        }
        .into());
    }
    let password_hash = passwords.hash(&command.password)?;
    let user = User::register(command.username, command.email, password_hash)?;
    tx.users().add(user)?;
    tx.commit()?;

    Ok(CommandOutput::None)
}

#[tracing::instrument(skip_all, fields(username = %command.username))]
fn generate_auth_token<B: Backend>(
    uow: &mut UnitOfWork<B>,
    command: GenerateAuthToken,
    passwords: &dyn PasswordManager,
    tokens: &dyn TokenManager,
    lifetime: Duration,
) -> Result<CommandOutput> {
    let mut tx = uow.enter()?;
    let user = tx.users().get(&command.username)?;
    if !passwords.verify(&command.password, user.password_hash())? {
        return Err(DomainError::PasswordVerification.into());
    }
    if !user.is_active() {
        return Err(DomainError::UserNotActive {
            username: command.username,
        }
        .into());
    }

    let token = tokens.issue(&command.username, lifetime)?;
    Ok(CommandOutput::Token(token))
}

#[tracing::instrument(skip_all, fields(username = %command.username))]
fn activate_user_with_code<B: Backend>(
    uow: &mut UnitOfWork<B>,
    command: ActivateUserWithCode,
    storage: &dyn ActivationCodeStorage,
) -> Result<CommandOutput> {
    let mut tx = uow.enter()?;
    let user = tx.users().get(&command.username)?;
    let code_matches = storage
        .get(&command.username)
        .is_some_and(|code| code == command.code);
    if !code_matches {
        return Err(DomainError::CodeVerification.into());
    }

    user.activate()?;
    tx.commit()?;
    storage.remove(&command.username);
    Ok(CommandOutput::None)
}

#[tracing::instrument(skip_all, fields(username = %command.username))]
fn resend_activation_code<B: Backend>(
    uow: &mut UnitOfWork<B>,
    command: ResendActivationCode,
    passwords: &dyn PasswordManager,
    generator: &dyn ActivationCodeGenerator,
    storage: &dyn ActivationCodeStorage,
    notificator: &dyn Notificator,
) -> Result<CommandOutput> {
    let mut tx = uow.enter()?;
    let user = tx.users().get(&command.username)?;
    if !passwords.verify(&command.password, user.password_hash())? {
        return Err(DomainError::PasswordVerification.into());
    }
    if user.is_active() {
        return Err(DomainError::UserAlreadyActive {
            username: command.username,
        }
        .into());
    }

    let code = generator.create_code();
    storage.save(&command.username, &code);
    notificator.send_activation_code(user.email(), &code)?;
    Ok(CommandOutput::None)
}

#[tracing::instrument(skip_all, fields(username = %command.username))]
fn change_password<B: Backend>(
    uow: &mut UnitOfWork<B>,
    command: ChangePassword,
    passwords: &dyn PasswordManager,
) -> Result<CommandOutput> {
    let mut tx = uow.enter()?;
    authorize_on_user(&mut tx, &command.metadata, &command.username, "change password")?;
    match &command.old_password {
        Some(old_password) => {
            let user = tx.users().get(&command.username)?;
            if !passwords.verify(old_password, user.password_hash())? {
                return Err(DomainError::PasswordVerification.into());
            }
        }
        None => {
            let check = require_superuser(&command.metadata, "reset password");
            authorize(&mut tx, &command.metadata, check, Permission::MANAGE_USERS)?;
        }
    }

    User::validate_password(&command.new_password)?;
    let password_hash = passwords.hash(&command.new_password)?;
    tx.users()
        .get(&command.username)?
        .change_password_hash(password_hash);
    tx.commit()?;
    Ok(CommandOutput::None)
}

fn send_activation_code(
    event: &UserCreated,
    generator: &dyn ActivationCodeGenerator,
    storage: &dyn ActivationCodeStorage,
    notificator: &dyn Notificator,
) -> Result<()> {
    let code = generator.create_code();
    storage.save(&event.username, &code);
    notificator.send_activation_code(&event.email, &code)?;
    Ok(())
}
