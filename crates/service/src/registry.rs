//! Handler registry: maps message type names to the handlers bound to them.

use std::collections::HashMap;

use domain::{Command, Event, MessageType};
use store::Backend;

use crate::messagebus::CommandOutput;
use crate::unit_of_work::UnitOfWork;
use crate::{Result, ServiceError};

type CommandFn<B> =
    Box<dyn Fn(Command, &mut UnitOfWork<B>) -> Result<CommandOutput> + Send + Sync>;
type EventFn<B> = Box<dyn Fn(&Event, &mut UnitOfWork<B>) -> Result<()> + Send + Sync>;

/// The single handler of one command type.
pub struct CommandHandler<B: Backend> {
    command: &'static str,
    handle: CommandFn<B>,
}

impl<B: Backend> CommandHandler<B> {
    pub fn command(&self) -> &'static str {
        self.command
    }

    pub(crate) fn call(&self, command: Command, uow: &mut UnitOfWork<B>) -> Result<CommandOutput> {
        (self.handle)(command, uow)
    }
}

/// One of the handlers of an event type.
pub struct EventHandler<B: Backend> {
    name: &'static str,
    handle: EventFn<B>,
}

impl<B: Backend> EventHandler<B> {
    /// The handler's name, as reported in failures.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn call(&self, event: &Event, uow: &mut UnitOfWork<B>) -> Result<()> {
        (self.handle)(event, uow)
    }
}

/// Immutable lookup table from message type name to handlers.
///
/// Built once with [`HandlerRegistry::builder`] and then shared between
/// message buses behind an `Arc`.
pub struct HandlerRegistry<B: Backend> {
    commands: HashMap<&'static str, CommandHandler<B>>,
    events: HashMap<&'static str, Vec<EventHandler<B>>>,
}

impl<B: Backend + 'static> HandlerRegistry<B> {
    pub fn builder() -> HandlerRegistryBuilder<B> {
        HandlerRegistryBuilder::default()
    }

    /// Returns the handler registered for a command type.
    pub fn command_handler(&self, command: &str) -> Option<&CommandHandler<B>> {
        self.commands.get(command)
    }

    /// Returns the number of command types with a handler.
    pub fn command_handler_count(&self) -> usize {
        self.commands.len()
    }

    /// Returns the handlers of an event type in registration order.
    ///
    /// Unknown event types have no handlers.
    pub fn event_handlers_for(&self, event: &str) -> &[EventHandler<B>] {
        self.events.get(event).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns true if the event type was registered, with or without handlers.
    pub fn knows_event(&self, event: &str) -> bool {
        self.events.contains_key(event)
    }
}

/// Collects handler registrations for a [`HandlerRegistry`].
pub struct HandlerRegistryBuilder<B: Backend> {
    commands: HashMap<&'static str, CommandHandler<B>>,
    events: HashMap<&'static str, Vec<EventHandler<B>>>,
    duplicates: Vec<&'static str>,
}

impl<B: Backend> Default for HandlerRegistryBuilder<B> {
    fn default() -> Self {
        Self {
            commands: HashMap::new(),
            events: HashMap::new(),
            duplicates: Vec::new(),
        }
    }
}

impl<B: Backend + 'static> HandlerRegistryBuilder<B> {
    /// Binds the handler of command type `C`.
    ///
    /// A second binding for the same command type is reported by
    /// [`build`](Self::build).
    pub fn command<C, F>(mut self, handler: F) -> Self
    where
        C: MessageType<Command> + 'static,
        F: Fn(C, &mut UnitOfWork<B>) -> Result<CommandOutput> + Send + Sync + 'static,
    {
        if self.commands.contains_key(C::NAME) {
            self.duplicates.push(C::NAME);
            return self;
        }
        let handle: CommandFn<B> = Box::new(move |command, uow| {
            let command = C::try_from_message(command).map_err(|other| {
                ServiceError::MismatchedMessage {
                    expected: C::NAME,
                    actual: other.name(),
                }
            })?;
            handler(command, uow)
        });
        self.commands.insert(
            C::NAME,
            CommandHandler {
                command: C::NAME,
                handle,
            },
        );
        self
    }

    /// Appends a named handler for event type `E`.
    pub fn event<E, F>(mut self, name: &'static str, handler: F) -> Self
    where
        E: MessageType<Event> + 'static,
        F: Fn(&E, &mut UnitOfWork<B>) -> Result<()> + Send + Sync + 'static,
    {
        let handle: EventFn<B> = Box::new(move |event, uow| {
            let event =
                E::try_from_message_ref(event).ok_or(ServiceError::MismatchedMessage {
                    expected: E::NAME,
                    actual: event.name(),
                })?;
            handler(event, uow)
        });
        self.events
            .entry(E::NAME)
            .or_default()
            .push(EventHandler { name, handle });
        self
    }

    /// Declares an event type that deliberately has no handlers.
    pub fn no_event_handlers<E>(mut self) -> Self
    where
        E: MessageType<Event>,
    {
        self.events.entry(E::NAME).or_default();
        self
    }

    /// Finishes the registry.
    ///
    /// Fails if any command type was bound more than once.
    pub fn build(self) -> Result<HandlerRegistry<B>> {
        if let Some(command) = self.duplicates.first() {
            return Err(ServiceError::DuplicateCommandHandler(*command));
        }
        tracing::debug!(
            commands = self.commands.len(),
            events = self.events.len(),
            "handler registry built"
        );
        Ok(HandlerRegistry {
            commands: self.commands,
            events: self.events,
        })
    }
}
