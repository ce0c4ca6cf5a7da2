//! The message bus: routes commands and events to their handlers and drains
//! the events they produce until the cascade settles.

use std::collections::VecDeque;
use std::sync::Arc;

use common::{ItemId, WishlistId};
use domain::{Command, Event, Message};
use store::Backend;

use crate::registry::HandlerRegistry;
use crate::unit_of_work::UnitOfWork;
use crate::{Result, ServiceError};

/// What a command handler hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    None,
    Token(String),
    WishlistId(WishlistId),
    ItemId(ItemId),
}

impl CommandOutput {
    pub fn token(&self) -> Option<&str> {
        match self {
            CommandOutput::Token(token) => Some(token),
            _ => None,
        }
    }

    pub fn wishlist_id(&self) -> Option<WishlistId> {
        match self {
            CommandOutput::WishlistId(id) => Some(*id),
            _ => None,
        }
    }

    pub fn item_id(&self) -> Option<ItemId> {
        match self {
            CommandOutput::ItemId(id) => Some(*id),
            _ => None,
        }
    }
}

/// An event handler that failed while the bus kept going.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerFailure {
    pub event: &'static str,
    pub handler: &'static str,
    pub error: String,
}

/// Dispatches one operation's messages.
///
/// A command goes to its single handler and a failure there aborts the whole
/// operation, dropping any events the handler left behind even if it
/// committed before failing. Events go to every handler registered for them, in order, and a
/// failing event handler is logged and recorded in
/// [`failures`](Messagebus::failures) without stopping the others. After
/// every successful handler the bus collects the events the unit of work
/// picked up and queues them behind the current message.
pub struct Messagebus<B: Backend> {
    uow: UnitOfWork<B>,
    registry: Arc<HandlerRegistry<B>>,
    failures: Vec<HandlerFailure>,
}

impl<B: Backend + 'static> Messagebus<B> {
    pub fn new(uow: UnitOfWork<B>, registry: Arc<HandlerRegistry<B>>) -> Self {
        Self {
            uow,
            registry,
            failures: Vec::new(),
        }
    }

    /// Handles a message and every event it transitively causes.
    ///
    /// Returns the command handler's output, or [`CommandOutput::None`] when
    /// the message is an event.
    pub fn handle(&mut self, message: impl Into<Message>) -> Result<CommandOutput> {
        let message = message.into();
        self.dispatch(message)
    }

    #[tracing::instrument(skip_all, fields(message = message.name()))]
    fn dispatch(&mut self, message: Message) -> Result<CommandOutput> {
        let mut queue = VecDeque::from([message]);
        let mut output = CommandOutput::None;

        while let Some(message) = queue.pop_front() {
            match message {
                Message::Command(command) => {
                    output = self.handle_command(command, &mut queue)?;
                }
                Message::Event(event) => self.handle_event(event, &mut queue),
            }
        }

        Ok(output)
    }

    fn handle_command(
        &mut self,
        command: Command,
        queue: &mut VecDeque<Message>,
    ) -> Result<CommandOutput> {
        let name = command.name();
        let registry = Arc::clone(&self.registry);
        let handler = registry
            .command_handler(name)
            .ok_or(ServiceError::UnhandledCommand(name))?;

        tracing::debug!(command = name, "handling command");
        match handler.call(command, &mut self.uow) {
            Ok(output) => {
                queue.extend(self.uow.collect_new_events().map(Message::Event));
                metrics::counter!("messagebus_commands_handled").increment(1);
                Ok(output)
            }
            Err(err) => {
                let dropped = self.uow.discard_new_events();
                tracing::warn!(command = name, error = %err, dropped, "command failed");
                Err(err)
            }
        }
    }

    fn handle_event(&mut self, event: Event, queue: &mut VecDeque<Message>) {
        let name = event.name();
        let registry = Arc::clone(&self.registry);
        let handlers = registry.event_handlers_for(name);
        if handlers.is_empty() {
            tracing::debug!(event = name, "no handlers for event");
        }

        for handler in handlers {
            tracing::debug!(event = name, handler = handler.name(), "handling event");
            match handler.call(&event, &mut self.uow) {
                Ok(()) => {
                    queue.extend(self.uow.collect_new_events().map(Message::Event));
                }
                Err(err) => {
                    let dropped = self.uow.discard_new_events();
                    tracing::error!(
                        event = name,
                        handler = handler.name(),
                        error = %err,
                        dropped,
                        "event handler failed"
                    );
                    metrics::counter!("messagebus_event_handler_failures").increment(1);
                    self.failures.push(HandlerFailure {
                        event: name,
                        handler: handler.name(),
                        error: err.to_string(),
                    });
                }
            }
        }
        metrics::counter!("messagebus_events_handled").increment(1);
    }

    /// Returns the event handler failures recorded so far.
    pub fn failures(&self) -> &[HandlerFailure] {
        &self.failures
    }

    /// Removes and returns the recorded failures.
    pub fn take_failures(&mut self) -> Vec<HandlerFailure> {
        std::mem::take(&mut self.failures)
    }

    pub fn uow(&self) -> &UnitOfWork<B> {
        &self.uow
    }

    pub fn uow_mut(&mut self) -> &mut UnitOfWork<B> {
        &mut self.uow
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry<B>> {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Username;
    use domain::{
        ActivateUser, CreateUser, DeactivateUser, User, UserActivated, UserCreated,
        UserDeactivated,
    };
    use parking_lot::Mutex;
    use store::InMemoryBackend;

    use crate::registry::HandlerRegistryBuilder;

    fn bus(builder: HandlerRegistryBuilder<InMemoryBackend>) -> Messagebus<InMemoryBackend> {
        Messagebus::new(
            UnitOfWork::new(InMemoryBackend::new()),
            Arc::new(builder.build().unwrap()),
        )
    }

    fn create_user(
        command: CreateUser,
        uow: &mut UnitOfWork<InMemoryBackend>,
    ) -> Result<CommandOutput> {
        let mut tx = uow.enter()?;
        tx.users()
            .add(User::register(command.username, command.email, command.password)?)?;
        tx.commit()?;
        Ok(CommandOutput::None)
    }

    #[test]
    fn unregistered_command_is_fatal() {
        let mut bus = bus(HandlerRegistry::builder());
        let err = bus.handle(Command::from(ActivateUser::new("alice"))).unwrap_err();
        assert!(matches!(err, ServiceError::UnhandledCommand("ActivateUser")));
    }

    #[test]
    fn failing_command_discards_the_queue() {
        let ran = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&ran);
        let mut bus = bus(
            HandlerRegistry::builder()
                .command(|_: DeactivateUser, _| {
                    Err(domain::DomainError::UserNotFound {
                        username: Username::from("ghost"),
                    }
                    .into())
                })
                .event("never", move |_: &UserDeactivated, _| {
                    *flag.lock() = true;
                    Ok(())
                }),
        );

        let err = bus.handle(Command::from(DeactivateUser::new("ghost"))).unwrap_err();
        assert_eq!(err.kind(), domain::ErrorKind::NotFound);
        assert!(!bus.uow().committed());
        assert!(!*ran.lock());
    }

    #[test]
    fn events_recorded_by_the_command_are_dispatched() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let mut bus = bus(
            HandlerRegistry::builder()
                .command(create_user)
                .event("record", move |event: &UserCreated, _| {
                    log.lock().push(event.username.clone());
                    Ok(())
                }),
        );

        let output = bus
            .handle(Command::from(CreateUser::new("alice", "a@x.com", "hash")))
            .unwrap();

        assert_eq!(output, CommandOutput::None);
        assert_eq!(*seen.lock(), vec![Username::from("alice")]);
    }

    #[test]
    fn failing_event_handler_does_not_stop_the_others() {
        let ran = Arc::new(Mutex::new(Vec::new()));
        let (a, c) = (Arc::clone(&ran), Arc::clone(&ran));
        let mut bus = bus(
            HandlerRegistry::builder()
                .event("a", move |_: &UserActivated, _| {
                    a.lock().push("a");
                    Ok(())
                })
                .event("b", |_: &UserActivated, _| {
                    Err(domain::DomainError::CodeVerification.into())
                })
                .event("c", move |_: &UserActivated, _| {
                    c.lock().push("c");
                    Ok(())
                }),
        );

        let event = Event::from(UserActivated {
            username: Username::from("alice"),
        });
        let output = bus.handle(event).unwrap();

        assert_eq!(output, CommandOutput::None);
        assert_eq!(*ran.lock(), vec!["a", "c"]);
        assert_eq!(
            bus.failures(),
            &[HandlerFailure {
                event: "UserActivated",
                handler: "b",
                error: "Domain error: Activation code verification failed".to_string(),
            }]
        );
    }

    #[test]
    fn cascade_runs_command_then_events_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (c, e1, e2) = (Arc::clone(&log), Arc::clone(&log), Arc::clone(&log));
        let mut bus = bus(
            HandlerRegistry::builder()
                .command(move |command: CreateUser, uow| {
                    c.lock().push("CreateUser");
                    create_user(command, uow)
                })
                .event("activate", move |event: &UserCreated, uow| {
                    e1.lock().push("UserCreated");
                    let mut tx = uow.enter()?;
                    tx.users().get(&event.username)?.activate()?;
                    tx.commit()
                })
                .event("record", move |_: &UserActivated, _| {
                    e2.lock().push("UserActivated");
                    Ok(())
                }),
        );

        bus.handle(CreateUser::new("alice", "a@x.com", "hash"))
            .unwrap();

        assert_eq!(*log.lock(), vec!["CreateUser", "UserCreated", "UserActivated"]);
        assert_eq!(bus.uow().commits(), 2);
    }

    #[test]
    fn events_of_a_failed_command_are_never_dispatched() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let mut bus = bus(
            HandlerRegistry::builder()
                .command(|command: CreateUser, uow| {
                    create_user(command, uow)?;
                    Err(domain::DomainError::CodeVerification.into())
                })
                .command(|_: ActivateUser, _| Ok(CommandOutput::None))
                .event("record", move |event: &UserCreated, _| {
                    log.lock().push(event.username.clone());
                    Ok(())
                }),
        );

        assert!(
            bus.handle(CreateUser::new("alice", "a@x.com", "hash"))
                .is_err()
        );
        assert!(bus.uow().committed());

        bus.handle(ActivateUser::new("bob")).unwrap();
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn command_output_accessors() {
        let output = CommandOutput::Token("jwt".into());
        assert_eq!(output.token(), Some("jwt"));
        assert_eq!(output.wishlist_id(), None);
        assert_eq!(CommandOutput::None.item_id(), None);
    }
}
