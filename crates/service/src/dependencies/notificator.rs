//! Outbound user notifications.

use parking_lot::Mutex;

use crate::error::NotificationError;

/// Delivers messages to users.
///
/// Implementors only provide [`send`](Notificator::send); the specific
/// notifications are built on top of it.
pub trait Notificator: Send + Sync {
    fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotificationError>;

    fn send_activation_code(&self, recipient: &str, code: &str) -> Result<(), NotificationError> {
        self.send(
            recipient,
            "Activation code",
            &format!("Your activation code is {code}"),
        )
    }

    fn send_activation_link(&self, recipient: &str, link: &str) -> Result<(), NotificationError> {
        self.send(
            recipient,
            "Activate your account",
            &format!("Follow {link} to activate your account"),
        )
    }

    fn send_password_changed(&self, recipient: &str) -> Result<(), NotificationError> {
        self.send(recipient, "Password changed", "Your password was changed")
    }

    fn send_email_changed(&self, recipient: &str) -> Result<(), NotificationError> {
        self.send(
            recipient,
            "Email changed",
            "This is now the email address of your account",
        )
    }

    fn send_wishlist_archived(
        &self,
        recipient: &str,
        wishlist_name: &str,
    ) -> Result<(), NotificationError> {
        self.send(
            recipient,
            "Wishlist archived",
            &format!("Your wishlist \"{wishlist_name}\" was archived"),
        )
    }
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct LoggingNotificator;

impl Notificator for LoggingNotificator {
    fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotificationError> {
        tracing::info!(recipient, subject, body, "notification");
        Ok(())
    }
}

/// A notification captured by [`RecordingNotificator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Default)]
struct RecordingState {
    sent: Vec<SentNotification>,
    fail: bool,
}

/// In-memory notificator for testing.
#[derive(Debug, Default)]
pub struct RecordingNotificator {
    state: Mutex<RecordingState>,
}

impl RecordingNotificator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures every following send to fail.
    pub fn set_failing(&self, fail: bool) {
        self.state.lock().fail = fail;
    }

    /// Returns every notification sent so far.
    pub fn sent(&self) -> Vec<SentNotification> {
        self.state.lock().sent.clone()
    }

    /// Returns the notifications with the given subject.
    pub fn sent_with_subject(&self, subject: &str) -> Vec<SentNotification> {
        self.state
            .lock()
            .sent
            .iter()
            .filter(|n| n.subject == subject)
            .cloned()
            .collect()
    }
}

impl Notificator for RecordingNotificator {
    fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotificationError> {
        let mut state = self.state.lock();
        if state.fail {
            return Err(NotificationError::Delivery {
                recipient: recipient.to_string(),
                reason: "mailbox unavailable".to_string(),
            });
        }
        state.sent.push(SentNotification {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
