/// Account notifications
///
/// Two messages exist: a welcome mail after signup and a goodbye mail after
/// account deletion. Delivery is best-effort. [`Notifications`] spawns each
/// send on the runtime and only logs failures, so a mail outage never fails
/// the request that triggered it.
///
/// # Backends
///
/// - [`sendgrid::SendGridNotifier`]: SendGrid v3 mail API
/// - [`LogNotifier`]: writes the message to the log (no API key configured)

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

pub mod sendgrid;

/// Error type for notification delivery
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Request to the mail provider failed
    #[error("Mail request failed: {0}")]
    Send(String),

    /// Mail provider answered with an error status
    #[error("Mail provider error: {0}")]
    Api(String),
}

/// A plain-text mail to one recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub to: String,
    pub subject: String,
    pub text: String,
}

impl Message {
    pub fn welcome(email: &str, name: &str) -> Self {
        Self {
            to: email.to_string(),
            subject: "Thanks for joining in!".to_string(),
            text: format!(
                "Welcome to the app, {}. Let me know how you get along with the app.",
                name
            ),
        }
    }

    pub fn cancellation(email: &str, name: &str) -> Self {
        Self {
            to: email.to_string(),
            subject: format!("Goodbye {}!", name),
            text: "Is there anything we could have done to have kept you on board?".to_string(),
        }
    }
}

/// Something that can deliver a [`Message`]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &Message) -> Result<(), NotifyError>;
}

/// Notifier that only logs what it would have sent
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &Message) -> Result<(), NotifyError> {
        info!(to = %message.to, subject = %message.subject, "Mail delivery disabled, message not sent");
        Ok(())
    }
}

/// Fire-and-forget front end over a [`Notifier`]
#[derive(Clone)]
pub struct Notifications {
    notifier: Arc<dyn Notifier>,
}

impl Notifications {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub fn send_welcome(&self, email: &str, name: &str) {
        self.dispatch(Message::welcome(email, name));
    }

    pub fn send_cancellation(&self, email: &str, name: &str) {
        self.dispatch(Message::cancellation(email, name));
    }

    fn dispatch(&self, message: Message) {
        let notifier = self.notifier.clone();

        tokio::spawn(async move {
            if let Err(e) = notifier.send(&message).await {
                warn!(to = %message.to, subject = %message.subject, error = %e, "Failed to send notification");
            }
        });
    }
}
