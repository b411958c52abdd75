//! Mailer trait and its type-erased wrapper.

use std::future::Future;
use std::pin::Pin;

use ragchat_types::mail::{EmailMessage, MailError};

/// A mail transport (Gmail API, logging sink, ...).
///
/// Implementations live in ragchat-infra.
pub trait Mailer: Send + Sync {
    /// Transport name for logs (e.g., "gmail").
    fn name(&self) -> &str;

    /// Deliver one message.
    fn send(
        &self,
        message: &EmailMessage,
    ) -> impl std::future::Future<Output = Result<(), MailError>> + Send;
}

pub trait MailerDyn: Send + Sync {
    fn name_dyn(&self) -> &str;

    fn send_boxed<'a>(
        &'a self,
        message: &'a EmailMessage,
    ) -> Pin<Box<dyn Future<Output = Result<(), MailError>> + Send + 'a>>;
}

impl<T: Mailer> MailerDyn for T {
    fn name_dyn(&self) -> &str {
        self.name()
    }

    fn send_boxed<'a>(
        &'a self,
        message: &'a EmailMessage,
    ) -> Pin<Box<dyn Future<Output = Result<(), MailError>> + Send + 'a>> {
        Box::pin(self.send(message))
    }
}

/// Type-erased mailer selected from config at startup.
pub struct BoxMailer {
    inner: Box<dyn MailerDyn + Send + Sync>,
}

impl BoxMailer {
    pub fn new<T: Mailer + 'static>(mailer: T) -> Self {
        Self {
            inner: Box::new(mailer),
        }
    }
}

impl Mailer for BoxMailer {
    fn name(&self) -> &str {
        self.inner.name_dyn()
    }

    fn send(&self, message: &EmailMessage) -> impl Future<Output = Result<(), MailError>> + Send {
        async move { self.inner.send_boxed(message).await }
    }
}
