//! Recording mailer for testing.

use crate::application::ports::Mailer;
use crate::domain::email::{MailError, OutgoingEmail, SendReceipt};
use std::sync::{Arc, Mutex};

/// Mailer that records every email instead of sending it.
///
/// Clones share the same outbox. Call `fail_with` to make every following
/// send return a provider error.
#[derive(Debug, Clone, Default)]
pub struct RecordingMailer {
    inner: Arc<Mutex<Outbox>>,
}

#[derive(Debug, Default)]
struct Outbox {
    sent: Vec<OutgoingEmail>,
    failure: Option<String>,
}

impl RecordingMailer {
    /// Create an empty recording mailer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail with a provider error.
    pub fn fail_with(&self, reason: &str) {
        self.outbox().failure = Some(reason.to_string());
    }

    /// Emails accepted so far.
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.outbox().sent.clone()
    }

    fn outbox(&self) -> std::sync::MutexGuard<'_, Outbox> {
        self.inner
            .lock()
            .expect("RecordingMailer mutex poisoned - a test thread panicked while holding the lock")
    }
}

impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<SendReceipt, MailError> {
        let mut outbox = self.outbox();
        if let Some(reason) = &outbox.failure {
            return Err(MailError::Provider(reason.clone()));
        }

        outbox.sent.push(email.clone());
        Ok(SendReceipt {
            id: format!("msg-{}", outbox.sent.len()),
        })
    }
}
