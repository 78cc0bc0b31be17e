//! In-memory senders for tests

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{EmailSender, MailError, OutboundEmail};

/// Records every message it is given.
///
/// Recipients registered through [`RecordingSender::failing_for`] are
/// rejected with a transport error instead, after being recorded as
/// attempted.
#[derive(Debug, Clone, Default)]
pub struct RecordingSender {
    sent: Arc<Mutex<Vec<OutboundEmail>>>,
    attempts: Arc<Mutex<usize>>,
    rejected: Arc<HashSet<String>>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for<I, S>(recipients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rejected: Arc::new(recipients.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Number of `send` calls, successful or not
    ///
    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }

    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }

    /// # Panics
    ///
    /// Panics if the mutex is poisoned
    pub fn sent_to(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|email| email.to.clone())
            .collect()
    }
}

#[async_trait]
impl EmailSender for RecordingSender {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        *self.attempts.lock().unwrap() += 1;

        if self.rejected.contains(&email.to) {
            return Err(MailError::transport(format!(
                "mailbox unavailable: {}",
                email.to
            )));
        }

        self.sent.lock().unwrap().push(email);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "recording"
    }
}
