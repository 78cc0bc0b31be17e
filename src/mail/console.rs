//! Development sender that logs instead of delivering

use async_trait::async_trait;
use tracing::{debug, info};

use super::{EmailSender, MailError, OutboundEmail};

#[derive(Debug, Clone, Default)]
pub struct ConsoleSender;

impl ConsoleSender {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmailSender for ConsoleSender {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        info!(
            from = %email.from,
            to = %email.to,
            subject = %email.subject,
            "Email (console backend, not delivered)"
        );
        debug!("Body:\n{}", email.html);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "console"
    }
}
