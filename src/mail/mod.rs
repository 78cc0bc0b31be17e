//! Outbound mail: the sender abstraction and its backends
//!
//! - **SMTP**: delivers through an SMTP relay (production)
//! - **Console**: logs messages without delivering (development)
//! - **Recording**: keeps messages in memory (tests)

mod console;
mod error;
mod message;
mod smtp;
pub mod testing;

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

pub use console::ConsoleSender;
pub use error::MailError;
pub use message::{render_assessment_invite, OutboundEmail, ASSESSMENT_SUBJECT};
pub use smtp::{SmtpConfig, SmtpSender};

/// Anything able to deliver one [`OutboundEmail`]
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send a single email
    ///
    /// # Errors
    ///
    /// Returns a `MailError` whose message is reported back as the
    /// candidate's failure reason
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError>;

    fn backend_name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailBackend {
    #[default]
    Smtp,
    Console,
}

impl FromStr for MailBackend {
    type Err = MailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "smtp" => Ok(Self::Smtp),
            "console" | "log" => Ok(Self::Console),
            other => Err(MailError::config(format!(
                "unknown mail backend '{other}', expected smtp or console"
            ))),
        }
    }
}

/// Build the configured sender
pub fn build_sender(
    backend: MailBackend,
    smtp: &SmtpConfig,
) -> Result<Arc<dyn EmailSender>, MailError> {
    Ok(match backend {
        MailBackend::Smtp => Arc::new(SmtpSender::new(smtp)?),
        MailBackend::Console => Arc::new(ConsoleSender::new()),
    })
}
