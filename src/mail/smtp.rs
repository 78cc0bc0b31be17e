//! SMTP sender backed by `lettre`

use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::Deserialize;
use tracing::debug;

use super::{EmailSender, MailError, OutboundEmail};

/// SMTP connection settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    /// 587 for STARTTLS, 465 for implicit TLS
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_tls: bool,
    pub timeout_secs: u64,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            username: None,
            password: None,
            use_tls: true,
            timeout_secs: 30,
        }
    }
}

impl SmtpConfig {
    pub fn has_credentials(&self) -> bool {
        self.username.as_deref().is_some_and(|u| !u.is_empty())
            && self.password.as_deref().is_some_and(|p| !p.is_empty())
    }
}

pub struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpSender {
    /// Build the transport once. No connection is made until the first send.
    ///
    /// Must be called inside a Tokio runtime: the pooled transport spawns its
    /// connection reaper on construction.
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let builder = if !config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        } else if config.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| MailError::config(format!("TLS relay for {}: {e}", config.host)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host).map_err(|e| {
                MailError::config(format!("STARTTLS relay for {}: {e}", config.host))
            })?
        };

        let mut builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }

    fn build_message(email: &OutboundEmail) -> Result<Message, MailError> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|_| MailError::InvalidAddress(email.to.clone()))?;

        Message::builder()
            .from(email.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone())
            .map_err(|e| MailError::Message(e.to_string()))
    }
}

#[async_trait]
impl EmailSender for SmtpSender {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        let message = Self::build_message(&email)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::transport(e.to_string()))?;

        debug!("SMTP relay accepted message for {}", email.to);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "smtp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(to: &str) -> OutboundEmail {
        OutboundEmail {
            from: "\"Talent Acquisition\" <hr@example.com>".parse().unwrap(),
            to: to.to_string(),
            subject: "Your Online Assessment Link".to_string(),
            html: "<p>Hello</p>".to_string(),
        }
    }

    #[test]
    fn test_build_message() {
        assert!(SmtpSender::build_message(&email("ada@example.com")).is_ok());
    }

    #[test]
    fn test_build_message_rejects_bad_recipient() {
        let err = SmtpSender::build_message(&email("not-an-address")).unwrap_err();
        assert_eq!(err.to_string(), "invalid email address: not-an-address");
    }

    #[tokio::test]
    async fn test_plain_transport_builds_without_connecting() {
        let config = SmtpConfig {
            host: "localhost".to_string(),
            port: 2525,
            use_tls: false,
            ..SmtpConfig::default()
        };
        let sender = SmtpSender::new(&config).unwrap();
        assert_eq!(sender.backend_name(), "smtp");
    }

    #[test]
    fn test_credentials_detection() {
        let mut config = SmtpConfig::default();
        assert!(!config.has_credentials());

        config.username = Some("hr@example.com".to_string());
        config.password = Some(String::new());
        assert!(!config.has_credentials());

        config.password = Some("secret".to_string());
        assert!(config.has_credentials());
    }
}
