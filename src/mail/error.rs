//! Mail error types

use thiserror::Error;

/// Errors raised while building or sending one message.
///
/// The `Display` output is what ends up as the failure reason for a
/// candidate, so variants carry the underlying message verbatim.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("failed to render email template: {0}")]
    Template(#[from] askama::Error),

    #[error("failed to build message: {0}")]
    Message(String),

    /// Error reported by the transport itself
    #[error("{0}")]
    Transport(String),

    #[error("email configuration error: {0}")]
    Config(String),
}

impl MailError {
    pub fn transport<T: Into<String>>(msg: T) -> Self {
        Self::Transport(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }
}
