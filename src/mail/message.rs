//! Outbound message and the assessment invitation body

use askama::Template;
use lettre::message::Mailbox;

use super::MailError;

pub const ASSESSMENT_SUBJECT: &str = "Your Online Assessment Link";

/// A single HTML email ready to hand to a sender
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub from: Mailbox,
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Template)]
#[template(path = "assessment_invite.html")]
struct AssessmentInvite<'a> {
    name: &'a str,
    link: &'a str,
}

/// Render the invitation body. Both values are HTML-escaped.
pub fn render_assessment_invite(name: &str, link: &str) -> Result<String, MailError> {
    Ok(AssessmentInvite { name, link }.render()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invite_greets_candidate() {
        let html = render_assessment_invite("Ada", "https://tests.example.com").unwrap();
        assert!(html.starts_with("<p>Dear Ada,</p>"));
        assert!(html.contains("<a href="));
        assert!(html.contains("complete your assessment"));
    }

    #[test]
    fn test_invite_escapes_markup() {
        let html = render_assessment_invite("<b>Eve</b>", "javascript:\"x\"").unwrap();
        assert!(!html.contains("<b>Eve</b>"));
        assert!(html.contains("&lt;b&gt;Eve"));
        assert!(!html.contains("\"x\""));
    }
}
