// src/dispatch.rs
//! Bulk dispatch: one invitation per deliverable candidate

use std::str::FromStr;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use lettre::message::Mailbox;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::mail::{render_assessment_invite, EmailSender, OutboundEmail, ASSESSMENT_SUBJECT};
use crate::types::{CandidateRecord, DispatchResult, FailedDelivery};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no candidates loaded")]
    NoCandidates,

    /// The configured sender address cannot be used
    #[error("invalid sender address: {0}")]
    Sender(String),
}

/// What happens to the batch once a dispatch starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchMode {
    /// The batch stays loaded; dispatching again re-sends to everyone
    #[default]
    Resend,
    /// The batch is consumed; a new upload is needed before the next send
    OneShot,
}

impl FromStr for DispatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "resend" => Ok(Self::Resend),
            "one-shot" | "one_shot" | "oneshot" => Ok(Self::OneShot),
            other => Err(format!(
                "unknown dispatch mode '{other}', expected resend or one-shot"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    pub from_name: String,
    pub from_address: Option<String>,
    pub subject: String,
    /// Sends in flight at once; 1 means strictly sequential
    pub concurrency: usize,
    pub mode: DispatchMode,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            from_name: "Talent Acquisition".to_string(),
            from_address: None,
            subject: ASSESSMENT_SUBJECT.to_string(),
            concurrency: 1,
            mode: DispatchMode::Resend,
        }
    }
}

pub struct Dispatcher {
    sender: Arc<dyn EmailSender>,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(sender: Arc<dyn EmailSender>, settings: DispatchSettings) -> Self {
        Self { sender, settings }
    }

    pub fn mode(&self) -> DispatchMode {
        self.settings.mode
    }

    pub fn backend_name(&self) -> &'static str {
        self.sender.backend_name()
    }

    pub fn sender_mailbox(&self) -> Result<Mailbox, DispatchError> {
        let address = self
            .settings
            .from_address
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| {
                DispatchError::Sender("no sender address configured (set SMTP_USER)".to_string())
            })?;

        let address = address
            .trim()
            .parse()
            .map_err(|e| DispatchError::Sender(format!("{address}: {e}")))?;

        Ok(Mailbox::new(Some(self.settings.from_name.clone()), address))
    }

    /// Send the invitation to every candidate, in order.
    ///
    /// Per-candidate problems end up in the result's failure list and never
    /// stop the loop. An unusable sender address is reported against every
    /// deliverable candidate, like any other transport failure. Only an
    /// empty batch fails the whole call.
    pub async fn dispatch(
        &self,
        candidates: &[CandidateRecord],
    ) -> Result<DispatchResult, DispatchError> {
        if candidates.is_empty() {
            return Err(DispatchError::NoCandidates);
        }

        let from = self.sender_mailbox().map_err(|e| e.to_string());
        if let Err(reason) = &from {
            warn!("No usable sender, every send will fail: {}", reason);
        }
        let concurrency = self.settings.concurrency.max(1);

        info!(
            "Dispatching to {} candidate(s) via {} (concurrency {})",
            candidates.len(),
            self.sender.backend_name(),
            concurrency
        );

        // buffered() yields in input order regardless of completion order
        let pending: Vec<_> = candidates
            .iter()
            .map(|candidate| self.deliver(candidate, from.as_ref().map_err(String::as_str)))
            .collect();
        let outcomes: Vec<Result<(), FailedDelivery>> = stream::iter(pending)
            .buffered(concurrency)
            .collect()
            .await;

        let mut result = DispatchResult::default();
        for outcome in outcomes {
            match outcome {
                Ok(()) => result.sent += 1,
                Err(failure) => result.failed.push(failure),
            }
        }

        info!(
            "Dispatch finished: {} sent, {} failed",
            result.sent,
            result.failed.len()
        );
        Ok(result)
    }

    async fn deliver(
        &self,
        candidate: &CandidateRecord,
        from: Result<&Mailbox, &str>,
    ) -> Result<(), FailedDelivery> {
        let (Some(email), Some(link)) = (candidate.email(), candidate.test_link()) else {
            warn!(
                "Skipping candidate without email or test link: {}",
                candidate.display_name()
            );
            return Err(FailedDelivery::missing_fields(candidate.clone()));
        };

        let from = from.map_err(|reason| FailedDelivery::new(candidate.clone(), reason))?;

        let html = render_assessment_invite(candidate.display_name(), link)
            .map_err(|e| FailedDelivery::new(candidate.clone(), e.to_string()))?;

        let outbound = OutboundEmail {
            from: from.clone(),
            to: email.to_string(),
            subject: self.settings.subject.clone(),
            html,
        };

        match self.sender.send(outbound).await {
            Ok(()) => {
                info!("Sent assessment link to {}", email);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to send to {}: {}", email, e);
                Err(FailedDelivery::new(candidate.clone(), e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::parse_candidates;
    use crate::mail::testing::RecordingSender;
    use crate::types::MISSING_FIELDS_REASON;

    fn settings() -> DispatchSettings {
        DispatchSettings {
            from_address: Some("hr@example.com".to_string()),
            ..DispatchSettings::default()
        }
    }

    fn dispatcher(sender: &RecordingSender, settings: DispatchSettings) -> Dispatcher {
        Dispatcher::new(Arc::new(sender.clone()), settings)
    }

    fn valid(n: usize) -> Vec<CandidateRecord> {
        (0..n)
            .map(|i| {
                CandidateRecord::from_fields([
                    ("Name".to_string(), format!("C{i}")),
                    ("Email".to_string(), format!("c{i}@example.com")),
                    ("Test_Link".to_string(), format!("https://t.example.com/{i}")),
                ])
            })
            .collect()
    }

    #[tokio::test]
    async fn test_scenario_missing_email() {
        let csv = "Name,Email,Test_Link\nAda,ada@x.com,http://t/1\nBob,,http://t/2\n";
        let candidates = parse_candidates(csv.as_bytes()).unwrap();
        let sender = RecordingSender::new();

        let result = dispatcher(&sender, settings())
            .dispatch(&candidates)
            .await
            .unwrap();

        assert_eq!(result.sent, 1);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].candidate.get("Name"), Some("Bob"));
        assert_eq!(result.failed[0].reason, MISSING_FIELDS_REASON);
        assert_eq!(sender.attempts(), 1);
        assert_eq!(sender.sent_to(), vec!["ada@x.com"]);
    }

    #[tokio::test]
    async fn test_all_succeed() {
        let sender = RecordingSender::new();
        let result = dispatcher(&sender, settings())
            .dispatch(&valid(5))
            .await
            .unwrap();

        assert_eq!(result.sent, 5);
        assert!(result.failed.is_empty());

        let sent = sender.sent();
        assert_eq!(sent[0].subject, ASSESSMENT_SUBJECT);
        assert_eq!(sent[0].from.name.as_deref(), Some("Talent Acquisition"));
        assert_eq!(sent[0].from.email.to_string(), "hr@example.com");
        assert!(sent[0].html.contains("Dear C0,"));
    }

    #[tokio::test]
    async fn test_transport_failures_do_not_abort() {
        let sender = RecordingSender::failing_for(["c1@example.com", "c3@example.com"]);
        let candidates = valid(5);
        let result = dispatcher(&sender, settings())
            .dispatch(&candidates)
            .await
            .unwrap();

        assert_eq!(result.sent, 3);
        assert_eq!(result.attempted(), 5);
        assert_eq!(result.failed[0].candidate, candidates[1]);
        assert_eq!(result.failed[1].candidate, candidates[3]);
        assert_eq!(result.failed[0].reason, "mailbox unavailable: c1@example.com");
    }

    #[tokio::test]
    async fn test_concurrent_sends_keep_input_order() {
        let sender = RecordingSender::failing_for(["c2@example.com", "c7@example.com"]);
        let mut candidates = valid(10);
        candidates.insert(4, CandidateRecord::from_fields([("Name", "NoMail")]));

        let result = dispatcher(
            &sender,
            DispatchSettings {
                concurrency: 4,
                ..settings()
            },
        )
        .dispatch(&candidates)
        .await
        .unwrap();

        assert_eq!(result.sent, 8);
        let names: Vec<&str> = result
            .failed
            .iter()
            .filter_map(|f| f.candidate.get("Name"))
            .collect();
        assert_eq!(names, vec!["C2", "NoMail", "C7"]);
    }

    #[tokio::test]
    async fn test_empty_batch_sends_nothing() {
        let sender = RecordingSender::new();
        let err = dispatcher(&sender, settings()).dispatch(&[]).await.unwrap_err();

        assert!(matches!(err, DispatchError::NoCandidates));
        assert_eq!(sender.attempts(), 0);
    }

    #[tokio::test]
    async fn test_missing_sender_address_fails_each_candidate() {
        let sender = RecordingSender::new();
        let mut candidates = valid(2);
        candidates.insert(1, CandidateRecord::from_fields([("Name", "NoMail")]));

        let result = dispatcher(&sender, DispatchSettings::default())
            .dispatch(&candidates)
            .await
            .unwrap();

        assert_eq!(result.sent, 0);
        assert_eq!(result.failed.len(), 3);
        assert_eq!(
            result.failed[0].reason,
            "invalid sender address: no sender address configured (set SMTP_USER)"
        );
        assert_eq!(result.failed[1].candidate.get("Name"), Some("NoMail"));
        assert_eq!(result.failed[1].reason, MISSING_FIELDS_REASON);
        assert_eq!(result.failed[2].candidate, candidates[2]);
        assert_eq!(sender.attempts(), 0);
    }

    #[test]
    fn test_sender_mailbox_rejects_bad_address() {
        let sender = RecordingSender::new();
        let dispatcher = dispatcher(
            &sender,
            DispatchSettings {
                from_address: Some("not an address".to_string()),
                ..settings()
            },
        );

        assert!(matches!(
            dispatcher.sender_mailbox(),
            Err(DispatchError::Sender(_))
        ));
    }

    #[tokio::test]
    async fn test_repeated_dispatch_resends() {
        let sender = RecordingSender::new();
        let dispatcher = dispatcher(&sender, settings());
        let candidates = valid(3);

        dispatcher.dispatch(&candidates).await.unwrap();
        dispatcher.dispatch(&candidates).await.unwrap();

        assert_eq!(sender.attempts(), 6);
    }

    #[test]
    fn test_dispatch_mode_from_str() {
        assert_eq!("resend".parse::<DispatchMode>(), Ok(DispatchMode::Resend));
        assert_eq!("One-Shot".parse::<DispatchMode>(), Ok(DispatchMode::OneShot));
        assert!("twice".parse::<DispatchMode>().is_err());
    }
}
