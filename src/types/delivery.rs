// src/types/delivery.rs
//! Outcome of one bulk dispatch

use serde::Serialize;

use super::candidate::CandidateRecord;

/// Reason recorded for rows that cannot be dispatched
pub const MISSING_FIELDS_REASON: &str = "missing email or test link";

/// A candidate that did not receive its email, with the reason why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDelivery {
    pub candidate: CandidateRecord,
    pub reason: String,
}

impl FailedDelivery {
    pub fn new(candidate: CandidateRecord, reason: impl Into<String>) -> Self {
        Self {
            candidate,
            reason: reason.into(),
        }
    }

    pub fn missing_fields(candidate: CandidateRecord) -> Self {
        Self::new(candidate, MISSING_FIELDS_REASON)
    }
}

/// Sent count plus failures, in batch order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchResult {
    pub sent: usize,
    pub failed: Vec<FailedDelivery>,
}

impl DispatchResult {
    pub fn attempted(&self) -> usize {
        self.sent + self.failed.len()
    }
}
