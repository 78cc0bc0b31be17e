// src/types/mod.rs
pub mod candidate;
pub mod delivery;

pub use candidate::{CandidateField, CandidateRecord, DEFAULT_DISPLAY_NAME};
pub use delivery::{DispatchResult, FailedDelivery, MISSING_FIELDS_REASON};
