// src/batch.rs
//! The candidate batch currently held by the server

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;

use crate::types::CandidateRecord;

/// An ingested upload. Never mutated once stored.
#[derive(Debug)]
pub struct Batch {
    pub candidates: Vec<CandidateRecord>,
    pub source: String,
    pub loaded_at: DateTime<Utc>,
}

impl Batch {
    pub fn new(candidates: Vec<CandidateRecord>, source: impl Into<String>) -> Self {
        Self {
            candidates,
            source: source.into(),
            loaded_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Holder for the single live batch.
///
/// Uploads swap the whole `Arc`; dispatches work on a cloned `Arc`, so a
/// replacement never shows up in the middle of a send loop.
#[derive(Debug, Default)]
pub struct BatchStore {
    current: RwLock<Option<Arc<Batch>>>,
}

impl BatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any previous batch wholesale
    pub async fn replace(&self, batch: Batch) -> Arc<Batch> {
        let batch = Arc::new(batch);
        let previous = self.current.write().await.replace(Arc::clone(&batch));

        info!(
            "Loaded batch of {} candidate(s) from {} (replaced: {})",
            batch.len(),
            batch.source,
            previous.map(|b| b.len().to_string()).unwrap_or_else(|| "none".to_string())
        );
        batch
    }

    pub async fn snapshot(&self) -> Option<Arc<Batch>> {
        self.current.read().await.clone()
    }

    /// Remove and return the batch, leaving the store empty
    pub async fn take(&self) -> Option<Arc<Batch>> {
        self.current.write().await.take()
    }

    pub async fn len(&self) -> usize {
        self.current
            .read()
            .await
            .as_ref()
            .map(|batch| batch.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(email: &str) -> CandidateRecord {
        CandidateRecord::from_fields([("Email", email), ("Test_Link", "http://t")])
    }

    #[tokio::test]
    async fn test_replace_drops_previous_batch() {
        let store = BatchStore::new();
        assert!(store.snapshot().await.is_none());

        store
            .replace(Batch::new(vec![record("a@x.com"), record("b@x.com")], "first.csv"))
            .await;
        store
            .replace(Batch::new(vec![record("c@x.com")], "second.csv"))
            .await;

        let current = store.snapshot().await.unwrap();
        assert_eq!(current.source, "second.csv");
        assert_eq!(current.len(), 1);
        assert_eq!(current.candidates[0].email(), Some("c@x.com"));
    }

    #[tokio::test]
    async fn test_snapshot_survives_replacement() {
        let store = BatchStore::new();
        store
            .replace(Batch::new(vec![record("a@x.com")], "first.csv"))
            .await;

        let snapshot = store.snapshot().await.unwrap();
        store.replace(Batch::new(Vec::new(), "second.csv")).await;

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_take_empties_store() {
        let store = BatchStore::new();
        store
            .replace(Batch::new(vec![record("a@x.com")], "first.csv"))
            .await;

        assert_eq!(store.take().await.map(|b| b.len()), Some(1));
        assert!(store.take().await.is_none());
        assert_eq!(store.len().await, 0);
    }
}
