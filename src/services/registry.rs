//! In-process registry of running batches and their cancellation flags.
//!
//! The dispatcher registers a flag when fan-out starts and checks it before
//! dispatching each pair; the cancel endpoint trips it. In-flight calls are
//! allowed to finish but their results no longer reach the counters (the
//! status guard in the increment statement makes late writes no-ops).

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;
use uuid::Uuid;

/// Cancellation flag handed to a batch run.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the batch was cancelled; checked before each dispatch.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Trip the flag. No new scoring calls start afterwards.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Registry of active batch runs keyed by batch id.
#[derive(Clone, Default)]
pub struct BatchRegistry {
    inner: Arc<RwLock<HashMap<Uuid, CancelFlag>>>,
}

impl BatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a batch run and return its cancellation flag.
    pub async fn register(&self, batch_id: Uuid) -> CancelFlag {
        let flag = CancelFlag::new();
        self.inner.write().await.insert(batch_id, flag.clone());
        flag
    }

    /// Trip a batch's flag. Returns false when the batch is not running in
    /// this process (already finished, or running elsewhere - the persisted
    /// status still stops it at its next increment).
    pub async fn cancel(&self, batch_id: Uuid) -> bool {
        match self.inner.read().await.get(&batch_id) {
            Some(flag) => {
                flag.cancel();
                true
            }
            None => false,
        }
    }

    /// Remove a finished batch.
    pub async fn remove(&self, batch_id: Uuid) {
        self.inner.write().await.remove(&batch_id);
    }

    /// Number of batches currently running in this process.
    pub async fn active_count(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_cancel_remove() {
        let registry = BatchRegistry::new();
        let id = Uuid::now_v7();

        let flag = registry.register(id).await;
        assert!(!flag.is_cancelled());
        assert_eq!(registry.active_count().await, 1);

        assert!(registry.cancel(id).await);
        assert!(flag.is_cancelled());

        registry.remove(id).await;
        assert_eq!(registry.active_count().await, 0);
    }

    #[tokio::test]
    async fn test_cancel_unknown_batch() {
        let registry = BatchRegistry::new();
        assert!(!registry.cancel(Uuid::now_v7()).await);
    }
}
