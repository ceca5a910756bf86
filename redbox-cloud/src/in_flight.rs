//! Per-record serialization of encryption calls.
//!
//! At most one encryption runs per record id at a time. A second caller for
//! the same record waits for the first to finish; different records never
//! contend. Entries are removed once nobody holds or waits on them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Slots = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Thread-safe registry of per-record locks.
#[derive(Clone, Default)]
pub struct InFlightRegistry {
    slots: Slots,
}

impl InFlightRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other call holds `record_id`, then holds it until the
    /// returned guard is dropped.
    pub async fn acquire(&self, record_id: &str) -> RecordGuard {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
            slots
                .entry(record_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        let guard = slot.lock_owned().await;
        RecordGuard {
            record_id: record_id.to_string(),
            slots: self.slots.clone(),
            guard: Some(guard),
        }
    }

    /// Returns true if some call currently holds or waits on `record_id`.
    pub fn is_busy(&self, record_id: &str) -> bool {
        self.slots
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .contains_key(record_id)
    }

    /// Number of records with a holder or waiter.
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Holds a record's slot; releases it on drop.
pub struct RecordGuard {
    record_id: String,
    slots: Slots,
    guard: Option<OwnedMutexGuard<()>>,
}

impl RecordGuard {
    pub fn record_id(&self) -> &str {
        &self.record_id
    }
}

impl Drop for RecordGuard {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut slots = self.slots.lock().unwrap_or_else(|p| p.into_inner());
        // Only the map's own reference left: no holder, no waiter.
        if slots
            .get(&self.record_id)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            slots.remove(&self.record_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn guard_release_clears_entry() {
        let registry = InFlightRegistry::new();
        let guard = registry.acquire("rec-1").await;
        assert!(registry.is_busy("rec-1"));
        assert_eq!(guard.record_id(), "rec-1");
        drop(guard);
        assert!(!registry.is_busy("rec-1"));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn different_records_do_not_block() {
        let registry = InFlightRegistry::new();
        let _a = registry.acquire("rec-a").await;
        let b = tokio::time::timeout(Duration::from_millis(200), registry.acquire("rec-b")).await;
        assert!(b.is_ok());
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn same_record_waits_for_holder() {
        let registry = InFlightRegistry::new();
        let first = registry.acquire("rec-1").await;

        let waiting = tokio::time::timeout(Duration::from_millis(100), registry.acquire("rec-1")).await;
        assert!(waiting.is_err(), "second acquire must wait");

        let r2 = registry.clone();
        let handle = tokio::spawn(async move {
            let _g = r2.acquire("rec-1").await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(first);
        handle.await.unwrap();
        assert!(registry.is_empty());
    }
}
