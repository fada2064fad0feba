//! In-process keyed mutual exclusion.
//!
//! Occupancy operations lock the parking spot first and the license plate
//! second. Entries exist only while someone holds or waits for them.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use parkade_core::validation::LicensePlate;

pub fn spot_key(spot_id: Uuid) -> String {
    format!("spot:{spot_id}")
}

pub fn plate_key(plate: &LicensePlate) -> String {
    format!("plate:{plate}")
}

/// A set of async mutexes addressed by string key.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    slots: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: String) -> KeyGuard<'_> {
        // The shard lock is released before awaiting.
        let slot = self.slots.entry(key.clone()).or_default().clone();
        let guard = slot.lock_owned().await;
        KeyGuard {
            locks: self,
            key,
            guard: Some(guard),
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Held access to one key. Dropping it releases the mutex and removes the
/// entry if nobody else is waiting on it.
pub struct KeyGuard<'a> {
    locks: &'a KeyedLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks
            .slots
            .remove_if(&self.key, |_, slot| Arc::strong_count(slot) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn entries_are_removed_once_released() {
        let locks = KeyedLocks::new();
        {
            let _a = locks.lock("spot:a".into()).await;
            let _b = locks.lock("plate:b".into()).await;
            assert_eq!(locks.len(), 2);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn same_key_is_serialized() {
        let locks = Arc::new(KeyedLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let inside = inside.clone();
            let max_inside = max_inside.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock("spot:shared".into()).await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn different_keys_do_not_block_each_other() {
        let locks = KeyedLocks::new();
        let _a = locks.lock("spot:a".into()).await;
        let b = tokio::time::timeout(Duration::from_millis(50), locks.lock("spot:b".into())).await;
        assert!(b.is_ok());
    }
}
