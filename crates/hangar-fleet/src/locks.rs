//! Per-citizen write serialization.
//!
//! Uploads for one citizen queue behind each other; uploads for different
//! citizens never share a lock. Entries are held weakly so the map only
//! contains citizens with an upload in flight.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex as StdMutex, Weak},
};

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct CitizenLocks {
  inner: StdMutex<HashMap<Uuid, Weak<Mutex<()>>>>,
}

impl CitizenLocks {
  pub fn new() -> Self { Self::default() }

  /// Wait for exclusive access to `citizen_id`'s fleet history.
  pub async fn lock(&self, citizen_id: Uuid) -> OwnedMutexGuard<()> {
    let mutex = {
      // The map is only touched synchronously, a poisoned lock still holds
      // a usable map.
      let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
      map.retain(|_, weak| weak.strong_count() > 0);
      match map.get(&citizen_id).and_then(Weak::upgrade) {
        Some(existing) => existing,
        None => {
          let fresh = Arc::new(Mutex::new(()));
          map.insert(citizen_id, Arc::downgrade(&fresh));
          fresh
        }
      }
    };
    mutex.lock_owned().await
  }

  #[cfg(test)]
  pub(crate) fn tracked(&self) -> usize {
    self.inner.lock().map(|m| m.len()).unwrap_or_default()
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;

  #[tokio::test]
  async fn same_citizen_is_serialized() {
    let locks = Arc::new(CitizenLocks::new());
    let id = Uuid::new_v4();

    let guard = locks.lock(id).await;
    let contender = {
      let locks = locks.clone();
      tokio::spawn(async move {
        let _g = locks.lock(id).await;
      })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!contender.is_finished());
    drop(guard);
    contender.await.unwrap();
  }

  #[tokio::test]
  async fn different_citizens_do_not_contend() {
    let locks = CitizenLocks::new();
    let _a = locks.lock(Uuid::new_v4()).await;
    let _b = tokio::time::timeout(Duration::from_secs(1), locks.lock(Uuid::new_v4()))
      .await
      .expect("second citizen should not wait");
  }

  #[tokio::test]
  async fn released_entries_are_pruned() {
    let locks = CitizenLocks::new();
    drop(locks.lock(Uuid::new_v4()).await);
    drop(locks.lock(Uuid::new_v4()).await);
    // The second call prunes the first entry.
    assert_eq!(locks.tracked(), 1);
  }
}
