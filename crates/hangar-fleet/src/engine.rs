//! The fleet versioning engine.
//!
//! `ingest` reads the citizen's latest snapshot, enforces the upload cooldown,
//! parses the entries and appends the next version. The whole sequence runs
//! under the citizen's lock, and the store's `(owner, version)` uniqueness
//! catches anything that slips past it (another process sharing the
//! database, for instance).

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, TimeDelta, Utc};
use hangar_core::{
  fleet::Fleet,
  store::{HangarStore, SaveOutcome},
};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  error::{Error, Result},
  locks::CitizenLocks,
  parse::parse_ship_entries,
};

/// Minimum time between two uploads from the same citizen.
pub const UPLOAD_COOLDOWN: Duration = Duration::from_secs(10 * 60);

pub struct FleetVersioningEngine<S> {
  store:    Arc<S>,
  cooldown: TimeDelta,
  locks:    CitizenLocks,
}

impl<S: HangarStore> FleetVersioningEngine<S> {
  pub fn new(store: Arc<S>) -> Self { Self::with_cooldown(store, UPLOAD_COOLDOWN) }

  pub fn with_cooldown(store: Arc<S>, cooldown: Duration) -> Self {
    Self {
      store,
      cooldown: TimeDelta::from_std(cooldown).unwrap_or(TimeDelta::MAX),
      locks: CitizenLocks::new(),
    }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn cooldown(&self) -> TimeDelta { self.cooldown }

  /// Append a new fleet version for `citizen_id` built from `entries`.
  pub async fn ingest(&self, citizen_id: Uuid, entries: &[Value]) -> Result<Fleet> {
    self.ingest_at(citizen_id, entries, Utc::now()).await
  }

  /// [`ingest`](Self::ingest) with an explicit clock reading.
  pub async fn ingest_at(
    &self,
    citizen_id: Uuid,
    entries: &[Value],
    now: DateTime<Utc>,
  ) -> Result<Fleet> {
    let _guard = self.locks.lock(citizen_id).await;

    let previous = self
      .store
      .latest_fleet(citizen_id)
      .await
      .map_err(Error::store)?;

    if let Some(prev) = &previous
      && prev.is_uploaded_too_close(now, self.cooldown)
    {
      warn!(
        %citizen_id,
        last_upload = %prev.uploaded_at,
        "rejected fleet upload inside cooldown window"
      );
      return Err(Error::FleetUploadedTooClose { last_upload: prev.uploaded_at });
    }

    let ships = parse_ship_entries(entries).inspect_err(|e| {
      warn!(%citizen_id, error = %e, "rejected malformed fleet upload");
    })?;

    let fleet = Fleet::next_version(citizen_id, previous.as_ref(), now, ships);
    match self.store.save_fleet(&fleet).await.map_err(Error::store)? {
      SaveOutcome::Saved => {
        info!(
          %citizen_id,
          version = fleet.version,
          ships = fleet.ships.len(),
          "stored new fleet version"
        );
        Ok(fleet)
      }
      SaveOutcome::VersionConflict => {
        warn!(%citizen_id, version = fleet.version, "fleet version already taken");
        Err(Error::VersionConflict { citizen_id, version: fleet.version })
      }
    }
  }

  /// The newest snapshot for `citizen_id`, if it ever uploaded.
  pub async fn latest_fleet(&self, citizen_id: Uuid) -> Result<Option<Fleet>> {
    self.store.latest_fleet(citizen_id).await.map_err(Error::store)
  }
}
