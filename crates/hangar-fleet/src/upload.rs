//! The upload pipeline: refresh the uploader's identity, then version the
//! fleet.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use hangar_core::{
  citizen::{Citizen, Handle, OrganizationSid, PublicChoice, Visibility},
  fleet::Fleet,
  provider::CitizenDirectory,
  store::HangarStore,
};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  engine::FleetVersioningEngine,
  error::{Error, Result},
  identity::CitizenIdentityResolver,
  parse::fleet_entries,
};

pub struct FleetUploadHandler<S, D> {
  store:    Arc<S>,
  resolver: CitizenIdentityResolver<D>,
  engine:   Arc<FleetVersioningEngine<S>>,
}

impl<S: HangarStore, D: CitizenDirectory> FleetUploadHandler<S, D> {
  pub fn new(
    store: Arc<S>,
    resolver: CitizenIdentityResolver<D>,
    engine: Arc<FleetVersioningEngine<S>>,
  ) -> Self {
    Self { store, resolver, engine }
  }

  pub fn engine(&self) -> &Arc<FleetVersioningEngine<S>> { &self.engine }

  /// Refresh `citizen` from the directory and store `data` as its next fleet
  /// version. Returns the refreshed citizen alongside the new fleet.
  ///
  /// The handle must still resolve to the citizen's own number; a handle
  /// that now belongs to someone else is [`Error::BadCitizen`] and nothing
  /// is written.
  pub async fn handle(&self, citizen: &Citizen, data: &Value) -> Result<(Citizen, Fleet)> {
    self.handle_at(citizen, data, Utc::now()).await
  }

  pub async fn handle_at(
    &self,
    citizen: &Citizen,
    data: &Value,
    now: DateTime<Utc>,
  ) -> Result<(Citizen, Fleet)> {
    let entries = fleet_entries(data)?;
    let identity = self.resolver.resolve(&citizen.actual_handle).await?;
    if identity.number != citizen.number {
      warn!(
        handle = %citizen.actual_handle,
        stored = %citizen.number,
        resolved = %identity.number,
        "handle resolves to another citizen"
      );
      return Err(Error::BadCitizen {
        handle: citizen.actual_handle.clone(),
        reason: format!(
          "handle now belongs to citizen {}, not {}",
          identity.number, citizen.number
        ),
      });
    }

    let mut refreshed = self
      .store
      .get_citizen(citizen.citizen_id)
      .await
      .map_err(Error::store)?
      .unwrap_or_else(|| citizen.clone());
    refreshed.apply_identity(identity, now);
    self.store.save_citizen(&refreshed).await.map_err(Error::store)?;

    let fleet = self.engine.ingest_at(refreshed.citizen_id, entries, now).await?;
    Ok((refreshed, fleet))
  }

  /// Resolve `handle` and create or update the matching citizen.
  ///
  /// A citizen already stored under the same canonical number keeps its id;
  /// otherwise `account_id` is used for the new record when given. When that
  /// citizen belongs to a different account the call fails with
  /// [`Error::AlreadyLinked`] before anything is saved.
  pub async fn link(&self, handle: &Handle, account_id: Option<Uuid>) -> Result<Citizen> {
    let identity = self.resolver.resolve(handle).await?;
    let now = Utc::now();

    let mut existing = self
      .store
      .get_citizen_by_number(&identity.number)
      .await
      .map_err(Error::store)?;
    if let (Some(found), Some(account)) = (&existing, account_id)
      && found.citizen_id != account
    {
      return Err(Error::AlreadyLinked { number: identity.number });
    }
    if existing.is_none()
      && let Some(id) = account_id
    {
      existing = self.store.get_citizen(id).await.map_err(Error::store)?;
    }

    let citizen = match existing {
      Some(mut citizen) => {
        if !citizen.actual_handle.matches(&identity.handle) {
          info!(
            number = %identity.number,
            old = %citizen.actual_handle,
            new = %identity.handle,
            "citizen handle changed upstream"
          );
        }
        citizen.apply_identity(identity, now);
        citizen
      }
      None => {
        let mut citizen = Citizen::from_identity(identity, now);
        if let Some(id) = account_id {
          citizen.citizen_id = id;
        }
        info!(number = %citizen.number, handle = %citizen.actual_handle, "linked new citizen");
        citizen
      }
    };

    self.store.save_citizen(&citizen).await.map_err(Error::store)?;
    Ok(citizen)
  }
}

// ─── Preferences ─────────────────────────────────────────────────────────────

/// Apply a citizen's sharing preferences and persist them.
///
/// Organizations the citizen is not a member of are ignored.
pub async fn save_preferences<S: HangarStore>(
  store: &S,
  mut citizen: Citizen,
  public_choice: PublicChoice,
  visibilities: &HashMap<OrganizationSid, Visibility>,
) -> Result<Citizen> {
  citizen.public_choice = public_choice;
  for (sid, visibility) in visibilities {
    if let Some(membership) = citizen.membership_mut(sid) {
      membership.visibility = *visibility;
    }
  }
  store.save_citizen(&citizen).await.map_err(Error::store)?;
  Ok(citizen)
}

/// The latest fleet of each citizen in `members` that ever uploaded, in
/// member order.
pub async fn latest_fleets_of_organization<S: HangarStore>(
  store: &S,
  members: &[Citizen],
) -> Result<Vec<(Citizen, Fleet)>> {
  let mut fleets = Vec::with_capacity(members.len());
  for member in members {
    if let Some(fleet) = store
      .latest_fleet(member.citizen_id)
      .await
      .map_err(Error::store)?
    {
      fleets.push((member.clone(), fleet));
    }
  }
  Ok(fleets)
}
