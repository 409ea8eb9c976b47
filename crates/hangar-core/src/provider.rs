//! Traits for the two external systems Hangar reads from: the citizen
//! directory and the ship catalog.
//!
//! Implementations perform plain I/O and never retry; retry and backoff are
//! the caller's business.

use std::{future::Future, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{citizen::Handle, ship_info::ShipInfo};

// ─── Citizen directory ───────────────────────────────────────────────────────

/// A citizen record exactly as the directory returned it. Nothing here is
/// validated yet; see `hangar_fleet::identity`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
  pub handle:         Option<String>,
  pub citizen_number: Option<String>,
  pub bio:            Option<String>,
  #[serde(default)]
  pub organizations:  Vec<DirectoryOrganization>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryOrganization {
  pub sid:  Option<String>,
  pub rank: Option<i64>,
}

pub trait CitizenDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Look up a handle. `Ok(None)` means the directory has no such handle.
  fn lookup<'a>(
    &'a self,
    handle: &'a Handle,
  ) -> impl Future<Output = Result<Option<DirectoryRecord>, Self::Error>> + Send + 'a;
}

impl<T: CitizenDirectory> CitizenDirectory for Arc<T> {
  type Error = T::Error;

  fn lookup<'a>(
    &'a self,
    handle: &'a Handle,
  ) -> impl Future<Output = Result<Option<DirectoryRecord>, Self::Error>> + Send + 'a {
    (**self).lookup(handle)
  }
}

// ─── Ship catalog ────────────────────────────────────────────────────────────

pub trait ShipCatalogProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The full catalog listing.
  fn all_ships(
    &self,
  ) -> impl Future<Output = Result<Vec<ShipInfo>, Self::Error>> + Send + '_;

  /// Every variant built on one chassis.
  fn ships_by_chassis<'a>(
    &'a self,
    chassis_id: &'a str,
  ) -> impl Future<Output = Result<Vec<ShipInfo>, Self::Error>> + Send + 'a;

  /// One request resolving any number of ids and (lower-cased) names.
  /// Unknown ids and names are simply absent from the result.
  fn ships_bulk<'a>(
    &'a self,
    ids: &'a [String],
    names: &'a [String],
  ) -> impl Future<Output = Result<Vec<ShipInfo>, Self::Error>> + Send + 'a;
}

impl<T: ShipCatalogProvider> ShipCatalogProvider for Arc<T> {
  type Error = T::Error;

  fn all_ships(
    &self,
  ) -> impl Future<Output = Result<Vec<ShipInfo>, Self::Error>> + Send + '_ {
    (**self).all_ships()
  }

  fn ships_by_chassis<'a>(
    &'a self,
    chassis_id: &'a str,
  ) -> impl Future<Output = Result<Vec<ShipInfo>, Self::Error>> + Send + 'a {
    (**self).ships_by_chassis(chassis_id)
  }

  fn ships_bulk<'a>(
    &'a self,
    ids: &'a [String],
    names: &'a [String],
  ) -> impl Future<Output = Result<Vec<ShipInfo>, Self::Error>> + Send + 'a {
    (**self).ships_bulk(ids, names)
  }
}
