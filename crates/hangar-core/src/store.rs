//! The `HangarStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `hangar-store-sqlite`).
//! Higher layers (`hangar-fleet`, `hangar-api`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  citizen::{Citizen, CitizenNumber, Handle},
  fleet::Fleet,
  ship_info::ShipNameAlias,
};

/// Result of [`HangarStore::save_fleet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
  Saved,
  /// Another fleet already holds this `(owner, version)` pair. Nothing was
  /// written.
  VersionConflict,
}

/// Abstraction over a Hangar storage backend.
///
/// Fleets are append-only: `save_fleet` inserts a snapshot and its ships as
/// one unit and never touches earlier versions. Citizens are upserted whole.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait HangarStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Citizens ──────────────────────────────────────────────────────────

  fn get_citizen(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Citizen>, Self::Error>> + Send + '_;

  fn get_citizen_by_number<'a>(
    &'a self,
    number: &'a CitizenNumber,
  ) -> impl Future<Output = Result<Option<Citizen>, Self::Error>> + Send + 'a;

  /// Case-insensitive lookup on the current handle.
  fn get_citizen_by_handle<'a>(
    &'a self,
    handle: &'a Handle,
  ) -> impl Future<Output = Result<Option<Citizen>, Self::Error>> + Send + 'a;

  /// Insert or fully replace a citizen, including its membership set.
  fn save_citizen<'a>(
    &'a self,
    citizen: &'a Citizen,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Every citizen holding a membership in `sid`, with all their
  /// memberships loaded.
  fn organization_members<'a>(
    &'a self,
    sid: &'a str,
  ) -> impl Future<Output = Result<Vec<Citizen>, Self::Error>> + Send + 'a;

  // ── Fleets ────────────────────────────────────────────────────────────

  /// The highest version stored for `owner_id`.
  fn latest_fleet(
    &self,
    owner_id: Uuid,
  ) -> impl Future<Output = Result<Option<Fleet>, Self::Error>> + Send + '_;

  fn fleet_version(
    &self,
    owner_id: Uuid,
    version: u32,
  ) -> impl Future<Output = Result<Option<Fleet>, Self::Error>> + Send + '_;

  /// Persist a fleet and all of its ships atomically.
  fn save_fleet<'a>(
    &'a self,
    fleet: &'a Fleet,
  ) -> impl Future<Output = Result<SaveOutcome, Self::Error>> + Send + 'a;

  // ── Ship name aliases ─────────────────────────────────────────────────

  fn ship_name_aliases(
    &self,
  ) -> impl Future<Output = Result<Vec<ShipNameAlias>, Self::Error>> + Send + '_;

  fn save_ship_name_alias<'a>(
    &'a self,
    alias: &'a ShipNameAlias,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
