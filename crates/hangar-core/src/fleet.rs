//! Fleet snapshots and the ships they contain.
//!
//! A fleet is an immutable, versioned snapshot of everything a citizen owned
//! at upload time. Fleets are never updated; a new upload always produces a
//! new fleet with the next version number.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Money ───────────────────────────────────────────────────────────────────

/// A currency amount in minor units (cents).
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash, Serialize,
  Deserialize,
)]
#[serde(transparent)]
pub struct Money(pub i64);

impl Money {
  pub fn minor_units(self) -> i64 { self.0 }
}

impl fmt::Display for Money {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "${}.{:02}", self.0 / 100, (self.0 % 100).abs())
  }
}

// ─── Ship ────────────────────────────────────────────────────────────────────

/// One parsed line of an uploaded fleet, before it is attached to a fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipEntry {
  pub manufacturer: String,
  /// The hangar name as uploaded; reconciled against catalog names on read.
  pub name:         String,
  /// Lifetime insurance.
  pub insured:      bool,
  pub cost:         Money,
  pub pledge_date:  NaiveDate,
  /// The original JSON object, kept verbatim for audit.
  pub raw:          serde_json::Value,
}

/// A ship line item belonging to exactly one fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ship {
  pub ship_id:      Uuid,
  pub fleet_id:     Uuid,
  /// Denormalised copy of [`Fleet::owner_id`].
  pub owner_id:     Uuid,
  pub manufacturer: String,
  pub name:         String,
  pub insured:      bool,
  pub cost:         Money,
  pub pledge_date:  NaiveDate,
  pub raw:          serde_json::Value,
}

// ─── Fleet ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fleet {
  pub fleet_id:    Uuid,
  pub owner_id:    Uuid,
  /// Starts at 1 and increases by exactly one per upload.
  pub version:     u32,
  pub uploaded_at: DateTime<Utc>,
  pub ships:       Vec<Ship>,
}

impl Fleet {
  /// Build the next snapshot for `owner_id` following `previous`.
  pub fn next_version(
    owner_id: Uuid,
    previous: Option<&Fleet>,
    uploaded_at: DateTime<Utc>,
    entries: Vec<ShipEntry>,
  ) -> Self {
    let fleet_id = Uuid::new_v4();
    let ships = entries
      .into_iter()
      .map(|e| Ship {
        ship_id: Uuid::new_v4(),
        fleet_id,
        owner_id,
        manufacturer: e.manufacturer,
        name: e.name,
        insured: e.insured,
        cost: e.cost,
        pledge_date: e.pledge_date,
        raw: e.raw,
      })
      .collect();

    Self {
      fleet_id,
      owner_id,
      version: previous.map_or(1, |f| f.version + 1),
      uploaded_at,
      ships,
    }
  }

  /// Whether a new upload at `now` falls inside the cooldown window that
  /// started with this snapshot.
  pub fn is_uploaded_too_close(&self, now: DateTime<Utc>, cooldown: Duration) -> bool {
    now - self.uploaded_at < cooldown
  }
}
