//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, dates are `YYYY-MM-DD`, UUIDs are
//! hyphenated lowercase strings, raw ship payloads are compact JSON.

use chrono::{DateTime, NaiveDate, Utc};
use hangar_core::{
  citizen::{
    Citizen, CitizenNumber, Handle, OrganizationMembership, PublicChoice,
    Visibility,
  },
  fleet::{Fleet, Money, Ship},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Dates ────────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Integers ─────────────────────────────────────────────────────────────────

pub fn decode_u32(column: &'static str, value: i64) -> Result<u32> {
  u32::try_from(value).map_err(|_| Error::OutOfRange { column, value })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `citizens` row.
pub struct RawCitizen {
  pub citizen_id:    String,
  pub number:        String,
  pub actual_handle: String,
  pub bio:           Option<String>,
  pub public_choice: String,
  pub updated_at:    String,
}

/// Raw values read from `citizen_organizations`.
pub struct RawMembership {
  pub organization_sid: String,
  pub rank:             i64,
  pub visibility:       String,
}

impl RawMembership {
  pub fn into_membership(self) -> Result<OrganizationMembership> {
    Ok(OrganizationMembership {
      organization_sid: self.organization_sid,
      rank:             decode_u32("rank", self.rank)?,
      visibility:       self.visibility.parse::<Visibility>()?,
    })
  }
}

impl RawCitizen {
  /// Combine the row with its memberships. `memberships` must already be
  /// filtered to this citizen and ordered by position.
  pub fn into_citizen(self, memberships: Vec<RawMembership>) -> Result<Citizen> {
    Ok(Citizen {
      citizen_id:    decode_uuid(&self.citizen_id)?,
      number:        CitizenNumber(self.number),
      actual_handle: Handle(self.actual_handle),
      bio:           self.bio,
      organizations: memberships
        .into_iter()
        .map(RawMembership::into_membership)
        .collect::<Result<_>>()?,
      public_choice: self.public_choice.parse::<PublicChoice>()?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read from a `fleets` row.
pub struct RawFleet {
  pub fleet_id:    String,
  pub owner_id:    String,
  pub version:     i64,
  pub uploaded_at: String,
}

/// Raw values read from a `ships` row.
pub struct RawShip {
  pub ship_id:      String,
  pub fleet_id:     String,
  pub owner_id:     String,
  pub manufacturer: String,
  pub name:         String,
  pub insured:      bool,
  pub cost:         i64,
  pub pledge_date:  String,
  pub raw_json:     String,
}

impl RawShip {
  pub fn into_ship(self) -> Result<Ship> {
    Ok(Ship {
      ship_id:      decode_uuid(&self.ship_id)?,
      fleet_id:     decode_uuid(&self.fleet_id)?,
      owner_id:     decode_uuid(&self.owner_id)?,
      manufacturer: self.manufacturer,
      name:         self.name,
      insured:      self.insured,
      cost:         Money(self.cost),
      pledge_date:  decode_date(&self.pledge_date)?,
      raw:          serde_json::from_str(&self.raw_json)?,
    })
  }
}

impl RawFleet {
  pub fn into_fleet(self, ships: Vec<RawShip>) -> Result<Fleet> {
    Ok(Fleet {
      fleet_id:    decode_uuid(&self.fleet_id)?,
      owner_id:    decode_uuid(&self.owner_id)?,
      version:     decode_u32("version", self.version)?,
      uploaded_at: decode_dt(&self.uploaded_at)?,
      ships:       ships.into_iter().map(RawShip::into_ship).collect::<Result<_>>()?,
    })
  }
}
