//! Catalog records for ship models.
//!
//! These come from a third-party catalog and are only ever cached; a missing
//! record degrades display but never invalidates a stored [`Ship`](crate::fleet::Ship).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionStatus {
  FlightReady,
  NotReady,
}

impl ProductionStatus {
  /// Map the catalog's `readyStatus` string.
  pub fn from_ready_status(status: &str) -> Self {
    if status == "flight-ready" {
      Self::FlightReady
    } else {
      Self::NotReady
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Manufacturer {
  pub id:   Option<String>,
  pub name: Option<String>,
  pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipInfo {
  pub id:                String,
  pub name:              String,
  pub size:              Option<String>,
  pub min_crew:          Option<u32>,
  pub max_crew:          Option<u32>,
  pub cargo_capacity:    Option<u32>,
  pub production_status: ProductionStatus,
  pub pledge_url:        Option<String>,
  pub chassis_id:        Option<String>,
  pub chassis_name:      Option<String>,
  pub manufacturer:      Manufacturer,
  pub media_url:         Option<String>,
  pub media_thumb_url:   Option<String>,
}

/// One row of the alias table mapping a hangar (uploaded) ship name to the
/// catalog's canonical name. Stored exactly as entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipNameAlias {
  pub hangar_name:   String,
  pub provider_name: String,
}

/// Normal form for name lookups: trimmed and lower-cased.
pub fn normalize_name(name: &str) -> String { name.trim().to_lowercase() }
