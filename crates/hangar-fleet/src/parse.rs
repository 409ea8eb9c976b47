//! Parsing of uploaded fleet files.
//!
//! An upload is a JSON array of objects shaped like
//!
//! ```json
//! {"manufacturer": "Aegis", "name": "Avenger", "lti": true,
//!  "cost": "$100.00", "pledge_date": "January 01, 2021"}
//! ```
//!
//! Unknown fields are ignored but kept in the raw payload. A single bad entry
//! rejects the whole upload.

use std::sync::LazyLock;

use chrono::NaiveDate;
use hangar_core::fleet::{Money, ShipEntry};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{InvalidFleetData, InvalidShip};

/// Leading dollar amount: `$1234`, `$1,234.5`, `$15.00 USD`.
static COST: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^\$(\d{1,3}(?:,\d{3})+|\d+)(?:\.(\d+))?")
    .unwrap_or_else(|e| panic!("invalid cost pattern: {e}"))
});

const PLEDGE_DATE_FORMAT: &str = "%B %d, %Y";

#[derive(Deserialize)]
struct RawShipEntry {
  manufacturer: String,
  name:         String,
  lti:          bool,
  cost:         String,
  pledge_date:  String,
}

/// Parse a cost string into minor units.
///
/// Only the leading `$<amount>` is considered. At most two fraction digits
/// are accepted, and the amount may not run on into a stray separator or
/// digit (`$1,23`, `$1,2345`).
pub fn parse_cost(cost: &str) -> Result<Money, InvalidShip> {
  let invalid = || InvalidShip::Cost(cost.to_owned());

  let trimmed = cost.trim_start();
  let caps = COST.captures(trimmed).ok_or_else(invalid)?;
  let rest = &trimmed[caps.get(0).map_or(0, |m| m.end())..];
  if rest.starts_with(|c: char| c == ',' || c.is_ascii_digit()) {
    return Err(invalid());
  }
  let whole: i64 = caps[1].replace(',', "").parse().map_err(|_| invalid())?;
  let cents: i64 = match caps.get(2).map(|m| m.as_str()) {
    None => 0,
    Some(f) if f.len() == 1 => f.parse::<i64>().map_err(|_| invalid())? * 10,
    Some(f) if f.len() == 2 => f.parse().map_err(|_| invalid())?,
    Some(_) => return Err(invalid()),
  };

  whole
    .checked_mul(100)
    .and_then(|w| w.checked_add(cents))
    .map(Money)
    .ok_or_else(invalid)
}

/// Parse a pledge date written as `Month dd, yyyy`.
pub fn parse_pledge_date(date: &str) -> Result<NaiveDate, InvalidShip> {
  NaiveDate::parse_from_str(date.trim(), PLEDGE_DATE_FORMAT)
    .map_err(|_| InvalidShip::PledgeDate(date.to_owned()))
}

/// Parse one entry, keeping the original object alongside.
pub fn parse_ship_entry(value: &Value) -> Result<ShipEntry, InvalidShip> {
  let raw: RawShipEntry = serde_json::from_value(value.clone())
    .map_err(|e| InvalidShip::Shape(e.to_string()))?;

  Ok(ShipEntry {
    cost:         parse_cost(&raw.cost)?,
    pledge_date:  parse_pledge_date(&raw.pledge_date)?,
    manufacturer: raw.manufacturer,
    name:         raw.name,
    insured:      raw.lti,
    raw:          value.clone(),
  })
}

/// Parse every entry; the first failure wins.
pub fn parse_ship_entries(entries: &[Value]) -> Result<Vec<ShipEntry>, InvalidFleetData> {
  entries
    .iter()
    .enumerate()
    .map(|(index, value)| {
      parse_ship_entry(value).map_err(|reason| InvalidFleetData::Ship { index, reason })
    })
    .collect()
}

/// Unwrap the top-level array of an upload.
pub fn fleet_entries(data: &Value) -> Result<&[Value], InvalidFleetData> {
  data
    .as_array()
    .map(Vec::as_slice)
    .ok_or(InvalidFleetData::NotAnArray)
}
