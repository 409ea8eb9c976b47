//! Client for the Galaxy ship catalog.
//!
//! Endpoints, all answering a JSON array of ships:
//!
//! - `GET  /api/ships?pagination=false`
//! - `GET  /api/ships?pagination=false&chassis={id}`
//! - `POST /api/ships/bulk?pagination=false` with `{"ids": [...], "names": [...]}`

use std::time::Duration;

use hangar_core::{
  provider::ShipCatalogProvider,
  ship_info::{Manufacturer, ProductionStatus, ShipInfo},
};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result, client, join};

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GalaxyShip {
  id:             String,
  name:           String,
  size:           Option<String>,
  min_crew:       Option<u32>,
  max_crew:       Option<u32>,
  cargo_capacity: Option<u32>,
  #[serde(default)]
  ready_status:   String,
  pledge_url:     Option<String>,
  chassis:        Option<GalaxyChassis>,
  picture_uri:    Option<String>,
  thumbnail_uri:  Option<String>,
}

#[derive(Debug, Deserialize)]
struct GalaxyChassis {
  id:           Option<String>,
  name:         Option<String>,
  manufacturer: Option<GalaxyManufacturer>,
}

#[derive(Debug, Deserialize)]
struct GalaxyManufacturer {
  id:   Option<String>,
  name: Option<String>,
  code: Option<String>,
}

impl From<GalaxyShip> for ShipInfo {
  fn from(ship: GalaxyShip) -> Self {
    let (chassis_id, chassis_name, manufacturer) = match ship.chassis {
      Some(c) => (
        c.id,
        c.name,
        c.manufacturer
          .map(|m| Manufacturer { id: m.id, name: m.name, code: m.code })
          .unwrap_or_default(),
      ),
      None => (None, None, Manufacturer::default()),
    };

    Self {
      id: ship.id,
      name: ship.name,
      size: ship.size,
      min_crew: ship.min_crew,
      max_crew: ship.max_crew,
      cargo_capacity: ship.cargo_capacity,
      production_status: ProductionStatus::from_ready_status(&ship.ready_status),
      pledge_url: ship.pledge_url,
      chassis_id,
      chassis_name,
      manufacturer,
      media_url: ship.picture_uri,
      media_thumb_url: ship.thumbnail_uri,
    }
  }
}

#[derive(Serialize)]
struct BulkRequest<'a> {
  ids:   &'a [String],
  names: &'a [String],
}

// ─── Client ──────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct GalaxyClient {
  http: Client,
  base: Url,
}

impl GalaxyClient {
  pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
    let (http, base) = client(base_url, timeout)?;
    Ok(Self { http, base })
  }

  async fn ships(&self, req: RequestBuilder, url: &Url) -> Result<Vec<ShipInfo>> {
    let resp = req.query(&[("pagination", "false")]).send().await?;
    let status = resp.status();
    if !status.is_success() {
      return Err(Error::Status { url: url.to_string(), status });
    }
    let ships: Vec<GalaxyShip> = resp.json().await?;
    debug!(%url, ships = ships.len(), "fetched ships from catalog");
    Ok(ships.into_iter().map(ShipInfo::from).collect())
  }

  /// `GET /api/ships`
  pub async fn list(&self, chassis_id: Option<&str>) -> Result<Vec<ShipInfo>> {
    let url = join(&self.base, &["api", "ships"])?;
    let mut req = self.http.get(url.clone());
    if let Some(chassis) = chassis_id {
      req = req.query(&[("chassis", chassis)]);
    }
    self.ships(req, &url).await
  }

  /// `POST /api/ships/bulk`
  pub async fn bulk(&self, ids: &[String], names: &[String]) -> Result<Vec<ShipInfo>> {
    let url = join(&self.base, &["api", "ships", "bulk"])?;
    let req = self.http.post(url.clone()).json(&BulkRequest { ids, names });
    self.ships(req, &url).await
  }
}

impl ShipCatalogProvider for GalaxyClient {
  type Error = Error;

  async fn all_ships(&self) -> Result<Vec<ShipInfo>> { self.list(None).await }

  async fn ships_by_chassis(&self, chassis_id: &str) -> Result<Vec<ShipInfo>> {
    self.list(Some(chassis_id)).await
  }

  async fn ships_bulk(&self, ids: &[String], names: &[String]) -> Result<Vec<ShipInfo>> {
    self.bulk(ids, names).await
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn maps_catalog_json_to_ship_info() {
    let ship: GalaxyShip = serde_json::from_value(json!({
      "id": "b4f4a5a2",
      "name": "Avenger Titan",
      "size": "small",
      "minCrew": 1,
      "maxCrew": 1,
      "cargoCapacity": 8,
      "readyStatus": "flight-ready",
      "pledgeUrl": "https://robertsspaceindustries.com/pledge/ships/aegis-avenger/Avenger-Titan",
      "chassis": {
        "id": "c1",
        "name": "Avenger",
        "manufacturer": { "id": "m1", "name": "Aegis Dynamics", "code": "AEGS" }
      },
      "pictureUri": "https://media.example/avenger.jpg",
      "thumbnailUri": "https://media.example/avenger-thumb.jpg"
    }))
    .unwrap();

    let info = ShipInfo::from(ship);
    assert_eq!(info.id, "b4f4a5a2");
    assert_eq!(info.production_status, ProductionStatus::FlightReady);
    assert_eq!(info.cargo_capacity, Some(8));
    assert_eq!(info.chassis_name.as_deref(), Some("Avenger"));
    assert_eq!(info.manufacturer.code.as_deref(), Some("AEGS"));
    assert_eq!(info.media_thumb_url.as_deref(), Some("https://media.example/avenger-thumb.jpg"));
  }

  #[test]
  fn sparse_catalog_entry_is_not_ready() {
    let ship: GalaxyShip = serde_json::from_value(json!({
      "id": "x",
      "name": "Concept",
      "readyStatus": "in-concept"
    }))
    .unwrap();

    let info = ShipInfo::from(ship);
    assert_eq!(info.production_status, ProductionStatus::NotReady);
    assert_eq!(info.manufacturer, Manufacturer::default());
    assert!(info.min_crew.is_none() && info.chassis_id.is_none());
  }
}
