//! Documents built from stored fleets: the per-citizen and per-organization
//! fleet files and the organization ship list.
//!
//! Ship names are reconciled to catalog names through the alias table. The
//! catalog only adds detail; when it cannot be reached the documents are
//! produced without it.

use std::{
  collections::{BTreeMap, HashMap},
  sync::Arc,
};

use chrono::{DateTime, NaiveDate, Utc};
use hangar_catalog::{ShipCatalogCache, ShipNameAliases};
use hangar_core::{
  citizen::{Citizen, CitizenNumber, Handle},
  fleet::{Fleet, Money, Ship},
  provider::ShipCatalogProvider,
  ship_info::{ShipInfo, normalize_name},
  store::HangarStore,
};
use serde::Serialize;
use tracing::warn;

use crate::error::ApiError;

// ─── Documents ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CitizenRef {
  pub number: CitizenNumber,
  pub handle: Handle,
}

#[derive(Debug, Serialize)]
pub struct ExportedShip {
  pub manufacturer: String,
  /// Catalog name when an alias exists, the uploaded name otherwise.
  pub name:         String,
  pub insured:      bool,
  pub cost:         Money,
  pub pledge_date:  NaiveDate,
  pub catalog:      Option<ShipInfo>,
}

#[derive(Debug, Serialize)]
pub struct CitizenFleetFile {
  pub citizen:     CitizenRef,
  pub version:     u32,
  pub uploaded_at: DateTime<Utc>,
  pub ships:       Vec<ExportedShip>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct OrganizationShipCount {
  pub name:         String,
  pub manufacturer: String,
  pub count:        usize,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct OrganizationShipLabel {
  /// Catalog id, when the catalog knows the ship.
  pub id:    Option<String>,
  pub label: String,
}

// ─── Builders ────────────────────────────────────────────────────────────────

pub async fn citizen_fleet_file<S, P>(
  aliases: &ShipNameAliases<S>,
  catalog: &ShipCatalogCache<P>,
  citizen: &Citizen,
  fleet: Fleet,
) -> Result<CitizenFleetFile, ApiError>
where
  S: HangarStore,
  P: ShipCatalogProvider,
{
  let names = canonical_names(aliases, &fleet.ships.iter().collect::<Vec<_>>()).await?;
  let infos = catalog_by_name(catalog, names.values()).await;

  let ships = fleet
    .ships
    .into_iter()
    .map(|ship| {
      let name = names.get(&ship.name).cloned().unwrap_or_else(|| ship.name.clone());
      ExportedShip {
        catalog: infos.get(&normalize_name(&name)).map(|info| (**info).clone()),
        manufacturer: ship.manufacturer,
        name,
        insured: ship.insured,
        cost: ship.cost,
        pledge_date: ship.pledge_date,
      }
    })
    .collect();

  Ok(CitizenFleetFile {
    citizen: CitizenRef {
      number: citizen.number.clone(),
      handle: citizen.actual_handle.clone(),
    },
    version: fleet.version,
    uploaded_at: fleet.uploaded_at,
    ships,
  })
}

/// Count ships across `fleets` by catalog name, sorted by name.
pub async fn organization_fleet_file<S: HangarStore>(
  aliases: &ShipNameAliases<S>,
  fleets: &[(Citizen, Fleet)],
) -> Result<Vec<OrganizationShipCount>, ApiError> {
  let ships: Vec<&Ship> = fleets.iter().flat_map(|(_, f)| &f.ships).collect();
  let names = canonical_names(aliases, &ships).await?;

  let mut counts: BTreeMap<String, OrganizationShipCount> = BTreeMap::new();
  for ship in ships {
    let name = names.get(&ship.name).cloned().unwrap_or_else(|| ship.name.clone());
    counts
      .entry(normalize_name(&name))
      .or_insert_with(|| OrganizationShipCount {
        name,
        manufacturer: ship.manufacturer.clone(),
        count: 0,
      })
      .count += 1;
  }
  Ok(counts.into_values().collect())
}

/// Distinct ships across `fleets`, labelled with their catalog name and id.
pub async fn organization_ship_labels<S, P>(
  aliases: &ShipNameAliases<S>,
  catalog: &ShipCatalogCache<P>,
  fleets: &[(Citizen, Fleet)],
) -> Result<Vec<OrganizationShipLabel>, ApiError>
where
  S: HangarStore,
  P: ShipCatalogProvider,
{
  let ships: Vec<&Ship> = fleets.iter().flat_map(|(_, f)| &f.ships).collect();
  let names = canonical_names(aliases, &ships).await?;
  let infos = catalog_by_name(catalog, names.values()).await;

  let mut labels: BTreeMap<String, OrganizationShipLabel> = BTreeMap::new();
  for label in names.into_values() {
    let key = normalize_name(&label);
    let id = infos.get(&key).map(|info| info.id.clone());
    labels.entry(key).or_insert(OrganizationShipLabel { id, label });
  }
  Ok(labels.into_values().collect())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Uploaded name → catalog name, for every distinct uploaded name.
async fn canonical_names<S: HangarStore>(
  aliases: &ShipNameAliases<S>,
  ships: &[&Ship],
) -> Result<HashMap<String, String>, ApiError> {
  let mut names = HashMap::new();
  for ship in ships {
    if names.contains_key(&ship.name) {
      continue;
    }
    let canonical = aliases
      .hangar_to_provider(&ship.name)
      .await
      .map_err(ApiError::store)?;
    names.insert(ship.name.clone(), canonical);
  }
  Ok(names)
}

/// Catalog records keyed by normalized name. Catalog failures are logged and
/// yield an empty map.
async fn catalog_by_name<'a, P: ShipCatalogProvider>(
  catalog: &ShipCatalogCache<P>,
  names: impl IntoIterator<Item = &'a String>,
) -> HashMap<String, Arc<ShipInfo>> {
  let names: Vec<String> = names.into_iter().cloned().collect();
  if names.is_empty() {
    return HashMap::new();
  }
  match catalog.get_many(&[], &names).await {
    Ok(found) => found
      .into_values()
      .map(|info| (normalize_name(&info.name), info))
      .collect(),
    Err(e) => {
      warn!(error = %e, "ship catalog unavailable, exporting without catalog data");
      HashMap::new()
    }
  }
}
