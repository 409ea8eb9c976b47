//! A dual-keyed cache over the ship catalog.
//!
//! Point entries are keyed by catalog id and by a hash of the normalized
//! name. Both keys of one ship share a single `Arc<ShipInfo>`, and point
//! entries never expire: once resolved they only change through
//! [`ShipCatalogCache::refresh`]. Listings (the whole catalog, one chassis)
//! expire after [`BULK_TTL`]. Ids and names the catalog does not know are
//! remembered as misses for [`MISS_TTL`] so they are not re-requested on
//! every lookup.
//!
//! The lock is never held across a provider call. Two tasks missing the same
//! key may both fetch it; the last write wins, which is harmless since a
//! catalog id always describes the same ship.

use std::{
  collections::{HashMap, HashSet},
  sync::Arc,
  time::Duration,
};

use hangar_core::{
  provider::ShipCatalogProvider,
  ship_info::{ShipInfo, normalize_name},
};
use sha2::{Digest, Sha256};
use tokio::{sync::RwLock, time::Instant};
use tracing::{debug, error, info};

use crate::error::{Error, Result};

/// Lifetime of catalog listings.
pub const BULK_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// How long an id or name the catalog did not know is not asked for again.
pub const MISS_TTL: Duration = Duration::from_secs(60 * 60);

/// Cache key for a ship name: hex SHA-256 of its normal form.
pub fn name_key(name: &str) -> String {
  hex::encode(Sha256::digest(normalize_name(name).as_bytes()))
}

struct Listing {
  ships:      Vec<Arc<ShipInfo>>,
  expires_at: Instant,
}

impl Listing {
  fn fresh(&self, now: Instant) -> Option<&[Arc<ShipInfo>]> {
    (now < self.expires_at).then_some(self.ships.as_slice())
  }
}

#[derive(Default)]
struct Entries {
  by_id:        HashMap<String, Arc<ShipInfo>>,
  by_name:      HashMap<String, Arc<ShipInfo>>,
  all:          Option<Listing>,
  by_chassis:   HashMap<String, Listing>,
  /// Unknown ids and name keys, with the instant they may be asked again.
  missed_ids:   HashMap<String, Instant>,
  missed_names: HashMap<String, Instant>,
}

impl Entries {
  fn insert_point(&mut self, ship: Arc<ShipInfo>) {
    let key = name_key(&ship.name);
    self.missed_names.remove(&key);
    self.missed_ids.remove(&ship.id);
    self.by_name.insert(key, ship.clone());
    self.by_id.insert(ship.id.clone(), ship);
  }
}

fn still_missed(missed: &HashMap<String, Instant>, key: &str, now: Instant) -> bool {
  missed.get(key).is_some_and(|until| now < *until)
}

pub struct ShipCatalogCache<P> {
  provider: P,
  bulk_ttl: Duration,
  entries:  RwLock<Entries>,
}

impl<P: ShipCatalogProvider> ShipCatalogCache<P> {
  pub fn new(provider: P) -> Self { Self::with_ttl(provider, BULK_TTL) }

  pub fn with_ttl(provider: P, bulk_ttl: Duration) -> Self {
    Self { provider, bulk_ttl, entries: RwLock::new(Entries::default()) }
  }

  // ── Point lookups ─────────────────────────────────────────────────────

  pub async fn get_by_id(&self, id: &str) -> Result<Option<Arc<ShipInfo>>> {
    if let Some(hit) = self.entries.read().await.by_id.get(id) {
      return Ok(Some(hit.clone()));
    }
    self.get_many(&[id.to_owned()], &[]).await?;
    Ok(self.entries.read().await.by_id.get(id).cloned())
  }

  pub async fn get_by_name(&self, name: &str) -> Result<Option<Arc<ShipInfo>>> {
    let key = name_key(name);
    if let Some(hit) = self.entries.read().await.by_name.get(&key) {
      return Ok(Some(hit.clone()));
    }
    self.get_many(&[], &[name.to_owned()]).await?;
    Ok(self.entries.read().await.by_name.get(&key).cloned())
  }

  /// Resolve any mix of ids and names, keyed by catalog id in the result.
  ///
  /// Every miss is fetched with a single bulk request. Ids and names the
  /// catalog does not know are absent from the result.
  pub async fn get_many(
    &self,
    ids: &[String],
    names: &[String],
  ) -> Result<HashMap<String, Arc<ShipInfo>>> {
    let now = Instant::now();
    let mut found = HashMap::new();
    let mut missing_ids = Vec::new();
    let mut missing_names = Vec::new();
    {
      let entries = self.entries.read().await;
      for id in ids.iter().collect::<HashSet<_>>() {
        match entries.by_id.get(id) {
          Some(ship) => {
            found.insert(ship.id.clone(), ship.clone());
          }
          None if still_missed(&entries.missed_ids, id, now) => {}
          None => missing_ids.push(id.clone()),
        }
      }
      let mut seen = HashSet::new();
      for name in names {
        let normalized = normalize_name(name);
        if !seen.insert(normalized.clone()) {
          continue;
        }
        let key = name_key(&normalized);
        match entries.by_name.get(&key) {
          Some(ship) => {
            found.insert(ship.id.clone(), ship.clone());
          }
          None if still_missed(&entries.missed_names, &key, now) => {}
          None => missing_names.push(normalized),
        }
      }
    }

    if missing_ids.is_empty() && missing_names.is_empty() {
      debug!(hits = found.len(), "ship catalog cache hit");
      return Ok(found);
    }

    debug!(
      hits = found.len(),
      missing_ids = missing_ids.len(),
      missing_names = missing_names.len(),
      "ship catalog cache miss, fetching in bulk"
    );
    let fetched = self
      .provider
      .ships_bulk(&missing_ids, &missing_names)
      .await
      .map_err(|e| {
        error!(error = %e, "cannot retrieve ship infos from the catalog");
        Error::Provider(Box::new(e))
      })?;

    let mut entries = self.entries.write().await;
    for ship in fetched {
      let ship = Arc::new(ship);
      entries.insert_point(ship.clone());
      found.insert(ship.id.clone(), ship);
    }

    let retry_at = Instant::now() + MISS_TTL;
    for id in missing_ids {
      if !entries.by_id.contains_key(&id) {
        entries.missed_ids.insert(id, retry_at);
      }
    }
    for name in missing_names {
      let key = name_key(&name);
      if !entries.by_name.contains_key(&key) {
        entries.missed_names.insert(key, retry_at);
      }
    }
    Ok(found)
  }

  // ── Listings ──────────────────────────────────────────────────────────

  /// The whole catalog, served from cache for up to [`BULK_TTL`]. Loading it
  /// also fills the point entries.
  pub async fn all_ships(&self) -> Result<Vec<Arc<ShipInfo>>> {
    if let Some(ships) = self
      .entries
      .read()
      .await
      .all
      .as_ref()
      .and_then(|l| l.fresh(Instant::now()))
    {
      return Ok(ships.to_vec());
    }
    self.load_all().await
  }

  pub async fn ships_by_chassis(&self, chassis_id: &str) -> Result<Vec<Arc<ShipInfo>>> {
    if let Some(ships) = self
      .entries
      .read()
      .await
      .by_chassis
      .get(chassis_id)
      .and_then(|l| l.fresh(Instant::now()))
    {
      return Ok(ships.to_vec());
    }

    let ships: Vec<_> = self
      .provider
      .ships_by_chassis(chassis_id)
      .await
      .map_err(|e| {
        error!(chassis_id, error = %e, "cannot retrieve chassis ships from the catalog");
        Error::Provider(Box::new(e))
      })?
      .into_iter()
      .map(Arc::new)
      .collect();

    self.entries.write().await.by_chassis.insert(chassis_id.to_owned(), Listing {
      ships:      ships.clone(),
      expires_at: Instant::now() + self.bulk_ttl,
    });
    Ok(ships)
  }

  /// Drop every cached entry, point lookups included, and reload the
  /// catalog listing.
  pub async fn refresh(&self) -> Result<Vec<Arc<ShipInfo>>> {
    *self.entries.write().await = Entries::default();
    let ships = self.load_all().await?;
    info!(ships = ships.len(), "ship catalog refreshed");
    Ok(ships)
  }

  async fn load_all(&self) -> Result<Vec<Arc<ShipInfo>>> {
    let ships: Vec<_> = self
      .provider
      .all_ships()
      .await
      .map_err(|e| {
        error!(error = %e, "cannot retrieve ship catalog");
        Error::Provider(Box::new(e))
      })?
      .into_iter()
      .map(Arc::new)
      .collect();

    let mut entries = self.entries.write().await;
    for ship in &ships {
      entries.insert_point(ship.clone());
    }
    entries.all = Some(Listing {
      ships:      ships.clone(),
      expires_at: Instant::now() + self.bulk_ttl,
    });
    Ok(ships)
  }
}
