//! Reconciliation between uploaded ship names and catalog names.
//!
//! Pledge exports and the catalog disagree on a handful of names ("Nox" vs
//! "Nox Kue"). The alias table stores both spellings as entered; lookups
//! here compare them lower-cased. Names without an alias map to themselves.

use std::{collections::HashMap, sync::Arc};

use hangar_core::{
  ship_info::{ShipNameAlias, normalize_name},
  store::HangarStore,
};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Error, Result};

#[derive(Default)]
struct AliasTable {
  to_provider: HashMap<String, String>,
  to_hangar:   HashMap<String, String>,
}

impl AliasTable {
  fn build(aliases: Vec<ShipNameAlias>) -> Self {
    let mut table = Self::default();
    for alias in aliases {
      table
        .to_hangar
        .insert(normalize_name(&alias.provider_name), alias.hangar_name.clone());
      table
        .to_provider
        .insert(normalize_name(&alias.hangar_name), alias.provider_name);
    }
    table
  }
}

pub struct ShipNameAliases<S> {
  store: Arc<S>,
  table: RwLock<Option<Arc<AliasTable>>>,
}

impl<S: HangarStore> ShipNameAliases<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store, table: RwLock::new(None) } }

  /// Catalog name for an uploaded name.
  pub async fn hangar_to_provider(&self, hangar_name: &str) -> Result<String> {
    let table = self.table().await?;
    let hangar_name = hangar_name.trim();
    Ok(
      table
        .to_provider
        .get(&normalize_name(hangar_name))
        .cloned()
        .unwrap_or_else(|| hangar_name.to_owned()),
    )
  }

  /// Uploaded name for a catalog name.
  pub async fn provider_to_hangar(&self, provider_name: &str) -> Result<String> {
    let table = self.table().await?;
    let provider_name = provider_name.trim();
    Ok(
      table
        .to_hangar
        .get(&normalize_name(provider_name))
        .cloned()
        .unwrap_or_else(|| provider_name.to_owned()),
    )
  }

  /// Whether an uploaded name designates the catalog ship `provider_name`.
  pub async fn names_are_equal(&self, hangar_name: &str, provider_name: &str) -> Result<bool> {
    let canonical = self.hangar_to_provider(hangar_name).await?;
    Ok(normalize_name(&canonical) == normalize_name(provider_name))
  }

  /// Store a new alias and make it visible immediately.
  pub async fn save(&self, alias: &ShipNameAlias) -> Result<()> {
    self
      .store
      .save_ship_name_alias(alias)
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;
    self.reload().await
  }

  /// Re-read the alias table from the store.
  pub async fn reload(&self) -> Result<()> {
    let table = Arc::new(self.load().await?);
    *self.table.write().await = Some(table);
    Ok(())
  }

  async fn table(&self) -> Result<Arc<AliasTable>> {
    if let Some(table) = self.table.read().await.as_ref() {
      return Ok(table.clone());
    }
    let table = Arc::new(self.load().await?);
    *self.table.write().await = Some(table.clone());
    Ok(table)
  }

  async fn load(&self) -> Result<AliasTable> {
    let aliases = self
      .store
      .ship_name_aliases()
      .await
      .map_err(|e| Error::Store(Box::new(e)))?;
    debug!(aliases = aliases.len(), "loaded ship name aliases");
    Ok(AliasTable::build(aliases))
  }
}
