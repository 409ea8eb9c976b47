//! Ship catalog caching and ship-name reconciliation for Hangar.
//!
//! [`ShipCatalogCache`] fronts a rate-limited [`ShipCatalogProvider`]
//! (`hangar_core::provider`). [`ShipNameAliases`] maps the names players
//! upload to the names the catalog knows.

pub mod aliases;
pub mod cache;
pub mod error;

pub use aliases::ShipNameAliases;
pub use cache::{BULK_TTL, MISS_TTL, ShipCatalogCache, name_key};
pub use error::{Error, Result};
