//! Fleet ingestion, identity resolution and access control for Hangar.
//!
//! Everything here is generic over [`hangar_core::store::HangarStore`] and the
//! provider traits in [`hangar_core::provider`]; no HTTP or SQL lives in this
//! crate.

pub mod access;
pub mod engine;
pub mod error;
pub mod identity;
pub mod locks;
pub mod parse;
pub mod upload;

pub use access::{AccessDecision, DenyReason, OrganizationAccessGuard};
pub use engine::{FleetVersioningEngine, UPLOAD_COOLDOWN};
pub use error::{Error, InvalidFleetData, InvalidShip, Result};
pub use identity::CitizenIdentityResolver;
pub use upload::{FleetUploadHandler, latest_fleets_of_organization, save_preferences};

#[cfg(test)]
mod tests;
