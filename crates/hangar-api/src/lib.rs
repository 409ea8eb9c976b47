//! JSON API for Hangar.
//!
//! Exposes an axum [`Router`] over any [`HangarStore`], citizen directory and
//! ship catalog. Authentication happens in front of this router; see
//! [`viewer`].
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/upload` | JSON array body; 204 |
//! | `POST` | `/citizens/link` | Body: `{"handle":"..."}` |
//! | `GET`  | `/citizens/{number}/fleet` | Latest fleet, access-guarded |
//! | `GET`  | `/create-citizen-fleet-file/{number}` | Attachment `citizen_fleet.json` |
//! | `GET`  | `/create-organization-fleet-file/{sid}` | Attachment `organization_fleet.json` |
//! | `GET`  | `/organizations/{sid}/ships` | `[{id, label}]` |
//! | `POST` | `/profile/preferences` | Body: `{public_choice, organization_visibilities}` |

pub mod error;
pub mod export;
pub mod fleets;
pub mod organizations;
pub mod profile;
pub mod viewer;

use std::{sync::Arc, time::Duration};

use axum::{
  Router,
  routing::{get, post},
};
use hangar_catalog::{ShipCatalogCache, ShipNameAliases};
use hangar_core::{
  provider::{CitizenDirectory, ShipCatalogProvider},
  store::HangarStore,
};
use hangar_fleet::{
  CitizenIdentityResolver, FleetUploadHandler, FleetVersioningEngine, OrganizationAccessGuard,
};
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use viewer::{VIEWER_HEADER, Viewer};

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S, D, P> {
  pub store:   Arc<S>,
  pub uploads: Arc<FleetUploadHandler<S, D>>,
  pub guard:   Arc<OrganizationAccessGuard<S>>,
  pub catalog: Arc<ShipCatalogCache<P>>,
  pub aliases: Arc<ShipNameAliases<S>>,
}

impl<S, D, P> Clone for AppState<S, D, P> {
  fn clone(&self) -> Self {
    Self {
      store:   self.store.clone(),
      uploads: self.uploads.clone(),
      guard:   self.guard.clone(),
      catalog: self.catalog.clone(),
      aliases: self.aliases.clone(),
    }
  }
}

impl<S, D, P> AppState<S, D, P>
where
  S: HangarStore,
  D: CitizenDirectory,
  P: ShipCatalogProvider,
{
  /// Wire every service over one store.
  pub fn new(store: Arc<S>, directory: D, catalog: P, cooldown: Duration) -> Self {
    let engine = Arc::new(FleetVersioningEngine::with_cooldown(store.clone(), cooldown));
    Self {
      uploads: Arc::new(FleetUploadHandler::new(
        store.clone(),
        CitizenIdentityResolver::new(directory),
        engine,
      )),
      guard: Arc::new(OrganizationAccessGuard::new(store.clone())),
      catalog: Arc::new(ShipCatalogCache::new(catalog)),
      aliases: Arc::new(ShipNameAliases::new(store.clone())),
      store,
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn api_router<S, D, P>(state: AppState<S, D, P>) -> Router<()>
where
  S: HangarStore + 'static,
  D: CitizenDirectory + 'static,
  P: ShipCatalogProvider + 'static,
{
  Router::new()
    // Fleets
    .route("/upload", post(fleets::upload::<S, D, P>))
    .route("/citizens/{number}/fleet", get(fleets::latest::<S, D, P>))
    .route("/create-citizen-fleet-file/{number}", get(fleets::export_file::<S, D, P>))
    // Organizations
    .route("/organizations/{sid}/ships", get(organizations::ships::<S, D, P>))
    .route(
      "/create-organization-fleet-file/{sid}",
      get(organizations::export_file::<S, D, P>),
    )
    // Profile
    .route("/citizens/link", post(profile::link::<S, D, P>))
    .route("/profile/preferences", post(profile::save::<S, D, P>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
