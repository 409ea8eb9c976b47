//! Handlers for organization fleets.
//!
//! Both endpoints only see the members whose fleet the viewer may see.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/organizations/{sid}/ships` | `[{"id": ..., "label": ...}]` |
//! | `GET`  | `/create-organization-fleet-file/{sid}` | `[{"name", "manufacturer", "count"}]` download |

use axum::{
  Json,
  extract::{Path, State},
  http::header,
  response::IntoResponse,
};
use hangar_core::{
  citizen::Citizen,
  fleet::Fleet,
  provider::{CitizenDirectory, ShipCatalogProvider},
  store::HangarStore,
};
use hangar_fleet::latest_fleets_of_organization;

use crate::{
  AppState,
  error::ApiError,
  export::{
    OrganizationShipCount, OrganizationShipLabel, organization_fleet_file,
    organization_ship_labels,
  },
  viewer::Viewer,
};

/// `GET /organizations/{sid}/ships`
pub async fn ships<S, D, P>(
  State(state): State<AppState<S, D, P>>,
  viewer: Viewer,
  Path(sid): Path<String>,
) -> Result<Json<Vec<OrganizationShipLabel>>, ApiError>
where
  S: HangarStore + 'static,
  D: CitizenDirectory + 'static,
  P: ShipCatalogProvider + 'static,
{
  let fleets = visible_fleets(&state, &viewer, &sid).await?;
  Ok(Json(
    organization_ship_labels(&state.aliases, &state.catalog, &fleets).await?,
  ))
}

/// `GET /create-organization-fleet-file/{sid}`
pub async fn export_file<S, D, P>(
  State(state): State<AppState<S, D, P>>,
  viewer: Viewer,
  Path(sid): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
  S: HangarStore + 'static,
  D: CitizenDirectory + 'static,
  P: ShipCatalogProvider + 'static,
{
  let fleets = visible_fleets(&state, &viewer, &sid).await?;
  let counts: Vec<OrganizationShipCount> = organization_fleet_file(&state.aliases, &fleets).await?;
  Ok((
    [(header::CONTENT_DISPOSITION, r#"attachment; filename="organization_fleet.json""#)],
    Json(counts),
  ))
}

async fn visible_fleets<S, D, P>(
  state: &AppState<S, D, P>,
  viewer: &Viewer,
  sid: &str,
) -> Result<Vec<(Citizen, Fleet)>, ApiError>
where
  S: HangarStore + 'static,
{
  let members = state.guard.check_organization(viewer.citizen(), sid).await?;
  Ok(latest_fleets_of_organization(state.store.as_ref(), &members).await?)
}
