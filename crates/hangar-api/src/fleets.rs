//! Handlers for citizen fleets.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/upload` | Body: the fleet file, a JSON array |
//! | `GET`  | `/citizens/{number}/fleet` | 404 if the citizen never uploaded |
//! | `GET`  | `/create-citizen-fleet-file/{number}` | Same document, as a download |

use axum::{
  Json,
  body::Bytes,
  extract::{Path, State},
  http::{StatusCode, header},
  response::IntoResponse,
};
use hangar_core::{
  citizen::{Citizen, CitizenNumber},
  provider::{CitizenDirectory, ShipCatalogProvider},
  store::HangarStore,
};
use serde_json::Value;

use crate::{
  AppState,
  error::ApiError,
  export::{CitizenFleetFile, citizen_fleet_file},
  viewer::Viewer,
};

// ─── Upload ──────────────────────────────────────────────────────────────────

/// `POST /upload`
pub async fn upload<S, D, P>(
  State(state): State<AppState<S, D, P>>,
  viewer: Viewer,
  body: Bytes,
) -> Result<StatusCode, ApiError>
where
  S: HangarStore + 'static,
  D: CitizenDirectory + 'static,
  P: ShipCatalogProvider + 'static,
{
  let citizen = viewer.require_citizen()?;
  let data: Value =
    serde_json::from_slice(&body).map_err(|e| ApiError::BadJson(e.to_string()))?;

  state
    .uploads
    .handle(&citizen, &data)
    .await
    .map_err(ApiError::upload)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Latest fleet ────────────────────────────────────────────────────────────

/// `GET /citizens/{number}/fleet`
pub async fn latest<S, D, P>(
  State(state): State<AppState<S, D, P>>,
  viewer: Viewer,
  Path(number): Path<String>,
) -> Result<Json<CitizenFleetFile>, ApiError>
where
  S: HangarStore + 'static,
  D: CitizenDirectory + 'static,
  P: ShipCatalogProvider + 'static,
{
  Ok(Json(fleet_file(&state, &viewer, number).await?))
}

/// `GET /create-citizen-fleet-file/{number}`
pub async fn export_file<S, D, P>(
  State(state): State<AppState<S, D, P>>,
  viewer: Viewer,
  Path(number): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
  S: HangarStore + 'static,
  D: CitizenDirectory + 'static,
  P: ShipCatalogProvider + 'static,
{
  let file = fleet_file(&state, &viewer, number).await?;
  Ok((
    [(header::CONTENT_DISPOSITION, r#"attachment; filename="citizen_fleet.json""#)],
    Json(file),
  ))
}

async fn fleet_file<S, D, P>(
  state: &AppState<S, D, P>,
  viewer: &Viewer,
  number: String,
) -> Result<CitizenFleetFile, ApiError>
where
  S: HangarStore + 'static,
  D: CitizenDirectory + 'static,
  P: ShipCatalogProvider + 'static,
{
  let target = find_citizen(state, number).await?;
  state.guard.check_citizen(viewer.citizen(), &target).await?;

  let fleet = state
    .store
    .latest_fleet(target.citizen_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| {
      ApiError::NotFound(format!("citizen {} has not uploaded a fleet yet", target.number))
    })?;

  citizen_fleet_file(&state.aliases, &state.catalog, &target, fleet).await
}

async fn find_citizen<S, D, P>(
  state: &AppState<S, D, P>,
  number: String,
) -> Result<Citizen, ApiError>
where
  S: HangarStore + 'static,
{
  let number = CitizenNumber(number);
  state
    .store
    .get_citizen_by_number(&number)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("citizen {number} not found")))
}
