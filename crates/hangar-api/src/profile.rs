//! Handlers for the viewer's own profile.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/citizens/link` | Body: `{"handle":"..."}`; returns the linked citizen |
//! | `POST` | `/profile/preferences` | Body: [`PreferencesBody`]; 204 |

use std::collections::HashMap;

use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use hangar_core::{
  citizen::{Citizen, Handle, OrganizationSid, PublicChoice, Visibility},
  provider::{CitizenDirectory, ShipCatalogProvider},
  store::HangarStore,
};
use hangar_fleet::save_preferences;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{AppState, error::ApiError, viewer::Viewer};

fn json_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
  serde_json::from_slice(body).map_err(|e| ApiError::BadJson(e.to_string()))
}

// ─── Link ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LinkBody {
  pub handle: String,
}

/// `POST /citizens/link`
pub async fn link<S, D, P>(
  State(state): State<AppState<S, D, P>>,
  viewer: Viewer,
  body: Bytes,
) -> Result<Json<Citizen>, ApiError>
where
  S: HangarStore + 'static,
  D: CitizenDirectory + 'static,
  P: ShipCatalogProvider + 'static,
{
  let account_id = viewer.account_id.ok_or(ApiError::Unauthenticated)?;
  let LinkBody { handle } = json_body(&body)?;
  let handle = handle.trim();
  if handle.is_empty() {
    return Err(ApiError::BadRequest("handle must not be empty".into()));
  }

  let citizen = state
    .uploads
    .link(&Handle(handle.to_owned()), Some(account_id))
    .await?;
  Ok(Json(citizen))
}

// ─── Preferences ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PreferencesBody {
  pub public_choice:             PublicChoice,
  /// Organizations the viewer does not belong to are ignored.
  #[serde(default)]
  pub organization_visibilities: HashMap<OrganizationSid, Visibility>,
}

/// `POST /profile/preferences`
pub async fn save<S, D, P>(
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
  let prefs: PreferencesBody = json_body(&body)?;

  save_preferences(
    state.store.as_ref(),
    citizen,
    prefs.public_choice,
    &prefs.organization_visibilities,
  )
  .await?;
  Ok(StatusCode::NO_CONTENT)
}
