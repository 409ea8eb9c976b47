//! Who is asking.
//!
//! Authentication happens upstream: a reverse proxy sets [`VIEWER_HEADER`]
//! to the account id, which is also the id of the account's citizen once it
//! has been linked. No header means an anonymous viewer.

use axum::{extract::FromRequestParts, http::request::Parts};
use hangar_core::{
  citizen::Citizen,
  provider::{CitizenDirectory, ShipCatalogProvider},
  store::HangarStore,
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub const VIEWER_HEADER: &str = "x-hangar-citizen";

pub struct Viewer {
  pub account_id: Option<Uuid>,
  pub citizen:    Option<Citizen>,
}

impl Viewer {
  pub fn citizen(&self) -> Option<&Citizen> { self.citizen.as_ref() }

  /// The viewer's citizen, for endpoints acting on the viewer's own data.
  pub fn require_citizen(self) -> Result<Citizen, ApiError> {
    match (self.account_id, self.citizen) {
      (None, _) => Err(ApiError::Unauthenticated),
      (Some(_), None) => Err(ApiError::NoCitizenCreated),
      (Some(_), Some(citizen)) => Ok(citizen),
    }
  }
}

impl<S, D, P> FromRequestParts<AppState<S, D, P>> for Viewer
where
  S: HangarStore + 'static,
  D: CitizenDirectory + 'static,
  P: ShipCatalogProvider + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, D, P>,
  ) -> Result<Self, Self::Rejection> {
    let Some(value) = parts.headers.get(VIEWER_HEADER) else {
      return Ok(Self { account_id: None, citizen: None });
    };

    let account_id = value
      .to_str()
      .ok()
      .and_then(|v| Uuid::parse_str(v.trim()).ok())
      .ok_or_else(|| ApiError::BadRequest(format!("{VIEWER_HEADER} is not a UUID")))?;

    let citizen = state
      .store
      .get_citizen(account_id)
      .await
      .map_err(ApiError::store)?;

    Ok(Self { account_id: Some(account_id), citizen })
  }
}
