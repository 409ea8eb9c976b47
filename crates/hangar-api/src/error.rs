//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error body is `{"error": <code>, "errorMessage": <message>}` so the
//! front end can branch on `error` and show `errorMessage` as is.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use hangar_fleet::Error as FleetError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Fleet(#[from] FleetError),

  /// An upload failed for a reason the user cannot act on.
  #[error("cannot handle fleet file: {0}")]
  CannotHandleFile(#[source] FleetError),

  #[error("malformed JSON body: {0}")]
  BadJson(String),

  #[error("no citizen linked to this account")]
  NoCitizenCreated,

  #[error("authentication required")]
  Unauthenticated,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify an error raised while handling an upload: domain outcomes stay
  /// as they are, backend failures become [`ApiError::CannotHandleFile`].
  pub fn upload(e: FleetError) -> Self {
    match e {
      FleetError::Directory(_) | FleetError::Store(_) => Self::CannotHandleFile(e),
      other => Self::Fleet(other),
    }
  }

  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  fn parts(&self) -> (StatusCode, &'static str, String) {
    use StatusCode as S;

    match self {
      Self::Fleet(e) => match e {
        FleetError::FleetUploadedTooClose { .. } => (
          S::BAD_REQUEST,
          "uploaded_too_close",
          "Your fleet has been uploaded recently. Please wait before re-uploading.".into(),
        ),
        FleetError::VersionConflict { .. } => (
          S::CONFLICT,
          "uploaded_too_close",
          "Another upload of your fleet is in progress. Please wait before re-uploading.".into(),
        ),
        FleetError::NotFoundHandle(handle) => (
          S::BAD_REQUEST,
          "not_found_handle",
          format!("The SC handle {handle} does not exist."),
        ),
        FleetError::BadCitizen { .. } => (
          S::BAD_REQUEST,
          "bad_citizen",
          "Your SC handle has probably changed. Please update it in your profile.".into(),
        ),
        FleetError::InvalidFleetData(_) => (
          S::BAD_REQUEST,
          "invalid_fleet_data",
          "The fleet data in your file is invalid. Please check it.".into(),
        ),
        FleetError::AlreadyLinked { .. } => (
          S::CONFLICT,
          "already_linked",
          "This RSI account is already linked to another user.".into(),
        ),
        FleetError::AccessDenied(reason) => (S::FORBIDDEN, reason.code(), reason.message().into()),
        FleetError::Directory(_) => (
          S::BAD_GATEWAY,
          "directory_unavailable",
          "The citizen directory cannot be reached. Try again later.".into(),
        ),
        FleetError::Store(_) => (S::INTERNAL_SERVER_ERROR, "internal_error", "Internal error.".into()),
      },
      Self::CannotHandleFile(_) => (
        S::BAD_REQUEST,
        "cannot_handle_file",
        "Cannot handle the fleet file. Try again!".into(),
      ),
      Self::BadJson(_) => (
        S::BAD_REQUEST,
        "bad_json",
        "Your file is not well formatted JSON. Please check it.".into(),
      ),
      Self::NoCitizenCreated => (
        S::BAD_REQUEST,
        "no_citizen_created",
        "Your RSI account must be linked first. Go to your profile page.".into(),
      ),
      Self::Unauthenticated => (
        S::UNAUTHORIZED,
        "unauthenticated",
        "You must be signed in.".into(),
      ),
      Self::NotFound(m) => (S::NOT_FOUND, "not_found", m.clone()),
      Self::BadRequest(m) => (S::BAD_REQUEST, "bad_request", m.clone()),
      Self::Store(_) => (S::INTERNAL_SERVER_ERROR, "internal_error", "Internal error.".into()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, code, message) = self.parts();
    if status.is_server_error() || matches!(self, Self::CannotHandleFile(_)) {
      error!(error = %self, code, "request failed");
    }
    (status, Json(json!({ "error": code, "errorMessage": message }))).into_response()
  }
}
