//! Error types for `hangar-http`.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid base URL: {0}")]
  InvalidBaseUrl(String),

  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{url} returned status {status}")]
  Status { url: String, status: StatusCode },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
