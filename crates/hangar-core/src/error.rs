//! Error types for `hangar-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown visibility: {0:?}")]
  UnknownVisibility(String),

  #[error("unknown public choice: {0:?}")]
  UnknownPublicChoice(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
