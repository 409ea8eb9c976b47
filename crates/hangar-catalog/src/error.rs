//! Error types for `hangar-catalog`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The catalog could not be reached or answered garbage. When raised by a
  /// batched lookup it covers every id and name of the batch.
  #[error("cannot retrieve ship infos: {0}")]
  Provider(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
