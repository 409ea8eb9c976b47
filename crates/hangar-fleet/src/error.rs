//! Error types for `hangar-fleet`.
//!
//! Callers are expected to match on the domain outcomes; `Directory` and
//! `Store` wrap whatever the backends reported.

use chrono::{DateTime, Utc};
use hangar_core::citizen::{CitizenNumber, Handle};
use thiserror::Error;
use uuid::Uuid;

use crate::access::DenyReason;

/// Why a single uploaded ship entry was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidShip {
  #[error("malformed entry: {0}")]
  Shape(String),

  #[error("cost {0:?} is not a dollar amount")]
  Cost(String),

  #[error("pledge date {0:?} is not formatted as `Month dd, yyyy`")]
  PledgeDate(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidFleetData {
  #[error("fleet data is not a JSON array")]
  NotAnArray,

  #[error("ship #{index}: {reason}")]
  Ship { index: usize, reason: InvalidShip },
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("handle {0} does not exist in the citizen directory")]
  NotFoundHandle(Handle),

  #[error("directory record for {handle} is inconsistent: {reason}")]
  BadCitizen { handle: Handle, reason: String },

  #[error("last version of the fleet was uploaded on {}", .last_upload.format("%Y-%m-%d %H:%M"))]
  FleetUploadedTooClose { last_upload: DateTime<Utc> },

  #[error("invalid fleet data: {0}")]
  InvalidFleetData(#[from] InvalidFleetData),

  /// The citizen is already linked to a different account.
  #[error("citizen {number} is linked to another account")]
  AlreadyLinked { number: CitizenNumber },

  #[error("access denied: {}", .0.code())]
  AccessDenied(DenyReason),

  /// Another upload for the same citizen claimed this version first.
  #[error("fleet version {version} of citizen {citizen_id} was written concurrently")]
  VersionConflict { citizen_id: Uuid, version: u32 },

  #[error("directory error: {0}")]
  Directory(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
