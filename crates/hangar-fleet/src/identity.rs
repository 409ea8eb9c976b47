//! Citizen identity resolution against the external directory.

use std::collections::HashSet;

use hangar_core::{
  citizen::{CitizenIdentity, CitizenNumber, Handle, IdentityMembership},
  provider::{CitizenDirectory, DirectoryRecord},
};
use tracing::{debug, error};

use crate::error::{Error, Result};

pub struct CitizenIdentityResolver<D> {
  directory: D,
}

impl<D: CitizenDirectory> CitizenIdentityResolver<D> {
  pub fn new(directory: D) -> Self { Self { directory } }

  /// Fetch and validate the identity behind `handle`.
  ///
  /// The returned handle is the one the directory currently reports, which
  /// may differ in case or spelling from the one asked for.
  pub async fn resolve(&self, handle: &Handle) -> Result<CitizenIdentity> {
    let record = self.directory.lookup(handle).await.map_err(|e| {
      error!(%handle, error = %e, "citizen directory lookup failed");
      Error::Directory(Box::new(e))
    })?;

    let Some(record) = record else {
      debug!(%handle, "handle not found in citizen directory");
      return Err(Error::NotFoundHandle(handle.clone()));
    };

    validate(handle, record)
  }
}

/// Turn a raw directory record into an identity, or explain why it can't be
/// trusted.
///
/// Organizations without a sid are redacted memberships the directory hides;
/// they are skipped rather than rejected.
pub fn validate(requested: &Handle, record: DirectoryRecord) -> Result<CitizenIdentity> {
  let bad = |reason: &str| Error::BadCitizen {
    handle: requested.clone(),
    reason: reason.to_owned(),
  };

  let number = record
    .citizen_number
    .map(|n| n.trim().to_owned())
    .filter(|n| !n.is_empty())
    .ok_or_else(|| bad("missing citizen number"))?;

  let handle = record
    .handle
    .map(|h| h.trim().to_owned())
    .filter(|h| !h.is_empty())
    .ok_or_else(|| bad("missing handle"))?;

  let mut seen = HashSet::new();
  let mut organizations = Vec::with_capacity(record.organizations.len());
  for org in record.organizations {
    let Some(sid) = org.sid else { continue };
    let rank = org
      .rank
      .and_then(|r| u32::try_from(r).ok())
      .ok_or_else(|| bad(&format!("organization {sid} has no usable rank")))?;
    if !seen.insert(sid.clone()) {
      return Err(bad(&format!("organization {sid} listed twice")));
    }
    organizations.push(IdentityMembership { organization_sid: sid, rank });
  }

  Ok(CitizenIdentity {
    number: CitizenNumber(number),
    handle: Handle(handle),
    bio: record.bio.filter(|b| !b.trim().is_empty()),
    organizations,
  })
}

#[cfg(test)]
mod tests {
  use hangar_core::provider::DirectoryOrganization;

  use super::*;

  fn record() -> DirectoryRecord {
    DirectoryRecord {
      handle:         Some("Ioni".into()),
      citizen_number: Some("123456".into()),
      bio:            Some("hello".into()),
      organizations:  vec![
        DirectoryOrganization { sid: Some("FLK".into()), rank: Some(1) },
        DirectoryOrganization { sid: None, rank: None },
        DirectoryOrganization { sid: Some("GARDIENS".into()), rank: Some(4) },
      ],
    }
  }

  fn requested() -> Handle { Handle("ioni".into()) }

  #[test]
  fn valid_record_keeps_directory_handle_and_skips_redacted_orgs() {
    let identity = validate(&requested(), record()).unwrap();
    assert_eq!(identity.number, CitizenNumber("123456".into()));
    assert_eq!(identity.handle, Handle("Ioni".into()));
    let sids: Vec<_> = identity
      .organizations
      .iter()
      .map(|m| (m.organization_sid.as_str(), m.rank))
      .collect();
    assert_eq!(sids, [("FLK", 1), ("GARDIENS", 4)]);
  }

  #[test]
  fn missing_number_is_bad_citizen() {
    for number in [None, Some("  ".to_owned())] {
      let err = validate(&requested(), DirectoryRecord { citizen_number: number, ..record() })
        .unwrap_err();
      assert!(matches!(err, Error::BadCitizen { .. }));
    }
  }

  #[test]
  fn missing_handle_is_bad_citizen() {
    let err = validate(&requested(), DirectoryRecord { handle: None, ..record() }).unwrap_err();
    assert!(matches!(err, Error::BadCitizen { .. }));
  }

  #[test]
  fn unusable_rank_is_bad_citizen() {
    for rank in [None, Some(-1)] {
      let rec = DirectoryRecord {
        organizations: vec![DirectoryOrganization { sid: Some("FLK".into()), rank }],
        ..record()
      };
      assert!(matches!(
        validate(&requested(), rec),
        Err(Error::BadCitizen { .. })
      ));
    }
  }

  #[test]
  fn duplicate_organization_is_bad_citizen() {
    let rec = DirectoryRecord {
      organizations: vec![
        DirectoryOrganization { sid: Some("FLK".into()), rank: Some(1) },
        DirectoryOrganization { sid: Some("FLK".into()), rank: Some(2) },
      ],
      ..record()
    };
    assert!(matches!(validate(&requested(), rec), Err(Error::BadCitizen { .. })));
  }

  #[test]
  fn blank_bio_becomes_none() {
    let rec = DirectoryRecord { bio: Some(" ".into()), ..record() };
    assert_eq!(validate(&requested(), rec).unwrap().bio, None);
  }
}
