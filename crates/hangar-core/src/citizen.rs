//! A citizen: the identity record a fleet belongs to.
//!
//! A citizen is keyed by its canonical number. The handle is only a display
//! name and may drift upstream; the organization membership set is replaced
//! wholesale every time the identity is re-resolved.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// The canonical, immutable citizen number assigned by the external
/// directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CitizenNumber(pub String);

/// A citizen's display handle. Case is preserved but comparisons upstream are
/// case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(pub String);

impl Handle {
  pub fn as_str(&self) -> &str { &self.0 }

  /// Case-insensitive comparison, as the directory treats handles.
  pub fn matches(&self, other: &Handle) -> bool {
    self.0.eq_ignore_ascii_case(&other.0)
  }
}

impl fmt::Display for Handle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl fmt::Display for CitizenNumber {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Spectrum identification of an organization (its short id, e.g. `FLK`).
pub type OrganizationSid = String;

// ─── Preferences ─────────────────────────────────────────────────────────────

/// Who may see a member's fleet within one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
  /// Anyone, including anonymous viewers.
  Public,
  /// Fellow members of the organization.
  Organization,
  /// Only the top-ranked members of the organization.
  #[default]
  Private,
}

impl Visibility {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Public => "public",
      Self::Organization => "organization",
      Self::Private => "private",
    }
  }
}

impl FromStr for Visibility {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "public" => Ok(Self::Public),
      "organization" => Ok(Self::Organization),
      "private" => Ok(Self::Private),
      other => Err(Error::UnknownVisibility(other.to_owned())),
    }
  }
}

/// Whether a citizen's personal fleet page is open to everyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicChoice {
  Public,
  #[default]
  Private,
}

impl PublicChoice {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Public => "public",
      Self::Private => "private",
    }
  }
}

impl FromStr for PublicChoice {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "public" => Ok(Self::Public),
      "private" => Ok(Self::Private),
      other => Err(Error::UnknownPublicChoice(other.to_owned())),
    }
  }
}

// ─── Membership ──────────────────────────────────────────────────────────────

/// A citizen's membership in one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationMembership {
  pub organization_sid: OrganizationSid,
  /// Lower is more authority. Only comparable within the same organization.
  pub rank:             u32,
  pub visibility:       Visibility,
}

// ─── Citizen ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citizen {
  pub citizen_id:    Uuid,
  pub number:        CitizenNumber,
  /// The handle as last reported by the directory.
  pub actual_handle: Handle,
  pub bio:           Option<String>,
  /// Ordered as reported by the directory (main organization first).
  pub organizations: Vec<OrganizationMembership>,
  pub public_choice: PublicChoice,
  pub updated_at:    DateTime<Utc>,
}

impl Citizen {
  pub fn membership(&self, sid: &str) -> Option<&OrganizationMembership> {
    self.organizations.iter().find(|m| m.organization_sid == sid)
  }

  pub fn membership_mut(&mut self, sid: &str) -> Option<&mut OrganizationMembership> {
    self.organizations.iter_mut().find(|m| m.organization_sid == sid)
  }

  pub fn is_member_of(&self, sid: &str) -> bool { self.membership(sid).is_some() }

  /// Replace the membership set with `fresh`, keeping the visibility chosen
  /// for organizations that appear in both.
  pub fn replace_memberships(&mut self, fresh: Vec<OrganizationMembership>) {
    let previous = std::mem::take(&mut self.organizations);
    self.organizations = fresh
      .into_iter()
      .map(|mut m| {
        if let Some(old) = previous
          .iter()
          .find(|old| old.organization_sid == m.organization_sid)
        {
          m.visibility = old.visibility;
        }
        m
      })
      .collect();
  }
}

// ─── Resolved identity ───────────────────────────────────────────────────────

/// A validated directory record, as produced by identity resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitizenIdentity {
  pub number:        CitizenNumber,
  pub handle:        Handle,
  pub bio:           Option<String>,
  pub organizations: Vec<IdentityMembership>,
}

/// Membership as the directory reports it: no visibility, that is a local
/// preference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityMembership {
  pub organization_sid: OrganizationSid,
  pub rank:             u32,
}

impl From<IdentityMembership> for OrganizationMembership {
  fn from(m: IdentityMembership) -> Self {
    Self {
      organization_sid: m.organization_sid,
      rank:             m.rank,
      visibility:       Visibility::default(),
    }
  }
}

impl Citizen {
  /// Build a brand-new citizen record from a resolved identity.
  pub fn from_identity(identity: CitizenIdentity, now: DateTime<Utc>) -> Self {
    Self {
      citizen_id:    Uuid::new_v4(),
      number:        identity.number,
      actual_handle: identity.handle,
      bio:           identity.bio,
      organizations: identity.organizations.into_iter().map(Into::into).collect(),
      public_choice: PublicChoice::default(),
      updated_at:    now,
    }
  }

  /// Overwrite the directory-owned fields with `identity`.
  pub fn apply_identity(&mut self, identity: CitizenIdentity, now: DateTime<Utc>) {
    self.number = identity.number;
    self.actual_handle = identity.handle;
    self.bio = identity.bio;
    self.replace_memberships(
      identity.organizations.into_iter().map(Into::into).collect(),
    );
    self.updated_at = now;
  }
}
