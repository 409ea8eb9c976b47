//! Organization-based access control.
//!
//! Every decision is a pure function over citizens that were already loaded;
//! [`OrganizationAccessGuard`] only knows how to fetch the rosters those
//! functions need.
//!
//! Rules, evaluated per membership of the target:
//!
//! - `public`: anyone.
//! - `organization`: members of that organization.
//! - `private`: members of that organization who can manage it, i.e. nobody
//!   in the organization outranks them.
//!
//! Anything that cannot be resolved is a deny.

use std::{collections::HashMap, sync::Arc};

use hangar_core::{
  citizen::{Citizen, OrganizationSid, PublicChoice, Visibility},
  store::HangarStore,
};
use tracing::debug;

use crate::error::{Error, Result};

/// Members of each organization, keyed by sid.
pub type Rosters = HashMap<OrganizationSid, Vec<Citizen>>;

// ─── Decisions ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
  /// Anonymous viewer and nothing public to show.
  NotEnoughRightsPublic,
  /// Signed in, but not a member of any organization that would grant access.
  NotEnoughRightsPrivate,
  /// A fellow member, but outranked.
  NotEnoughRightsAdmin,
}

impl DenyReason {
  pub fn code(self) -> &'static str {
    match self {
      Self::NotEnoughRightsPublic => "not_enough_rights_public",
      Self::NotEnoughRightsPrivate => "not_enough_rights_private",
      Self::NotEnoughRightsAdmin => "not_enough_rights_admin",
    }
  }

  pub fn message(self) -> &'static str {
    match self {
      Self::NotEnoughRightsPublic => {
        "This fleet is not public. Sign in to see it if you belong to the same organization."
      }
      Self::NotEnoughRightsPrivate => "You must be a member of the same organization to see this fleet.",
      Self::NotEnoughRightsAdmin => "Only the highest ranked members of the organization can see this fleet.",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
  Allow,
  Deny(DenyReason),
}

impl AccessDecision {
  pub fn is_allowed(self) -> bool { self == Self::Allow }

  pub fn into_result(self) -> Result<()> {
    match self {
      Self::Allow => Ok(()),
      Self::Deny(reason) => Err(Error::AccessDenied(reason)),
    }
  }
}

// ─── Rank ────────────────────────────────────────────────────────────────────

/// How two members holding the same best rank are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankTieBreak {
  /// Every member sharing the best rank may manage.
  Allow,
  /// Managing requires being strictly better ranked than everyone else.
  Deny,
}

/// Members tied for the best rank do not manage each other's private
/// fleets. [`can_manage_with`] with [`RankTieBreak::Allow`] lets tied-top
/// members share management instead.
pub const RANK_TIE_BREAK: RankTieBreak = RankTieBreak::Deny;

/// Whether `viewer` may manage `sid`, given everyone in `roster`.
pub fn can_manage(viewer: &Citizen, sid: &str, roster: &[Citizen]) -> bool {
  can_manage_with(RANK_TIE_BREAK, viewer, sid, roster)
}

pub fn can_manage_with(
  tie_break: RankTieBreak,
  viewer: &Citizen,
  sid: &str,
  roster: &[Citizen],
) -> bool {
  let Some(own) = viewer.membership(sid) else {
    return false;
  };

  roster
    .iter()
    .filter(|other| other.citizen_id != viewer.citizen_id)
    .filter_map(|other| other.membership(sid))
    .all(|other| match tie_break {
      RankTieBreak::Allow => other.rank >= own.rank,
      RankTieBreak::Deny => other.rank > own.rank,
    })
}

// ─── Citizens ────────────────────────────────────────────────────────────────

/// Whether `viewer` (`None` for anonymous) may see `target`'s fleet.
///
/// `rosters` needs an entry for every organization in which the target is
/// `private` and the viewer is a member; a missing roster denies.
pub fn can_view_citizen(
  viewer: Option<&Citizen>,
  target: &Citizen,
  rosters: &Rosters,
) -> AccessDecision {
  if viewer.is_some_and(|v| v.citizen_id == target.citizen_id)
    || target.public_choice == PublicChoice::Public
  {
    return AccessDecision::Allow;
  }

  let mut shares_organization = false;
  for membership in &target.organizations {
    let sid = membership.organization_sid.as_str();
    let viewer_is_member = viewer.is_some_and(|v| v.is_member_of(sid));
    shares_organization |= viewer_is_member;

    let allowed = match membership.visibility {
      Visibility::Public => true,
      Visibility::Organization => viewer_is_member,
      Visibility::Private => match (viewer, rosters.get(sid)) {
        (Some(v), Some(roster)) => viewer_is_member && can_manage(v, sid, roster),
        _ => false,
      },
    };
    if allowed {
      return AccessDecision::Allow;
    }
  }

  AccessDecision::Deny(match viewer {
    None => DenyReason::NotEnoughRightsPublic,
    Some(_) if shares_organization => DenyReason::NotEnoughRightsAdmin,
    Some(_) => DenyReason::NotEnoughRightsPrivate,
  })
}

// ─── Organizations ───────────────────────────────────────────────────────────

/// Members of `sid` whose fleet `viewer` may see under the visibility each
/// member chose for that organization.
pub fn visible_members<'a>(
  viewer: Option<&Citizen>,
  sid: &str,
  members: &'a [Citizen],
) -> Vec<&'a Citizen> {
  let viewer_is_member = viewer.is_some_and(|v| v.is_member_of(sid));
  let manages = viewer.is_some_and(|v| can_manage(v, sid, members));

  members
    .iter()
    .filter(|member| {
      if viewer.is_some_and(|v| v.citizen_id == member.citizen_id) {
        return true;
      }
      match member.membership(sid).map(|m| m.visibility) {
        Some(Visibility::Public) => true,
        Some(Visibility::Organization) => viewer_is_member,
        Some(Visibility::Private) => manages,
        None => false,
      }
    })
    .collect()
}

/// Whether `viewer` may open `sid`'s fleet page at all.
///
/// Members can when they would see at least one other member's fleet: they
/// manage the organization, or someone shares beyond `private`. Outsiders
/// can when at least one member shares their fleet publicly with that
/// organization.
pub fn can_view_organization(
  viewer: Option<&Citizen>,
  sid: &str,
  members: &[Citizen],
) -> AccessDecision {
  if let Some(viewer) = viewer
    && viewer.is_member_of(sid)
  {
    let anyone_shared = members
      .iter()
      .filter(|m| m.citizen_id != viewer.citizen_id)
      .filter_map(|m| m.membership(sid))
      .any(|m| m.visibility != Visibility::Private);
    return if anyone_shared || can_manage(viewer, sid, members) {
      AccessDecision::Allow
    } else {
      AccessDecision::Deny(DenyReason::NotEnoughRightsAdmin)
    };
  }

  let any_public = members.iter().any(|m| {
    m.membership(sid)
      .is_some_and(|m| m.visibility == Visibility::Public)
  });
  if any_public {
    return AccessDecision::Allow;
  }

  AccessDecision::Deny(match viewer {
    None => DenyReason::NotEnoughRightsPublic,
    Some(_) => DenyReason::NotEnoughRightsPrivate,
  })
}

// ─── Guard ───────────────────────────────────────────────────────────────────

/// Loads what the decision functions need from a [`HangarStore`].
pub struct OrganizationAccessGuard<S> {
  store: Arc<S>,
}

impl<S: HangarStore> OrganizationAccessGuard<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Fails with [`Error::AccessDenied`] unless `viewer` may see `target`.
  pub async fn check_citizen(&self, viewer: Option<&Citizen>, target: &Citizen) -> Result<()> {
    let mut rosters = Rosters::new();
    if let Some(viewer) = viewer {
      for membership in &target.organizations {
        let sid = &membership.organization_sid;
        if membership.visibility == Visibility::Private && viewer.is_member_of(sid) {
          let roster = self
            .store
            .organization_members(sid)
            .await
            .map_err(Error::store)?;
          rosters.insert(sid.clone(), roster);
        }
      }
    }

    let decision = can_view_citizen(viewer, target, &rosters);
    debug!(target = %target.actual_handle, ?decision, "citizen access check");
    decision.into_result()
  }

  /// Fails with [`Error::AccessDenied`] unless `viewer` may see `sid`;
  /// otherwise returns the members whose fleets are visible to `viewer`.
  pub async fn check_organization(
    &self,
    viewer: Option<&Citizen>,
    sid: &str,
  ) -> Result<Vec<Citizen>> {
    let members = self
      .store
      .organization_members(sid)
      .await
      .map_err(Error::store)?;

    let decision = can_view_organization(viewer, sid, &members);
    debug!(organization = sid, ?decision, "organization access check");
    decision.into_result()?;

    Ok(visible_members(viewer, sid, &members).into_iter().cloned().collect())
  }
}
