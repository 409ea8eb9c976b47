//! [`SqliteStore`], the SQLite implementation of [`HangarStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use hangar_core::{
  citizen::{Citizen, CitizenNumber, Handle},
  fleet::Fleet,
  ship_info::ShipNameAlias,
  store::{HangarStore, SaveOutcome},
};

use crate::{
  Result,
  encode::{
    RawCitizen, RawFleet, RawMembership, RawShip, encode_date, encode_dt,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Hangar store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Load every citizen matching `condition` (an SQL fragment over the
  /// `citizens` table taking a single `?1` parameter), memberships included.
  async fn query_citizens(
    &self,
    condition: &'static str,
    param: String,
  ) -> Result<Vec<Citizen>> {
    let rows: Vec<(RawCitizen, Vec<RawMembership>)> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT citizen_id, number, actual_handle, bio, public_choice, updated_at
           FROM citizens
           WHERE {condition}
           ORDER BY actual_handle COLLATE NOCASE"
        );
        let mut stmt = conn.prepare(&sql)?;
        let citizens = stmt
          .query_map(rusqlite::params![param], |row| {
            Ok(RawCitizen {
              citizen_id:    row.get(0)?,
              number:        row.get(1)?,
              actual_handle: row.get(2)?,
              bio:           row.get(3)?,
              public_choice: row.get(4)?,
              updated_at:    row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut memberships_stmt = conn.prepare(
          "SELECT organization_sid, rank, visibility
           FROM citizen_organizations
           WHERE citizen_id = ?1
           ORDER BY position",
        )?;

        let mut out = Vec::with_capacity(citizens.len());
        for citizen in citizens {
          let memberships = memberships_stmt
            .query_map(rusqlite::params![citizen.citizen_id], |row| {
              Ok(RawMembership {
                organization_sid: row.get(0)?,
                rank:             row.get(1)?,
                visibility:       row.get(2)?,
              })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          out.push((citizen, memberships));
        }
        Ok(out)
      })
      .await?;

    rows
      .into_iter()
      .map(|(citizen, memberships)| citizen.into_citizen(memberships))
      .collect()
  }

  /// Load the latest fleet of `owner_id`, or a specific `version` of it,
  /// ships included in upload order.
  async fn query_fleet(&self, owner_id: Uuid, version: Option<u32>) -> Result<Option<Fleet>> {
    let owner_str = encode_uuid(owner_id);

    let row: Option<(RawFleet, Vec<RawShip>)> = self
      .conn
      .call(move |conn| {
        let fleet = match version {
          Some(v) => conn.query_row(
            "SELECT fleet_id, owner_id, version, uploaded_at
             FROM fleets
             WHERE owner_id = ?1 AND version = ?2",
            rusqlite::params![owner_str, v],
            raw_fleet,
          ),
          None => conn.query_row(
            "SELECT fleet_id, owner_id, version, uploaded_at
             FROM fleets
             WHERE owner_id = ?1
             ORDER BY version DESC
             LIMIT 1",
            rusqlite::params![owner_str],
            raw_fleet,
          ),
        }
        .optional()?;

        let Some(fleet) = fleet else {
          return Ok(None);
        };

        let mut stmt = conn.prepare(
          "SELECT ship_id, fleet_id, owner_id, manufacturer, name, insured,
                  cost, pledge_date, raw_json
           FROM ships
           WHERE fleet_id = ?1
           ORDER BY position",
        )?;
        let ships = stmt
          .query_map(rusqlite::params![fleet.fleet_id], |row| {
            Ok(RawShip {
              ship_id:      row.get(0)?,
              fleet_id:     row.get(1)?,
              owner_id:     row.get(2)?,
              manufacturer: row.get(3)?,
              name:         row.get(4)?,
              insured:      row.get(5)?,
              cost:         row.get(6)?,
              pledge_date:  row.get(7)?,
              raw_json:     row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some((fleet, ships)))
      })
      .await?;

    row.map(|(fleet, ships)| fleet.into_fleet(ships)).transpose()
  }
}

fn raw_fleet(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawFleet> {
  Ok(RawFleet {
    fleet_id:    row.get(0)?,
    owner_id:    row.get(1)?,
    version:     row.get(2)?,
    uploaded_at: row.get(3)?,
  })
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        || f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
  )
}

/// Ship columns, pre-encoded so the insert closure owns plain values.
struct ShipRow {
  ship_id:      String,
  manufacturer: String,
  name:         String,
  insured:      bool,
  cost:         i64,
  pledge_date:  String,
  raw_json:     String,
}

// ─── HangarStore impl ────────────────────────────────────────────────────────

impl HangarStore for SqliteStore {
  type Error = crate::Error;

  // ── Citizens ──────────────────────────────────────────────────────────────

  async fn get_citizen(&self, id: Uuid) -> Result<Option<Citizen>> {
    let found = self.query_citizens("citizen_id = ?1", encode_uuid(id)).await?;
    Ok(found.into_iter().next())
  }

  async fn get_citizen_by_number(&self, number: &CitizenNumber) -> Result<Option<Citizen>> {
    let found = self.query_citizens("number = ?1", number.0.clone()).await?;
    Ok(found.into_iter().next())
  }

  async fn get_citizen_by_handle(&self, handle: &Handle) -> Result<Option<Citizen>> {
    let found = self
      .query_citizens("actual_handle = ?1 COLLATE NOCASE", handle.0.clone())
      .await?;
    Ok(found.into_iter().next())
  }

  async fn save_citizen(&self, citizen: &Citizen) -> Result<()> {
    let id_str        = encode_uuid(citizen.citizen_id);
    let number        = citizen.number.0.clone();
    let handle        = citizen.actual_handle.0.clone();
    let bio           = citizen.bio.clone();
    let public_choice = citizen.public_choice.as_str();
    let updated_at    = encode_dt(citizen.updated_at);
    let memberships: Vec<(String, u32, &'static str)> = citizen
      .organizations
      .iter()
      .map(|m| (m.organization_sid.clone(), m.rank, m.visibility.as_str()))
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO citizens (citizen_id, number, actual_handle, bio, public_choice, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (citizen_id) DO UPDATE SET
             number        = excluded.number,
             actual_handle = excluded.actual_handle,
             bio           = excluded.bio,
             public_choice = excluded.public_choice,
             updated_at    = excluded.updated_at",
          rusqlite::params![id_str, number, handle, bio, public_choice, updated_at],
        )?;
        tx.execute(
          "DELETE FROM citizen_organizations WHERE citizen_id = ?1",
          rusqlite::params![id_str],
        )?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO citizen_organizations
               (citizen_id, organization_sid, rank, visibility, position)
             VALUES (?1, ?2, ?3, ?4, ?5)",
          )?;
          for (position, (sid, rank, visibility)) in memberships.iter().enumerate() {
            stmt.execute(rusqlite::params![id_str, sid, rank, visibility, position])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn organization_members(&self, sid: &str) -> Result<Vec<Citizen>> {
    self
      .query_citizens(
        "citizen_id IN (SELECT citizen_id FROM citizen_organizations WHERE organization_sid = ?1)",
        sid.to_owned(),
      )
      .await
  }

  // ── Fleets ────────────────────────────────────────────────────────────────

  async fn latest_fleet(&self, owner_id: Uuid) -> Result<Option<Fleet>> {
    self.query_fleet(owner_id, None).await
  }

  async fn fleet_version(&self, owner_id: Uuid, version: u32) -> Result<Option<Fleet>> {
    self.query_fleet(owner_id, Some(version)).await
  }

  async fn save_fleet(&self, fleet: &Fleet) -> Result<SaveOutcome> {
    let fleet_id_str = encode_uuid(fleet.fleet_id);
    let owner_str    = encode_uuid(fleet.owner_id);
    let version      = fleet.version;
    let uploaded_at  = encode_dt(fleet.uploaded_at);
    let ships = fleet
      .ships
      .iter()
      .map(|s| {
        Ok(ShipRow {
          ship_id:      encode_uuid(s.ship_id),
          manufacturer: s.manufacturer.clone(),
          name:         s.name.clone(),
          insured:      s.insured,
          cost:         s.cost.minor_units(),
          pledge_date:  encode_date(s.pledge_date),
          raw_json:     serde_json::to_string(&s.raw)?,
        })
      })
      .collect::<Result<Vec<_>>>()?;

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let inserted = tx.execute(
          "INSERT INTO fleets (fleet_id, owner_id, version, uploaded_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![fleet_id_str, owner_str, version, uploaded_at],
        );
        match inserted {
          Ok(_) => {}
          // Dropping `tx` rolls back.
          Err(e) if is_unique_violation(&e) => return Ok(SaveOutcome::VersionConflict),
          Err(e) => return Err(e.into()),
        }

        {
          let mut stmt = tx.prepare(
            "INSERT INTO ships (
               ship_id, fleet_id, owner_id, position, manufacturer, name,
               insured, cost, pledge_date, raw_json
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          )?;
          for (position, ship) in ships.iter().enumerate() {
            stmt.execute(rusqlite::params![
              ship.ship_id,
              fleet_id_str,
              owner_str,
              position,
              ship.manufacturer,
              ship.name,
              ship.insured,
              ship.cost,
              ship.pledge_date,
              ship.raw_json,
            ])?;
          }
        }

        tx.commit()?;
        Ok(SaveOutcome::Saved)
      })
      .await?;

    if outcome == SaveOutcome::VersionConflict {
      tracing::warn!(owner_id = %fleet.owner_id, version, "fleet version already taken");
    }
    Ok(outcome)
  }

  // ── Ship name aliases ─────────────────────────────────────────────────────

  async fn ship_name_aliases(&self) -> Result<Vec<ShipNameAlias>> {
    let aliases = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare("SELECT hangar_name, provider_name FROM ship_names ORDER BY hangar_name")?;
        let rows = stmt
          .query_map([], |row| {
            Ok(ShipNameAlias {
              hangar_name:   row.get(0)?,
              provider_name: row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(aliases)
  }

  async fn save_ship_name_alias(&self, alias: &ShipNameAlias) -> Result<()> {
    let hangar_name   = alias.hangar_name.clone();
    let provider_name = alias.provider_name.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO ship_names (hangar_name, provider_name) VALUES (?1, ?2)
           ON CONFLICT (hangar_name) DO UPDATE SET provider_name = excluded.provider_name",
          rusqlite::params![hangar_name, provider_name],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
