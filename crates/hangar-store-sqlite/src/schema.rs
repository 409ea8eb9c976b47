//! SQL schema for the Hangar SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS citizens (
    citizen_id     TEXT PRIMARY KEY,
    number         TEXT NOT NULL UNIQUE,
    actual_handle  TEXT NOT NULL,
    bio            TEXT,
    public_choice  TEXT NOT NULL DEFAULT 'private',  -- 'public' | 'private'
    updated_at     TEXT NOT NULL
);

-- Replaced wholesale whenever the citizen is saved.
CREATE TABLE IF NOT EXISTS citizen_organizations (
    citizen_id       TEXT NOT NULL REFERENCES citizens(citizen_id) ON DELETE CASCADE,
    organization_sid TEXT NOT NULL,
    rank             INTEGER NOT NULL,
    visibility       TEXT NOT NULL,   -- 'public' | 'organization' | 'private'
    position         INTEGER NOT NULL,
    PRIMARY KEY (citizen_id, organization_sid)
);

-- Fleets are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table or `ships`.
CREATE TABLE IF NOT EXISTS fleets (
    fleet_id     TEXT PRIMARY KEY,
    owner_id     TEXT NOT NULL REFERENCES citizens(citizen_id),
    version      INTEGER NOT NULL,
    uploaded_at  TEXT NOT NULL,   -- ISO 8601 UTC
    UNIQUE (owner_id, version)
);

CREATE TABLE IF NOT EXISTS ships (
    ship_id      TEXT PRIMARY KEY,
    fleet_id     TEXT NOT NULL REFERENCES fleets(fleet_id),
    owner_id     TEXT NOT NULL REFERENCES citizens(citizen_id),
    position     INTEGER NOT NULL,
    manufacturer TEXT NOT NULL,
    name         TEXT NOT NULL,
    insured      INTEGER NOT NULL,
    cost         INTEGER NOT NULL,   -- minor units
    pledge_date  TEXT NOT NULL,      -- YYYY-MM-DD
    raw_json     TEXT NOT NULL
);

-- Hangar name to catalog name, stored as entered.
CREATE TABLE IF NOT EXISTS ship_names (
    hangar_name   TEXT PRIMARY KEY,
    provider_name TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS citizens_handle_idx      ON citizens(actual_handle COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS citizen_orgs_sid_idx     ON citizen_organizations(organization_sid);
CREATE INDEX IF NOT EXISTS fleets_owner_version_idx ON fleets(owner_id, version DESC);
CREATE INDEX IF NOT EXISTS ships_fleet_idx          ON ships(fleet_id);

PRAGMA user_version = 1;
";
