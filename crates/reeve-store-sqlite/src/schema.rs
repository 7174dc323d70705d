//! SQL schema for the reeve SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Extracted cost tables. Written only by the extraction pipeline;
-- re-extraction overwrites rows in place by composite key.
CREATE TABLE IF NOT EXISTS reference_records (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    server_version  TEXT NOT NULL,
    server_speed    INTEGER NOT NULL,
    entity_kind     TEXT NOT NULL,      -- 'building' | 'unit'
    entity_key      TEXT NOT NULL,      -- snake_case, or 'unknown_<signature>'
    level           INTEGER NOT NULL,
    wood_cost       INTEGER NOT NULL,
    clay_cost       INTEGER NOT NULL,
    iron_cost       INTEGER NOT NULL,
    crop_cost       INTEGER NOT NULL,
    time_seconds    INTEGER NOT NULL,
    population      INTEGER,
    culture_points  INTEGER,
    UNIQUE (server_version, server_speed, entity_kind, entity_key, level)
);

-- Non-tabular constants (culture-point thresholds, speed multipliers).
CREATE TABLE IF NOT EXISTS mechanic_records (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    server_version  TEXT NOT NULL,
    server_speed    INTEGER NOT NULL,
    mechanic_type   TEXT NOT NULL,
    mechanic_key    TEXT NOT NULL,
    mechanic_value  TEXT NOT NULL,
    UNIQUE (server_version, server_speed, mechanic_type, mechanic_key)
);

-- Live game-state captures. Strictly append-only:
-- no UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS snapshots (
    snapshot_id       TEXT PRIMARY KEY,
    captured_at       TEXT NOT NULL,    -- ISO 8601 UTC; server-assigned
    server_version    TEXT NOT NULL,
    server_speed      INTEGER NOT NULL,
    server_started_at TEXT,
    villages_json     TEXT NOT NULL,
    resources_json    TEXT NOT NULL,    -- totals across villages
    production_json   TEXT NOT NULL,
    troops_total      INTEGER NOT NULL,
    cp_current        INTEGER NOT NULL,
    cp_per_day        REAL,
    raw_json          TEXT NOT NULL     -- original payload, verbatim
);

-- Rule-engine output; mutated only to set resolved_at.
CREATE TABLE IF NOT EXISTS recommendations (
    recommendation_id TEXT PRIMARY KEY,
    created_at        TEXT NOT NULL,
    priority          INTEGER NOT NULL, -- 1 is most urgent
    category          TEXT NOT NULL,
    action_key        TEXT NOT NULL,
    reasoning         TEXT NOT NULL,
    resolved_at       TEXT
);

CREATE INDEX IF NOT EXISTS snapshots_captured_idx
    ON snapshots(captured_at);
CREATE INDEX IF NOT EXISTS recommendations_resolved_idx
    ON recommendations(resolved_at);
CREATE INDEX IF NOT EXISTS reference_entity_idx
    ON reference_records(entity_kind, entity_key);

PRAGMA user_version = 1;
";
