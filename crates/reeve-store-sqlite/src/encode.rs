//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Structured fields (village
//! lists, resource totals, raw payloads) are stored as compact JSON. UUIDs
//! are stored as hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use reeve_core::{
  recommendation::{Category, Recommendation},
  reference::{CostVector, EntityKind, MechanicRecord, ReferenceRecord},
  snapshot::{CulturePoints, Snapshot, VillageState},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `reference_records` row.
pub struct RawReference {
  pub server_version: String,
  pub server_speed:   u32,
  pub entity_kind:    String,
  pub entity_key:     String,
  pub level:          u32,
  pub wood_cost:      i64,
  pub clay_cost:      i64,
  pub iron_cost:      i64,
  pub crop_cost:      i64,
  pub time_seconds:   i64,
  pub population:     Option<i64>,
  pub culture_points: Option<i64>,
}

impl RawReference {
  pub fn into_record(self) -> Result<ReferenceRecord> {
    Ok(ReferenceRecord {
      server_version: self.server_version,
      server_speed:   self.server_speed,
      entity_kind:    EntityKind::from_discriminant(&self.entity_kind)
        .map_err(Error::Core)?,
      entity_key:     self.entity_key,
      level:          self.level,
      cost:           CostVector::new(
        self.wood_cost,
        self.clay_cost,
        self.iron_cost,
        self.crop_cost,
      ),
      time_seconds:   self.time_seconds,
      population:     self.population,
      culture_points: self.culture_points,
    })
  }
}

/// Raw values read directly from a `mechanic_records` row.
pub struct RawMechanic {
  pub server_version: String,
  pub server_speed:   u32,
  pub mechanic_type:  String,
  pub mechanic_key:   String,
  pub mechanic_value: String,
}

impl RawMechanic {
  pub fn into_record(self) -> MechanicRecord {
    MechanicRecord {
      server_version: self.server_version,
      server_speed:   self.server_speed,
      mechanic_type:  self.mechanic_type,
      mechanic_key:   self.mechanic_key,
      mechanic_value: self.mechanic_value,
    }
  }
}

/// Raw strings read directly from a `snapshots` row.
pub struct RawSnapshot {
  pub snapshot_id:       String,
  pub captured_at:       String,
  pub server_version:    String,
  pub server_speed:      u32,
  pub server_started_at: Option<String>,
  pub villages_json:     String,
  pub resources_json:    String,
  pub production_json:   String,
  pub troops_total:      i64,
  pub cp_current:        i64,
  pub cp_per_day:        Option<f64>,
  pub raw_json:          String,
}

impl RawSnapshot {
  pub fn into_snapshot(self) -> Result<Snapshot> {
    let villages: Vec<VillageState> = serde_json::from_str(&self.villages_json)?;
    Ok(Snapshot {
      snapshot_id:       decode_uuid(&self.snapshot_id)?,
      captured_at:       decode_dt(&self.captured_at)?,
      server_version:    self.server_version,
      server_speed:      self.server_speed,
      server_started_at: self
        .server_started_at
        .as_deref()
        .map(decode_dt)
        .transpose()?,
      villages,
      resources_total:   serde_json::from_str(&self.resources_json)?,
      production_total:  serde_json::from_str(&self.production_json)?,
      troops_total:      self.troops_total,
      culture_points:    CulturePoints {
        current: self.cp_current,
        per_day: self.cp_per_day,
      },
      raw:               serde_json::from_str(&self.raw_json)?,
    })
  }
}

/// Raw strings read directly from a `recommendations` row.
pub struct RawRecommendation {
  pub recommendation_id: String,
  pub created_at:        String,
  pub priority:          u8,
  pub category:          String,
  pub action_key:        String,
  pub reasoning:         String,
  pub resolved_at:       Option<String>,
}

impl RawRecommendation {
  pub fn into_recommendation(self) -> Result<Recommendation> {
    Ok(Recommendation {
      recommendation_id: decode_uuid(&self.recommendation_id)?,
      created_at:        decode_dt(&self.created_at)?,
      priority:          self.priority,
      category:          Category::from_discriminant(&self.category)
        .map_err(Error::Core)?,
      action_key:        self.action_key,
      reasoning:         self.reasoning,
      resolved_at:       self
        .resolved_at
        .as_deref()
        .map(decode_dt)
        .transpose()?,
    })
  }
}
