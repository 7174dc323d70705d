//! Reference records — static, version-scoped game-mechanics data.
//!
//! A reference record is one row of an entity's cost table on the external
//! reference calculator: entity × level × server-speed variant. Records are
//! written only by the extraction pipeline and are immutable once validated;
//! the rest of the system treats them as a read-only dataset safe to cache.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Entity kind ─────────────────────────────────────────────────────────────

/// What kind of game entity a cost table describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
  Building,
  Unit,
}

impl EntityKind {
  /// The discriminant string stored in the `entity_kind` column.
  pub fn discriminant(&self) -> &'static str {
    match self {
      EntityKind::Building => "building",
      EntityKind::Unit => "unit",
    }
  }

  pub fn from_discriminant(s: &str) -> Result<Self> {
    match s {
      "building" => Ok(EntityKind::Building),
      "unit" => Ok(EntityKind::Unit),
      other => Err(Error::UnknownEntityKind(other.to_string())),
    }
  }
}

// ─── Cost vector ─────────────────────────────────────────────────────────────

/// The four-resource cost of one level (or one unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CostVector {
  pub wood: i64,
  pub clay: i64,
  pub iron: i64,
  pub crop: i64,
}

impl CostVector {
  pub fn new(wood: i64, clay: i64, iron: i64, crop: i64) -> Self {
    Self { wood, clay, iron, crop }
  }

  /// The `"wood-clay-iron-crop"` form used for entity identification.
  ///
  /// The reference site exposes no machine-readable entity id; the level-1
  /// cost vector is, empirically, unique per entity within a game version.
  pub fn signature(&self) -> String {
    format!("{}-{}-{}-{}", self.wood, self.clay, self.iron, self.crop)
  }
}

// ─── Reference record ────────────────────────────────────────────────────────

/// One extracted cost-table row.
///
/// Unique on `(server_version, server_speed, entity_kind, entity_key, level)`;
/// re-extraction overwrites in place (on-conflict-replace).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceRecord {
  pub server_version: String,
  pub server_speed:   u32,
  pub entity_kind:    EntityKind,
  /// Stable snake_case key, e.g. `"main_building"`. Entities the classifier
  /// could not identify carry an `unknown_<signature>` key.
  pub entity_key:     String,
  /// 1-based level. Units carry `level = 1` (their tables have no level axis).
  pub level:          u32,
  pub cost:           CostVector,
  pub time_seconds:   i64,
  pub population:     Option<i64>,
  pub culture_points: Option<i64>,
}

// ─── Mechanic record ─────────────────────────────────────────────────────────

/// Mechanic type for culture-point thresholds; key is the current village
/// count, value the CP total required for the next settlement.
pub const MECHANIC_CP_THRESHOLD: &str = "cp_threshold";

/// Mechanic type for server-speed multipliers.
pub const MECHANIC_SPEED_FACTOR: &str = "speed_factor";

/// A non-tabular game constant, keyed within a `(type, key)` namespace.
///
/// Unique on `(server_version, server_speed, mechanic_type, mechanic_key)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MechanicRecord {
  pub server_version: String,
  pub server_speed:   u32,
  pub mechanic_type:  String,
  pub mechanic_key:   String,
  pub mechanic_value: String,
}
