//! Snapshot — a timestamped capture of a player's live in-game state.
//!
//! Snapshots are append-only: one row per ingestion call, never updated,
//! never deduplicated. Recency and time-series continuity matter more than
//! storage efficiency here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::reference::CostVector;

// ─── Per-village state ───────────────────────────────────────────────────────

/// Current stock or production rate of the four resources.
///
/// Reuses [`CostVector`] — same four axes, same arithmetic.
pub type Resources = CostVector;

/// One building slot as reported by the scraping collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingState {
  pub key:          String,
  pub level:        u32,
  pub is_upgrading: bool,
}

/// Troop count for one unit type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TroopCount {
  pub key:   String,
  pub count: i64,
}

/// Normalised state of a single village.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VillageState {
  pub id:          String,
  pub name:        String,
  pub coordinates: Option<(i32, i32)>,
  pub population:  i64,
  pub resources:   Resources,
  pub production:  Resources,
  pub buildings:   Vec<BuildingState>,
  pub troops:      Vec<TroopCount>,
  pub loyalty:     Option<i64>,
}

/// Culture-point standing as reported by the game UI.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CulturePoints {
  pub current: i64,
  /// Accrual rate per day; `None` when the scraped page did not expose it.
  pub per_day: Option<f64>,
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// A snapshot ready for insertion; the store assigns id and capture time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSnapshot {
  pub server_version:    String,
  pub server_speed:      u32,
  pub server_started_at: Option<DateTime<Utc>>,
  pub villages:          Vec<VillageState>,
  pub resources_total:   Resources,
  pub production_total:  Resources,
  pub troops_total:      i64,
  pub culture_points:    CulturePoints,
  /// The original payload, retained verbatim for audit and re-ingestion.
  pub raw:               serde_json::Value,
}

/// A persisted snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
  pub snapshot_id:       Uuid,
  pub captured_at:       DateTime<Utc>,
  pub server_version:    String,
  pub server_speed:      u32,
  pub server_started_at: Option<DateTime<Utc>>,
  pub villages:          Vec<VillageState>,
  pub resources_total:   Resources,
  pub production_total:  Resources,
  pub troops_total:      i64,
  pub culture_points:    CulturePoints,
  pub raw:               serde_json::Value,
}

impl Snapshot {
  pub fn village_count(&self) -> usize {
    self.villages.len()
  }
}
