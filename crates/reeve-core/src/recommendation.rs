//! Recommendations — ranked, auditable advice emitted by the rule engine.
//!
//! A recommendation is created once and afterwards mutated only to mark
//! resolution. Resolved rows are retained for history, never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Broad grouping used by the presentation layer to pick icons and wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
  Resources,
  Build,
  Settlement,
  Military,
  Trade,
}

impl Category {
  /// The discriminant string stored in the `category` column.
  pub fn discriminant(&self) -> &'static str {
    match self {
      Category::Resources => "resources",
      Category::Build => "build",
      Category::Settlement => "settlement",
      Category::Military => "military",
      Category::Trade => "trade",
    }
  }

  pub fn from_discriminant(s: &str) -> Result<Self> {
    match s {
      "resources" => Ok(Category::Resources),
      "build" => Ok(Category::Build),
      "settlement" => Ok(Category::Settlement),
      "military" => Ok(Category::Military),
      "trade" => Ok(Category::Trade),
      other => Err(Error::UnknownCategory(other.to_string())),
    }
  }
}

/// A recommendation ready for insertion; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecommendation {
  /// 1 is most urgent.
  pub priority:   u8,
  pub category:   Category,
  /// Stable machine key for the suggested action, e.g. `"npc_trade"`.
  pub action_key: String,
  /// Human-readable justification shown to the player.
  pub reasoning:  String,
}

/// A persisted recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
  pub recommendation_id: Uuid,
  pub created_at:        DateTime<Utc>,
  pub priority:          u8,
  pub category:          Category,
  pub action_key:        String,
  pub reasoning:         String,
  pub resolved_at:       Option<DateTime<Utc>>,
}
