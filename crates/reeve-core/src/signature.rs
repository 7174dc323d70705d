//! Cost-signature classification of extracted tables.
//!
//! The reference calculator exposes no stable machine-readable identifier
//! per entity — tables are addressed by an opaque numeric page parameter
//! whose mapping has drifted across site revisions. The level-1 cost vector
//! is the only cross-reference proxy available, and it is empirically unique
//! per entity within a game version. Classification is therefore an explicit
//! fallible step: unregistered vectors come back as [`Classification::Unknown`]
//! so the caller can store them flagged instead of dropping them.

use crate::reference::{CostVector, EntityKind};

/// Result of classifying a level-1 cost vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
  Known { key: &'static str, kind: EntityKind },
  /// Carries the signature string so the caller can persist the table under
  /// an `unknown_<signature>` key rather than lose the data.
  Unknown(String),
}

impl Classification {
  /// The entity key to store the table under.
  pub fn entity_key(&self) -> String {
    match self {
      Classification::Known { key, .. } => (*key).to_string(),
      Classification::Unknown(sig) => format!("unknown_{sig}"),
    }
  }
}

/// `(signature, key, kind)` — level-1 costs at 1× speed, T4 rules.
///
/// Speed variants scale build times, not costs, so one table covers all
/// known server speeds.
const SIGNATURES: &[(&str, &str, EntityKind)] = &[
  // Resource fields
  ("40-100-50-60", "woodcutter", EntityKind::Building),
  ("80-40-80-50", "clay_pit", EntityKind::Building),
  ("100-80-30-60", "iron_mine", EntityKind::Building),
  ("70-90-70-20", "cropland", EntityKind::Building),
  // Resource boosters
  ("520-380-290-90", "sawmill", EntityKind::Building),
  ("440-480-320-50", "brickyard", EntityKind::Building),
  ("200-450-510-120", "iron_foundry", EntityKind::Building),
  ("500-440-380-1240", "grain_mill", EntityKind::Building),
  ("1200-1480-870-1600", "bakery", EntityKind::Building),
  // Infrastructure
  ("70-40-60-20", "main_building", EntityKind::Building),
  ("130-160-90-40", "warehouse", EntityKind::Building),
  ("80-100-70-20", "granary", EntityKind::Building),
  ("110-160-90-70", "rally_point", EntityKind::Building),
  ("80-70-120-70", "marketplace", EntityKind::Building),
  ("180-130-150-80", "embassy", EntityKind::Building),
  ("40-50-30-10", "cranny", EntityKind::Building),
  // Military
  ("210-140-260-120", "barracks", EntityKind::Building),
  ("260-140-220-100", "stable", EntityKind::Building),
  ("460-510-600-320", "workshop", EntityKind::Building),
  ("220-160-90-40", "academy", EntityKind::Building),
  ("180-250-500-160", "smithy", EntityKind::Building),
  ("1750-2250-1530-240", "tournament_square", EntityKind::Building),
  ("700-670-700-240", "hero_mansion", EntityKind::Building),
  // Village
  ("1250-1110-1260-600", "town_hall", EntityKind::Building),
  ("580-460-350-180", "residence", EntityKind::Building),
  ("550-800-750-250", "palace", EntityKind::Building),
  ("2880-2740-2580-990", "treasury", EntityKind::Building),
  ("1400-1330-1200-400", "trade_office", EntityKind::Building),
  ("650-800-450-200", "great_warehouse", EntityKind::Building),
  ("400-500-350-100", "great_granary", EntityKind::Building),
  ("1460-930-1250-1740", "brewery", EntityKind::Building),
  ("100-100-100-100", "trapper", EntityKind::Building),
  ("155-130-125-70", "stonemason", EntityKind::Building),
  ("780-420-660-540", "horse_drinking_trough", EntityKind::Building),
  // Walls
  ("70-90-170-70", "city_wall", EntityKind::Building),
  ("120-200-0-80", "earth_wall", EntityKind::Building),
  ("160-100-80-60", "palisade", EntityKind::Building),
  // Units (training costs; level axis does not apply)
  ("120-100-150-30", "legionnaire", EntityKind::Unit),
  ("100-130-160-70", "praetorian", EntityKind::Unit),
  ("150-160-210-80", "imperian", EntityKind::Unit),
  ("95-75-40-40", "clubswinger", EntityKind::Unit),
  ("145-70-85-40", "spearman", EntityKind::Unit),
  ("130-120-170-70", "axeman", EntityKind::Unit),
  ("100-130-55-30", "phalanx", EntityKind::Unit),
  ("140-150-185-60", "swordsman", EntityKind::Unit),
  ("5800-5300-7200-5500", "settler_roman", EntityKind::Unit),
  ("7200-5500-5800-6500", "settler_teuton", EntityKind::Unit),
  ("5500-7000-5300-4900", "settler_gaul", EntityKind::Unit),
];

/// Identify an entity from its level-1 cost vector. Never fails.
pub fn classify(level_one: &CostVector) -> Classification {
  let sig = level_one.signature();
  for (known_sig, key, kind) in SIGNATURES {
    if *known_sig == sig {
      return Classification::Known { key, kind: *kind };
    }
  }
  Classification::Unknown(sig)
}
