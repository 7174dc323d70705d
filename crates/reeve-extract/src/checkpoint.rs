//! Known-good cost rows used to catch positional drift in the parsed tables.
//!
//! A wrong column order or a site markup change produces well-formed but
//! wrong rows; these hand-verified values catch that. A mismatch is logged
//! by the pipeline and does not block persistence.

use reeve_core::reference::CostVector;

use crate::error::ValidationError;

/// `(speed, entity_key, level)` → expected cost, verified by hand against
/// the live site.
const CHECKPOINTS: &[(u32, &str, u32, CostVector)] = &[
  (1, "main_building", 1, CostVector { wood: 70, clay: 40, iron: 60, crop: 20 }),
  (2, "main_building", 1, CostVector { wood: 70, clay: 40, iron: 60, crop: 20 }),
  (2, "main_building", 6, CostVector { wood: 240, clay: 135, iron: 205, crop: 70 }),
];

/// Check a parsed row against the checkpoint table. Rows not covered by a
/// checkpoint always pass.
pub fn validate(
  speed: u32,
  entity_key: &str,
  level: u32,
  actual: &CostVector,
) -> Result<(), ValidationError> {
  for (s, key, l, expected) in CHECKPOINTS {
    if *s == speed && *key == entity_key && *l == level && expected != actual {
      return Err(ValidationError::Mismatch {
        expected: *expected,
        actual:   *actual,
      });
    }
  }
  Ok(())
}
