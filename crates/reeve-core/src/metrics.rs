//! Derived metrics — pure functions over a snapshot plus reference data.
//!
//! Nothing here touches a store or mutates anything; the rule engine and the
//! API layer both consume the [`Metrics`] bundle produced by [`compute`].

use serde::{Deserialize, Serialize};

use crate::{
  reference::{EntityKind, MECHANIC_CP_THRESHOLD, MechanicRecord, ReferenceRecord},
  snapshot::Snapshot,
};

/// Returned by [`culture_threshold_for`] beyond the documented threshold
/// table. The source data has a hard ceiling at ten villages; whether the
/// real game formula continues past it is unknown, so this is a deliberate
/// approximation rather than an extrapolation.
pub const CP_THRESHOLD_CEILING: i64 = 1_000_000;

/// Production rates count as imbalanced when their standard deviation
/// exceeds this fraction of their mean.
pub const IMBALANCE_RATIO: f64 = 0.20;

// ─── Imbalance ───────────────────────────────────────────────────────────────

/// Spread of the four production rates around their mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Imbalance {
  pub mean:    f64,
  pub std_dev: f64,
  /// `std_dev / mean`; zero when nothing is produced.
  pub ratio:   f64,
  pub flagged: bool,
}

/// Standard deviation of the four production rates relative to their mean.
pub fn resource_imbalance(snapshot: &Snapshot) -> Imbalance {
  let p = snapshot.production_total;
  let rates = [p.wood as f64, p.clay as f64, p.iron as f64, p.crop as f64];
  let mean = rates.iter().sum::<f64>() / 4.0;

  if mean == 0.0 {
    return Imbalance { mean, std_dev: 0.0, ratio: 0.0, flagged: false };
  }

  let variance =
    rates.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / 4.0;
  let std_dev = variance.sqrt();
  let ratio = std_dev / mean;

  Imbalance { mean, std_dev, ratio, flagged: ratio > IMBALANCE_RATIO }
}

// ─── Simple aggregates ───────────────────────────────────────────────────────

/// Sum of village populations.
pub fn total_population(snapshot: &Snapshot) -> i64 {
  snapshot.villages.iter().map(|v| v.population).sum()
}

/// Sum of all troop counts across all units.
///
/// Deliberately coarse: no weighting by unit power, since per-tribe combat
/// values are not reliably present in snapshots.
pub fn military_strength(snapshot: &Snapshot) -> i64 {
  snapshot.troops_total
}

// ─── Culture points ──────────────────────────────────────────────────────────

/// Culture points required for the next settlement, given the current
/// village count.
///
/// Reads `cp_threshold` mechanic records (key = current village count).
/// Village counts past the stored table return [`CP_THRESHOLD_CEILING`].
pub fn culture_threshold_for(
  village_count: usize,
  mechanics: &[MechanicRecord],
) -> i64 {
  let key = village_count.to_string();
  mechanics
    .iter()
    .find(|m| m.mechanic_type == MECHANIC_CP_THRESHOLD && m.mechanic_key == key)
    .and_then(|m| m.mechanic_value.parse().ok())
    .unwrap_or(CP_THRESHOLD_CEILING)
}

/// Culture-point accrual rate per day.
///
/// The scraped rate wins when present; otherwise the rate is derived from
/// building levels via the reference dataset. CP production is cumulative:
/// a level-N building yields the sum of the per-level CP values for levels
/// 1 through N each day, not just the value at its current level.
pub fn culture_point_rate(
  snapshot: &Snapshot,
  references: &[ReferenceRecord],
) -> f64 {
  if let Some(per_day) = snapshot.culture_points.per_day {
    return per_day;
  }

  snapshot
    .villages
    .iter()
    .flat_map(|v| v.buildings.iter())
    .map(|b| {
      references
        .iter()
        .filter(|r| {
          r.entity_kind == EntityKind::Building
            && r.entity_key == b.key
            && r.level >= 1
            && r.level <= b.level
        })
        .filter_map(|r| r.culture_points)
        .sum::<i64>()
    })
    .sum::<i64>() as f64
}

/// Days until the next settlement's CP threshold is met.
///
/// Clamped to zero when the threshold is already reached; infinite when
/// nothing is accruing.
pub fn projected_settlement_days(
  snapshot: &Snapshot,
  mechanics: &[MechanicRecord],
  cp_per_day: f64,
) -> f64 {
  let threshold = culture_threshold_for(snapshot.village_count(), mechanics);
  let needed = threshold - snapshot.culture_points.current;
  if needed <= 0 {
    return 0.0;
  }
  if cp_per_day <= 0.0 {
    return f64::INFINITY;
  }
  needed as f64 / cp_per_day
}

/// Age of the server at capture time, when the scraper reported a start date.
pub fn server_age_days(snapshot: &Snapshot) -> Option<f64> {
  let started = snapshot.server_started_at?;
  let secs = (snapshot.captured_at - started).num_seconds();
  Some(secs.max(0) as f64 / 86_400.0)
}

// ─── Bundle ──────────────────────────────────────────────────────────────────

/// Everything the rule engine and presentation layer need, computed once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metrics {
  pub village_count:             usize,
  pub total_population:          i64,
  pub military_strength:         i64,
  pub imbalance:                 Imbalance,
  pub culture_points_current:    i64,
  pub culture_points_per_day:    f64,
  pub culture_threshold_next:    i64,
  pub projected_settlement_days: f64,
  pub server_age_days:           Option<f64>,
}

pub fn compute(
  snapshot: &Snapshot,
  references: &[ReferenceRecord],
  mechanics: &[MechanicRecord],
) -> Metrics {
  let cp_per_day = culture_point_rate(snapshot, references);
  Metrics {
    village_count: snapshot.village_count(),
    total_population: total_population(snapshot),
    military_strength: military_strength(snapshot),
    imbalance: resource_imbalance(snapshot),
    culture_points_current: snapshot.culture_points.current,
    culture_points_per_day: cp_per_day,
    culture_threshold_next: culture_threshold_for(
      snapshot.village_count(),
      mechanics,
    ),
    projected_settlement_days: projected_settlement_days(
      snapshot, mechanics, cp_per_day,
    ),
    server_age_days: server_age_days(snapshot),
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;
  use crate::snapshot::{
    BuildingState, CulturePoints, Resources, Snapshot, VillageState,
  };
  use chrono::{TimeZone, Utc};
  use uuid::Uuid;

  fn snapshot() -> Snapshot {
    Snapshot {
      snapshot_id: Uuid::new_v4(),
      captured_at: Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap(),
      server_version: "T4".into(),
      server_speed: 2,
      server_started_at: None,
      villages: Vec::new(),
      resources_total: Resources::default(),
      production_total: Resources::default(),
      troops_total: 0,
      culture_points: CulturePoints::default(),
      raw: serde_json::Value::Object(Default::default()),
    }
  }

  fn village(population: i64) -> VillageState {
    VillageState {
      id: "v".into(),
      name: "Village".into(),
      coordinates: None,
      population,
      resources: Resources::default(),
      production: Resources::default(),
      buildings: Vec::new(),
      troops: Vec::new(),
      loyalty: None,
    }
  }

  fn cp_mechanic(villages: usize, threshold: i64) -> MechanicRecord {
    MechanicRecord {
      server_version: "T4".into(),
      server_speed: 2,
      mechanic_type: MECHANIC_CP_THRESHOLD.into(),
      mechanic_key: villages.to_string(),
      mechanic_value: threshold.to_string(),
    }
  }

  #[test]
  fn balanced_production_is_not_flagged() {
    let mut s = snapshot();
    s.production_total = Resources::new(100, 100, 100, 100);
    let imb = resource_imbalance(&s);
    assert_eq!(imb.std_dev, 0.0);
    assert!(!imb.flagged);
  }

  #[test]
  fn skewed_production_is_flagged() {
    let mut s = snapshot();
    s.production_total = Resources::new(400, 100, 100, 100);
    let imb = resource_imbalance(&s);
    assert!(imb.ratio > IMBALANCE_RATIO);
    assert!(imb.flagged);
  }

  #[test]
  fn zero_production_is_not_flagged() {
    let imb = resource_imbalance(&snapshot());
    assert!(!imb.flagged);
    assert_eq!(imb.ratio, 0.0);
  }

  #[test]
  fn population_sums_across_villages() {
    let mut s = snapshot();
    s.villages = vec![village(87), village(43)];
    assert_eq!(total_population(&s), 130);
  }

  #[test]
  fn threshold_lookup_and_ceiling() {
    let mechanics = vec![cp_mechanic(1, 200), cp_mechanic(2, 500)];
    assert_eq!(culture_threshold_for(1, &mechanics), 200);
    assert_eq!(culture_threshold_for(2, &mechanics), 500);
    assert_eq!(culture_threshold_for(11, &mechanics), CP_THRESHOLD_CEILING);
  }

  #[test]
  fn projection_monotonically_decreases_with_current_cp() {
    let mechanics = vec![cp_mechanic(1, 200)];
    let mut s = snapshot();
    s.villages = vec![village(100)];

    let mut last = f64::INFINITY;
    for current in [0, 50, 100, 150, 199, 200, 250] {
      s.culture_points = CulturePoints { current, per_day: Some(24.0) };
      let days = projected_settlement_days(&s, &mechanics, 24.0);
      assert!(days <= last, "projection rose at cp={current}");
      assert!(days >= 0.0);
      last = days;
    }
    // Threshold reached: clamped to zero, not negative.
    assert_eq!(last, 0.0);
  }

  #[test]
  fn projection_is_infinite_without_accrual() {
    let mechanics = vec![cp_mechanic(1, 200)];
    let mut s = snapshot();
    s.villages = vec![village(100)];
    assert_eq!(
      projected_settlement_days(&s, &mechanics, 0.0),
      f64::INFINITY
    );
  }

  fn cp_reference(level: u32, cp: i64) -> ReferenceRecord {
    ReferenceRecord {
      server_version: "T4".into(),
      server_speed: 2,
      entity_kind: EntityKind::Building,
      entity_key: "academy".into(),
      level,
      cost: Resources::default(),
      time_seconds: 0,
      population: None,
      culture_points: Some(cp),
    }
  }

  #[test]
  fn derived_cp_rate_accumulates_across_levels() {
    let mut v = village(100);
    v.buildings = vec![BuildingState {
      key:          "academy".into(),
      level:        3,
      is_upgrading: false,
    }];
    let mut s = snapshot();
    s.villages = vec![v];

    let refs = vec![
      cp_reference(1, 2),
      cp_reference(2, 3),
      cp_reference(3, 5),
      cp_reference(4, 8),
    ];
    // A level-3 building yields the CP of levels 1..=3 per day: 2 + 3 + 5.
    assert_eq!(culture_point_rate(&s, &refs), 10.0);
  }

  #[test]
  fn scraped_cp_rate_wins_over_derived() {
    let mut s = snapshot();
    s.culture_points = CulturePoints { current: 10, per_day: Some(31.5) };
    assert_eq!(culture_point_rate(&s, &[]), 31.5);
  }

  #[test]
  fn server_age_from_start_date() {
    let mut s = snapshot();
    s.server_started_at =
      Some(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap());
    assert_eq!(server_age_days(&s), Some(9.0));
    s.server_started_at = None;
    assert_eq!(server_age_days(&s), None);
  }
}
