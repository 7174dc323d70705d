//! Snapshot ingestion — the boundary where loosely-typed scraper payloads
//! become normalised [`NewSnapshot`]s.
//!
//! The DOM-scraping collaborator produces arbitrary JSON: fields come and go
//! between extension versions, numbers arrive as floats or strings, and whole
//! sections are missing when the player never opened that game page. All of
//! that is tolerated here — missing fields default to zero/empty, unknown
//! fields are ignored — and validated nowhere else. Only an entirely absent
//! payload is rejected.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::snapshot::{
  BuildingState, CulturePoints, NewSnapshot, Resources, TroopCount,
  VillageState,
};

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum IngestError {
  /// The payload was `null` or absent. A failed ingest means no new snapshot
  /// and no new recommendations for that cycle; the caller must resubmit.
  #[error("empty game-state payload")]
  EmptyPayload,
}

// ─── Context ─────────────────────────────────────────────────────────────────

/// Explicit per-call context — which server the snapshot belongs to.
///
/// Passed in by the caller on every ingest; there is no process-wide
/// "current game" singleton.
#[derive(Debug, Clone)]
pub struct IngestContext {
  pub server_version: String,
  pub server_speed:   u32,
}

// ─── Wire-shape structs ──────────────────────────────────────────────────────
//
// Everything is optional and defaulted. serde ignores unknown fields by
// default, which is exactly the tolerance the scraping boundary needs.

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GameStatePayload {
  server_started_at: Option<chrono::DateTime<chrono::Utc>>,
  villages:          Vec<VillagePayload>,
  resources:         Option<ResourcesPayload>,
  production:        Option<ResourcesPayload>,
  culture_points:    Option<CulturePointsPayload>,
  troops:            Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct VillagePayload {
  id:          Option<Value>,
  name:        Option<String>,
  x:           Option<i32>,
  y:           Option<i32>,
  population:  Option<f64>,
  resources:   Option<ResourcesPayload>,
  production:  Option<ResourcesPayload>,
  buildings:   Vec<BuildingPayload>,
  troops:      Option<Value>,
  loyalty:     Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResourcesPayload {
  wood: Option<f64>,
  clay: Option<f64>,
  iron: Option<f64>,
  crop: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct BuildingPayload {
  key:          Option<String>,
  // Some extension versions report the key under `type`.
  #[serde(rename = "type")]
  kind:         Option<String>,
  level:        Option<f64>,
  is_upgrading: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CulturePointsPayload {
  current: Option<f64>,
  per_day: Option<f64>,
}

// ─── Normalisation ───────────────────────────────────────────────────────────

impl ResourcesPayload {
  fn into_resources(self) -> Resources {
    Resources {
      wood: self.wood.unwrap_or(0.0) as i64,
      clay: self.clay.unwrap_or(0.0) as i64,
      iron: self.iron.unwrap_or(0.0) as i64,
      crop: self.crop.unwrap_or(0.0) as i64,
    }
  }
}

/// Village ids arrive as numbers or strings depending on extension version.
fn id_string(v: Option<Value>) -> String {
  match v {
    Some(Value::String(s)) => s,
    Some(Value::Number(n)) => n.to_string(),
    _ => String::new(),
  }
}

/// Troop counts arrive either as `[{"key": "...", "count": n}, ...]` or as a
/// `{"legionnaire": n, ...}` map.
fn parse_troops(v: Option<&Value>) -> Vec<TroopCount> {
  match v {
    Some(Value::Array(items)) => items
      .iter()
      .filter_map(|item| {
        let key = item.get("key")?.as_str()?.to_string();
        let count = item.get("count").and_then(Value::as_i64).unwrap_or(0);
        Some(TroopCount { key, count })
      })
      .collect(),
    Some(Value::Object(map)) => map
      .iter()
      .filter_map(|(key, count)| {
        Some(TroopCount { key: key.clone(), count: count.as_i64()? })
      })
      .collect(),
    _ => Vec::new(),
  }
}

fn normalise_village(v: VillagePayload) -> VillageState {
  let coordinates = match (v.x, v.y) {
    (Some(x), Some(y)) => Some((x, y)),
    _ => None,
  };

  VillageState {
    id: id_string(v.id),
    name: v.name.unwrap_or_default(),
    coordinates,
    population: v.population.unwrap_or(0.0) as i64,
    resources: v.resources.unwrap_or_default().into_resources(),
    production: v.production.unwrap_or_default().into_resources(),
    buildings: v
      .buildings
      .into_iter()
      .filter_map(|b| {
        let key = b.key.or(b.kind)?;
        Some(BuildingState {
          key,
          level: b.level.unwrap_or(0.0) as u32,
          is_upgrading: b.is_upgrading.unwrap_or(false),
        })
      })
      .collect(),
    troops: parse_troops(v.troops.as_ref()),
    loyalty: v.loyalty.map(|l| l as i64),
  }
}

// ─── Entry point ─────────────────────────────────────────────────────────────

/// Normalise a raw game-state payload into a [`NewSnapshot`].
///
/// Fails only on a `null` payload. A payload that fails to match the expected
/// shape entirely still produces a snapshot with zeroed totals — the raw
/// JSON is retained either way, so nothing is silently lost.
pub fn build_snapshot(
  payload: &Value,
  ctx: &IngestContext,
) -> Result<NewSnapshot, IngestError> {
  if payload.is_null() {
    return Err(IngestError::EmptyPayload);
  }

  let parsed: GameStatePayload =
    serde_json::from_value(payload.clone()).unwrap_or_default();

  let villages: Vec<VillageState> =
    parsed.villages.into_iter().map(normalise_village).collect();

  // Totals: sum over villages; fall back to the top-level section when the
  // scraper reported aggregates without a village breakdown.
  let sum = |f: fn(&VillageState) -> Resources| Resources {
    wood: villages.iter().map(|v| f(v).wood).sum(),
    clay: villages.iter().map(|v| f(v).clay).sum(),
    iron: villages.iter().map(|v| f(v).iron).sum(),
    crop: villages.iter().map(|v| f(v).crop).sum(),
  };

  let resources_total = if villages.is_empty() {
    parsed.resources.unwrap_or_default().into_resources()
  } else {
    sum(|v| v.resources)
  };
  let production_total = if villages.is_empty() {
    parsed.production.unwrap_or_default().into_resources()
  } else {
    sum(|v| v.production)
  };

  let top_level_troops = parse_troops(parsed.troops.as_ref());
  let troops_total: i64 = villages
    .iter()
    .flat_map(|v| v.troops.iter().map(|t| t.count))
    .chain(top_level_troops.iter().map(|t| t.count))
    .sum();

  let cp = parsed.culture_points.unwrap_or_default();

  Ok(NewSnapshot {
    server_version: ctx.server_version.clone(),
    server_speed: ctx.server_speed,
    server_started_at: parsed.server_started_at,
    villages,
    resources_total,
    production_total,
    troops_total,
    culture_points: CulturePoints {
      current: cp.current.unwrap_or(0.0) as i64,
      per_day: cp.per_day,
    },
    raw: payload.clone(),
  })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn ctx() -> IngestContext {
    IngestContext { server_version: "T4".into(), server_speed: 2 }
  }

  #[test]
  fn null_payload_is_rejected() {
    let err = build_snapshot(&Value::Null, &ctx()).unwrap_err();
    assert!(matches!(err, IngestError::EmptyPayload));
  }

  #[test]
  fn empty_object_yields_zero_totals() {
    let snap = build_snapshot(&json!({}), &ctx()).unwrap();
    assert!(snap.villages.is_empty());
    assert_eq!(snap.resources_total, Resources::default());
    assert_eq!(snap.production_total, Resources::default());
    assert_eq!(snap.troops_total, 0);
    assert_eq!(snap.culture_points.current, 0);
  }

  #[test]
  fn unknown_fields_are_ignored() {
    let payload = json!({
      "hero": { "hp": 80, "adventures": { "available": 2 } },
      "someFutureField": [1, 2, 3],
      "villages": [{ "id": 1, "name": "Capital", "population": 87 }],
    });
    let snap = build_snapshot(&payload, &ctx()).unwrap();
    assert_eq!(snap.villages.len(), 1);
    assert_eq!(snap.villages[0].id, "1");
    assert_eq!(snap.villages[0].population, 87);
  }

  #[test]
  fn totals_sum_across_villages() {
    let payload = json!({
      "villages": [
        {
          "id": "v1",
          "resources":  { "wood": 100, "clay": 200, "iron": 300, "crop": 400 },
          "production": { "wood": 10, "clay": 20, "iron": 30, "crop": 40 },
          "troops": { "legionnaire": 12, "praetorian": 3 },
        },
        {
          "id": "v2",
          "resources":  { "wood": 1, "clay": 2, "iron": 3, "crop": 4 },
          "troops": [ { "key": "phalanx", "count": 50 } ],
        },
      ],
    });
    let snap = build_snapshot(&payload, &ctx()).unwrap();
    assert_eq!(snap.resources_total, Resources::new(101, 202, 303, 404));
    assert_eq!(snap.production_total, Resources::new(10, 20, 30, 40));
    assert_eq!(snap.troops_total, 65);
  }

  #[test]
  fn top_level_aggregates_used_without_villages() {
    let payload = json!({
      "resources":  { "wood": 500.7, "clay": 600, "iron": 700, "crop": 800 },
      "production": { "wood": 50, "clay": 60, "iron": 70, "crop": 80 },
      "culturePoints": { "current": 120, "perDay": 44.5 },
    });
    let snap = build_snapshot(&payload, &ctx()).unwrap();
    assert_eq!(snap.resources_total, Resources::new(500, 600, 700, 800));
    assert_eq!(snap.culture_points.current, 120);
    assert_eq!(snap.culture_points.per_day, Some(44.5));
  }

  #[test]
  fn building_key_falls_back_to_type_field() {
    let payload = json!({
      "villages": [{
        "id": 1,
        "buildings": [
          { "key": "main_building", "level": 6 },
          { "type": "granary", "level": 2, "isUpgrading": true },
          { "level": 9 },
        ],
      }],
    });
    let snap = build_snapshot(&payload, &ctx()).unwrap();
    let buildings = &snap.villages[0].buildings;
    assert_eq!(buildings.len(), 2);
    assert_eq!(buildings[0].key, "main_building");
    assert_eq!(buildings[1].key, "granary");
    assert!(buildings[1].is_upgrading);
  }

  #[test]
  fn shape_mismatch_degrades_to_defaults() {
    // `villages` is a string here — the whole parse falls back to defaults
    // rather than failing the ingest.
    let payload = json!({ "villages": "corrupted" });
    let snap = build_snapshot(&payload, &ctx()).unwrap();
    assert!(snap.villages.is_empty());
    assert_eq!(snap.raw, payload);
  }
}
