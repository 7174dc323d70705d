//! Integration tests for `SqliteStore` against an in-memory database.

use reeve_core::{
  recommendation::{Category, NewRecommendation},
  reference::{
    CostVector, EntityKind, MECHANIC_CP_THRESHOLD, MechanicRecord,
    ReferenceRecord,
  },
  snapshot::{CulturePoints, NewSnapshot, Resources},
  store::{MechanicsStore, ReferenceQuery},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn reference(entity_key: &str, level: u32, cost: CostVector) -> ReferenceRecord {
  ReferenceRecord {
    server_version: "T4".into(),
    server_speed: 2,
    entity_kind: EntityKind::Building,
    entity_key: entity_key.into(),
    level,
    cost,
    time_seconds: 1_200,
    population: Some(2),
    culture_points: Some(5),
  }
}

fn query(entity_key: Option<&str>, level: Option<u32>) -> ReferenceQuery {
  ReferenceQuery {
    server_version: "T4".into(),
    server_speed: 2,
    entity_kind: EntityKind::Building,
    entity_key: entity_key.map(str::to_string),
    level,
  }
}

fn snapshot_input() -> NewSnapshot {
  NewSnapshot {
    server_version: "T4".into(),
    server_speed: 2,
    server_started_at: None,
    villages: Vec::new(),
    resources_total: Resources::new(1, 2, 3, 4),
    production_total: Resources::new(10, 20, 30, 40),
    troops_total: 7,
    culture_points: CulturePoints { current: 42, per_day: Some(12.5) },
    raw: serde_json::json!({ "villages": [] }),
  }
}

// ─── Reference records ───────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_reference_is_idempotent() {
  let s = store().await;
  let first = reference("main_building", 6, CostVector::new(1, 1, 1, 1));
  let second = reference("main_building", 6, CostVector::new(240, 135, 205, 70));

  s.upsert_reference(first).await.unwrap();
  s.upsert_reference(second).await.unwrap();

  // Exactly one row per composite key; the second run's values win.
  let rows = s
    .query_reference(query(Some("main_building"), Some(6)))
    .await
    .unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].cost, CostVector::new(240, 135, 205, 70));
}

#[tokio::test]
async fn batch_upsert_and_level_filter() {
  let s = store().await;
  let rows: Vec<ReferenceRecord> = (1..=20)
    .map(|l| reference("granary", l, CostVector::new(l as i64, 0, 0, 0)))
    .collect();
  s.upsert_reference_batch(rows).await.unwrap();

  let all = s.query_reference(query(Some("granary"), None)).await.unwrap();
  assert_eq!(all.len(), 20);
  // Ordered by level.
  assert!(all.windows(2).all(|w| w[0].level < w[1].level));

  let one = s.query_reference(query(Some("granary"), Some(7))).await.unwrap();
  assert_eq!(one.len(), 1);
  assert_eq!(one[0].cost.wood, 7);
}

#[tokio::test]
async fn query_reference_scopes_by_variant() {
  let s = store().await;
  s.upsert_reference(reference("cranny", 1, CostVector::new(40, 50, 30, 10)))
    .await
    .unwrap();

  let mut other_speed = query(None, None);
  other_speed.server_speed = 3;
  assert!(s.query_reference(other_speed).await.unwrap().is_empty());

  let mut unit_kind = query(None, None);
  unit_kind.entity_kind = EntityKind::Unit;
  assert!(s.query_reference(unit_kind).await.unwrap().is_empty());
}

// ─── Mechanic records ────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_mechanic_overwrites_value() {
  let s = store().await;
  let mut m = MechanicRecord {
    server_version: "T4".into(),
    server_speed: 2,
    mechanic_type: MECHANIC_CP_THRESHOLD.into(),
    mechanic_key: "1".into(),
    mechanic_value: "999".into(),
  };
  s.upsert_mechanic(m.clone()).await.unwrap();
  m.mechanic_value = "200".into();
  s.upsert_mechanic(m).await.unwrap();

  let rows = s
    .query_mechanics("T4".into(), 2, Some(MECHANIC_CP_THRESHOLD.into()))
    .await
    .unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].mechanic_value, "200");
}

#[tokio::test]
async fn query_mechanics_type_filter() {
  let s = store().await;
  for (t, k, v) in [
    (MECHANIC_CP_THRESHOLD, "1", "200"),
    (MECHANIC_CP_THRESHOLD, "2", "500"),
    ("speed_factor", "build", "2"),
  ] {
    s.upsert_mechanic(MechanicRecord {
      server_version: "T4".into(),
      server_speed: 2,
      mechanic_type: t.into(),
      mechanic_key: k.into(),
      mechanic_value: v.into(),
    })
    .await
    .unwrap();
  }

  let all = s.query_mechanics("T4".into(), 2, None).await.unwrap();
  assert_eq!(all.len(), 3);

  let cp = s
    .query_mechanics("T4".into(), 2, Some(MECHANIC_CP_THRESHOLD.into()))
    .await
    .unwrap();
  assert_eq!(cp.len(), 2);
}

// ─── Snapshots ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn snapshot_round_trip() {
  let s = store().await;
  let stored = s.insert_snapshot(snapshot_input()).await.unwrap();

  let latest = s.latest_snapshot().await.unwrap().unwrap();
  assert_eq!(latest.snapshot_id, stored.snapshot_id);
  assert_eq!(latest.resources_total, Resources::new(1, 2, 3, 4));
  assert_eq!(latest.culture_points.current, 42);
  assert_eq!(latest.culture_points.per_day, Some(12.5));
  assert_eq!(latest.raw, serde_json::json!({ "villages": [] }));
}

#[tokio::test]
async fn latest_snapshot_none_when_empty() {
  let s = store().await;
  assert!(s.latest_snapshot().await.unwrap().is_none());
}

#[tokio::test]
async fn identical_ingests_create_distinct_rows() {
  let s = store().await;
  let a = s.insert_snapshot(snapshot_input()).await.unwrap();
  let b = s.insert_snapshot(snapshot_input()).await.unwrap();
  // No deduplication: every call creates a new snapshot.
  assert_ne!(a.snapshot_id, b.snapshot_id);
}

// ─── Recommendations ─────────────────────────────────────────────────────────

fn rec(priority: u8, action_key: &str) -> NewRecommendation {
  NewRecommendation {
    priority,
    category: Category::Resources,
    action_key: action_key.into(),
    reasoning: "test".into(),
  }
}

#[tokio::test]
async fn recommendations_list_ordered_by_priority() {
  let s = store().await;
  s.insert_recommendations(vec![rec(2, "queue_building"), rec(1, "resource_focus")])
    .await
    .unwrap();

  let listed = s.list_recommendations(false).await.unwrap();
  assert_eq!(listed.len(), 2);
  assert_eq!(listed[0].action_key, "resource_focus");
  assert_eq!(listed[1].action_key, "queue_building");
}

#[tokio::test]
async fn resolve_marks_and_filters() {
  let s = store().await;
  let inserted = s
    .insert_recommendations(vec![rec(1, "a"), rec(2, "b")])
    .await
    .unwrap();

  let resolved = s
    .resolve_recommendation(inserted[0].recommendation_id)
    .await
    .unwrap();
  assert!(resolved.resolved_at.is_some());

  let open = s.list_recommendations(true).await.unwrap();
  assert_eq!(open.len(), 1);
  assert_eq!(open[0].action_key, "b");

  // Resolved rows are retained for history.
  let all = s.list_recommendations(false).await.unwrap();
  assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn resolve_twice_is_a_conflict() {
  let s = store().await;
  let inserted = s.insert_recommendations(vec![rec(1, "a")]).await.unwrap();
  let id = inserted[0].recommendation_id;

  s.resolve_recommendation(id).await.unwrap();
  let err = s.resolve_recommendation(id).await.unwrap_err();
  assert!(matches!(err, Error::AlreadyResolved(_)));
}

#[tokio::test]
async fn resolve_unknown_is_not_found() {
  let s = store().await;
  let err = s.resolve_recommendation(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::RecommendationNotFound(_)));
}
