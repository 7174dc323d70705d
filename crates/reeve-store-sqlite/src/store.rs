//! [`SqliteStore`] — the SQLite implementation of [`MechanicsStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use reeve_core::{
  recommendation::{NewRecommendation, Recommendation},
  reference::{MechanicRecord, ReferenceRecord},
  snapshot::{NewSnapshot, Snapshot},
  store::{MechanicsStore, ReferenceQuery},
};

use crate::{
  Error, Result,
  encode::{
    RawMechanic, RawRecommendation, RawReference, RawSnapshot, encode_dt,
    encode_uuid,
  },
  schema::SCHEMA,
};

const REFERENCE_COLUMNS: &str = "server_version, server_speed, entity_kind, \
   entity_key, level, wood_cost, clay_cost, iron_cost, crop_cost, \
   time_seconds, population, culture_points";

const UPSERT_REFERENCE_SQL: &str = "INSERT INTO reference_records (
     server_version, server_speed, entity_kind, entity_key, level,
     wood_cost, clay_cost, iron_cost, crop_cost,
     time_seconds, population, culture_points
   ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
   ON CONFLICT (server_version, server_speed, entity_kind, entity_key, level)
   DO UPDATE SET
     wood_cost      = excluded.wood_cost,
     clay_cost      = excluded.clay_cost,
     iron_cost      = excluded.iron_cost,
     crop_cost      = excluded.crop_cost,
     time_seconds   = excluded.time_seconds,
     population     = excluded.population,
     culture_points = excluded.culture_points";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A reeve mechanics store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Read the current state of a recommendation row.
  async fn get_recommendation(
    &self,
    id: Uuid,
  ) -> Result<Option<RawRecommendation>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT recommendation_id, created_at, priority, category,
                      action_key, reasoning, resolved_at
               FROM recommendations WHERE recommendation_id = ?1",
              rusqlite::params![id_str],
              read_recommendation_row,
            )
            .optional()?,
        )
      })
      .await?;
    Ok(raw)
  }
}

// ─── Row readers ─────────────────────────────────────────────────────────────

fn read_reference_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawReference> {
  Ok(RawReference {
    server_version: row.get(0)?,
    server_speed:   row.get(1)?,
    entity_kind:    row.get(2)?,
    entity_key:     row.get(3)?,
    level:          row.get(4)?,
    wood_cost:      row.get(5)?,
    clay_cost:      row.get(6)?,
    iron_cost:      row.get(7)?,
    crop_cost:      row.get(8)?,
    time_seconds:   row.get(9)?,
    population:     row.get(10)?,
    culture_points: row.get(11)?,
  })
}

fn read_snapshot_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSnapshot> {
  Ok(RawSnapshot {
    snapshot_id:       row.get(0)?,
    captured_at:       row.get(1)?,
    server_version:    row.get(2)?,
    server_speed:      row.get(3)?,
    server_started_at: row.get(4)?,
    villages_json:     row.get(5)?,
    resources_json:    row.get(6)?,
    production_json:   row.get(7)?,
    troops_total:      row.get(8)?,
    cp_current:        row.get(9)?,
    cp_per_day:        row.get(10)?,
    raw_json:          row.get(11)?,
  })
}

fn read_recommendation_row(
  row: &rusqlite::Row<'_>,
) -> rusqlite::Result<RawRecommendation> {
  Ok(RawRecommendation {
    recommendation_id: row.get(0)?,
    created_at:        row.get(1)?,
    priority:          row.get(2)?,
    category:          row.get(3)?,
    action_key:        row.get(4)?,
    reasoning:         row.get(5)?,
    resolved_at:       row.get(6)?,
  })
}

// ─── MechanicsStore impl ─────────────────────────────────────────────────────

impl MechanicsStore for SqliteStore {
  type Error = Error;

  // ── Reference data ────────────────────────────────────────────────────────

  async fn upsert_reference(&self, record: ReferenceRecord) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          UPSERT_REFERENCE_SQL,
          rusqlite::params![
            record.server_version,
            record.server_speed,
            record.entity_kind.discriminant(),
            record.entity_key,
            record.level,
            record.cost.wood,
            record.cost.clay,
            record.cost.iron,
            record.cost.crop,
            record.time_seconds,
            record.population,
            record.culture_points,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn upsert_reference_batch(
    &self,
    records: Vec<ReferenceRecord>,
  ) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(UPSERT_REFERENCE_SQL)?;
          for record in &records {
            stmt.execute(rusqlite::params![
              record.server_version,
              record.server_speed,
              record.entity_kind.discriminant(),
              record.entity_key,
              record.level,
              record.cost.wood,
              record.cost.clay,
              record.cost.iron,
              record.cost.crop,
              record.time_seconds,
              record.population,
              record.culture_points,
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn upsert_mechanic(&self, record: MechanicRecord) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO mechanic_records (
             server_version, server_speed, mechanic_type, mechanic_key,
             mechanic_value
           ) VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (server_version, server_speed, mechanic_type,
                        mechanic_key)
           DO UPDATE SET mechanic_value = excluded.mechanic_value",
          rusqlite::params![
            record.server_version,
            record.server_speed,
            record.mechanic_type,
            record.mechanic_key,
            record.mechanic_value,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_reference(
    &self,
    query: ReferenceQuery,
  ) -> Result<Vec<ReferenceRecord>> {
    let kind_str = query.entity_kind.discriminant();
    let raws: Vec<RawReference> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {REFERENCE_COLUMNS} FROM reference_records
           WHERE server_version = ?1
             AND server_speed   = ?2
             AND entity_kind    = ?3
             AND (?4 IS NULL OR entity_key = ?4)
             AND (?5 IS NULL OR level = ?5)
           ORDER BY entity_key, level"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              query.server_version,
              query.server_speed,
              kind_str,
              query.entity_key,
              query.level,
            ],
            read_reference_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReference::into_record).collect()
  }

  async fn query_mechanics(
    &self,
    server_version: String,
    server_speed: u32,
    mechanic_type: Option<String>,
  ) -> Result<Vec<MechanicRecord>> {
    let raws: Vec<RawMechanic> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT server_version, server_speed, mechanic_type, mechanic_key,
                  mechanic_value
           FROM mechanic_records
           WHERE server_version = ?1
             AND server_speed   = ?2
             AND (?3 IS NULL OR mechanic_type = ?3)
           ORDER BY mechanic_type, mechanic_key",
        )?;
        let rows = stmt
          .query_map(
            rusqlite::params![server_version, server_speed, mechanic_type],
            |row| {
              Ok(RawMechanic {
                server_version: row.get(0)?,
                server_speed:   row.get(1)?,
                mechanic_type:  row.get(2)?,
                mechanic_key:   row.get(3)?,
                mechanic_value: row.get(4)?,
              })
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawMechanic::into_record).collect())
  }

  // ── Snapshots — append-only writes ────────────────────────────────────────

  async fn insert_snapshot(&self, input: NewSnapshot) -> Result<Snapshot> {
    let snapshot = Snapshot {
      snapshot_id:       Uuid::new_v4(),
      captured_at:       Utc::now(),
      server_version:    input.server_version,
      server_speed:      input.server_speed,
      server_started_at: input.server_started_at,
      villages:          input.villages,
      resources_total:   input.resources_total,
      production_total:  input.production_total,
      troops_total:      input.troops_total,
      culture_points:    input.culture_points,
      raw:               input.raw,
    };

    let id_str          = encode_uuid(snapshot.snapshot_id);
    let at_str          = encode_dt(snapshot.captured_at);
    let version         = snapshot.server_version.clone();
    let speed           = snapshot.server_speed;
    let started_str     = snapshot.server_started_at.map(encode_dt);
    let villages_json   = serde_json::to_string(&snapshot.villages)?;
    let resources_json  = serde_json::to_string(&snapshot.resources_total)?;
    let production_json = serde_json::to_string(&snapshot.production_total)?;
    let troops_total    = snapshot.troops_total;
    let cp_current      = snapshot.culture_points.current;
    let cp_per_day      = snapshot.culture_points.per_day;
    let raw_json        = serde_json::to_string(&snapshot.raw)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO snapshots (
             snapshot_id, captured_at, server_version, server_speed,
             server_started_at, villages_json, resources_json,
             production_json, troops_total, cp_current, cp_per_day, raw_json
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
          rusqlite::params![
            id_str,
            at_str,
            version,
            speed,
            started_str,
            villages_json,
            resources_json,
            production_json,
            troops_total,
            cp_current,
            cp_per_day,
            raw_json,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(snapshot)
  }

  async fn latest_snapshot(&self) -> Result<Option<Snapshot>> {
    let raw: Option<RawSnapshot> = self
      .conn
      .call(|conn| {
        Ok(
          conn
            .query_row(
              "SELECT snapshot_id, captured_at, server_version, server_speed,
                      server_started_at, villages_json, resources_json,
                      production_json, troops_total, cp_current, cp_per_day,
                      raw_json
               FROM snapshots
               ORDER BY captured_at DESC
               LIMIT 1",
              [],
              read_snapshot_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSnapshot::into_snapshot).transpose()
  }

  // ── Recommendations ───────────────────────────────────────────────────────

  async fn insert_recommendations(
    &self,
    recs: Vec<NewRecommendation>,
  ) -> Result<Vec<Recommendation>> {
    let created_at = Utc::now();
    let out: Vec<Recommendation> = recs
      .into_iter()
      .map(|r| Recommendation {
        recommendation_id: Uuid::new_v4(),
        created_at,
        priority: r.priority,
        category: r.category,
        action_key: r.action_key,
        reasoning: r.reasoning,
        resolved_at: None,
      })
      .collect();

    let rows: Vec<(String, String, u8, &'static str, String, String)> = out
      .iter()
      .map(|r| {
        (
          encode_uuid(r.recommendation_id),
          encode_dt(r.created_at),
          r.priority,
          r.category.discriminant(),
          r.action_key.clone(),
          r.reasoning.clone(),
        )
      })
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO recommendations (
               recommendation_id, created_at, priority, category,
               action_key, reasoning
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          )?;
          for (id, at, priority, category, action, reasoning) in &rows {
            stmt.execute(rusqlite::params![
              id, at, priority, category, action, reasoning
            ])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(out)
  }

  async fn list_recommendations(
    &self,
    unresolved_only: bool,
  ) -> Result<Vec<Recommendation>> {
    let raws: Vec<RawRecommendation> = self
      .conn
      .call(move |conn| {
        let sql = if unresolved_only {
          "SELECT recommendation_id, created_at, priority, category,
                  action_key, reasoning, resolved_at
           FROM recommendations
           WHERE resolved_at IS NULL
           ORDER BY priority ASC, created_at ASC"
        } else {
          "SELECT recommendation_id, created_at, priority, category,
                  action_key, reasoning, resolved_at
           FROM recommendations
           ORDER BY priority ASC, created_at ASC"
        };
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
          .query_map([], read_recommendation_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawRecommendation::into_recommendation)
      .collect()
  }

  async fn resolve_recommendation(&self, id: Uuid) -> Result<Recommendation> {
    let existing = self
      .get_recommendation(id)
      .await?
      .ok_or(Error::RecommendationNotFound(id))?;
    if existing.resolved_at.is_some() {
      return Err(Error::AlreadyResolved(id));
    }

    let resolved_at = Utc::now();
    let id_str = encode_uuid(id);
    let at_str = encode_dt(resolved_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE recommendations SET resolved_at = ?2
           WHERE recommendation_id = ?1",
          rusqlite::params![id_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    let mut rec = existing.into_recommendation()?;
    rec.resolved_at = Some(resolved_at);
    Ok(rec)
  }
}
