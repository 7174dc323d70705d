//! Sequential extraction pipeline.
//!
//! One entity at a time, a fixed delay before every request, bounded retries
//! on fetch failure. A failed entity is recorded in the report and the run
//! continues; only store errors abort the whole run.

use std::time::Duration;

use reeve_core::{
  reference::{
    EntityKind, MECHANIC_CP_THRESHOLD, MECHANIC_SPEED_FACTOR, MechanicRecord,
    ReferenceRecord,
  },
  signature::{Classification, classify},
  store::MechanicsStore,
};

use crate::{
  checkpoint,
  error::{ExtractionError, FetchError},
  fetch::PageFetcher,
  table::{self, LevelRow},
};

/// Game ruleset version all extracted records are scoped to.
pub const SERVER_VERSION: &str = "T4";

const DEFAULT_DELAY: Duration = Duration::from_millis(500);
const DEFAULT_ATTEMPTS: u32 = 3;

// ─── Extraction targets ──────────────────────────────────────────────────────

/// One server-speed variant of the reference site.
#[derive(Debug, Clone, Copy)]
pub struct SpeedVariant {
  /// Speed multiplier, also the `server_speed` column value.
  pub speed: u32,
  /// Value of the site's `s` query parameter for this variant.
  pub code:  &'static str,
}

/// The speed variants worth extracting.
pub const SPEED_VARIANTS: &[SpeedVariant] = &[
  SpeedVariant { speed: 1, code: "0" },
  SpeedVariant { speed: 2, code: "1" },
  SpeedVariant { speed: 3, code: "2" },
];

/// Building pages by the site's numeric `b` parameter.
const BUILDING_PAGES: &[(u32, &str)] = &[
  // Resource fields and boosters
  (1, "woodcutter"),
  (2, "clay_pit"),
  (3, "iron_mine"),
  (4, "cropland"),
  (5, "sawmill"),
  (6, "brickyard"),
  (7, "iron_foundry"),
  (8, "grain_mill"),
  (9, "bakery"),
  // Infrastructure
  (10, "warehouse"),
  (11, "granary"),
  (13, "smithy"),
  (14, "tournament_square"),
  (15, "main_building"),
  (16, "rally_point"),
  (17, "marketplace"),
  (18, "embassy"),
  // Military
  (19, "barracks"),
  (20, "stable"),
  (21, "workshop"),
  (22, "academy"),
  // Village
  (23, "cranny"),
  (24, "town_hall"),
  (25, "residence"),
  (26, "palace"),
  (27, "treasury"),
  (28, "trade_office"),
  // Walls
  (31, "city_wall"),
  (32, "earth_wall"),
  (33, "palisade"),
  // Special
  (34, "stonemason"),
  (35, "brewery"),
  (36, "trapper"),
  (37, "hero_mansion"),
  (38, "great_warehouse"),
  (39, "great_granary"),
  (40, "wonder_of_world"),
  (41, "horse_drinking_trough"),
  (42, "water_ditch"),
  (43, "natarian_wall"),
  (44, "hidden_treasury"),
  (45, "great_workshop"),
];

/// Culture-point totals required for the next settlement, keyed by current
/// village count. Verified against the game's published T4 rules.
const CP_THRESHOLDS: &[(u32, i64)] = &[
  (1, 200),
  (2, 500),
  (3, 1000),
  (4, 2000),
  (5, 3500),
  (6, 6000),
  (7, 10_000),
  (8, 15_000),
  (9, 25_000),
];

// ─── Report ──────────────────────────────────────────────────────────────────

/// One entity whose extraction was given up on after retries.
#[derive(Debug)]
pub struct EntityFailure {
  pub speed:  u32,
  pub entity: String,
  pub error:  ExtractionError,
}

/// Outcome of a full pipeline run.
#[derive(Debug, Default)]
pub struct ExtractionReport {
  pub references_written: usize,
  pub mechanics_written:  usize,
  pub failures:           Vec<EntityFailure>,
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

pub struct Pipeline<F, S> {
  fetcher:  F,
  store:    S,
  base_url: String,
  delay:    Duration,
  attempts: u32,
}

impl<F: PageFetcher, S: MechanicsStore> Pipeline<F, S> {
  pub fn new(fetcher: F, store: S, base_url: impl Into<String>) -> Self {
    Self {
      fetcher,
      store,
      base_url: base_url.into(),
      delay: DEFAULT_DELAY,
      attempts: DEFAULT_ATTEMPTS,
    }
  }

  /// Override the inter-request delay (tests run with zero).
  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = delay;
    self
  }

  /// Extract every building and unit table for every speed variant, then
  /// seed the mechanic constants.
  pub async fn run(&self) -> Result<ExtractionReport, S::Error> {
    let mut report = ExtractionReport::default();

    for variant in SPEED_VARIANTS {
      tracing::info!(speed = variant.speed, "extracting speed variant");

      for (page_id, entity_key) in BUILDING_PAGES {
        match self.extract_building(variant, *page_id, entity_key).await {
          Ok(records) => {
            report.references_written += records.len();
            self.store.upsert_reference_batch(records).await?;
          }
          Err(error) => {
            tracing::warn!(
              speed = variant.speed,
              entity = entity_key,
              %error,
              "building extraction failed"
            );
            report.failures.push(EntityFailure {
              speed:  variant.speed,
              entity: (*entity_key).to_string(),
              error,
            });
          }
        }
      }

      match self.extract_units(variant).await {
        Ok(records) => {
          report.references_written += records.len();
          self.store.upsert_reference_batch(records).await?;
        }
        Err(error) => {
          tracing::warn!(
            speed = variant.speed,
            %error,
            "troop extraction failed"
          );
          report.failures.push(EntityFailure {
            speed:  variant.speed,
            entity: "troops".to_string(),
            error,
          });
        }
      }
    }

    self.seed_mechanics(&mut report).await?;
    Ok(report)
  }

  /// Fetch one building's level table and turn it into reference records.
  async fn extract_building(
    &self,
    variant: &SpeedVariant,
    page_id: u32,
    entity_key: &str,
  ) -> Result<Vec<ReferenceRecord>, ExtractionError> {
    let url = format!(
      "{}/build.php?s={}&b={}",
      self.base_url, variant.code, page_id
    );
    let page = self.fetch_with_retry(&url).await?;
    let rows = table::parse_levels(&page)?;

    // The page id map is authoritative for buildings; the cost signature is
    // a cross-check against id drift on the site.
    if let Some(first) = rows.iter().find(|r| r.level == 1)
      && let Classification::Known { key, .. } = classify(&first.cost)
      && key != entity_key
    {
      tracing::warn!(
        entity = entity_key,
        classified = key,
        "level-1 cost signature names a different entity"
      );
    }

    for row in &rows {
      if let Err(error) =
        checkpoint::validate(variant.speed, entity_key, row.level, &row.cost)
      {
        tracing::warn!(
          entity = entity_key,
          level = row.level,
          %error,
          "checkpoint validation failed"
        );
      }
    }

    Ok(
      rows
        .into_iter()
        .map(|row| building_record(variant, entity_key, row))
        .collect(),
    )
  }

  /// Fetch the troop table; units are identified by cost signature since the
  /// page carries no per-unit parameter.
  async fn extract_units(
    &self,
    variant: &SpeedVariant,
  ) -> Result<Vec<ReferenceRecord>, ExtractionError> {
    let url = format!("{}/troops.php?s={}", self.base_url, variant.code);
    let page = self.fetch_with_retry(&url).await?;
    let rows = table::parse_units(&page)?;

    Ok(
      rows
        .into_iter()
        .map(|row| ReferenceRecord {
          server_version: SERVER_VERSION.to_string(),
          server_speed:   variant.speed,
          entity_kind:    EntityKind::Unit,
          entity_key:     classify(&row.cost).entity_key(),
          level:          1,
          cost:           row.cost,
          time_seconds:   row.time_seconds,
          population:     None,
          culture_points: None,
        })
        .collect(),
    )
  }

  /// Write the non-tabular game constants.
  async fn seed_mechanics(
    &self,
    report: &mut ExtractionReport,
  ) -> Result<(), S::Error> {
    for variant in SPEED_VARIANTS {
      for (village_count, threshold) in CP_THRESHOLDS {
        self
          .store
          .upsert_mechanic(MechanicRecord {
            server_version: SERVER_VERSION.to_string(),
            server_speed:   variant.speed,
            mechanic_type:  MECHANIC_CP_THRESHOLD.to_string(),
            mechanic_key:   village_count.to_string(),
            mechanic_value: threshold.to_string(),
          })
          .await?;
        report.mechanics_written += 1;
      }
      self
        .store
        .upsert_mechanic(MechanicRecord {
          server_version: SERVER_VERSION.to_string(),
          server_speed:   variant.speed,
          mechanic_type:  MECHANIC_SPEED_FACTOR.to_string(),
          mechanic_key:   "base".to_string(),
          mechanic_value: variant.speed.to_string(),
        })
        .await?;
      report.mechanics_written += 1;
    }
    Ok(())
  }

  /// Fetch with the configured delay before every attempt.
  async fn fetch_with_retry(&self, url: &str) -> Result<String, FetchError> {
    let mut last = FetchError::Timeout;
    for attempt in 1..=self.attempts {
      tokio::time::sleep(self.delay).await;
      match self.fetcher.fetch(url).await {
        Ok(page) => return Ok(page),
        Err(error) => {
          tracing::debug!(url, attempt, %error, "fetch attempt failed");
          last = error;
        }
      }
    }
    Err(last)
  }
}

fn building_record(
  variant: &SpeedVariant,
  entity_key: &str,
  row: LevelRow,
) -> ReferenceRecord {
  ReferenceRecord {
    server_version: SERVER_VERSION.to_string(),
    server_speed:   variant.speed,
    entity_kind:    EntityKind::Building,
    entity_key:     entity_key.to_string(),
    level:          row.level,
    cost:           row.cost,
    time_seconds:   row.time_seconds,
    population:     row.population,
    culture_points: row.culture_points,
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use reeve_core::{
    reference::{CostVector, EntityKind, MECHANIC_CP_THRESHOLD},
    store::{MechanicsStore, ReferenceQuery},
  };
  use reeve_store_sqlite::SqliteStore;

  use super::*;
  use crate::{error::FetchError, fetch::PageFetcher};

  /// Serves canned pages; every other URL gets a 404.
  struct CannedFetcher {
    pages: HashMap<String, String>,
  }

  impl PageFetcher for CannedFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
      self
        .pages
        .get(url)
        .cloned()
        .ok_or(FetchError::Http(404))
    }
  }

  fn building_page() -> String {
    let costs = [
      (70, 40, 60, 20),
      (90, 50, 75, 25),
      (115, 65, 100, 35),
      (145, 85, 125, 40),
      (190, 105, 160, 55),
      (240, 135, 205, 70),
    ];
    let mut rows = String::new();
    for (i, (w, c, fe, f)) in costs.iter().enumerate() {
      rows.push_str(&format!(
        "<tr><td>{}</td><td>{w}</td><td>{c}</td><td>{fe}</td><td>{f}</td>\
         <td>2</td><td>2</td><td>0:20:00</td></tr>",
        i + 1
      ));
    }
    for level in 7..=20 {
      rows.push_str(&format!(
        "<tr><td>{level}</td><td>1000</td><td>1000</td><td>1000</td>\
         <td>1000</td><td>2</td><td>5</td><td>1:00:00</td></tr>"
      ));
    }
    format!("<table>{rows}</table>")
  }

  fn troop_page() -> String {
    "<table>\
     <tr><td>Legionnaire</td><td>120</td><td>100</td><td>150</td><td>30</td>\
     <td>1</td><td>0:26:40</td></tr>\
     <tr><td>Settler</td><td>5 800</td><td>5 300</td><td>7 200</td>\
     <td>5 500</td><td>1</td><td>7:28:20</td></tr>\
     </table>"
      .to_string()
  }

  async fn run_pipeline(
    pages: HashMap<String, String>,
  ) -> (ExtractionReport, SqliteStore) {
    let store = SqliteStore::open_in_memory().await.expect("store");
    let pipeline =
      Pipeline::new(CannedFetcher { pages }, store.clone(), "http://site")
        .with_delay(Duration::ZERO);
    let report = pipeline.run().await.expect("pipeline run");
    (report, store)
  }

  #[tokio::test]
  async fn partial_failure_is_isolated() {
    // Only main_building at speed 2 and the speed-2 troop page exist.
    let mut pages = HashMap::new();
    pages.insert("http://site/build.php?s=1&b=15".to_string(), building_page());
    pages.insert("http://site/troops.php?s=1".to_string(), troop_page());

    let (report, store) = run_pipeline(pages).await;

    // 20 building levels + 2 unit rows.
    assert_eq!(report.references_written, 22);
    // Every other page failed: all building pages but one, plus the troop
    // page at the two other speeds.
    assert_eq!(report.failures.len(), (BUILDING_PAGES.len() * 3 - 1) + 2);
    assert!(report.failures.iter().all(|f| matches!(
      f.error,
      ExtractionError::Fetch(FetchError::Http(404))
    )));

    let rows = store
      .query_reference(ReferenceQuery {
        server_version: SERVER_VERSION.to_string(),
        server_speed:   2,
        entity_kind:    EntityKind::Building,
        entity_key:     Some("main_building".to_string()),
        level:          None,
      })
      .await
      .expect("query");
    assert_eq!(rows.len(), 20);
    assert_eq!(rows[5].cost, CostVector::new(240, 135, 205, 70));
  }

  #[tokio::test]
  async fn units_are_classified_by_signature() {
    let mut pages = HashMap::new();
    pages.insert("http://site/troops.php?s=0".to_string(), troop_page());

    let (_, store) = run_pipeline(pages).await;

    let units = store
      .query_reference(ReferenceQuery {
        server_version: SERVER_VERSION.to_string(),
        server_speed:   1,
        entity_kind:    EntityKind::Unit,
        entity_key:     None,
        level:          None,
      })
      .await
      .expect("query");
    assert_eq!(units.len(), 2);
    assert!(units.iter().any(|u| u.entity_key == "legionnaire"));
    assert!(units.iter().any(|u| u.entity_key == "settler_roman"));
  }

  #[tokio::test]
  async fn mechanics_are_seeded_even_when_all_pages_fail() {
    let (report, store) = run_pipeline(HashMap::new()).await;

    assert_eq!(report.references_written, 0);
    assert_eq!(
      report.mechanics_written,
      (CP_THRESHOLDS.len() + 1) * SPEED_VARIANTS.len()
    );

    let thresholds = store
      .query_mechanics(
        SERVER_VERSION.to_string(),
        2,
        Some(MECHANIC_CP_THRESHOLD.to_string()),
      )
      .await
      .expect("query");
    assert_eq!(thresholds.len(), CP_THRESHOLDS.len());
    assert!(
      thresholds
        .iter()
        .any(|m| m.mechanic_key == "1" && m.mechanic_value == "200")
    );
  }
}
