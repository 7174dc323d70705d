//! Cost-table parsing.
//!
//! Building pages carry one table with a row per level (1..=20); the troop
//! page carries one table with a row per unit. Both are located by row count
//! rather than by id or class, since the site's markup carries neither.

use reeve_core::reference::CostVector;

use crate::{error::ExtractionError, html};

/// A level table must have at least this many data rows to qualify.
const MIN_LEVEL_ROWS: usize = 20;

/// One parsed row of a building's level table.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelRow {
  pub level:          u32,
  pub cost:           CostVector,
  pub time_seconds:   i64,
  pub population:     Option<i64>,
  pub culture_points: Option<i64>,
}

/// One parsed row of the troop table. Units have no level axis.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitRow {
  pub cost:         CostVector,
  pub time_seconds: i64,
}

/// Parse a building page into its per-level cost rows.
///
/// Rows whose first cell is not an integer in 1..=20 are ignored (headers,
/// footers); rows with fewer than four cost columns after the level are
/// malformed and skipped. The parse fails only when nothing survives.
pub fn parse_levels(page: &str) -> Result<Vec<LevelRow>, ExtractionError> {
  let table = level_table(page).ok_or(ExtractionError::NoTableFound)?;

  let mut rows = Vec::new();
  let mut first_bad = None;
  for (index, tr) in html::blocks(table, "tr").into_iter().enumerate() {
    let cells = cell_texts(tr);
    let Some(level) = cells.first().and_then(|c| cell_integer(c)) else {
      continue;
    };
    let Ok(level) = u32::try_from(level) else {
      continue;
    };
    if !(1..=20).contains(&level) {
      continue;
    }
    match level_row(level, &cells) {
      Some(row) => rows.push(row),
      None => {
        first_bad.get_or_insert(index);
      }
    }
  }

  if rows.is_empty() {
    return Err(match first_bad {
      Some(line) => ExtractionError::MalformedRow { line },
      None => ExtractionError::NoTableFound,
    });
  }
  Ok(rows)
}

/// Parse the troop page into per-unit cost rows.
///
/// A data row is any row with at least four plain-integer cells; the first
/// four are the training cost. A `H:MM:SS` cell, when present, is the
/// training time.
pub fn parse_units(page: &str) -> Result<Vec<UnitRow>, ExtractionError> {
  let table = html::blocks(page, "table")
    .into_iter()
    .max_by_key(|t| html::blocks(t, "tr").len())
    .ok_or(ExtractionError::NoTableFound)?;

  let mut rows = Vec::new();
  for tr in html::blocks(table, "tr") {
    let cells = cell_texts(tr);
    let numbers: Vec<i64> =
      cells.iter().filter_map(|c| cell_integer(c)).collect();
    if numbers.len() < 4 {
      continue;
    }
    let time_seconds =
      cells.iter().find_map(|c| cell_duration(c)).unwrap_or(0);
    rows.push(UnitRow {
      cost: CostVector::new(numbers[0], numbers[1], numbers[2], numbers[3]),
      time_seconds,
    });
  }

  if rows.is_empty() {
    return Err(ExtractionError::NoTableFound);
  }
  Ok(rows)
}

/// The largest table with enough rows to be a level table.
fn level_table(page: &str) -> Option<&str> {
  html::blocks(page, "table")
    .into_iter()
    .map(|t| (t, html::blocks(t, "tr").len()))
    .filter(|(_, n)| *n >= MIN_LEVEL_ROWS)
    .max_by_key(|(_, n)| *n)
    .map(|(t, _)| t)
}

/// Stripped text of every `<td>` in a row.
fn cell_texts(tr: &str) -> Vec<String> {
  html::blocks(tr, "td")
    .into_iter()
    .map(html::strip_tags)
    .collect()
}

/// Integer value of a cell, tolerating thousands separators and embedded
/// whitespace. Duration cells and cells without digits yield `None`.
fn cell_integer(cell: &str) -> Option<i64> {
  if cell.contains(':') {
    return None;
  }
  let digits: String = cell.chars().filter(char::is_ascii_digit).collect();
  if digits.is_empty() {
    return None;
  }
  digits.parse().ok()
}

/// Seconds represented by a `H:MM:SS` or `MM:SS` cell.
fn cell_duration(cell: &str) -> Option<i64> {
  let parts: Vec<&str> = cell.split(':').collect();
  if !(2..=3).contains(&parts.len()) {
    return None;
  }
  let mut seconds = 0i64;
  for part in &parts {
    seconds = seconds * 60 + part.trim().parse::<i64>().ok()?;
  }
  Some(seconds)
}

/// Build a [`LevelRow`] from stripped cells, or `None` when the four cost
/// columns are missing. Of the remaining integer cells the first is taken as
/// population upkeep and the second as culture-point yield; the site orders
/// them this way on every building page.
fn level_row(level: u32, cells: &[String]) -> Option<LevelRow> {
  if cells.len() < 5 {
    return None;
  }
  let wood = cell_integer(&cells[1])?;
  let clay = cell_integer(&cells[2])?;
  let iron = cell_integer(&cells[3])?;
  let crop = cell_integer(&cells[4])?;

  let time_seconds = cells[5..]
    .iter()
    .find_map(|c| cell_duration(c))
    .unwrap_or(0);
  let mut extras = cells[5..].iter().filter_map(|c| cell_integer(c));

  Some(LevelRow {
    level,
    cost: CostVector::new(wood, clay, iron, crop),
    time_seconds,
    population: extras.next(),
    culture_points: extras.next(),
  })
}
