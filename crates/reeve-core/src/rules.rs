//! The recommendation rule engine.
//!
//! Each rule is a pure predicate over `(Snapshot, Metrics)` producing zero or
//! one recommendation. Rules run independently in declaration order; their
//! outputs are concatenated and stably sorted ascending by priority, so ties
//! keep declaration order. No rule mutates snapshot or reference state.

use crate::{
  metrics::Metrics,
  recommendation::{Category, NewRecommendation},
  snapshot::Snapshot,
};

/// Below this total resource stock the player's growth is resource-starved.
pub const RESOURCE_LOW_WATER: i64 = 500;

/// NPC trading is not worth the merchant fee below this stock level.
pub const NPC_TRADE_FLOOR: i64 = 1_000;

/// A second village this late means the opening was badly mismanaged.
pub const SETTLEMENT_URGENCY_DAYS: f64 = 7.0;

type Rule = fn(&Snapshot, &Metrics) -> Option<NewRecommendation>;

/// Declaration order is the tie-break order for equal priorities.
const RULES: &[Rule] = &[
  low_resources,
  settlement_overdue,
  empty_build_queue,
  npc_trade,
  boost_culture_points,
];

/// Run every rule against the snapshot and return the ranked results.
pub fn evaluate(snapshot: &Snapshot, metrics: &Metrics) -> Vec<NewRecommendation> {
  let mut out: Vec<NewRecommendation> =
    RULES.iter().filter_map(|rule| rule(snapshot, metrics)).collect();
  out.sort_by_key(|r| r.priority);
  out
}

// ─── Rules ───────────────────────────────────────────────────────────────────

fn low_resources(snapshot: &Snapshot, _m: &Metrics) -> Option<NewRecommendation> {
  let t = snapshot.resources_total;
  let total = t.wood + t.clay + t.iron + t.crop;
  if snapshot.villages.is_empty() || total >= RESOURCE_LOW_WATER {
    return None;
  }
  Some(NewRecommendation {
    priority: 1,
    category: Category::Resources,
    action_key: "resource_focus".into(),
    reasoning: format!(
      "Total stock is {total} resources; upgrade resource fields before \
       anything else"
    ),
  })
}

fn settlement_overdue(
  _s: &Snapshot,
  metrics: &Metrics,
) -> Option<NewRecommendation> {
  let age = metrics.server_age_days?;
  if metrics.village_count >= 2 || age <= SETTLEMENT_URGENCY_DAYS {
    return None;
  }
  Some(NewRecommendation {
    priority: 1,
    category: Category::Settlement,
    action_key: "settle_second_village".into(),
    reasoning: format!(
      "Server is {age:.1} days old and you still have one village; push \
       culture points and settlers now"
    ),
  })
}

fn empty_build_queue(
  snapshot: &Snapshot,
  _m: &Metrics,
) -> Option<NewRecommendation> {
  let idle = snapshot
    .villages
    .iter()
    .find(|v| !v.buildings.iter().any(|b| b.is_upgrading))?;
  Some(NewRecommendation {
    priority: 2,
    category: Category::Build,
    action_key: "queue_building".into(),
    reasoning: format!(
      "Build queue in {} is empty; an idle queue is wasted production",
      if idle.name.is_empty() { &idle.id } else { &idle.name }
    ),
  })
}

fn npc_trade(snapshot: &Snapshot, metrics: &Metrics) -> Option<NewRecommendation> {
  let t = snapshot.resources_total;
  let total = t.wood + t.clay + t.iron + t.crop;
  if !metrics.imbalance.flagged || total < NPC_TRADE_FLOOR {
    return None;
  }
  Some(NewRecommendation {
    priority: 2,
    category: Category::Trade,
    action_key: "npc_trade".into(),
    reasoning: format!(
      "Production is imbalanced ({:.0}% deviation from mean); an NPC trade \
       would rebalance growth",
      metrics.imbalance.ratio * 100.0
    ),
  })
}

fn boost_culture_points(
  _s: &Snapshot,
  metrics: &Metrics,
) -> Option<NewRecommendation> {
  if metrics.village_count >= 2
    || metrics.culture_points_per_day <= 0.0
    || !metrics.projected_settlement_days.is_finite()
    || metrics.projected_settlement_days <= 2.0
  {
    return None;
  }
  Some(NewRecommendation {
    priority: 3,
    category: Category::Settlement,
    action_key: "boost_culture_points".into(),
    reasoning: format!(
      "At {:.1} CP/day the next settlement is {:.1} days away; upgrade \
       Main Building, Marketplace and Embassy to shorten it",
      metrics.culture_points_per_day, metrics.projected_settlement_days
    ),
  })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
