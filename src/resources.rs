//! Remodel resource requirements.
//!
//! A stage's cost is what it takes to move past that stage, so "what is left"
//! for an acquired ship is the sum of every stage after the highest reached
//! one. An unacquired ship is charged every stage starting at stage 0.
//! Resource names are open-ended and unknown names simply become new keys.

use std::collections::BTreeMap;
use std::ops::Add;

use crate::catalog::{ResourceMap, Ship};
use crate::progress::{ProgressSnapshot, ShipProgress};
use crate::status::classify;

/// Remaining cost to finish `ship` from its current position.
pub fn needed_for(ship: &Ship, progress: &ShipProgress) -> ResourceMap {
    let start = if progress.acquired() {
        progress.current_stage().map_or(0, |current| current + 1)
    } else {
        0
    };

    let mut needed = ResourceMap::new();
    for stage in ship.stages().iter().skip(start) {
        add_costs(&mut needed, stage.resources());
    }
    needed
}

/// Cost of every stage regardless of progress.
pub fn total_for(ship: &Ship) -> ResourceMap {
    let mut total = ResourceMap::new();
    for stage in ship.stages() {
        add_costs(&mut total, stage.resources());
    }
    total
}

fn add_costs(acc: &mut ResourceMap, costs: &ResourceMap) {
    for (name, count) in costs {
        let entry = acc.entry(name.clone()).or_default();
        *entry = entry.saturating_add(*count);
    }
}

/// Needed and total quantity of one resource across the collection. Sums
/// saturate at `u64::MAX`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceTally {
    pub needed: u64,
    pub total: u64,
}

impl Add for ResourceTally {
    type Output = ResourceTally;

    fn add(self, rhs: Self) -> Self::Output {
        ResourceTally {
            needed: self.needed.saturating_add(rhs.needed),
            total: self.total.saturating_add(rhs.total),
        }
    }
}

/// Acquisition counts for a group of ships.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeProgress {
    pub acquired: usize,
    pub completed: usize,
    pub total: usize,
}

impl TypeProgress {
    pub fn acquired_ratio(&self) -> f64 {
        ratio(self.acquired, self.total)
    }

    pub fn completed_ratio(&self) -> f64 {
        ratio(self.completed, self.total)
    }
}

fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

impl Add for TypeProgress {
    type Output = TypeProgress;

    fn add(self, rhs: Self) -> Self::Output {
        TypeProgress {
            acquired: self.acquired.saturating_add(rhs.acquired),
            completed: self.completed.saturating_add(rhs.completed),
            total: self.total.saturating_add(rhs.total),
        }
    }
}

/// Collection-wide totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CollectionSummary {
    pub resources: BTreeMap<String, ResourceTally>,
    /// Keyed by each ship's own raw type; stage overrides are not counted.
    pub by_type: BTreeMap<String, TypeProgress>,
    pub overall: TypeProgress,
}

impl CollectionSummary {
    /// Key-wise sum of two summaries over disjoint sets of ships.
    pub fn merge(&self, other: &CollectionSummary) -> CollectionSummary {
        CollectionSummary {
            resources: merge_maps(&self.resources, &other.resources),
            by_type: merge_maps(&self.by_type, &other.by_type),
            overall: self.overall + other.overall,
        }
    }

    /// Resources that still have a non-zero need.
    pub fn outstanding(&self) -> impl Iterator<Item = (&str, &ResourceTally)> {
        self.resources
            .iter()
            .filter(|(_, tally)| tally.needed > 0)
            .map(|(name, tally)| (name.as_str(), tally))
    }

    pub fn needed(&self) -> ResourceMap {
        self.resources
            .iter()
            .map(|(name, tally)| (name.clone(), tally.needed))
            .collect()
    }

    pub fn total(&self) -> ResourceMap {
        self.resources
            .iter()
            .map(|(name, tally)| (name.clone(), tally.total))
            .collect()
    }
}

fn merge_maps<V>(a: &BTreeMap<String, V>, b: &BTreeMap<String, V>) -> BTreeMap<String, V>
where
    V: Add<Output = V> + Copy + Default,
{
    let mut merged = a.clone();
    for (key, value) in b {
        let entry = merged.entry(key.clone()).or_default();
        *entry = *entry + *value;
    }
    merged
}

/// Fold [`needed_for`] and [`total_for`] over `ships`, along with acquisition
/// counts per raw type. Ships without a record count as untouched.
pub fn aggregate<'a>(
    ships: impl IntoIterator<Item = &'a Ship>,
    progress: &ProgressSnapshot,
) -> CollectionSummary {
    let mut summary = CollectionSummary::default();

    for ship in ships {
        let record = progress.get(ship.name());

        let needed = needed_for(ship, record);
        for (name, count) in total_for(ship) {
            let tally = summary.resources.entry(name).or_default();
            tally.total = tally.total.saturating_add(count);
        }
        for (name, count) in needed {
            let tally = summary.resources.entry(name).or_default();
            tally.needed = tally.needed.saturating_add(count);
        }

        let counts = TypeProgress {
            acquired: usize::from(record.acquired()),
            completed: usize::from(classify(ship, record).is_complete()),
            total: 1,
        };
        let by_type = summary
            .by_type
            .entry(ship.ship_type().to_string())
            .or_default();
        *by_type = *by_type + counts;
        summary.overall = summary.overall + counts;
    }

    summary
}

/// Abbreviation used where space is tight, or the full name when there is
/// none.
pub fn short_name(resource: &str) -> &str {
    match resource {
        "改装設計図" => "図",
        "海外艦最新技術" => "海",
        "高速建造材" => "バ",
        "開発資材" => "釘",
        "新型砲熕兵装資材" => "砲",
        "戦闘詳報" => "報",
        "新型高温高圧缶" => "缶",
        "新型兵装資材" => "兵",
        "試製甲板カタパルト" => "甲",
        "新型航空兵装資材" => "航",
        other => other,
    }
}
