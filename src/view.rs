//! Filtered, deterministically ordered view of the catalog.

use std::cmp::Ordering;
use std::collections::HashSet;

use bon::Builder;

use crate::catalog::{Catalog, Ship};
use crate::progress::{ProgressSnapshot, ShipProgress};
use crate::status::{Status, classify};
use crate::taxonomy::Taxonomy;

/// Every criterion must hold for a ship to be kept. Empty sets, empty search
/// text and `false` flags match everything.
#[derive(Builder, Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    #[builder(into, default)]
    pub search_text: String,
    /// Raw types; a ship matches on its own type or any stage override.
    #[builder(default)]
    pub selected_types: HashSet<String>,
    #[builder(default)]
    pub selected_statuses: HashSet<Status>,
    #[builder(default)]
    pub priority_only: bool,
    #[builder(default)]
    pub task_only: bool,
}

/// [`filter_and_sort_with`] using [`Taxonomy::builtin`].
pub fn filter_and_sort<'a>(
    catalog: &'a Catalog,
    progress: &ProgressSnapshot,
    criteria: &FilterCriteria,
) -> Vec<&'a Ship> {
    filter_and_sort_with(Taxonomy::builtin(), catalog, progress, criteria)
}

/// Ships matching `criteria`, ordered by taxonomy rank of their type, then
/// class (numbers compared by value), then name.
pub fn filter_and_sort_with<'a>(
    taxonomy: &Taxonomy,
    catalog: &'a Catalog,
    progress: &ProgressSnapshot,
    criteria: &FilterCriteria,
) -> Vec<&'a Ship> {
    let mut ships: Vec<&Ship> = filter(catalog, progress, criteria).collect();
    ships.sort_by(|a, b| compare_ships(taxonomy, a, b));
    ships
}

/// Ships matching `criteria`, in catalog order.
pub fn filter<'a>(
    catalog: &'a Catalog,
    progress: &ProgressSnapshot,
    criteria: &FilterCriteria,
) -> impl Iterator<Item = &'a Ship> {
    let query = criteria.search_text.to_lowercase();

    catalog
        .entries()
        .filter(move |(ship, romaji)| {
            let record = progress.get(ship.name());
            matches_criteria(ship, record, criteria) && matches_search(ship, romaji, &query)
        })
        .map(|(ship, _)| ship)
}

fn matches_criteria(ship: &Ship, record: &ShipProgress, criteria: &FilterCriteria) -> bool {
    let type_match = criteria.selected_types.is_empty()
        || ship
            .types()
            .any(|ship_type| criteria.selected_types.contains(ship_type));

    let status_match = criteria.selected_statuses.is_empty()
        || criteria.selected_statuses.contains(&classify(ship, record));

    let priority_match = !criteria.priority_only || record.priority();
    let task_match = !criteria.task_only || record.task();

    type_match && status_match && priority_match && task_match
}

/// Case-insensitive substring search over the ship's name, phonetic key and
/// its romaji, class, type, and every stage's name and type. `query` must
/// already be lowercase; an empty query matches.
pub fn matches_search(ship: &Ship, romaji: &str, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }

    let contains = |field: &str| field.to_lowercase().contains(query);

    contains(ship.name())
        || contains(ship.hiragana())
        || romaji.contains(query)
        || contains(ship.class())
        || contains(ship.ship_type())
        || ship.stages().iter().any(|stage| {
            contains(stage.name()) || stage.ship_type().is_some_and(|t| contains(t))
        })
}

pub fn compare_ships(taxonomy: &Taxonomy, a: &Ship, b: &Ship) -> Ordering {
    taxonomy
        .compare_types(a.ship_type(), b.ship_type())
        .then_with(|| natural_cmp(a.class(), b.class()))
        .then_with(|| a.name().cmp(b.name()))
}

#[derive(Debug, Clone, Copy)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

fn chunks(s: &str) -> impl Iterator<Item = Chunk<'_>> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = rest
            .char_indices()
            .find(|&(_, c)| c.is_ascii_digit() != digits)
            .map_or(rest.len(), |(idx, _)| idx);
        let (chunk, tail) = rest.split_at(end);
        rest = tail;
        Some(if digits {
            Chunk::Digits(chunk)
        } else {
            Chunk::Text(chunk)
        })
    })
}

fn compare_chunks(a: Chunk<'_>, b: Chunk<'_>) -> Ordering {
    match (a, b) {
        (Chunk::Digits(x), Chunk::Digits(y)) => {
            let x = x.trim_start_matches('0');
            let y = y.trim_start_matches('0');
            x.len().cmp(&y.len()).then_with(|| x.cmp(y))
        }
        (Chunk::Digits(_), Chunk::Text(_)) => Ordering::Less,
        (Chunk::Text(_), Chunk::Digits(_)) => Ordering::Greater,
        (Chunk::Text(x), Chunk::Text(y)) => x
            .chars()
            .flat_map(char::to_lowercase)
            .cmp(y.chars().flat_map(char::to_lowercase)),
    }
}

/// Numeric-aware comparison: runs of ASCII digits compare by value, so
/// "Type 3" sorts before "Type 12". Text runs compare case-insensitively.
/// Strings that only differ in case or leading zeros fall back to plain
/// ordering so the result is total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = chunks(a);
    let mut right = chunks(b);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match compare_chunks(x, y) {
                Ordering::Equal => continue,
                other => return other,
            },
        }
    }
}
