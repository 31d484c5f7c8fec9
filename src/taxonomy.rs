//! Two-level ship type taxonomy.
//!
//! Raw type labels from the catalog (e.g. "正規空母") belong to a major category
//! (e.g. `CV`) and carry a display alias. The table is configuration: the
//! built-in one is constructed once per process, and [`Taxonomy::new`] accepts
//! a custom one. Raw types missing from the table are not errors. They resolve
//! to [`Recognized::Unknown`], group under [`OTHERS_ID`] and sort after every
//! defined type.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use itertools::Itertools;
use tracing::debug;
use variantly::Variantly;

use crate::error::ErrorKind;
use crate::recognized::Recognized;

/// Id of the implicit category holding every raw type the table does not list.
pub const OTHERS_ID: &str = "OTH";
pub const OTHERS_LABEL: &str = "その他";

/// One raw type label and how it is displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubType {
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    raw: String,
    alias: String,
}

impl SubType {
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }
}

/// A major category and its sub-types in canonical order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Category {
    id: String,
    label: String,
    #[cfg_attr(feature = "serde", serde(rename = "subTypes"))]
    sub_types: Vec<SubType>,
}

impl Category {
    pub fn new<R, A>(
        id: impl Into<String>,
        label: impl Into<String>,
        sub_types: impl IntoIterator<Item = (R, A)>,
    ) -> Self
    where
        R: Into<String>,
        A: Into<String>,
    {
        Category {
            id: id.into(),
            label: label.into(),
            sub_types: sub_types
                .into_iter()
                .map(|(raw, alias)| SubType {
                    raw: raw.into(),
                    alias: alias.into(),
                })
                .collect(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn sub_types(&self) -> &[SubType] {
        &self.sub_types
    }
}

/// Where a defined raw type sits in the table.
#[derive(Debug, Clone, Copy)]
struct TypeSlot {
    category: usize,
    sub_type: usize,
    order: usize,
}

/// A raw type that the taxonomy defines.
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo<'a> {
    pub category: &'a Category,
    pub alias: &'a str,
    /// Position of the type in the flattened table.
    pub order: usize,
}

#[derive(Debug, Clone)]
pub struct Taxonomy {
    categories: Vec<Category>,
    index: HashMap<String, TypeSlot>,
}

static BUILTIN: LazyLock<Taxonomy> = LazyLock::new(|| {
    Taxonomy::new(builtin_categories())
        .unwrap_or_else(|err| panic!("built-in taxonomy is invalid: {err}"))
});

impl Default for Taxonomy {
    fn default() -> Self {
        Taxonomy::builtin().clone()
    }
}

impl Taxonomy {
    /// The table shipped with the crate.
    pub fn builtin() -> &'static Taxonomy {
        &BUILTIN
    }

    /// Build a taxonomy from categories in canonical order. A raw type may
    /// appear in only one category, and [`OTHERS_ID`] is reserved.
    pub fn new(categories: Vec<Category>) -> Result<Self, ErrorKind> {
        let mut index: HashMap<String, TypeSlot> = HashMap::new();
        let mut order = 0;

        for (category_idx, category) in categories.iter().enumerate() {
            if category.id == OTHERS_ID {
                return Err(ErrorKind::ReservedCategory {
                    id: category.id.clone(),
                });
            }

            for (sub_type_idx, sub_type) in category.sub_types.iter().enumerate() {
                let slot = TypeSlot {
                    category: category_idx,
                    sub_type: sub_type_idx,
                    order,
                };
                if let Some(existing) = index.insert(sub_type.raw.clone(), slot) {
                    return Err(ErrorKind::DuplicateSubType {
                        sub_type: sub_type.raw.clone(),
                        first: categories[existing.category].id.clone(),
                        second: category.id.clone(),
                    });
                }
                order += 1;
            }
        }

        debug!(
            "built taxonomy with {} categories and {} sub-types",
            categories.len(),
            index.len()
        );

        Ok(Taxonomy { categories, index })
    }

    /// Load a category list (`[{ "id", "label", "subTypes": [{ "type", "alias" }] }]`).
    #[cfg(feature = "json")]
    pub fn from_json(data: &str) -> crate::error::IResult<Taxonomy> {
        let categories: Vec<Category> = serde_json::from_str(data)?;
        Ok(Taxonomy::new(categories)?)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    /// Number of defined raw types.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn resolve<'r>(&self, raw: &'r str) -> Recognized<TypeInfo<'_>, &'r str> {
        match self.index.get(raw) {
            Some(slot) => {
                let category = &self.categories[slot.category];
                Recognized::Known(TypeInfo {
                    category,
                    alias: category.sub_types[slot.sub_type].alias.as_str(),
                    order: slot.order,
                })
            }
            None => Recognized::Unknown(raw),
        }
    }

    /// Category id of a raw type, or [`OTHERS_ID`].
    pub fn group_of(&self, raw: &str) -> &str {
        self.resolve(raw)
            .fold(|info| info.category.id.as_str(), |_| OTHERS_ID)
    }

    /// Canonical sort rank. Every undefined type shares the rank just past the
    /// last defined one; [`Taxonomy::compare_types`] orders those by name.
    pub fn order_index(&self, raw: &str) -> usize {
        self.resolve(raw).fold(|info| info.order, |_| self.len())
    }

    /// Display alias, falling back to the raw label.
    pub fn alias_of<'a>(&'a self, raw: &'a str) -> &'a str {
        self.resolve(raw).fold(|info| info.alias, |raw| raw)
    }

    pub fn compare_types(&self, a: &str, b: &str) -> Ordering {
        self.order_index(a)
            .cmp(&self.order_index(b))
            .then_with(|| {
                if self.resolve(a).is_unknown() {
                    a.cmp(b)
                } else {
                    Ordering::Equal
                }
            })
    }

    /// Grouping for a type picker: every defined category with all of its
    /// sub-types, then an [`OTHERS_ID`] group holding the undefined types
    /// among `raw_types`, sorted alphabetically. The others group is left out
    /// when it would be empty.
    pub fn group_types<'a>(&self, raw_types: impl IntoIterator<Item = &'a str>) -> Vec<TypeGroup> {
        let mut groups: Vec<TypeGroup> = self
            .categories
            .iter()
            .map(|category| TypeGroup {
                id: category.id.clone(),
                label: category.label.clone(),
                members: category
                    .sub_types
                    .iter()
                    .map(|sub_type| sub_type.raw.clone())
                    .collect(),
            })
            .collect();

        let others: Vec<String> = raw_types
            .into_iter()
            .filter(|raw| self.resolve(raw).is_unknown())
            .sorted()
            .dedup()
            .map(str::to_string)
            .collect();

        if !others.is_empty() {
            groups.push(TypeGroup {
                id: OTHERS_ID.to_string(),
                label: OTHERS_LABEL.to_string(),
                members: others,
            });
        }

        groups
    }
}

/// How much of a group is selected in a type filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Variantly)]
pub enum SelectionState {
    Full,
    Partial,
    Empty,
}

/// A category as presented to a type filter, with its current members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeGroup {
    id: String,
    label: String,
    members: Vec<String>,
}

impl TypeGroup {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// A group without members always reads as [`SelectionState::Empty`].
    pub fn selection(&self, selected: &HashSet<String>) -> SelectionState {
        let selected_count = self
            .members
            .iter()
            .filter(|member| selected.contains(*member))
            .count();

        if selected_count == 0 {
            SelectionState::Empty
        } else if selected_count == self.members.len() {
            SelectionState::Full
        } else {
            SelectionState::Partial
        }
    }

    /// Returns the new selection: a fully selected group is removed as a whole,
    /// anything else gets every member added.
    pub fn toggle(&self, selected: &HashSet<String>) -> HashSet<String> {
        let mut next = selected.clone();
        if self.selection(selected).is_full() {
            for member in &self.members {
                next.remove(member);
            }
        } else {
            next.extend(self.members.iter().cloned());
        }
        next
    }
}

fn builtin_categories() -> Vec<Category> {
    vec![
        Category::new(
            "BB",
            "戦艦級",
            [
                ("戦艦", "戦艦 (BB)"),
                ("高速戦艦", "高速戦艦 (FBB)"),
                ("巡洋戦艦", "巡洋戦艦 (BC)"),
                ("航空戦艦", "航空戦艦 (BBV)"),
                ("改装航空戦艦", "改装航空戦艦 (BBV)"),
            ],
        ),
        Category::new(
            "CV",
            "航空母艦級",
            [
                ("正規空母", "正規空母 (CV)"),
                ("装甲空母", "装甲空母 (CVB)"),
                ("夜間作戦航空母艦", "夜間作戦空母 (CV)"),
                ("近代化航空母艦", "近代化空母 (CV)"),
                ("航空母艦", "航空母艦 (CV)"),
                ("軽空母", "軽空母 (CVL)"),
                ("特設護衛空母", "護衛空母 (CVE)"),
                ("戦力投射母艦", "戦力投射母艦 (CVL)"),
            ],
        ),
        Category::new(
            "CA",
            "重巡級",
            [
                ("重巡洋艦", "重巡洋艦 (CA)"),
                ("航空巡洋艦", "航空巡洋艦 (CAV)"),
                ("改装航空巡洋艦", "改装航巡 (CAV)"),
                ("特殊改装航空巡洋艦", "特殊改装航巡 (CAV)"),
            ],
        ),
        Category::new(
            "CL",
            "軽巡級",
            [
                ("軽巡洋艦", "軽巡洋艦 (CL)"),
                ("重雷装巡洋艦", "雷巡 (CLT)"),
                ("練習巡洋艦", "練巡 (CT)"),
                ("兵装実験軽巡", "兵装実験軽巡 (CL)"),
                ("重改装軽巡洋艦", "重改装軽巡 (CL)"),
                ("軽(航空)巡洋艦", "軽空巡 (CLV)"),
            ],
        ),
        Category::new("DD", "駆逐艦", [("駆逐艦", "駆逐艦 (DD)")]),
        Category::new(
            "DE",
            "海防艦",
            [("海防艦", "海防艦 (DE)"), ("海防戦艦", "海防戦艦")],
        ),
        Category::new(
            "SS",
            "潜水艦",
            [("潜水艦", "潜水艦 (SS)"), ("潜水空母", "潜水空母 (SSV)")],
        ),
        Category::new(
            "AUX",
            "補助艦艇",
            [
                ("水上機母艦", "水母 (AV)"),
                ("特設戦闘水上機母艦", "特設水母 (AV)"),
                ("潜水母艦", "潜水母艦 (AS)"),
                ("工作艦", "工作艦 (AR)"),
                ("補給艦", "補給艦 (AO)"),
                ("給糧艦", "給糧艦"),
                ("揚陸艦", "揚陸艦 (LHA)"),
                ("戦車揚陸艦", "戦車揚陸艦 (LST)"),
                ("特務艦", "特務艦"),
                ("練習特務艦", "練習特務艦"),
                ("灯台補給船", "灯台補給船"),
                ("砕氷艦", "砕氷艦"),
                ("南極観測船", "南極観測船"),
                ("雑役船", "雑役船"),
            ],
        ),
    ]
}

#[cfg(test)]
mod test {
    use super::*;

    fn selected(types: &[&str]) -> HashSet<String> {
        types.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn builtin_lookups() {
        let taxonomy = Taxonomy::builtin();
        assert_eq!(taxonomy.group_of("駆逐艦"), "DD");
        assert_eq!(taxonomy.group_of("軽空母"), "CV");
        assert_eq!(taxonomy.alias_of("重雷装巡洋艦"), "雷巡 (CLT)");
        assert_eq!(taxonomy.order_index("戦艦"), 0);
        assert_eq!(taxonomy.order_index("高速戦艦"), 1);
        assert!(taxonomy.order_index("正規空母") < taxonomy.order_index("駆逐艦"));
    }

    #[test]
    fn undefined_types_fall_back() {
        let taxonomy = Taxonomy::builtin();
        assert_eq!(taxonomy.group_of("宇宙戦艦"), OTHERS_ID);
        assert_eq!(taxonomy.alias_of("宇宙戦艦"), "宇宙戦艦");
        assert_eq!(taxonomy.order_index("宇宙戦艦"), taxonomy.len());
        assert_eq!(taxonomy.resolve("宇宙戦艦").unknown(), Some(&"宇宙戦艦"));
    }

    #[test]
    fn compare_types_puts_undefined_last_alphabetically() {
        let taxonomy = Taxonomy::builtin();
        assert_eq!(taxonomy.compare_types("戦艦", "駆逐艦"), Ordering::Less);
        assert_eq!(taxonomy.compare_types("Zeta", "駆逐艦"), Ordering::Greater);
        assert_eq!(taxonomy.compare_types("Alpha", "Beta"), Ordering::Less);
        assert_eq!(taxonomy.compare_types("駆逐艦", "駆逐艦"), Ordering::Equal);
    }

    #[test]
    fn rejects_duplicate_sub_types() {
        let err = Taxonomy::new(vec![
            Category::new("A", "A", [("x", "X")]),
            Category::new("B", "B", [("x", "X again")]),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ErrorKind::DuplicateSubType { ref first, ref second, .. } if first == "A" && second == "B"
        ));
    }

    #[test]
    fn rejects_reserved_id() {
        let err = Taxonomy::new(vec![Category::new(OTHERS_ID, "Mine", [("x", "X")])]).unwrap_err();
        assert!(matches!(err, ErrorKind::ReservedCategory { .. }));
    }

    #[test]
    fn custom_taxonomy_orders_by_table() {
        let taxonomy = Taxonomy::new(vec![
            Category::new("SMALL", "Small", [("Corvette", "CV"), ("Frigate", "FF")]),
            Category::new("BIG", "Big", [("Carrier", "CV")]),
        ])
        .unwrap();
        assert_eq!(taxonomy.order_index("Frigate"), 1);
        assert_eq!(taxonomy.order_index("Carrier"), 2);
        assert_eq!(taxonomy.order_index("Battleship"), 3);
        assert!(taxonomy.resolve("Corvette").is_known());
        assert_eq!(
            taxonomy.resolve("Carrier").map(|info| info.category.id()).into_known(),
            Some("BIG")
        );
    }

    #[test]
    fn groups_end_with_sorted_others() {
        let taxonomy = Taxonomy::builtin();
        let groups = taxonomy.group_types(["駆逐艦", "Zeta", "Alpha", "Zeta"]);
        assert_eq!(groups.len(), taxonomy.categories().len() + 1);

        let others = groups.last().unwrap();
        assert_eq!(others.id(), OTHERS_ID);
        assert_eq!(others.members(), ["Alpha".to_string(), "Zeta".to_string()]);

        let without_unknowns = taxonomy.group_types(["駆逐艦"]);
        assert_eq!(without_unknowns.len(), taxonomy.categories().len());
    }

    #[test]
    fn tri_state_selection() {
        let taxonomy = Taxonomy::builtin();
        let groups = taxonomy.group_types(std::iter::empty());
        let submarines = groups.iter().find(|group| group.id() == "SS").unwrap();

        assert_eq!(submarines.selection(&selected(&[])), SelectionState::Empty);
        assert_eq!(
            submarines.selection(&selected(&["潜水艦", "駆逐艦"])),
            SelectionState::Partial
        );
        assert_eq!(
            submarines.selection(&selected(&["潜水艦", "潜水空母"])),
            SelectionState::Full
        );
    }

    #[test]
    fn toggle_selects_or_clears_whole_group() {
        let taxonomy = Taxonomy::builtin();
        let groups = taxonomy.group_types(std::iter::empty());
        let submarines = groups.iter().find(|group| group.id() == "SS").unwrap();

        let partial = selected(&["潜水艦", "駆逐艦"]);
        let full = submarines.toggle(&partial);
        assert_eq!(full, selected(&["潜水艦", "潜水空母", "駆逐艦"]));

        let cleared = submarines.toggle(&full);
        assert_eq!(cleared, selected(&["駆逐艦"]));
        // input selection is untouched
        assert_eq!(partial.len(), 2);
    }

    #[test]
    fn empty_group_reads_as_empty() {
        let group = TypeGroup {
            id: "X".to_string(),
            label: "X".to_string(),
            members: vec![],
        };
        assert_eq!(group.selection(&selected(&["a"])), SelectionState::Empty);
    }

    #[cfg(feature = "json")]
    #[test]
    fn categories_load_from_json() {
        let data = r#"[
            { "id": "DD", "label": "Destroyers", "subTypes": [{ "type": "駆逐艦", "alias": "DD" }] }
        ]"#;
        let taxonomy = Taxonomy::from_json(data).unwrap();
        assert_eq!(taxonomy.alias_of("駆逐艦"), "DD");

        let reserved = r#"[{ "id": "OTH", "label": "x", "subTypes": [] }]"#;
        let err = Taxonomy::from_json(reserved).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ReservedCategory { .. }));
    }
}
