//! Static catalog shape: ships and their remodel stages.
//!
//! The catalog is read-only input supplied by a loader. [`Catalog::new`] is the
//! validation boundary: every ship must carry at least one stage and names must
//! be unique, since the last stage index and the total cost of a ship are
//! undefined otherwise.

use std::collections::{BTreeMap, HashMap};

use bon::Builder;
use itertools::Itertools;
use tracing::debug;

use crate::error::ErrorKind;
use crate::romaji::to_romaji;

/// Resource name -> quantity.
pub type ResourceMap = BTreeMap<String, u64>;

/// One step of a ship's remodel path.
///
/// `resources` is the cost of moving from this stage to the next one, so the
/// final stage normally carries an empty map.
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stage {
    #[cfg_attr(feature = "serde", serde(default))]
    #[builder(default)]
    level: i64,
    #[builder(into)]
    name: String,
    /// Present when the ship changes type at this stage.
    #[cfg_attr(
        feature = "serde",
        serde(rename = "type", default, skip_serializing_if = "Option::is_none")
    )]
    #[builder(into)]
    ship_type: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    #[builder(into)]
    class: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "deserialize_resources")
    )]
    #[builder(default)]
    resources: ResourceMap,
}

impl Stage {
    pub fn level(&self) -> i64 {
        self.level
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ship_type(&self) -> Option<&str> {
        self.ship_type.as_deref()
    }

    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    pub fn resources(&self) -> &ResourceMap {
        &self.resources
    }
}

/// Catalog data in the wild writes "no cost" as `{}`, `[]`, `null` or omits the
/// key entirely. Anything other than an object or an empty list is rejected.
#[cfg(feature = "serde")]
fn deserialize_resources<'de, D>(deserializer: D) -> Result<ResourceMap, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{Error, IgnoredAny};

    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum RawResources {
        Map(ResourceMap),
        List(Vec<IgnoredAny>),
    }

    match <Option<RawResources> as serde::Deserialize>::deserialize(deserializer)? {
        Some(RawResources::Map(map)) => Ok(map),
        Some(RawResources::List(list)) if list.is_empty() => Ok(ResourceMap::new()),
        Some(RawResources::List(_)) => Err(D::Error::custom(
            "stage resources must be an object of name -> quantity",
        )),
        None => Ok(ResourceMap::new()),
    }
}

/// A collectible ship.
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ship {
    #[builder(into)]
    name: String,
    /// Phonetic reading, used for search.
    #[cfg_attr(feature = "serde", serde(default))]
    #[builder(into, default)]
    hiragana: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    #[builder(into)]
    ship_type: String,
    #[cfg_attr(feature = "serde", serde(default))]
    #[builder(into, default)]
    class: String,
    #[cfg_attr(feature = "serde", serde(rename = "wikiUrl", default))]
    #[builder(into, default)]
    wiki_url: String,
    #[cfg_attr(feature = "serde", serde(rename = "imageUrl", default))]
    #[builder(into, default)]
    image_url: String,
    stages: Vec<Stage>,
}

impl Ship {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hiragana(&self) -> &str {
        &self.hiragana
    }

    pub fn ship_type(&self) -> &str {
        &self.ship_type
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn wiki_url(&self) -> &str {
        &self.wiki_url
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    /// Index of the final remodel. `None` only for a ship that failed
    /// validation.
    pub fn last_stage_index(&self) -> Option<usize> {
        self.stages.len().checked_sub(1)
    }

    /// The ship's own type followed by every stage override, in stage order.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.ship_type.as_str())
            .chain(self.stages.iter().filter_map(|stage| stage.ship_type()))
    }

    /// Type in effect once `index` is reached: the last override at or before
    /// that stage, else the ship's own type.
    pub fn type_at(&self, index: usize) -> &str {
        self.stages
            .iter()
            .take(index.saturating_add(1))
            .filter_map(|stage| stage.ship_type())
            .last()
            .unwrap_or(self.ship_type.as_str())
    }

    /// Base class followed by each class change along the remodel path
    /// (consecutive repeats collapsed).
    pub fn class_progression(&self) -> Vec<&str> {
        std::iter::once(self.class.as_str())
            .chain(self.stages.iter().filter_map(|stage| stage.class()))
            .dedup()
            .collect()
    }

    pub fn validate(&self) -> Result<(), ErrorKind> {
        if self.name.trim().is_empty() {
            return Err(ErrorKind::MalformedShip {
                name: self.name.clone(),
                reason: "name is empty".to_string(),
            });
        }

        if self.stages.is_empty() {
            return Err(ErrorKind::MalformedShip {
                name: self.name.clone(),
                reason: "ship has no stages".to_string(),
            });
        }

        Ok(())
    }
}

/// Validated, name-unique collection of ships in source order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    ships: Vec<Ship>,
    /// Romaji of each ship's phonetic key, parallel to `ships`.
    romaji: Vec<String>,
    by_name: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(ships: Vec<Ship>) -> Result<Self, ErrorKind> {
        let mut by_name = HashMap::with_capacity(ships.len());
        for (idx, ship) in ships.iter().enumerate() {
            ship.validate()?;
            if by_name.insert(ship.name.clone(), idx).is_some() {
                return Err(ErrorKind::DuplicateShip {
                    name: ship.name.clone(),
                });
            }
        }

        let romaji = ships.iter().map(|ship| to_romaji(&ship.hiragana)).collect();

        debug!("loaded catalog with {} ships", ships.len());

        Ok(Catalog {
            ships,
            romaji,
            by_name,
        })
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    pub fn len(&self) -> usize {
        self.ships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ships.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Ship> {
        self.by_name.get(name).map(|&idx| &self.ships[idx])
    }

    pub fn require(&self, name: &str) -> Result<&Ship, ErrorKind> {
        self.get(name).ok_or_else(|| ErrorKind::UnknownShip {
            name: name.to_string(),
        })
    }

    /// Each ship paired with the romaji form of its phonetic key.
    pub fn entries(&self) -> impl Iterator<Item = (&Ship, &str)> {
        self.ships
            .iter()
            .zip(self.romaji.iter().map(String::as_str))
    }

    /// Every raw type used anywhere in the catalog, including stage
    /// overrides, sorted and de-duplicated.
    pub fn all_types(&self) -> Vec<&str> {
        self.ships
            .iter()
            .flat_map(Ship::types)
            .sorted()
            .dedup()
            .collect()
    }

    pub fn with_ship_added(&self, ship: Ship) -> Result<Catalog, ErrorKind> {
        let mut ships = self.ships.clone();
        ships.push(ship);
        Catalog::new(ships)
    }

    /// Replace the ship named `target`. The replacement may carry a new name;
    /// pair this with [`crate::progress::ProgressSnapshot::renamed`] so the
    /// user's record follows it.
    pub fn with_ship_replaced(&self, target: &str, ship: Ship) -> Result<Catalog, ErrorKind> {
        let idx = *self
            .by_name
            .get(target)
            .ok_or_else(|| ErrorKind::UnknownShip {
                name: target.to_string(),
            })?;

        let mut ships = self.ships.clone();
        ships[idx] = ship;
        Catalog::new(ships)
    }

    pub fn without_ship(&self, name: &str) -> Result<Catalog, ErrorKind> {
        self.require(name)?;
        let ships = self
            .ships
            .iter()
            .filter(|ship| ship.name != name)
            .cloned()
            .collect();
        Catalog::new(ships)
    }

    pub fn into_ships(self) -> Vec<Ship> {
        self.ships
    }

    #[cfg(feature = "json")]
    pub fn from_json(data: &str) -> crate::error::IResult<Catalog> {
        let ships: Vec<Ship> = serde_json::from_str(data)?;
        Ok(Catalog::new(ships)?)
    }

    #[cfg(feature = "json")]
    pub fn to_json(&self) -> crate::error::IResult<String> {
        Ok(serde_json::to_string_pretty(&self.ships)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn res(pairs: &[(&str, u64)]) -> ResourceMap {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn akatsuki() -> Ship {
        Ship::builder()
            .name("Akatsuki")
            .hiragana("あかつき")
            .ship_type("駆逐艦")
            .class("Akatsuki-class 1")
            .stages(vec![
                Stage::builder()
                    .level(1)
                    .name("Base")
                    .resources(res(&[("Fuel", 50)]))
                    .build(),
                Stage::builder().level(2).name("Kai").build(),
            ])
            .build()
    }

    fn chitose() -> Ship {
        Ship::builder()
            .name("Chitose")
            .ship_type("水上機母艦")
            .class("Chitose-class 1")
            .stages(vec![
                Stage::builder().level(1).name("Chitose").build(),
                Stage::builder()
                    .level(12)
                    .name("Chitose A")
                    .ship_type("水上機母艦")
                    .build(),
                Stage::builder()
                    .level(50)
                    .name("Chitose Carrier")
                    .ship_type("軽空母")
                    .class("Chitose-class CVL")
                    .build(),
                Stage::builder()
                    .level(55)
                    .name("Chitose Carrier Kai")
                    .class("Chitose-class CVL")
                    .build(),
            ])
            .build()
    }

    #[test]
    fn rejects_ship_without_stages() {
        let ship = Ship::builder()
            .name("Ghost")
            .ship_type("駆逐艦")
            .stages(vec![])
            .build();
        let err = Catalog::new(vec![ship]).unwrap_err();
        assert!(matches!(err, ErrorKind::MalformedShip { ref name, .. } if name == "Ghost"));
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = Catalog::new(vec![akatsuki(), akatsuki()]).unwrap_err();
        assert!(matches!(err, ErrorKind::DuplicateShip { ref name } if name == "Akatsuki"));
    }

    #[test]
    fn all_types_includes_stage_overrides() {
        let catalog = Catalog::new(vec![akatsuki(), chitose()]).unwrap();
        assert_eq!(catalog.all_types(), vec!["水上機母艦", "軽空母", "駆逐艦"]);
    }

    #[test]
    fn type_at_follows_overrides() {
        let ship = chitose();
        assert_eq!(ship.type_at(0), "水上機母艦");
        assert_eq!(ship.type_at(2), "軽空母");
        assert_eq!(ship.type_at(3), "軽空母");
        assert_eq!(akatsuki().type_at(1), "駆逐艦");
    }

    #[test]
    fn class_progression_collapses_repeats() {
        assert_eq!(
            chitose().class_progression(),
            vec!["Chitose-class 1", "Chitose-class CVL"]
        );
        assert_eq!(akatsuki().class_progression(), vec!["Akatsuki-class 1"]);
    }

    #[test]
    fn editing_returns_new_catalogs() {
        let catalog = Catalog::new(vec![akatsuki()]).unwrap();

        let added = catalog.with_ship_added(chitose()).unwrap();
        assert_eq!(added.len(), 2);
        assert_eq!(catalog.len(), 1);
        assert!(catalog.with_ship_added(akatsuki()).is_err());

        let renamed = Ship::builder()
            .name("Akatsuki Kai Ni")
            .ship_type("駆逐艦")
            .stages(akatsuki().stages().to_vec())
            .build();
        let replaced = added.with_ship_replaced("Akatsuki", renamed).unwrap();
        assert!(replaced.get("Akatsuki").is_none());
        assert_eq!(replaced.ships()[0].name(), "Akatsuki Kai Ni");

        let removed = replaced.without_ship("Chitose").unwrap();
        assert_eq!(removed.len(), 1);
        assert!(matches!(
            removed.without_ship("Chitose"),
            Err(ErrorKind::UnknownShip { .. })
        ));
    }

    #[test]
    fn entries_carry_romaji() {
        let catalog = Catalog::new(vec![akatsuki()]).unwrap();
        let (_, romaji) = catalog.entries().next().unwrap();
        assert_eq!(romaji, "akatsuki");
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_accepts_list_and_missing_resources() {
        let data = r#"[
            {
                "name": "Akatsuki",
                "hiragana": "あかつき",
                "type": "駆逐艦",
                "class": "Akatsuki-class 1",
                "wikiUrl": "https://example.invalid/akatsuki",
                "imageUrl": "https://example.invalid/akatsuki.png",
                "stages": [
                    { "level": 1, "name": "Base", "resources": { "Fuel": 50 } },
                    { "level": 2, "name": "Kai", "resources": [] },
                    { "level": 70, "name": "Kai Ni" }
                ]
            }
        ]"#;
        let catalog = Catalog::from_json(data).unwrap();
        let ship = catalog.get("Akatsuki").unwrap();
        assert_eq!(ship.stages().len(), 3);
        assert!(ship.stages()[1].resources().is_empty());
        assert!(ship.stages()[2].resources().is_empty());

        let round_tripped = Catalog::from_json(&catalog.to_json().unwrap()).unwrap();
        assert_eq!(round_tripped.ships(), catalog.ships());
    }

    #[cfg(feature = "json")]
    #[test]
    fn json_rejects_ship_without_stages() {
        let data = r#"[{ "name": "Ghost", "type": "駆逐艦", "stages": [] }]"#;
        let err = Catalog::from_json(data).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::MalformedShip { .. }));
    }
}
