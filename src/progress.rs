//! User-owned progress records.
//!
//! Records are never edited in place: every toggle returns a new
//! [`ShipProgress`], and [`ProgressSnapshot`] updates return a new snapshot that
//! shares the untouched records with the old one.
//!
//! Stage marks are kept monotonic on every write path. If stage `i` is
//! reached, every stage before it is reached too, and unreached stages are not
//! stored at all.

use std::collections::BTreeMap;

use bon::bon;
use tracing::warn;

use crate::Rc;
use crate::catalog::Ship;
use crate::error::ErrorKind;

static UNTOUCHED: ShipProgress = ShipProgress {
    acquired: false,
    priority: false,
    task: false,
    stages: BTreeMap::new(),
};

/// Progress for one ship. `Default` is the "never touched" record.
///
/// Deserialized records are normalized, so stage marks read from storage are
/// monotonic like every other write path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "RawProgress"))]
pub struct ShipProgress {
    acquired: bool,
    priority: bool,
    task: bool,
    /// Stage index -> reached.
    stages: BTreeMap<usize, bool>,
}

/// Stored shape of a record, before stage marks are normalized.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawProgress {
    #[serde(default)]
    acquired: bool,
    #[serde(default)]
    priority: bool,
    #[serde(default)]
    task: bool,
    #[serde(default)]
    stages: BTreeMap<usize, bool>,
}

#[cfg(feature = "serde")]
impl RawProgress {
    fn into_progress(self) -> ShipProgress {
        ShipProgress {
            acquired: self.acquired,
            priority: self.priority,
            task: self.task,
            stages: self.stages,
        }
    }
}

#[cfg(feature = "serde")]
impl From<RawProgress> for ShipProgress {
    fn from(raw: RawProgress) -> Self {
        raw.into_progress().normalized()
    }
}

#[bon]
impl ShipProgress {
    /// `reached` lists reached stage indices; every stage below the highest
    /// one is marked as well.
    #[builder]
    pub fn new(
        #[builder(default)] acquired: bool,
        #[builder(default)] priority: bool,
        #[builder(default)] task: bool,
        #[builder(default)] reached: Vec<usize>,
    ) -> Self {
        ShipProgress {
            acquired,
            priority,
            task,
            stages: marks_through(reached.into_iter().max()),
        }
    }
}

fn marks_through(last: Option<usize>) -> BTreeMap<usize, bool> {
    match last {
        Some(last) => (0..=last).map(|idx| (idx, true)).collect(),
        None => BTreeMap::new(),
    }
}

impl ShipProgress {
    pub fn acquired(&self) -> bool {
        self.acquired
    }

    pub fn priority(&self) -> bool {
        self.priority
    }

    pub fn task(&self) -> bool {
        self.task
    }

    pub fn stages(&self) -> &BTreeMap<usize, bool> {
        &self.stages
    }

    pub fn is_reached(&self, index: usize) -> bool {
        self.stages.get(&index).copied().unwrap_or(false)
    }

    /// Highest reached stage index. Derived from the stage marks only, so an
    /// acquired ship with nothing marked returns `None`.
    pub fn current_stage(&self) -> Option<usize> {
        self.stages
            .iter()
            .rev()
            .find(|&(_, &reached)| reached)
            .map(|(&idx, _)| idx)
    }

    /// Cascading stage toggle.
    ///
    /// Marking stage `index` marks `0..=index` and forces acquisition.
    /// Unmarking it clears `index` and every later stage, leaving earlier marks
    /// alone.
    pub fn toggle_stage(&self, ship: &Ship, index: usize) -> Result<ShipProgress, ErrorKind> {
        let stage_count = ship.stages().len();
        if index >= stage_count {
            return Err(ErrorKind::StageOutOfRange {
                ship: ship.name().to_string(),
                index,
                stage_count,
            });
        }

        let mut next = self.clone();
        if self.is_reached(index) {
            next.stages.retain(|&idx, _| idx < index);
        } else {
            next.stages.extend((0..=index).map(|idx| (idx, true)));
            next.acquired = true;
        }

        Ok(next)
    }

    /// Clearing acquisition clears every stage mark; setting it keeps them.
    pub fn toggle_acquired(&self) -> ShipProgress {
        if self.acquired {
            ShipProgress {
                acquired: false,
                stages: BTreeMap::new(),
                ..self.clone()
            }
        } else {
            ShipProgress {
                acquired: true,
                ..self.clone()
            }
        }
    }

    pub fn toggle_priority(&self) -> ShipProgress {
        ShipProgress {
            priority: !self.priority,
            ..self.clone()
        }
    }

    pub fn toggle_task(&self) -> ShipProgress {
        ShipProgress {
            task: !self.task,
            ..self.clone()
        }
    }

    /// Rewrite the stage marks into monotonic form: everything up to the
    /// highest reached stage is marked and nothing else is stored.
    pub fn normalized(&self) -> ShipProgress {
        ShipProgress {
            stages: marks_through(self.current_stage()),
            ..self.clone()
        }
    }

    pub fn is_normalized(&self) -> bool {
        self.stages == marks_through(self.current_stage())
    }
}

/// Name-keyed progress for the whole collection.
///
/// Cloning is cheap: records are reference counted and only the updated one is
/// replaced by each write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ProgressSnapshot {
    records: BTreeMap<String, Rc<ShipProgress>>,
}

/// Goes through [`ProgressSnapshot::new`], so gaps in stored stage marks are
/// filled (and logged) no matter who does the deserializing.
#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ProgressSnapshot {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let records: BTreeMap<String, RawProgress> =
            serde::Deserialize::deserialize(deserializer)?;
        Ok(records
            .into_iter()
            .map(|(name, raw)| (name, raw.into_progress()))
            .collect())
    }
}

impl ProgressSnapshot {
    /// Build a snapshot, normalising any record whose stage marks are not
    /// monotonic.
    pub fn new(records: impl IntoIterator<Item = (String, ShipProgress)>) -> Self {
        let records = records
            .into_iter()
            .map(|(name, progress)| {
                let progress = if progress.is_normalized() {
                    progress
                } else {
                    warn!("normalizing non-monotonic stage marks for {name}");
                    progress.normalized()
                };
                (name, Rc::new(progress))
            })
            .collect();

        ProgressSnapshot { records }
    }

    /// The record for `name`, or the untouched record when there is none.
    pub fn get(&self, name: &str) -> &ShipProgress {
        self.records
            .get(name)
            .map(|progress| progress.as_ref())
            .unwrap_or(&UNTOUCHED)
    }

    pub fn record(&self, name: &str) -> Option<&ShipProgress> {
        self.records.get(name).map(|progress| progress.as_ref())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ShipProgress)> {
        self.records
            .iter()
            .map(|(name, progress)| (name.as_str(), progress.as_ref()))
    }

    pub fn with_record(&self, name: impl Into<String>, progress: ShipProgress) -> ProgressSnapshot {
        let mut records = self.records.clone();
        records.insert(name.into(), Rc::new(progress.normalized()));
        ProgressSnapshot { records }
    }

    pub fn without(&self, name: &str) -> ProgressSnapshot {
        let mut records = self.records.clone();
        records.remove(name);
        ProgressSnapshot { records }
    }

    /// Move the record for `old` to `new`, replacing whatever `new` had. A
    /// missing `old` record leaves the snapshot unchanged.
    pub fn renamed(&self, old: &str, new: &str) -> ProgressSnapshot {
        let mut records = self.records.clone();
        if let Some(progress) = records.remove(old) {
            records.insert(new.to_string(), progress);
        }
        ProgressSnapshot { records }
    }

    /// Parse an imported snapshot. Anything that is not an object of
    /// name -> record is rejected whole; nothing is partially merged.
    #[cfg(feature = "json")]
    pub fn from_json(data: &str) -> crate::error::IResult<ProgressSnapshot> {
        let snapshot = serde_json::from_str(data).map_err(|err| ErrorKind::MalformedProgress {
            detail: err.to_string(),
        })?;

        Ok(snapshot)
    }

    #[cfg(feature = "json")]
    pub fn to_json(&self) -> crate::error::IResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl FromIterator<(String, ShipProgress)> for ProgressSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, ShipProgress)>>(iter: I) -> Self {
        ProgressSnapshot::new(iter)
    }
}
