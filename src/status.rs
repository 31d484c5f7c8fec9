//! Three-state classification of a ship from its progress record.

use std::fmt;

use variantly::Variantly;

use crate::catalog::Ship;
use crate::progress::ShipProgress;
use crate::recognized::Recognized;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Variantly)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Status {
    /// Not acquired, regardless of any stage marks.
    Unacquired,
    /// Acquired with the final stage not yet reached.
    Remodeling,
    /// Acquired with the final stage reached.
    Complete,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Unacquired, Status::Remodeling, Status::Complete];

    pub fn from_name(name: &str) -> Recognized<Self> {
        match name {
            "unacquired" => Recognized::Known(Self::Unacquired),
            "remodeling" => Recognized::Known(Self::Remodeling),
            "complete" => Recognized::Known(Self::Complete),
            other => Recognized::Unknown(other.to_string()),
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Unacquired => "unacquired",
            Self::Remodeling => "remodeling",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify a ship. A missing record should be passed as
/// [`ShipProgress::default`], which classifies as [`Status::Unacquired`].
pub fn classify(ship: &Ship, progress: &ShipProgress) -> Status {
    if !progress.acquired() {
        return Status::Unacquired;
    }

    match ship.last_stage_index() {
        Some(last) if progress.is_reached(last) => Status::Complete,
        _ => Status::Remodeling,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::catalog::Stage;

    fn ship(stage_count: usize) -> Ship {
        Ship::builder()
            .name("Akatsuki")
            .ship_type("駆逐艦")
            .stages(
                (0..stage_count)
                    .map(|i| {
                        Stage::builder()
                            .level(i as i64 + 1)
                            .name(format!("Stage {i}"))
                            .build()
                    })
                    .collect(),
            )
            .build()
    }

    #[test]
    fn no_record_is_unacquired() {
        assert_eq!(classify(&ship(2), &ShipProgress::default()), Status::Unacquired);
    }

    #[test]
    fn stage_marks_ignored_when_not_acquired() {
        let progress = ShipProgress::builder().reached(vec![0, 1]).build();
        assert!(!progress.acquired());
        assert_eq!(classify(&ship(2), &progress), Status::Unacquired);
    }

    #[test]
    fn acquired_without_final_stage_is_remodeling() {
        let progress = ShipProgress::builder().acquired(true).build();
        assert_eq!(classify(&ship(2), &progress), Status::Remodeling);

        let progress = ShipProgress::builder().acquired(true).reached(vec![0]).build();
        assert_eq!(classify(&ship(2), &progress), Status::Remodeling);
    }

    #[test]
    fn final_stage_reached_is_complete() {
        let progress = ShipProgress::builder().acquired(true).reached(vec![1]).build();
        assert_eq!(classify(&ship(2), &progress), Status::Complete);
        assert!(classify(&ship(2), &progress).is_complete());
    }

    #[test]
    fn single_stage_ship() {
        let acquired = ShipProgress::builder().acquired(true).build();
        assert_eq!(classify(&ship(1), &acquired), Status::Remodeling);

        let done = ShipProgress::builder().acquired(true).reached(vec![0]).build();
        assert_eq!(classify(&ship(1), &done), Status::Complete);
    }

    #[test]
    fn names_round_trip() {
        for status in Status::ALL {
            assert_eq!(Status::from_name(status.name()), Recognized::Known(status));
        }
        assert!(Status::from_name("sunk").is_unknown());
    }
}
