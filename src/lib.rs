/// Ship catalog model: ships, remodel stages, and the validated catalog
pub mod catalog;
/// Error definitions
pub mod error;
/// Per-ship user progress records and the copy-on-write progress snapshot
pub mod progress;
/// Generic wrapper for values that may or may not match a known variant.
pub mod recognized;
/// Remodel resource requirements, per ship and across the whole collection
pub mod resources;
/// Kana to romaji transliteration used by search
pub mod romaji;
/// Acquisition/remodel status classification
pub mod status;
/// Owner of the authoritative progress snapshot and its persistence seam
pub mod store;
/// Two-level ship type taxonomy (category -> sub-type -> display alias)
pub mod taxonomy;
/// Filtering and deterministic ordering of the catalog
pub mod view;

#[cfg(feature = "arc")]
pub type Rc<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub type Rc<T> = std::rc::Rc<T>;
