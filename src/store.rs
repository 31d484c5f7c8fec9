//! Authoritative progress snapshot plus its persistence seam.
//!
//! The core functions never touch storage. [`ProgressStore`] owns the current
//! [`ProgressSnapshot`], applies the pure toggles to it, and hands every new
//! snapshot to a [`ProgressSink`] before adopting it. A sink failure is
//! returned to the caller and the previous snapshot stays current.

use tracing::debug;

use crate::catalog::Ship;
use crate::error::ErrorKind;
use crate::progress::{ProgressSnapshot, ShipProgress};

/// Receives every snapshot the store is about to adopt.
pub trait ProgressSink {
    fn persist(&self, snapshot: &ProgressSnapshot) -> Result<(), ErrorKind>;
}

/// Keeps nothing.
impl ProgressSink for () {
    fn persist(&self, _snapshot: &ProgressSnapshot) -> Result<(), ErrorKind> {
        Ok(())
    }
}

pub struct SinkWithCallback<F> {
    callback: F,
}

impl<F> SinkWithCallback<F>
where
    F: Fn(&ProgressSnapshot) -> Result<(), ErrorKind>,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressSink for SinkWithCallback<F>
where
    F: Fn(&ProgressSnapshot) -> Result<(), ErrorKind>,
{
    fn persist(&self, snapshot: &ProgressSnapshot) -> Result<(), ErrorKind> {
        (self.callback)(snapshot)
    }
}

pub struct ProgressStore<S = ()> {
    snapshot: ProgressSnapshot,
    sink: S,
}

impl ProgressStore<()> {
    pub fn in_memory(snapshot: ProgressSnapshot) -> Self {
        ProgressStore { snapshot, sink: () }
    }
}

impl<S: ProgressSink> ProgressStore<S> {
    pub fn new(snapshot: ProgressSnapshot, sink: S) -> Self {
        ProgressStore { snapshot, sink }
    }

    pub fn snapshot(&self) -> &ProgressSnapshot {
        &self.snapshot
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn get(&self, name: &str) -> &ShipProgress {
        self.snapshot.get(name)
    }

    pub fn toggle_stage(&mut self, ship: &Ship, index: usize) -> Result<&ShipProgress, ErrorKind> {
        self.update(ship.name(), |progress| progress.toggle_stage(ship, index))
    }

    pub fn toggle_acquired(&mut self, ship: &Ship) -> Result<&ShipProgress, ErrorKind> {
        self.update(ship.name(), |progress| Ok(progress.toggle_acquired()))
    }

    pub fn toggle_priority(&mut self, ship: &Ship) -> Result<&ShipProgress, ErrorKind> {
        self.update(ship.name(), |progress| Ok(progress.toggle_priority()))
    }

    pub fn toggle_task(&mut self, ship: &Ship) -> Result<&ShipProgress, ErrorKind> {
        self.update(ship.name(), |progress| Ok(progress.toggle_task()))
    }

    /// Swap in a whole snapshot, e.g. after an import.
    pub fn replace(&mut self, snapshot: ProgressSnapshot) -> Result<(), ErrorKind> {
        debug!("replacing progress snapshot ({} records)", snapshot.len());
        self.commit(snapshot)
    }

    /// Follow a ship rename in the catalog.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), ErrorKind> {
        if old == new {
            return Ok(());
        }
        debug!("moving progress record {old} -> {new}");
        let next = self.snapshot.renamed(old, new);
        self.commit(next)
    }

    fn update<F>(&mut self, name: &str, f: F) -> Result<&ShipProgress, ErrorKind>
    where
        F: FnOnce(&ShipProgress) -> Result<ShipProgress, ErrorKind>,
    {
        let progress = f(self.snapshot.get(name))?;
        debug!(
            "updating {name}: acquired={} stage={:?}",
            progress.acquired(),
            progress.current_stage()
        );
        let next = self.snapshot.with_record(name, progress);
        self.commit(next)?;
        Ok(self.snapshot.get(name))
    }

    fn commit(&mut self, next: ProgressSnapshot) -> Result<(), ErrorKind> {
        self.sink.persist(&next)?;
        self.snapshot = next;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::catalog::Stage;
    use crate::status::{Status, classify};

    fn akatsuki() -> Ship {
        Ship::builder()
            .name("Akatsuki")
            .ship_type("駆逐艦")
            .stages(vec![
                Stage::builder().level(1).name("Base").build(),
                Stage::builder().level(2).name("Kai").build(),
            ])
            .build()
    }

    #[test]
    fn toggles_write_through_the_sink() {
        let ship = akatsuki();
        let persisted = RefCell::new(Vec::new());
        let sink = SinkWithCallback::new(|snapshot: &ProgressSnapshot| {
            persisted.borrow_mut().push(snapshot.clone());
            Ok(())
        });
        let mut store = ProgressStore::new(ProgressSnapshot::default(), sink);

        let progress = store.toggle_stage(&ship, 1).unwrap();
        assert_eq!(classify(&ship, progress), Status::Complete);

        store.toggle_priority(&ship).unwrap();
        store.toggle_acquired(&ship).unwrap();

        let persisted = persisted.borrow();
        assert_eq!(persisted.len(), 3);
        assert_eq!(persisted.last(), Some(store.snapshot()));
        assert!(!store.get("Akatsuki").acquired());
        assert!(store.get("Akatsuki").stages().is_empty());
        assert!(store.get("Akatsuki").priority());
    }

    #[test]
    fn sink_failure_keeps_previous_snapshot() {
        let ship = akatsuki();
        let fail = Cell::new(false);
        let sink = SinkWithCallback::new(|_: &ProgressSnapshot| {
            if fail.get() {
                Err(ErrorKind::Persist {
                    detail: "disk full".to_string(),
                })
            } else {
                Ok(())
            }
        });
        let mut store = ProgressStore::new(ProgressSnapshot::default(), sink);
        store.toggle_acquired(&ship).unwrap();

        fail.set(true);
        let err = store.toggle_stage(&ship, 0).unwrap_err();
        assert!(matches!(err, ErrorKind::Persist { .. }));
        assert!(store.get("Akatsuki").acquired());
        assert_eq!(store.get("Akatsuki").current_stage(), None);
    }

    #[test]
    fn invalid_toggle_is_not_persisted() {
        let ship = akatsuki();
        let writes = Cell::new(0);
        let sink = SinkWithCallback::new(|_: &ProgressSnapshot| {
            writes.set(writes.get() + 1);
            Ok(())
        });
        let mut store = ProgressStore::new(ProgressSnapshot::default(), sink);

        assert!(store.toggle_stage(&ship, 9).is_err());
        assert_eq!(writes.get(), 0);
    }

    #[test]
    fn rename_and_replace() {
        let ship = akatsuki();
        let mut store = ProgressStore::in_memory(ProgressSnapshot::default());
        store.toggle_task(&ship).unwrap();

        store.rename("Akatsuki", "Akatsuki Kai Ni").unwrap();
        assert!(store.snapshot().record("Akatsuki").is_none());
        assert!(store.get("Akatsuki Kai Ni").task());

        store.replace(ProgressSnapshot::default()).unwrap();
        assert!(store.snapshot().is_empty());
    }
}
