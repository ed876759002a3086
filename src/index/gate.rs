//! Readiness gate around the shared symbol index.
//!
//! A rebuild takes the write side for its whole duration; a resolution
//! request runs inside one read snapshot and is rejected with
//! [`LookupError::IndexNotReady`] instead of blocking when a rebuild is in
//! progress.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockWriteGuard};

use crate::error::{LookupError, Result};

#[derive(Debug, Default)]
pub struct IndexGate {
    building: AtomicBool,
    lock: RwLock<()>,
}

impl IndexGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a rebuild guard is alive.
    pub fn is_building(&self) -> bool {
        self.building.load(Ordering::Acquire)
    }

    /// Marks a rebuild in progress for the lifetime of the returned guard.
    /// Waits for in-flight read snapshots to finish before returning.
    pub fn begin_build(&self) -> BuildGuard<'_> {
        self.building.store(true, Ordering::Release);
        let guard = self.lock.write().unwrap();
        BuildGuard {
            gate: self,
            _write: guard,
        }
    }

    /// Runs `f` inside one read-consistent snapshot. Never blocks: when a
    /// rebuild holds or is waiting for the lock, the call fails with
    /// `IndexNotReady` immediately. The read side is released on every exit
    /// path by guard drop.
    pub fn with_read_snapshot<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        if self.is_building() {
            return Err(LookupError::IndexNotReady);
        }
        let _read = self
            .lock
            .try_read()
            .map_err(|_| LookupError::IndexNotReady)?;
        // A rebuild may have been requested between the flag check and the
        // lock acquisition.
        if self.is_building() {
            return Err(LookupError::IndexNotReady);
        }
        f()
    }
}

/// RAII guard for a rebuild; clears the building flag on drop.
pub struct BuildGuard<'a> {
    gate: &'a IndexGate,
    _write: RwLockWriteGuard<'a, ()>,
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        self.gate.building.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_runs_when_idle() {
        let gate = IndexGate::new();
        let value = gate.with_read_snapshot(|| Ok(42)).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_snapshot_rejected_during_build() {
        let gate = IndexGate::new();
        let guard = gate.begin_build();
        assert!(gate.is_building());
        let err = gate.with_read_snapshot(|| Ok(())).unwrap_err();
        assert!(matches!(err, LookupError::IndexNotReady));
        drop(guard);

        assert!(!gate.is_building());
        assert!(gate.with_read_snapshot(|| Ok(())).is_ok());
    }

    #[test]
    fn test_building_flag_cleared_on_drop() {
        let gate = IndexGate::new();
        {
            let _guard = gate.begin_build();
            assert!(gate.is_building());
        }
        assert!(!gate.is_building());
    }

    #[test]
    fn test_snapshot_error_propagates_and_releases() {
        let gate = IndexGate::new();
        let err = gate
            .with_read_snapshot(|| -> Result<()> { Err(LookupError::Index("boom".to_string())) })
            .unwrap_err();
        assert!(matches!(err, LookupError::Index(_)));
        // The read side must have been released despite the error.
        let _guard = gate.begin_build();
    }
}
