//! Lazily recomputed interpolated position.
//!
//! The cache pairs an atomic stale flag with a reusable coordinate slot.
//! The periodic ticker only ever sets the flag; readers test-and-clear it
//! while holding the slot lock, so at most one reader recomputes per tick and
//! no reader observes a half-written slot.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::coord::Coordinate;

/// Reusable storage for the last computed estimate.
#[derive(Debug, Default)]
struct Slot {
    position: Coordinate,
    /// False until the slot has been written at least once.
    seeded: bool,
}

/// Stale flag plus cached interpolated position.
#[derive(Debug)]
pub struct InterpolationCache {
    stale: AtomicBool,
    slot: Mutex<Slot>,
}

impl InterpolationCache {
    /// Create a cache that starts stale.
    pub fn new() -> Self {
        Self {
            stale: AtomicBool::new(true),
            slot: Mutex::new(Slot::default()),
        }
    }

    /// Mark the cached estimate as needing recomputation.
    #[inline]
    pub fn invalidate(&self) {
        self.stale.store(true, Ordering::Release);
    }

    /// True if the next read will recompute.
    #[inline]
    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::Acquire)
    }

    /// Return the cached estimate, recomputing it first if stale.
    ///
    /// `refresh` receives the reusable slot and returns true if it wrote a new
    /// estimate. When it returns false the slot keeps its previous value; an
    /// unseeded slot is filled with `fallback` (the raw fix) so a hold never
    /// reports a coordinate that was not derived from a fix.
    pub fn get_or_refresh<F>(&self, fallback: Coordinate, refresh: F) -> Coordinate
    where
        F: FnOnce(&mut Coordinate) -> bool,
    {
        let mut slot = self.slot.lock();

        if self.stale.swap(false, Ordering::AcqRel) {
            let moved = refresh(&mut slot.position);
            if !moved && !slot.seeded {
                slot.position = fallback;
            }
            slot.seeded = true;
        }

        if slot.seeded {
            slot.position
        } else {
            fallback
        }
    }
}

impl Default for InterpolationCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIX: Coordinate = Coordinate::new(10.0, 20.0);

    #[test]
    fn test_starts_stale() {
        assert!(InterpolationCache::new().is_stale());
    }

    #[test]
    fn test_refresh_runs_once_per_invalidation() {
        let cache = InterpolationCache::new();
        let mut calls = 0;

        let first = cache.get_or_refresh(FIX, |slot| {
            calls += 1;
            *slot = Coordinate::new(1.0, 2.0);
            true
        });
        let second = cache.get_or_refresh(FIX, |_| {
            calls += 1;
            true
        });

        assert_eq!(calls, 1);
        assert_eq!(first, Coordinate::new(1.0, 2.0));
        assert_eq!(second, first);
        assert!(!cache.is_stale());
    }

    #[test]
    fn test_invalidate_forces_recompute() {
        let cache = InterpolationCache::new();
        cache.get_or_refresh(FIX, |slot| {
            *slot = Coordinate::new(1.0, 1.0);
            true
        });

        cache.invalidate();
        let value = cache.get_or_refresh(FIX, |slot| {
            *slot = Coordinate::new(2.0, 2.0);
            true
        });

        assert_eq!(value, Coordinate::new(2.0, 2.0));
    }

    #[test]
    fn test_hold_on_unseeded_slot_uses_fallback() {
        let cache = InterpolationCache::new();
        let value = cache.get_or_refresh(FIX, |_| false);
        assert_eq!(value, FIX);
    }

    #[test]
    fn test_hold_keeps_previous_estimate() {
        let cache = InterpolationCache::new();
        cache.get_or_refresh(FIX, |slot| {
            *slot = Coordinate::new(3.0, 4.0);
            true
        });

        cache.invalidate();
        let value = cache.get_or_refresh(Coordinate::new(50.0, 50.0), |_| false);

        assert_eq!(value, Coordinate::new(3.0, 4.0));
        assert!(!cache.is_stale());
    }

    #[test]
    fn test_concurrent_readers_recompute_once() {
        use std::sync::atomic::AtomicUsize;
        use std::sync::Arc;

        let cache = Arc::new(InterpolationCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                std::thread::spawn(move || {
                    cache.get_or_refresh(FIX, |slot| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        *slot = Coordinate::new(7.0, 7.0);
                        true
                    })
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Coordinate::new(7.0, 7.0));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
