//! Debug-only reentrancy guard for public map entry points.
//!
//! The map calls user code through `K: Eq/Hash` while probing, and a
//! hostile (or merely clever) key could try to re-enter the map from
//! inside those calls while a mutation is mid-flight. Debug builds trap
//! that with a panic; release builds compile the whole thing to nothing.
//! The marker field also keeps any containing struct `!Send + !Sync`,
//! matching the single-threaded contract.

use core::cell::Cell;
use core::marker::PhantomData;

#[derive(Debug, Default)]
pub(crate) struct ReentryCheck {
    #[cfg(debug_assertions)]
    busy: Cell<bool>,
    _single_threaded: PhantomData<*mut ()>,
}

impl ReentryCheck {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            busy: Cell::new(false),
            _single_threaded: PhantomData,
        }
    }

    /// Mark the map busy until the returned token drops. Panics in debug
    /// builds if the map is already busy.
    #[inline]
    pub(crate) fn enter(&self) -> Busy<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.busy.replace(true),
                "reentrant call into WindowHashMap from key Eq/Hash code"
            );
            return Busy { check: self };
        }

        #[cfg(not(debug_assertions))]
        {
            return Busy {
                _lt: PhantomData,
            };
        }
    }
}

pub(crate) struct Busy<'a> {
    #[cfg(debug_assertions)]
    check: &'a ReentryCheck,
    #[cfg(not(debug_assertions))]
    _lt: PhantomData<&'a ()>,
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.check.busy.set(false);
    }
}
