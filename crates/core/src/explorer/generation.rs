//! # Generation Guard
//!
//! Epoch-guarded shared state. Every topic transition begins a new
//! generation; writes tagged with an older one are dropped. In-flight
//! requests are never aborted, only their results are.
//!
//! The epoch lives under the same lock as the value, so a check and
//! the write it guards cannot interleave with a newer `begin`.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Identity of one transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Generation(u64);

impl Generation {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

struct Guarded<T> {
    epoch: u64,
    value: T,
}

pub struct GenerationGuard<T> {
    inner: Mutex<Guarded<T>>,
}

impl<T: Clone> GenerationGuard<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(Guarded { epoch: 0, value }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Guarded<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a new generation, invalidating every earlier one, and
    /// replace the value with `reset`.
    pub fn begin(&self, reset: T) -> Generation {
        let mut guarded = self.lock();
        guarded.epoch += 1;
        guarded.value = reset;
        Generation(guarded.epoch)
    }

    /// Same as [`begin`](Self::begin), running `after` under the lock
    pub fn begin_with(&self, reset: T, after: impl FnOnce(Generation, &T)) -> Generation {
        let mut guarded = self.lock();
        guarded.epoch += 1;
        guarded.value = reset;
        let generation = Generation(guarded.epoch);
        after(generation, &guarded.value);
        generation
    }

    pub fn current(&self) -> Generation {
        Generation(self.lock().epoch)
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.lock().epoch == generation.0
    }

    /// Mutate the value if `generation` is still current.
    /// Returns `None` (and leaves the value untouched) when stale.
    pub fn apply<R>(&self, generation: Generation, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut guarded = self.lock();
        if guarded.epoch != generation.0 {
            return None;
        }
        Some(f(&mut guarded.value))
    }

    /// Read the value together with the generation it belongs to
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> (Generation, R) {
        let guarded = self.lock();
        (Generation(guarded.epoch), f(&guarded.value))
    }

    pub fn snapshot(&self) -> T {
        self.lock().value.clone()
    }
}
