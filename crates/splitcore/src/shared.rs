//! One timer observed by many components.
//!
//! [`SharedTimer`] is the reference-counted wrapper, not a second owner of the
//! engine resource: exactly one [`Timer`] exists behind it. Guards deref to the
//! timer for as long as they live and unlock on drop, so every exit path of a
//! scope releases its access. Guards are `!Send` and cannot be held across an
//! `.await`.

use crate::timer::Timer;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};

#[derive(Debug, Clone)]
pub struct SharedTimer {
    inner: Arc<RwLock<Timer>>,
}

pub struct TimerReadGuard<'a> {
    guard: RwLockReadGuard<'a, Timer>,
}

pub struct TimerWriteGuard<'a> {
    guard: RwLockWriteGuard<'a, Timer>,
}

impl SharedTimer {
    pub fn new(timer: Timer) -> Self {
        Self {
            inner: Arc::new(RwLock::new(timer)),
        }
    }

    /// Another reference to the same timer.
    pub fn share(&self) -> Self {
        self.clone()
    }

    /// Block until no writer holds the timer.
    pub fn read(&self) -> TimerReadGuard<'_> {
        TimerReadGuard {
            guard: self.inner.read().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Block until no other guard holds the timer.
    pub fn write(&self) -> TimerWriteGuard<'_> {
        TimerWriteGuard {
            guard: self.inner.write().unwrap_or_else(PoisonError::into_inner),
        }
    }

    pub fn try_read(&self) -> Option<TimerReadGuard<'_>> {
        match self.inner.try_read() {
            Ok(guard) => Some(TimerReadGuard { guard }),
            Err(TryLockError::Poisoned(poisoned)) => Some(TimerReadGuard {
                guard: poisoned.into_inner(),
            }),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    pub fn try_write(&self) -> Option<TimerWriteGuard<'_>> {
        match self.inner.try_write() {
            Ok(guard) => Some(TimerWriteGuard { guard }),
            Err(TryLockError::Poisoned(poisoned)) => Some(TimerWriteGuard {
                guard: poisoned.into_inner(),
            }),
            Err(TryLockError::WouldBlock) => None,
        }
    }

    pub fn read_with<T>(&self, f: impl FnOnce(&Timer) -> T) -> T {
        f(&self.read())
    }

    pub fn write_with<T>(&self, f: impl FnOnce(&mut Timer) -> T) -> T {
        f(&mut self.write())
    }

    /// Swap the guarded timer under the write lock and return the old one.
    pub fn replace_inner(&self, timer: Timer) -> Timer {
        std::mem::replace(&mut *self.write(), timer)
    }

    /// Number of live `SharedTimer` references.
    pub fn share_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl Deref for TimerReadGuard<'_> {
    type Target = Timer;

    fn deref(&self) -> &Timer {
        &self.guard
    }
}

impl Deref for TimerWriteGuard<'_> {
    type Target = Timer;

    fn deref(&self) -> &Timer {
        &self.guard
    }
}

impl DerefMut for TimerWriteGuard<'_> {
    fn deref_mut(&mut self) -> &mut Timer {
        &mut self.guard
    }
}
