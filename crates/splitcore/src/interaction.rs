//! Interaction suppression.
//!
//! While any reason to suppress interaction is outstanding (a modal dialog, an
//! open editor) commands fail fast with `Busy`. Reasons overlap, so the gate
//! counts them. [`InteractionGate::lock_interaction`] hands out a token that
//! gives its count back exactly once; the raw [`InteractionGate::acquire`] /
//! [`InteractionGate::release`] pair is for callers bridging external
//! open/close notifications.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Clone, Default)]
pub struct InteractionGate {
    count: Arc<AtomicUsize>,
}

/// One outstanding reason to suppress interaction.
#[must_use = "interaction unlocks as soon as the lock is dropped"]
#[derive(Debug)]
pub struct InteractionLock {
    gate: InteractionGate,
}

impl InteractionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock_interaction(&self) -> InteractionLock {
        self.acquire();
        InteractionLock { gate: self.clone() }
    }

    /// Lock only if nothing else holds the gate. Check and lock happen as one
    /// step, so two callers can never both pass.
    pub fn try_lock_interaction(&self) -> Option<InteractionLock> {
        self.count
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        trace!(count = 1, "interaction locked");
        Some(InteractionLock { gate: self.clone() })
    }

    pub fn acquire(&self) {
        let count = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(count, "interaction locked");
    }

    /// # Panics
    ///
    /// When nothing is locked. An unmatched release is a bookkeeping bug.
    #[track_caller]
    pub fn release(&self) {
        match self
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        {
            Ok(previous) => trace!(count = previous - 1, "interaction unlocked"),
            Err(_) => panic!("The lock count should never be negative."),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.lock_count() > 0
    }

    pub fn lock_count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl InteractionLock {
    pub fn unlock(self) {}

    pub fn gate(&self) -> &InteractionGate {
        &self.gate
    }
}

impl Drop for InteractionLock {
    fn drop(&mut self) {
        self.gate.release();
    }
}
