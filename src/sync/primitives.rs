//! Interrupt-safe waker storage.
//!
//! The completion path may run in a device interrupt handler, so the slot
//! is guarded by a critical section rather than a lock.

use core::cell::RefCell;
use core::task::Waker;

use critical_section::Mutex;

/// One parked task, woken by the gate when a counter it may be waiting on
/// changes.
///
/// Registering replaces whatever task was parked before.
pub struct AtomicWaker {
    slot: Mutex<RefCell<Option<Waker>>>,
}

impl AtomicWaker {
    /// Create an empty slot.
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(RefCell::new(None)),
        }
    }

    /// Park `waker`, unless it would wake the task already parked.
    pub fn register(&self, waker: &Waker) {
        critical_section::with(|cs| {
            let mut slot = self.slot.borrow_ref_mut(cs);
            if !slot.as_ref().is_some_and(|parked| parked.will_wake(waker)) {
                *slot = Some(waker.clone());
            }
        });
    }

    /// Wake the parked task and empty the slot. The waker runs outside the
    /// critical section.
    #[inline]
    pub fn wake(&self) {
        let parked = critical_section::with(|cs| self.slot.borrow_ref_mut(cs).take());
        if let Some(waker) = parked {
            waker.wake();
        }
    }
}

impl Default for AtomicWaker {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for AtomicWaker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AtomicWaker").finish_non_exhaustive()
    }
}
