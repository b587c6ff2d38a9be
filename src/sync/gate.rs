//! Flow-control gate.
//!
//! Counters and tokens coordinating blocking readers and writers with the
//! interrupt side of the DMA core:
//!
//! - `ready`: inbound buffers filled by the device and not yet read
//! - `free`: outbound slots writers may still fill
//! - `inbound_free`: inbound slots the device may still fill
//! - transfer state: single-starter tie-break for outbound bursts
//! - exclusive token: one caller at a time in read/write/control
//! - mask token: one-shot re-enable of the write-request interrupt
//!
//! All counters are `SeqCst` atomics. Blocking waits park on a single
//! mutex/condvar event which every state change notifies while holding the
//! mutex, so a waiter that has just checked its condition cannot miss the
//! wake-up.

use core::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use super::cancel::CancelToken;
use crate::driver::error::{IoError, IoResult};
use crate::internal::fmt::trace;

#[cfg(feature = "async")]
use super::primitives::AtomicWaker;

// =============================================================================
// Wait Mode
// =============================================================================

/// How a gate operation behaves when it cannot proceed immediately
#[derive(Debug, Clone, Copy)]
pub enum Wait<'a> {
    /// Park the calling thread until the condition holds, the token is
    /// cancelled or the optional timeout expires
    Block {
        /// Token interrupting the wait
        cancel: &'a CancelToken,
        /// Upper bound on the wait
        timeout: Option<Duration>,
    },
    /// Fail with [`IoError::WouldBlock`] instead of waiting
    Poll,
}

impl<'a> Wait<'a> {
    /// Block without a timeout
    #[inline]
    pub const fn blocking(cancel: &'a CancelToken) -> Self {
        Wait::Block {
            cancel,
            timeout: None,
        }
    }
}

// =============================================================================
// Transfer State
// =============================================================================

/// Outbound burst state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum TransferState {
    /// No burst in flight and nobody starting one
    Idle = 0,
    /// One caller won the tie-break and is programming a burst
    Starting = 1,
    /// Burst programmed; the device owns the buffer until completion
    Running = 2,
}

impl TransferState {
    const fn from_raw(raw: u8) -> Self {
        match raw {
            1 => TransferState::Starting,
            2 => TransferState::Running,
            _ => TransferState::Idle,
        }
    }
}

// =============================================================================
// Gate
// =============================================================================

/// Counters, tokens and the wait event shared by both transfer directions.
pub struct FlowControlGate {
    ready: AtomicUsize,
    free: AtomicUsize,
    inbound_free: AtomicUsize,
    inbound_capacity: usize,
    outbound_capacity: usize,
    transfer: AtomicU8,
    exclusive: AtomicBool,
    exclusive_contended: AtomicBool,
    mask_token: AtomicBool,
    consumed_since_unmask: AtomicUsize,
    event: Mutex<()>,
    changed: Condvar,
    #[cfg(feature = "async")]
    read_waker: AtomicWaker,
    #[cfg(feature = "async")]
    write_waker: AtomicWaker,
}

impl FlowControlGate {
    /// Create a gate for rings of the given capacities.
    ///
    /// Starts with nothing ready, every slot free, no burst running and
    /// the unmask protocol disarmed.
    pub fn new(inbound_capacity: usize, outbound_capacity: usize) -> Self {
        Self {
            ready: AtomicUsize::new(0),
            free: AtomicUsize::new(outbound_capacity),
            inbound_free: AtomicUsize::new(inbound_capacity),
            inbound_capacity,
            outbound_capacity,
            transfer: AtomicU8::new(TransferState::Idle as u8),
            exclusive: AtomicBool::new(false),
            exclusive_contended: AtomicBool::new(false),
            mask_token: AtomicBool::new(false),
            // Disarmed until the interrupt side masks the write request
            consumed_since_unmask: AtomicUsize::new(1),
            event: Mutex::new(()),
            changed: Condvar::new(),
            #[cfg(feature = "async")]
            read_waker: AtomicWaker::new(),
            #[cfg(feature = "async")]
            write_waker: AtomicWaker::new(),
        }
    }

    // -------------------------------------------------------------------------
    // Exclusive access
    // -------------------------------------------------------------------------

    /// Take the single caller token, released when the guard drops.
    ///
    /// Not fair and not reentrant: a thread that already holds the guard
    /// and asks again waits on itself.
    ///
    /// Releasing the guard only wakes waiters if some caller found the
    /// token taken while it was held.
    pub fn acquire_exclusive(&self, wait: Wait<'_>) -> IoResult<ExclusiveGuard<'_>> {
        self.wait_for(wait, || {
            if self.try_take_exclusive() {
                return Some(ExclusiveGuard { gate: self });
            }
            // Flag before the retry so a concurrent release either sees it
            // or leaves the token free for the retry.
            self.exclusive_contended.store(true, Ordering::SeqCst);
            if self.try_take_exclusive() {
                Some(ExclusiveGuard { gate: self })
            } else {
                None
            }
        })
    }

    fn try_take_exclusive(&self) -> bool {
        self.exclusive
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Check whether some caller holds the exclusive token
    #[inline]
    pub fn is_exclusive_held(&self) -> bool {
        self.exclusive.load(Ordering::SeqCst)
    }

    // -------------------------------------------------------------------------
    // Inbound accounting
    // -------------------------------------------------------------------------

    /// Wait until an inbound buffer is ready, then consume one.
    pub fn wait_until_ready_to_read(&self, wait: Wait<'_>) -> IoResult<()> {
        self.wait_for(wait, || decrement(&self.ready).map(|_| ()))
    }

    /// Interrupt side: one more inbound buffer is ready.
    pub fn publish_ready(&self) {
        let ready = self.ready.fetch_add(1, Ordering::SeqCst) + 1;
        trace!("ready -> {}", ready);
        self.notify();
    }

    /// Interrupt side: take one inbound slot for the device to fill.
    ///
    /// Returns the number of slots still free afterwards, or `None` if
    /// every inbound slot holds unread data.
    pub fn claim_inbound_slot(&self) -> Option<usize> {
        decrement(&self.inbound_free).map(|previous| previous - 1)
    }

    /// Reader side: an inbound slot was drained and may be refilled.
    pub fn release_inbound_slot(&self) {
        self.inbound_free.fetch_add(1, Ordering::SeqCst);
    }

    /// Count one consumed buffer for the unmask protocol.
    ///
    /// Returns `true` for exactly the caller that moves the counter from
    /// zero to one after [`arm_unmask`](Self::arm_unmask). That caller must
    /// [`take_mask_token`](Self::take_mask_token) and clear the mask bit.
    pub fn signal_buffer_consumed_on_read(&self) -> bool {
        self.consumed_since_unmask.fetch_add(1, Ordering::SeqCst) == 0
    }

    /// Interrupt side: the write request was masked; post the token and
    /// arm the counter.
    pub fn arm_unmask(&self) {
        self.mask_token.store(true, Ordering::SeqCst);
        self.consumed_since_unmask.store(0, Ordering::SeqCst);
        trace!("unmask armed");
    }

    /// Interrupt side, right after [`arm_unmask`](Self::arm_unmask): claim
    /// the unmask if a reader freed a slot before the protocol was armed.
    pub fn claim_missed_unmask(&self) -> bool {
        self.inbound_free.load(Ordering::SeqCst) > 0
            && self
                .consumed_since_unmask
                .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
    }

    /// Take the posted mask token, if any
    pub fn take_mask_token(&self) -> bool {
        self.mask_token.swap(false, Ordering::SeqCst)
    }

    // -------------------------------------------------------------------------
    // Outbound accounting
    // -------------------------------------------------------------------------

    /// Wait until at least one outbound slot is free. Does not take it.
    pub fn wait_until_free_to_write(&self, wait: Wait<'_>) -> IoResult<()> {
        self.wait_for(wait, || (self.free.load(Ordering::SeqCst) > 0).then_some(()))
    }

    /// Writer side: the slot at the producer cursor now holds data.
    ///
    /// Returns `false` if no slot was free.
    pub fn take_free_slot(&self) -> bool {
        decrement(&self.free).is_some()
    }

    /// Interrupt side: one outbound buffer was drained by the device.
    pub fn release_free_slot(&self) {
        let free = self.free.fetch_add(1, Ordering::SeqCst) + 1;
        trace!("free -> {}", free);
        self.notify();
    }

    /// Outbound buffers filled but not yet completed by the device
    #[inline]
    pub fn pending_outbound(&self) -> usize {
        self.outbound_capacity
            .saturating_sub(self.free.load(Ordering::SeqCst))
    }

    // -------------------------------------------------------------------------
    // Burst tie-break
    // -------------------------------------------------------------------------

    /// Try to become the single starter of the next burst (`Idle -> Starting`).
    pub fn try_begin_transfer(&self) -> bool {
        self.transfer
            .compare_exchange(
                TransferState::Idle as u8,
                TransferState::Starting as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// The burst was programmed (`Starting -> Running`)
    pub fn mark_transfer_running(&self) {
        self.transfer
            .store(TransferState::Running as u8, Ordering::SeqCst);
    }

    /// Starting the burst failed (`-> Idle`)
    pub fn abort_transfer(&self) {
        self.transfer.store(TransferState::Idle as u8, Ordering::SeqCst);
    }

    /// The running burst completed (`Running -> Idle`).
    ///
    /// Returns `false` if no burst was running.
    pub fn finish_transfer(&self) -> bool {
        self.transfer
            .compare_exchange(
                TransferState::Running as u8,
                TransferState::Idle as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// Current burst state
    #[inline]
    pub fn transfer_state(&self) -> TransferState {
        TransferState::from_raw(self.transfer.load(Ordering::SeqCst))
    }

    // -------------------------------------------------------------------------
    // Snapshots
    // -------------------------------------------------------------------------

    /// Inbound buffers ready to read
    #[inline]
    pub fn ready(&self) -> usize {
        self.ready.load(Ordering::SeqCst)
    }

    /// Free outbound slots
    #[inline]
    pub fn free(&self) -> usize {
        self.free.load(Ordering::SeqCst)
    }

    /// Inbound slots the device may still fill
    #[inline]
    pub fn inbound_free(&self) -> usize {
        self.inbound_free.load(Ordering::SeqCst)
    }

    /// Inbound ring capacity
    #[inline]
    pub const fn inbound_capacity(&self) -> usize {
        self.inbound_capacity
    }

    /// Outbound ring capacity
    #[inline]
    pub const fn outbound_capacity(&self) -> usize {
        self.outbound_capacity
    }

    // -------------------------------------------------------------------------
    // Waiting
    // -------------------------------------------------------------------------

    /// Wake every blocked waiter (and async task) so it re-checks its
    /// condition and cancel token.
    pub fn wake_all(&self) {
        self.notify();
    }

    /// Register the task to wake when inbound data may be available
    #[cfg(feature = "async")]
    pub fn register_read_waker(&self, waker: &core::task::Waker) {
        self.read_waker.register(waker);
    }

    /// Register the task to wake when an outbound slot may be free
    #[cfg(feature = "async")]
    pub fn register_write_waker(&self, waker: &core::task::Waker) {
        self.write_waker.register(waker);
    }

    fn notify(&self) {
        {
            let _event = self.event.lock().unwrap_or_else(PoisonError::into_inner);
            self.changed.notify_all();
        }
        #[cfg(feature = "async")]
        {
            self.read_waker.wake();
            self.write_waker.wake();
        }
    }

    fn wait_for<T>(&self, wait: Wait<'_>, mut attempt: impl FnMut() -> Option<T>) -> IoResult<T> {
        if let Some(value) = attempt() {
            return Ok(value);
        }

        let (cancel, timeout) = match wait {
            Wait::Poll => return Err(IoError::WouldBlock),
            Wait::Block { cancel, timeout } => (cancel, timeout),
        };
        let deadline = timeout.map(|timeout| Instant::now() + timeout);

        let mut event = self.event.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if cancel.take() {
                return Err(IoError::Cancelled);
            }
            if let Some(value) = attempt() {
                return Ok(value);
            }

            event = match deadline {
                None => self
                    .changed
                    .wait(event)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(IoError::Timeout);
                    }
                    self.changed
                        .wait_timeout(event, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }
}

impl fmt::Debug for FlowControlGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowControlGate")
            .field("ready", &self.ready())
            .field("free", &self.free())
            .field("inbound_free", &self.inbound_free())
            .field("transfer", &self.transfer_state())
            .field("exclusive", &self.is_exclusive_held())
            .finish_non_exhaustive()
    }
}

/// Exclusive access token; released on drop.
#[derive(Debug)]
#[must_use = "exclusive access is released as soon as the guard is dropped"]
pub struct ExclusiveGuard<'a> {
    gate: &'a FlowControlGate,
}

impl Drop for ExclusiveGuard<'_> {
    fn drop(&mut self) {
        self.gate.exclusive.store(false, Ordering::SeqCst);
        if self.gate.exclusive_contended.swap(false, Ordering::SeqCst) {
            self.gate.notify();
        }
    }
}

/// Decrement `counter` if it is positive, returning the previous value.
fn decrement(counter: &AtomicUsize) -> Option<usize> {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .ok()
}

// =============================================================================
// Tests
// =============================================================================
