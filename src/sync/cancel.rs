//! Cancellation of blocking waits.
//!
//! Each [`DeviceHandle`](crate::DeviceHandle) owns a [`CancelToken`]. Any
//! thread holding a [`Canceller`] for that handle can interrupt a read,
//! write or control call blocked inside the flow-control gate.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::gate::FlowControlGate;

/// Pending-cancellation flag shared between a handle and its cancellers.
///
/// The flag is consumed by the wait that observes it, so one
/// [`Canceller::cancel`] interrupts exactly one blocking wait. A flag
/// raised while nothing is blocked cancels the next wait that would block.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token with no cancellation pending
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag without waking anyone
    #[inline]
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check whether a cancellation is pending
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Consume a pending cancellation, returning whether there was one
    #[inline]
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::SeqCst)
    }
}

/// Cloneable handle that cancels the blocking wait of one device handle.
///
/// # Example
///
/// ```ignore
/// let canceller = handle.canceller();
/// std::thread::spawn(move || {
///     std::thread::sleep(Duration::from_millis(100));
///     canceller.cancel();
/// });
///
/// // Returns Err(Error::Io(IoError::Cancelled)) if no data arrives first
/// let result = handle.read(&mut buffer);
/// ```
#[derive(Debug, Clone)]
pub struct Canceller {
    token: CancelToken,
    gate: Arc<FlowControlGate>,
}

impl Canceller {
    pub(crate) fn new(token: CancelToken, gate: Arc<FlowControlGate>) -> Self {
        Self { token, gate }
    }

    /// Cancel the handle's current (or next) blocking wait
    pub fn cancel(&self) {
        self.token.cancel();
        self.gate.wake_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_token_is_not_cancelled() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(!token.take());
    }

    #[test]
    fn take_consumes_cancellation() {
        let token = CancelToken::new();
        token.cancel();
        assert!(token.is_cancelled());
        assert!(token.take());
        assert!(!token.is_cancelled());
        assert!(!token.take());
    }

    #[test]
    fn clones_share_the_flag() {
        let token = CancelToken::new();
        let other = token.clone();
        other.cancel();
        assert!(token.take());
        assert!(!other.is_cancelled());
    }

    #[test]
    fn canceller_raises_token() {
        let token = CancelToken::new();
        let canceller = Canceller::new(token.clone(), Arc::new(FlowControlGate::new(1, 1)));
        canceller.cancel();
        assert!(token.is_cancelled());
    }
}
