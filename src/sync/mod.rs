//! Synchronization and Concurrency Support
//!
//! This module coordinates blocking callers with the interrupt side of the
//! DMA core. It includes:
//!
//! - **Gate** (`gate`): Flow-control counters, the burst tie-break, the
//!   exclusive access token and the write-request unmask protocol
//!   - [`FlowControlGate`] - Shared by both transfer directions
//!   - [`Wait`] - Blocking (cancellable, optional timeout) or poll
//!
//! - **Cancellation** (`cancel`): Interrupting blocked calls
//!   - [`CancelToken`], [`Canceller`]
//!
//! - **Primitives** (`primitives`): Interrupt-safe waker storage
//!   - [`AtomicWaker`] - Async waker storage for completions
//!
//! - **Async Support** (`asynch`): Futures over device handles
//!   - [`AsyncDeviceExt`] - Extension trait adding async methods to handles
//!   - [`ReadFuture`], [`WriteFuture`] - Futures for async I/O
//!
//! # Feature Flags
//!
//! - `critical-section`: Enables `primitives`
//! - `async`: Enables `asynch` module (also requires `critical-section`)

pub mod cancel;
pub mod gate;

pub use cancel::{CancelToken, Canceller};
pub use gate::{ExclusiveGuard, FlowControlGate, TransferState, Wait};

// Primitives module (requires critical-section)
#[cfg(feature = "critical-section")]
mod primitives;

#[cfg(feature = "critical-section")]
pub use primitives::AtomicWaker;

// Async support (requires async feature)
#[cfg(feature = "async")]
pub mod asynch;

#[cfg(feature = "async")]
pub use asynch::{AsyncDeviceExt, ReadFuture, WriteFuture};
