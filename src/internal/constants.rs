//! Centralized Constants
//!
//! This module provides a single source of truth for the default pool
//! geometry and timing values used throughout the driver.
//!
//! # Note
//!
//! Register offsets and bit definitions remain in `internal::register` as
//! they are part of the device wire contract.

// =============================================================================
// Buffer Sizes
// =============================================================================

/// Default size of one inbound (device-to-host) packet buffer
pub const DEFAULT_INBOUND_BUFFER_SIZE: usize = 128 * 1024;

/// Default size of one outbound (host-to-device) packet buffer
pub const DEFAULT_OUTBOUND_BUFFER_SIZE: usize = 128 * 1024;

/// Default value programmed into the maximum transfer size register
pub const DEFAULT_MAX_TRANSFER_SIZE: u32 = 128 * 1024;

// =============================================================================
// Default Buffer Counts
// =============================================================================

/// Default number of inbound buffers in the read ring
pub const DEFAULT_INBOUND_BUFFERS: usize = 8;

/// Default number of outbound buffers in the write ring
pub const DEFAULT_OUTBOUND_BUFFERS: usize = 8;

// =============================================================================
// Timing
// =============================================================================

/// Time the reset bit is held asserted during device configuration
pub const RESET_HOLD_US: u32 = 10;
