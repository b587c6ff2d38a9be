//! Core driver components for the streaming DMA device.
//!
//! This module contains the building blocks for bringing a device up and
//! moving data through it:
//!
//! - [`config`] - Pool geometry and timing with a builder
//! - [`error`] - Error types and result aliases
//! - [`device`] - The shared device context and its rings
//! - [`handle`] - Per-caller handles with blocking read/write/control
//! - [`interrupt`] - Completion entry points for the interrupt path
//! - [`control`] - Register pass-through and reset requests
//! - [`stats`] - Transfer counters
//!
//! # Example
//!
//! ```ignore
//! use pcie_stream_dma::driver::{DeviceConfig, Error};
//!
//! let config = DeviceConfig::new()
//!     .with_inbound_buffers(16)
//!     .with_wait_timeout_ms(500);
//! ```

// Submodules
pub mod config;
pub mod control;
pub mod device;
pub mod error;
pub mod handle;
pub mod interrupt;
pub mod stats;
mod transfer;

// Re-exports for convenience
pub use config::DeviceConfig;
pub use control::{ControlCommand, DEVICE_RESET, READ_CMD, RegisterAccess, WRITE_CMD};
pub use device::StreamDevice;
pub use error::{
    AllocResult, AllocationError, ConfigError, ConfigResult, DeviceError, DeviceResult, Error,
    IoError, IoResult, Result, TransferError,
};
pub use handle::DeviceHandle;
pub use stats::DeviceStats;
