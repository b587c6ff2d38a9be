//! PCIe Streaming DMA Core
//!
//! Buffer rings and blocking read/write flow control for a PCIe device that
//! streams packets in both directions over DMA.
//!
//! The host keeps two rings of fixed-size buffers. The device fills the
//! inbound ring and raises a completion per buffer; readers drain it in
//! order. Writers fill the outbound ring and the driver chains one
//! outbound burst at a time, starting the next from the completion of the
//! previous one.
//!
//! # Architecture
//!
//! The crate is organized into three layers:
//!
//! 1. **Driver Layer** ([`driver`]): The shared [`StreamDevice`], per-caller
//!    [`DeviceHandle`]s and the interrupt-side completion API
//! 2. **Sync Layer** ([`sync`]): The flow-control gate, cancellation and
//!    async wakers
//! 3. **HAL Layer** ([`hal`]): Register bus and DMA address mapping seams
//!
//! ## Flow Control
//!
//! - Readers block while no inbound buffer is ready
//! - Writers block while every outbound buffer is queued or in flight
//! - When the device fills the last free inbound buffer the write-request
//!   interrupt is masked; the next reader to drain a buffer unmasks it
//! - Read, write and control calls are mutually exclusive across handles
//!
//! # Features
//!
//! - `log` (default): Driver diagnostics through the `log` facade
//! - `defmt`: Enable defmt formatting for error and config types
//! - `critical-section`: Enable ISR-safe waker storage
//! - `async`: Enable async/await support with wakers
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use pcie_stream_dma::{DeviceConfig, StreamDevice};
//! use pcie_stream_dma::hal::MmioBus;
//!
//! let config = DeviceConfig::new()
//!     .with_inbound_buffers(16)
//!     .with_outbound_buffers(16)
//!     .with_wait_timeout_ms(1_000);
//!
//! // SAFETY: bar0 maps the device's register window for the program lifetime
//! let bus = unsafe { MmioBus::new(bar0, bar0_len) };
//! // `mapper` implements `DmaMapper` over the platform's DMA API
//! let device = Arc::new(StreamDevice::new(bus, mapper, delay, config)?);
//!
//! // Interrupt side
//! let irq_device = Arc::clone(&device);
//! std::thread::spawn(move || {
//!     while let Some(event) = next_event() {
//!         let _ = match event {
//!             Event::ReadComplete { index, length } => {
//!                 irq_device.notify_read_completed(index, length)
//!             }
//!             Event::WriteComplete => irq_device.notify_write_slot_freed(),
//!         };
//!     }
//! });
//!
//! // Caller side
//! let handle = device.open();
//! handle.write(b"request")?;
//! let mut reply = [0u8; 4096];
//! let n = handle.read(&mut reply)?;
//! ```
//!
//! # Memory Requirements
//!
//! With default configuration (8 inbound and 8 outbound buffers of
//! 128 KiB each) the rings hold 2 MiB, allocated once when the device is
//! created.

#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels live here; thresholds and config are in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements,
    clippy::let_underscore_future
)]

// =============================================================================
// Modules
// =============================================================================

pub mod driver;
pub mod hal;
pub mod sync;

// Internal implementation details (pub(crate) only)
mod internal;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use driver::config::DeviceConfig;
pub use driver::control::{ControlCommand, RegisterAccess};
pub use driver::device::StreamDevice;
pub use driver::error::{
    AllocResult, AllocationError, ConfigError, ConfigResult, DeviceError, DeviceResult, Error,
    IoError, IoResult, Result, TransferError,
};
pub use driver::handle::DeviceHandle;
pub use driver::stats::DeviceStats;
pub use sync::{CancelToken, Canceller, TransferState};

// Re-export async types when async feature is enabled
#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub use sync::asynch::AsyncDeviceExt;

/// Low-level register accessors for advanced use.
///
/// These are intentionally separated from the primary facade. Most users should
/// prefer [`ControlCommand`] through a [`DeviceHandle`], which serializes
/// register access with the data path.
///
/// # Safety
///
/// Direct register access bypasses driver invariants. Touching DCSR2 or
/// DCSR3 behind the driver's back can lose interrupts or start a burst on
/// a buffer the driver does not consider in flight.
pub mod registers {
    pub use crate::internal::register::csr::DeviceRegs;
    pub use crate::internal::register::{
        DCSR0_MODE_SELECT, DCSR0_OFFSET, DCSR0_RESET, DCSR0_WIDTH_SELECT,
        DCSR1_EN_READ_COMPLETE, DCSR1_EN_WRITE_COMPLETE, DCSR1_OFFSET, DCSR2_EN_WRITE_REQ,
        DCSR2_MASK_WRITE_REQ, DCSR2_OFFSET, DCSR3_OFFSET, DCSR3_OUT_DMA_START,
        DMA_TRANS_MAX_SIZE_OFFSET, OUT_DMA_ADDR_LO_OFFSET, OUT_DMA_SIZE_OFFSET,
        REGISTER_WINDOW_SIZE,
    };
}

/// Shared driver constants.
///
/// These are grouped into a dedicated module to keep the top-level facade
/// focused on driver types.
pub mod constants {
    pub use crate::internal::constants::{
        // Buffer counts
        DEFAULT_INBOUND_BUFFERS,
        // Buffer sizes
        DEFAULT_INBOUND_BUFFER_SIZE,
        DEFAULT_MAX_TRANSFER_SIZE,
        DEFAULT_OUTBOUND_BUFFERS,
        DEFAULT_OUTBOUND_BUFFER_SIZE,
        // Timing
        RESET_HOLD_US,
    };
}
