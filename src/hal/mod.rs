//! Hardware Abstraction Layer
//!
//! This module provides the two seams through which the driver touches the
//! hardware, making it possible to run the DMA core against real BAR
//! windows, simulated devices or test mocks alike.
//!
//! # Modules
//!
//! - [`mmio`]: Volatile register access over a mapped BAR window
//! - [`mapping`]: Streaming DMA address mapping for transfer buffers. The
//!   platform supplies the [`DmaMapper`]; [`IdentityMapper`] only suits
//!   simulated devices
//!
//! # Delay Integration
//!
//! Device configuration holds the reset bit for a fixed time using
//! `embedded_hal::delay::DelayNs`. Pass any delay implementation from your
//! platform crate.

pub mod mapping;
pub mod mmio;

// Re-export commonly used types
pub use mapping::{DmaDirection, DmaMapper, IdentityMapper};
pub use mmio::MmioBus;

use crate::driver::error::DeviceResult;

// =============================================================================
// Register Bus Trait
// =============================================================================

/// Trait for 32-bit register access at byte offsets within one BAR.
///
/// This trait can be implemented by different backends, allowing the
/// driver to work with MMIO windows, UIO/VFIO mappings or simulators.
/// Accesses take `&self`: interrupt-side and caller-side code both reach
/// the bus concurrently.
pub trait RegisterBus {
    /// Read the register at `offset`
    fn read32(&self, offset: usize) -> DeviceResult<u32>;

    /// Write `value` to the register at `offset`
    fn write32(&self, offset: usize, value: u32) -> DeviceResult<()>;

    /// Read-modify-write the register at `offset`
    fn modify32<F>(&self, offset: usize, f: F) -> DeviceResult<()>
    where
        F: FnOnce(u32) -> u32,
    {
        let value = self.read32(offset)?;
        self.write32(offset, f(value))
    }
}

impl<T: RegisterBus + ?Sized> RegisterBus for std::sync::Arc<T> {
    #[inline]
    fn read32(&self, offset: usize) -> DeviceResult<u32> {
        (**self).read32(offset)
    }

    #[inline]
    fn write32(&self, offset: usize, value: u32) -> DeviceResult<()> {
        (**self).write32(offset, value)
    }
}
