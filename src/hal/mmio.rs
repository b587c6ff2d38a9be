//! Volatile MMIO register bus
//!
//! Wraps a mapped BAR window (e.g. from `mmap` of a UIO/VFIO resource file)
//! and performs bounds- and alignment-checked volatile 32-bit accesses.

use core::ptr::NonNull;

use super::RegisterBus;
use crate::driver::error::{DeviceError, DeviceResult};

/// Register bus backed by a memory-mapped BAR window.
#[derive(Debug)]
pub struct MmioBus {
    base: NonNull<u8>,
    len: usize,
}

impl MmioBus {
    /// Create a bus over `len` bytes of register space starting at `base`.
    ///
    /// # Safety
    ///
    /// `base` must point to a mapping of at least `len` bytes that stays
    /// valid for the lifetime of the bus and tolerates volatile 32-bit
    /// accesses at every 4-byte aligned offset.
    pub unsafe fn new(base: NonNull<u8>, len: usize) -> Self {
        Self { base, len }
    }

    /// Size of the register window in bytes
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the register window is empty
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn register(&self, offset: usize) -> DeviceResult<*mut u32> {
        let in_bounds = offset
            .checked_add(core::mem::size_of::<u32>())
            .is_some_and(|end| end <= self.len);
        if offset % 4 != 0 || !in_bounds {
            return Err(DeviceError::RegisterIo);
        }
        // SAFETY: offset + 4 <= len, which the constructor contract covers.
        Ok(unsafe { self.base.as_ptr().add(offset) }.cast::<u32>())
    }
}

impl RegisterBus for MmioBus {
    #[inline]
    fn read32(&self, offset: usize) -> DeviceResult<u32> {
        let reg = self.register(offset)?;
        // SAFETY: `reg` is aligned and inside the mapped window.
        Ok(unsafe { core::ptr::read_volatile(reg) })
    }

    #[inline]
    fn write32(&self, offset: usize, value: u32) -> DeviceResult<()> {
        let reg = self.register(offset)?;
        // SAFETY: `reg` is aligned and inside the mapped window.
        unsafe { core::ptr::write_volatile(reg, value) };
        Ok(())
    }
}

// SAFETY: the bus holds no CPU-side state; every access is a single
// volatile load or store to device memory.
unsafe impl Send for MmioBus {}
// SAFETY: see above.
unsafe impl Sync for MmioBus {}
