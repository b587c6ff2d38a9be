//! Register layout for the streaming DMA device
//!
//! This module defines the BAR0 register offsets and bit fields that form
//! the device wire contract, plus accessor macros over a
//! [`RegisterBus`](crate::hal::RegisterBus).

pub mod csr;

// =============================================================================
// Register Offsets
// =============================================================================

/// Device Control/Status Register 0 (reset, bus width, mode)
pub const DCSR0_OFFSET: usize = 0x00;
/// Device Control/Status Register 1 (completion interrupt enables)
pub const DCSR1_OFFSET: usize = 0x04;
/// Device Control/Status Register 2 (write-request interrupt enable/mask)
pub const DCSR2_OFFSET: usize = 0x08;
/// Device Control/Status Register 3 (outbound DMA command)
pub const DCSR3_OFFSET: usize = 0x0C;
/// Maximum DMA transfer size register offset
pub const DMA_TRANS_MAX_SIZE_OFFSET: usize = 0x10;
/// Outbound burst DMA address register offset (low 32 bits)
pub const OUT_DMA_ADDR_LO_OFFSET: usize = 0x14;
/// Outbound burst DMA size register offset
pub const OUT_DMA_SIZE_OFFSET: usize = 0x18;

/// Size of the register window the driver touches
pub const REGISTER_WINDOW_SIZE: usize = 0x1C;

// =============================================================================
// DCSR0 Bits
// =============================================================================

/// Device reset, held while asserted
pub const DCSR0_RESET: u32 = 1 << 0;
/// Bus width select
pub const DCSR0_WIDTH_SELECT: u32 = 1 << 1;
/// Streaming mode select
pub const DCSR0_MODE_SELECT: u32 = 1 << 2;

// =============================================================================
// DCSR1 Bits
// =============================================================================

/// Enable the inbound (device-to-host) completion interrupt
pub const DCSR1_EN_READ_COMPLETE: u32 = 1 << 0;
/// Enable the outbound (host-to-device) completion interrupt
pub const DCSR1_EN_WRITE_COMPLETE: u32 = 1 << 1;

// =============================================================================
// DCSR2 Bits
// =============================================================================

/// Enable the write-request interrupt (device has data for the host)
pub const DCSR2_EN_WRITE_REQ: u32 = 1 << 0;
/// Mask the write-request interrupt (set while no inbound buffer is free)
pub const DCSR2_MASK_WRITE_REQ: u32 = 1 << 1;

// =============================================================================
// DCSR3 Bits
// =============================================================================

/// Start the outbound burst programmed in the address/size registers
pub const DCSR3_OUT_DMA_START: u32 = 1 << 0;

// =============================================================================
// Register Access Macros
// =============================================================================

/// Generate read/write accessor methods for a register on `self.bus`.
///
/// # Example
/// ```ignore
/// impl<B: RegisterBus> DeviceRegs<B> {
///     reg_rw!(dcsr0, set_dcsr0, DCSR0_OFFSET, "Device Control/Status Register 0");
/// }
/// ```
macro_rules! reg_rw {
    ($read_fn:ident, $write_fn:ident, $offset:expr, $doc:expr) => {
        #[doc = concat!("Read ", $doc)]
        #[inline(always)]
        pub fn $read_fn(&self) -> $crate::driver::error::DeviceResult<u32> {
            self.bus.read32($offset)
        }

        #[doc = concat!("Write ", $doc)]
        #[inline(always)]
        pub fn $write_fn(&self, value: u32) -> $crate::driver::error::DeviceResult<()> {
            self.bus.write32($offset, value)
        }
    };
}

/// Generate a write-only accessor for a register on `self.bus`.
///
/// For registers the driver programs but never needs to read back.
macro_rules! reg_wo {
    ($write_fn:ident, $offset:expr, $doc:expr) => {
        #[doc = concat!("Write ", $doc)]
        #[inline(always)]
        pub fn $write_fn(&self, value: u32) -> $crate::driver::error::DeviceResult<()> {
            self.bus.write32($offset, value)
        }
    };
}

// Export macros for use in submodules
pub(crate) use reg_rw;
pub(crate) use reg_wo;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_word_aligned_and_inside_window() {
        let offsets = [
            DCSR0_OFFSET,
            DCSR1_OFFSET,
            DCSR2_OFFSET,
            DCSR3_OFFSET,
            DMA_TRANS_MAX_SIZE_OFFSET,
            OUT_DMA_ADDR_LO_OFFSET,
            OUT_DMA_SIZE_OFFSET,
        ];
        for offset in offsets {
            assert_eq!(offset % 4, 0);
            assert!(offset + 4 <= REGISTER_WINDOW_SIZE);
        }
    }

    #[test]
    fn write_request_enable_and_mask_are_distinct() {
        assert_eq!(DCSR2_EN_WRITE_REQ & DCSR2_MASK_WRITE_REQ, 0);
    }

    #[test]
    fn dcsr0_bits_are_distinct() {
        assert_eq!(DCSR0_RESET & (DCSR0_WIDTH_SELECT | DCSR0_MODE_SELECT), 0);
        assert_eq!(DCSR0_WIDTH_SELECT & DCSR0_MODE_SELECT, 0);
    }
}
