//! Device Register Interface
//!
//! Named operations over the BAR0 control/status registers. The transfer
//! core never interprets bit layouts itself; it calls these.

use embedded_hal::delay::DelayNs;

use super::{
    DCSR0_MODE_SELECT, DCSR0_OFFSET, DCSR0_RESET, DCSR0_WIDTH_SELECT, DCSR1_EN_READ_COMPLETE,
    DCSR1_EN_WRITE_COMPLETE, DCSR1_OFFSET, DCSR2_EN_WRITE_REQ, DCSR2_OFFSET, DCSR3_OFFSET,
    DCSR3_OUT_DMA_START, DMA_TRANS_MAX_SIZE_OFFSET, OUT_DMA_ADDR_LO_OFFSET,
    OUT_DMA_SIZE_OFFSET, reg_rw, reg_wo,
};
use crate::driver::error::DeviceResult;
use crate::hal::RegisterBus;
use crate::internal::fmt::debug;

/// Register block of one streaming DMA device.
#[derive(Debug)]
pub struct DeviceRegs<B> {
    bus: B,
}

impl<B: RegisterBus> DeviceRegs<B> {
    /// Wrap a register bus
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Borrow the underlying bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    reg_rw!(dcsr0, set_dcsr0, DCSR0_OFFSET, "Device Control/Status Register 0");
    reg_rw!(dcsr1, set_dcsr1, DCSR1_OFFSET, "Device Control/Status Register 1");
    reg_rw!(dcsr2, set_dcsr2, DCSR2_OFFSET, "Device Control/Status Register 2");
    reg_rw!(
        max_transfer_size,
        set_max_transfer_size,
        DMA_TRANS_MAX_SIZE_OFFSET,
        "maximum DMA transfer size register"
    );
    reg_wo!(set_out_dma_addr, OUT_DMA_ADDR_LO_OFFSET, "outbound DMA address register");
    reg_wo!(set_out_dma_size, OUT_DMA_SIZE_OFFSET, "outbound DMA size register");

    /// Issue the outbound DMA start command, keeping the other DCSR3 bits
    #[inline(always)]
    pub fn start_out_dma(&self) -> DeviceResult<()> {
        self.bus.modify32(DCSR3_OFFSET, |v| v | DCSR3_OUT_DMA_START)
    }

    /// Run the fixed bring-up sequence.
    ///
    /// Asserts reset together with width/mode selection, holds it for
    /// `reset_hold_us`, releases it, enables both completion interrupts and
    /// the write-request interrupt, and programs the maximum transfer size.
    /// Idempotent.
    pub fn configure<D: DelayNs>(
        &self,
        delay: &mut D,
        max_transfer_size: u32,
        reset_hold_us: u32,
    ) -> DeviceResult<()> {
        let mode = DCSR0_WIDTH_SELECT | DCSR0_MODE_SELECT;

        self.set_dcsr0(DCSR0_RESET | mode)?;
        debug!("DCSR0 reset: set {:#x} read {:#x}", DCSR0_RESET | mode, self.dcsr0()?);
        delay.delay_us(reset_hold_us);

        self.set_dcsr0(mode)?;
        debug!("DCSR0 release: set {:#x} read {:#x}", mode, self.dcsr0()?);

        let enables = DCSR1_EN_READ_COMPLETE | DCSR1_EN_WRITE_COMPLETE;
        self.set_dcsr1(enables)?;
        debug!("DCSR1: set {:#x} read {:#x}", enables, self.dcsr1()?);

        self.set_dcsr2(DCSR2_EN_WRITE_REQ)?;
        debug!("DCSR2: set {:#x} read {:#x}", DCSR2_EN_WRITE_REQ, self.dcsr2()?);

        self.set_max_transfer_size(max_transfer_size)?;
        debug!("max transfer size: {:#x}", self.max_transfer_size()?);
        Ok(())
    }

    /// Program and start one outbound burst.
    pub fn start_burst(&self, address: u32, length: u32) -> DeviceResult<()> {
        self.set_out_dma_addr(address)?;
        self.set_out_dma_size(length)?;
        self.start_out_dma()?;
        debug!("outbound burst: addr {:#010x} size {}", address, length);
        Ok(())
    }

    /// Set (`masked = true`) or clear interrupt mask bits in DCSR2.
    pub fn set_interrupt_mask(&self, bits: u32, masked: bool) -> DeviceResult<()> {
        if masked {
            self.bus.modify32(DCSR2_OFFSET, |v| v | bits)
        } else {
            self.bus.modify32(DCSR2_OFFSET, |v| v & !bits)
        }
    }

    /// Raw register read (control channel pass-through)
    #[inline]
    pub fn read_register(&self, offset: usize) -> DeviceResult<u32> {
        self.bus.read32(offset)
    }

    /// Raw register write (control channel pass-through)
    #[inline]
    pub fn write_register(&self, offset: usize, value: u32) -> DeviceResult<()> {
        self.bus.write32(offset, value)
    }
}
