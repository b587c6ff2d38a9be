//! Interrupt-side producer API.
//!
//! Whatever receives the device's interrupts (an ISR shim, a UIO/VFIO event
//! loop, a simulated device thread) reports completions through these
//! methods. They never block on readers or writers.
//!
//! # Example
//!
//! ```ignore
//! loop {
//!     match wait_for_irq()? {
//!         Irq::ReadComplete { index, length } => {
//!             device.notify_read_completed(index, length)?;
//!         }
//!         Irq::WriteComplete => device.notify_write_slot_freed()?,
//!     }
//! }
//! ```

use embedded_hal::delay::DelayNs;

use super::device::{StreamDevice, lock};
use super::error::{DeviceError, IoError, Result};
use crate::hal::{DmaMapper, RegisterBus};
use crate::internal::dma::Cursor;
use crate::internal::fmt::{error, trace, warn};

impl<B, M, D> StreamDevice<B, M, D>
where
    B: RegisterBus,
    M: DmaMapper,
    D: DelayNs,
{
    /// The device finished writing `length` bytes into inbound buffer `index`.
    ///
    /// Completions must arrive in ring order: `index` has to equal
    /// [`next_inbound_index`](Self::next_inbound_index). When this fills the
    /// last free inbound buffer the write-request interrupt is masked until
    /// a reader drains one.
    ///
    /// # Errors
    ///
    /// - [`IoError::InvalidArgument`] if `length` is zero or exceeds the
    ///   inbound buffer size
    /// - [`DeviceError::OutOfOrder`] if `index` is not the next buffer
    /// - [`DeviceError::Overrun`] if no inbound buffer was free
    /// - [`DeviceError::RegisterIo`] if masking the interrupt failed; the
    ///   buffer is still published to readers
    pub fn notify_read_completed(&self, index: usize, length: usize) -> Result<()> {
        let _serial = lock(&self.inbound_completion);
        self.check_inbound_length(length)?;

        let expected = self.inbound.index(Cursor::Producer);
        if index != expected {
            warn!("inbound completion for {} while expecting {}", index, expected);
            return Err(DeviceError::OutOfOrder.into());
        }

        self.complete_inbound(index, length)
    }

    /// Copy `payload` into the next inbound buffer and complete it.
    ///
    /// For devices that hand data over by programmed I/O, and for
    /// simulation. Errors as [`notify_read_completed`](Self::notify_read_completed);
    /// nothing is copied when the ring is full.
    pub fn deliver_inbound(&self, payload: &[u8]) -> Result<()> {
        let _serial = lock(&self.inbound_completion);
        self.check_inbound_length(payload.len())?;

        // Only readers raise this while completions are serialized
        if self.gate.inbound_free() == 0 {
            return Err(self.overrun().into());
        }

        let index = self.inbound.index(Cursor::Producer);
        self.inbound.with_descriptor(index, |desc| desc.fill(payload));
        self.complete_inbound(index, payload.len())
    }

    /// The device finished the running outbound burst.
    ///
    /// Releases the buffer to writers and chains the next pending buffer
    /// into a new burst.
    ///
    /// # Errors
    ///
    /// - [`DeviceError::UnexpectedCompletion`] if no burst was running
    /// - [`DeviceError::MappingFailed`] or [`DeviceError::RegisterIo`] if
    ///   the next burst could not be started; the completion itself is
    ///   still accounted and the next write retries
    pub fn notify_write_slot_freed(&self) -> Result<()> {
        let Some(burst) = lock(&self.active_burst).take() else {
            error!("outbound completion without a running burst");
            return Err(DeviceError::UnexpectedCompletion.into());
        };

        self.release_mapping(burst);
        let consumer = self.outbound.index(Cursor::Consumer);
        debug_assert_eq!(consumer, burst.index, "burst completed out of ring order");
        self.outbound.advance(Cursor::Consumer);
        self.gate.release_free_slot();
        self.gate.finish_transfer();
        self.stats.record_write_completion();
        trace!("outbound buffer {} completed", burst.index);

        self.kick_outbound()?;
        Ok(())
    }

    fn check_inbound_length(&self, length: usize) -> Result<()> {
        if length == 0 || length > self.inbound.buffer_size() {
            warn!(
                "inbound completion of {} bytes (buffer size {})",
                length,
                self.inbound.buffer_size()
            );
            return Err(IoError::InvalidArgument.into());
        }
        Ok(())
    }

    fn overrun(&self) -> DeviceError {
        self.stats.record_overrun();
        warn!("inbound overrun: all {} buffers unread", self.inbound.capacity());
        DeviceError::Overrun
    }

    /// Publish the buffer at the producer cursor. Caller holds
    /// `inbound_completion`.
    fn complete_inbound(&self, index: usize, length: usize) -> Result<()> {
        let Some(remaining) = self.gate.claim_inbound_slot() else {
            return Err(self.overrun().into());
        };

        self.inbound
            .with_descriptor(index, |desc| desc.set_data_length(length));
        self.inbound.advance(Cursor::Producer);
        self.gate.publish_ready();
        self.stats.record_read_completion();
        trace!("inbound buffer {} ready ({} bytes)", index, length);

        if remaining == 0 {
            self.mask_write_request()?;
            self.gate.arm_unmask();
            // A reader may have freed a slot before the protocol was armed
            if self.gate.claim_missed_unmask() {
                self.unmask_write_request()?;
            }
        }
        Ok(())
    }
}
