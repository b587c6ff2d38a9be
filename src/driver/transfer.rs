//! Read and write paths.
//!
//! The read path drains the inbound ring in order:
//!
//! ```text
//! Idle -> AwaitingData -> Delivering -> MaybeUnmasking -> Idle
//! ```
//!
//! The write path queues one buffer and makes sure a burst is running:
//!
//! ```text
//! Idle -> AwaitingFreeSlot -> Filling -> MaybeStartingDma -> Idle
//! ```
//!
//! Both hold the gate's exclusive token for their whole duration.

use embedded_hal::delay::DelayNs;

use super::device::{BurstMapping, StreamDevice, lock};
use super::error::{DeviceError, DeviceResult, IoError, Result, TransferError};
use crate::hal::{DmaMapper, RegisterBus};
use crate::internal::dma::Cursor;
use crate::internal::fmt::{trace, warn};
use crate::internal::register::DCSR2_MASK_WRITE_REQ;
use crate::sync::gate::Wait;

impl<B, M, D> StreamDevice<B, M, D>
where
    B: RegisterBus,
    M: DmaMapper,
    D: DelayNs,
{
    /// Deliver the oldest inbound buffer into `buffer`.
    pub(crate) fn read_with(&self, buffer: &mut [u8], wait: Wait<'_>) -> Result<usize> {
        let _exclusive = self.gate.acquire_exclusive(wait)?;
        // An earlier unmask may have failed on the bus with slots free.
        if self.gate.claim_missed_unmask() {
            self.unmask_or_log();
        }
        self.gate.wait_until_ready_to_read(wait)?;

        let index = self.inbound.index(Cursor::Consumer);
        let copied = self.inbound.with_descriptor(index, |desc| {
            let payload = desc.payload();
            let target = buffer
                .get_mut(..payload.len())
                .ok_or(TransferError::BufferTooSmall)?;
            target.copy_from_slice(payload);
            Ok::<_, TransferError>(payload.len())
        });

        // The buffer is consumed even when it did not fit
        self.inbound.advance(Cursor::Consumer);
        self.gate.release_inbound_slot();
        if self.gate.signal_buffer_consumed_on_read() {
            self.unmask_or_log();
        }

        match copied {
            Ok(len) => {
                self.stats.record_read(len);
                trace!("read {} bytes from inbound buffer {}", len, index);
            }
            Err(_) => {
                warn!(
                    "inbound buffer {} dropped: caller buffer of {} bytes too small",
                    index,
                    buffer.len()
                );
            }
        }

        Ok(copied?)
    }

    /// Clear the write-request mask from the read path. A bus failure
    /// re-arms the unmask for the next read instead of failing this one.
    fn unmask_or_log(&self) {
        if let Err(e) = self.unmask_write_request() {
            warn!("write request left masked: {}", e);
        }
    }

    /// Queue `data` as one outbound buffer and start a burst if none runs.
    pub(crate) fn write_with(&self, data: &[u8], wait: Wait<'_>) -> Result<usize> {
        if data.is_empty() || data.len() > self.outbound.buffer_size() {
            warn!(
                "rejected write of {} bytes (buffer size {})",
                data.len(),
                self.outbound.buffer_size()
            );
            return Err(IoError::InvalidArgument.into());
        }

        let _exclusive = self.gate.acquire_exclusive(wait)?;
        self.gate.wait_until_free_to_write(wait)?;

        let index = self.outbound.index(Cursor::Producer);
        self.outbound.with_descriptor(index, |desc| desc.fill(data));
        self.outbound.advance(Cursor::Producer);
        let taken = self.gate.take_free_slot();
        debug_assert!(taken, "free slot vanished under exclusive access");

        self.stats.record_write(data.len());
        trace!("queued {} bytes in outbound buffer {}", data.len(), index);

        self.kick_outbound()?;
        Ok(data.len())
    }

    /// Start a burst for the oldest pending outbound buffer, unless one is
    /// already running or being started.
    ///
    /// On failure the transfer state is rolled back and the data stays
    /// queued; the next write or completion retries.
    pub(crate) fn kick_outbound(&self) -> DeviceResult<()> {
        loop {
            if self.gate.pending_outbound() == 0 || !self.gate.try_begin_transfer() {
                return Ok(());
            }
            // A completion may have drained the ring between the check and
            // the tie-break.
            if self.gate.pending_outbound() > 0 {
                break;
            }
            self.gate.abort_transfer();
        }

        let index = self.outbound.index(Cursor::Consumer);
        let mapped = self.outbound.with_descriptor(index, |desc| {
            let length =
                u32::try_from(desc.data_length()).map_err(|_| DeviceError::MappingFailed)?;
            let address = self
                .mapper
                .map(desc.payload(), self.outbound.direction().dma_direction())?;
            Ok::<_, DeviceError>(BurstMapping {
                index,
                address,
                length,
            })
        });
        let burst = match mapped {
            Ok(burst) => burst,
            Err(e) => {
                self.gate.abort_transfer();
                warn!("outbound buffer {} not started: {}", index, e);
                return Err(e);
            }
        };

        self.gate.mark_transfer_running();
        *lock(&self.active_burst) = Some(burst);

        if let Err(e) = self.regs.start_burst(burst.address, burst.length) {
            if let Some(burst) = lock(&self.active_burst).take() {
                self.release_mapping(burst);
            }
            self.gate.abort_transfer();
            warn!("outbound buffer {} not started: {}", index, e);
            return Err(e);
        }

        self.stats.record_burst();
        trace!("burst started for outbound buffer {}", index);
        Ok(())
    }

    pub(super) fn release_mapping(&self, burst: BurstMapping) {
        self.mapper.unmap(
            burst.address,
            burst.length as usize,
            self.outbound.direction().dma_direction(),
        );
    }

    /// Take the posted mask token and clear the write-request mask bit.
    ///
    /// If the register write fails the token is posted again and the
    /// unmask re-armed, so the mask bit is never left set with nobody
    /// holding the token.
    pub(super) fn unmask_write_request(&self) -> DeviceResult<()> {
        if !self.gate.take_mask_token() {
            return Ok(());
        }
        let _mask = lock(&self.mask_lock);
        if let Err(e) = self.regs.set_interrupt_mask(DCSR2_MASK_WRITE_REQ, false) {
            self.gate.arm_unmask();
            return Err(e);
        }
        trace!("write request unmasked");
        Ok(())
    }

    /// Set the write-request mask bit.
    pub(super) fn mask_write_request(&self) -> DeviceResult<()> {
        let _mask = lock(&self.mask_lock);
        self.regs.set_interrupt_mask(DCSR2_MASK_WRITE_REQ, true)?;
        trace!("write request masked");
        Ok(())
    }
}
