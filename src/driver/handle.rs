//! Per-caller device handles.

use std::sync::Arc;

use embedded_hal::delay::DelayNs;

use super::control::ControlCommand;
use super::device::StreamDevice;
use super::error::Result;
use crate::hal::{DmaMapper, RegisterBus};
use crate::sync::cancel::{CancelToken, Canceller};
use crate::sync::gate::Wait;

/// An open handle on a [`StreamDevice`].
///
/// Blocking calls wait for the gate's exclusive token and then for data
/// (reads) or a free slot (writes). Each wait is bounded by the device's
/// configured timeout, if any, and can be interrupted through
/// [`canceller`](Self::canceller).
pub struct DeviceHandle<B, M, D> {
    device: Arc<StreamDevice<B, M, D>>,
    cancel: CancelToken,
}

impl<B, M, D> DeviceHandle<B, M, D>
where
    B: RegisterBus,
    M: DmaMapper,
    D: DelayNs,
{
    pub(crate) fn new(device: Arc<StreamDevice<B, M, D>>) -> Self {
        Self {
            device,
            cancel: CancelToken::new(),
        }
    }

    /// Read the oldest inbound buffer, blocking until one is ready.
    ///
    /// Returns the number of bytes copied into `buffer`.
    ///
    /// # Errors
    ///
    /// - [`IoError::Cancelled`](super::error::IoError::Cancelled) or
    ///   [`IoError::Timeout`](super::error::IoError::Timeout) while waiting;
    ///   nothing is consumed
    /// - [`TransferError::BufferTooSmall`](super::error::TransferError::BufferTooSmall)
    ///   if the payload does not fit; the payload is dropped
    ///
    /// A failure to re-enable the write request is logged and retried by
    /// the next read; it never costs the caller the delivered data.
    pub fn read(&self, buffer: &mut [u8]) -> Result<usize> {
        self.device.read_with(buffer, self.blocking())
    }

    /// Read without blocking; fails with `WouldBlock` if nothing is ready
    /// or another caller holds the device.
    pub fn try_read(&self, buffer: &mut [u8]) -> Result<usize> {
        self.device.read_with(buffer, Wait::Poll)
    }

    /// Queue `data` as one outbound buffer, blocking until a slot is free.
    ///
    /// Writes are all-or-nothing: on success the whole of `data` is queued
    /// and its length returned.
    ///
    /// # Errors
    ///
    /// - [`IoError::InvalidArgument`](super::error::IoError::InvalidArgument)
    ///   if `data` is empty or larger than one outbound buffer
    /// - [`IoError::Cancelled`](super::error::IoError::Cancelled) or
    ///   [`IoError::Timeout`](super::error::IoError::Timeout) while waiting
    /// - [`DeviceError::MappingFailed`](super::error::DeviceError::MappingFailed)
    ///   or [`DeviceError::RegisterIo`](super::error::DeviceError::RegisterIo)
    ///   if the burst could not be started; the data stays queued
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        self.device.write_with(data, self.blocking())
    }

    /// Write without blocking; fails with `WouldBlock` if no slot is free
    /// or another caller holds the device.
    pub fn try_write(&self, data: &[u8]) -> Result<usize> {
        self.device.write_with(data, Wait::Poll)
    }

    /// Execute a control request, blocking for exclusive access.
    pub fn control(&self, command: ControlCommand) -> Result<Option<u32>> {
        self.device.control_with(command, self.blocking())
    }

    /// A canceller interrupting this handle's blocking calls
    pub fn canceller(&self) -> Canceller {
        Canceller::new(self.cancel.clone(), self.device.gate_arc())
    }

    /// The device this handle is bound to
    #[inline]
    pub fn device(&self) -> &Arc<StreamDevice<B, M, D>> {
        &self.device
    }

    /// Close the handle.
    ///
    /// Equivalent to dropping it; the device and its queued data stay.
    pub fn close(self) {}

    fn blocking(&self) -> Wait<'_> {
        Wait::Block {
            cancel: &self.cancel,
            timeout: self.device.config.wait_timeout(),
        }
    }
}

impl<B, M, D> core::fmt::Debug for DeviceHandle<B, M, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DeviceHandle")
            .field("device", &self.device)
            .field("cancel", &self.cancel)
            .finish()
    }
}
