//! Streaming DMA device context.
//!
//! [`StreamDevice`] owns everything one device needs: the register block,
//! the DMA mapper, both buffer rings and the flow-control gate. It is
//! shared behind an [`Arc`] by every open handle and by whatever delivers
//! interrupts.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_hal::delay::DelayNs;

use super::config::DeviceConfig;
use super::error::Result;
use super::handle::DeviceHandle;
use super::stats::{DeviceStats, StatsCounters};
use crate::hal::{DmaMapper, RegisterBus};
use crate::internal::dma::{BufferRing, Cursor, Direction};
use crate::internal::fmt::debug;
use crate::internal::register::DCSR2_MASK_WRITE_REQ;
use crate::internal::register::csr::DeviceRegs;
use crate::sync::gate::{FlowControlGate, TransferState};

/// An outbound buffer currently owned by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BurstMapping {
    pub(crate) index: usize,
    pub(crate) address: u32,
    pub(crate) length: u32,
}

/// A streaming DMA device with its buffer rings.
///
/// # Type Parameters
///
/// * `B` - Register bus over the device's BAR0 window
/// * `M` - Mapper producing device-visible addresses for outbound buffers
/// * `D` - Delay used for the reset hold during (re)configuration
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use pcie_stream_dma::{DeviceConfig, StreamDevice};
/// use pcie_stream_dma::hal::MmioBus;
///
/// let bus = unsafe { MmioBus::new(bar0, bar0_len) };
/// let device = Arc::new(StreamDevice::new(bus, mapper, delay, DeviceConfig::new())?);
///
/// // From the interrupt path
/// device.notify_read_completed(index, length)?;
///
/// // From application threads
/// let mut handle = device.open();
/// handle.write(b"hello")?;
/// ```
pub struct StreamDevice<B, M, D> {
    pub(super) regs: DeviceRegs<B>,
    pub(super) mapper: M,
    pub(super) delay: Mutex<D>,
    pub(super) config: DeviceConfig,
    pub(super) inbound: BufferRing,
    pub(super) outbound: BufferRing,
    pub(super) gate: Arc<FlowControlGate>,
    /// Burst handed to the device, taken back on completion
    pub(super) active_burst: Mutex<Option<BurstMapping>>,
    /// Serializes inbound completions
    pub(super) inbound_completion: Mutex<()>,
    /// Serializes read-modify-writes of the write-request mask bit
    pub(super) mask_lock: Mutex<()>,
    pub(super) stats: StatsCounters,
}

impl<B, M, D> StreamDevice<B, M, D>
where
    B: RegisterBus,
    M: DmaMapper,
    D: DelayNs,
{
    /// Allocate both rings and bring the device up.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`](super::error::Error::Config) if `config` fails
    ///   [`DeviceConfig::validate`]; nothing is allocated
    /// - [`Error::Alloc`](super::error::Error::Alloc) if a ring cannot be
    ///   allocated; everything allocated so far is released
    /// - [`Error::Device`](super::error::Error::Device) if the configure
    ///   sequence fails on the bus
    pub fn new(bus: B, mapper: M, mut delay: D, config: DeviceConfig) -> Result<Self> {
        config.validate()?;

        let inbound = BufferRing::allocate(
            Direction::Inbound,
            config.inbound_buffers,
            config.inbound_buffer_size,
        )?;
        let outbound = BufferRing::allocate(
            Direction::Outbound,
            config.outbound_buffers,
            config.outbound_buffer_size,
        )?;
        debug!(
            "rings allocated: {} x {} inbound, {} x {} outbound",
            config.inbound_buffers,
            config.inbound_buffer_size,
            config.outbound_buffers,
            config.outbound_buffer_size
        );

        let regs = DeviceRegs::new(bus);
        regs.configure(&mut delay, config.max_transfer_size, config.reset_hold_us)?;

        Ok(Self {
            regs,
            mapper,
            delay: Mutex::new(delay),
            gate: Arc::new(FlowControlGate::new(inbound.capacity(), outbound.capacity())),
            inbound,
            outbound,
            config,
            active_burst: Mutex::new(None),
            inbound_completion: Mutex::new(()),
            mask_lock: Mutex::new(()),
            stats: StatsCounters::default(),
        })
    }

    /// Open a new handle on the device.
    ///
    /// Handles are independent callers; the gate lets one of them into
    /// read, write or control at a time.
    pub fn open(self: &Arc<Self>) -> DeviceHandle<B, M, D> {
        DeviceHandle::new(Arc::clone(self))
    }

    /// Re-run the configure sequence without touching the rings.
    ///
    /// Configure leaves the write request unmasked; the mask is put back
    /// if the inbound ring is still full.
    pub(super) fn reconfigure(&self) -> Result<()> {
        let _mask = lock(&self.mask_lock);
        let mut delay = lock(&self.delay);
        self.regs.configure(
            &mut *delay,
            self.config.max_transfer_size,
            self.config.reset_hold_us,
        )?;
        if self.gate.inbound_free() == 0 {
            self.regs.set_interrupt_mask(DCSR2_MASK_WRITE_REQ, true)?;
            debug!("write request re-masked after reset: inbound ring full");
        }
        Ok(())
    }
}

impl<B, M, D> StreamDevice<B, M, D> {
    /// Configuration the device was created with
    #[inline]
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Snapshot of the transfer counters
    pub fn stats(&self) -> DeviceStats {
        self.stats.snapshot()
    }

    /// Inbound buffers waiting to be read
    #[inline]
    pub fn ready_to_read(&self) -> usize {
        self.gate.ready()
    }

    /// Outbound slots available to writers
    #[inline]
    pub fn free_to_write(&self) -> usize {
        self.gate.free()
    }

    /// Outbound buffers queued or in flight
    #[inline]
    pub fn pending_writes(&self) -> usize {
        self.gate.pending_outbound()
    }

    /// Current outbound burst state
    #[inline]
    pub fn transfer_state(&self) -> TransferState {
        self.gate.transfer_state()
    }

    /// Index the device must fill next in the inbound ring
    #[inline]
    pub fn next_inbound_index(&self) -> usize {
        self.inbound.index(Cursor::Producer)
    }

    #[inline]
    pub(crate) fn gate(&self) -> &FlowControlGate {
        &self.gate
    }

    pub(crate) fn gate_arc(&self) -> Arc<FlowControlGate> {
        Arc::clone(&self.gate)
    }
}

impl<B, M, D> core::fmt::Debug for StreamDevice<B, M, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StreamDevice")
            .field("config", &self.config)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked
pub(super) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::error::{AllocationError, ConfigError, DeviceError, Error};
    use crate::internal::register::{
        DCSR0_OFFSET, DCSR1_OFFSET, DCSR2_EN_WRITE_REQ, DCSR2_OFFSET, DMA_TRANS_MAX_SIZE_OFFSET,
    };
    use crate::testing::{MockBus, MockDelay, MockMapper, fixture};

    #[test]
    fn new_configures_device() {
        let bus = Arc::new(MockBus::new());
        let delay = MockDelay::new();
        let config = DeviceConfig::new()
            .with_inbound_buffers(2)
            .with_outbound_buffers(2)
            .with_inbound_buffer_size(64)
            .with_outbound_buffer_size(64)
            .with_max_transfer_size(64)
            .with_reset_hold_us(7);

        let device = StreamDevice::new(bus.clone(), MockMapper::new(), delay.clone(), config).unwrap();

        assert_eq!(bus.writes_to(DCSR0_OFFSET).len(), 2);
        assert_ne!(bus.register(DCSR1_OFFSET), 0);
        assert_eq!(bus.register(DCSR2_OFFSET), DCSR2_EN_WRITE_REQ);
        assert_eq!(bus.register(DMA_TRANS_MAX_SIZE_OFFSET), 64);
        assert_eq!(delay.total_ns(), 7_000);
        assert_eq!(device.ready_to_read(), 0);
        assert_eq!(device.free_to_write(), 2);
        assert_eq!(device.transfer_state(), TransferState::Idle);
    }

    #[test]
    fn invalid_config_touches_nothing() {
        let bus = Arc::new(MockBus::new());
        let result = StreamDevice::new(
            bus.clone(),
            MockMapper::new(),
            MockDelay::new(),
            DeviceConfig::new().with_outbound_buffers(0),
        );

        assert_eq!(result.unwrap_err(), Error::Config(ConfigError::InvalidPoolSize));
        assert!(bus.writes().is_empty());
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn allocation_failure_is_fatal() {
        let bus = Arc::new(MockBus::new());
        let config = DeviceConfig::new()
            .with_inbound_buffers(usize::MAX / 2)
            .with_inbound_buffer_size(16)
            .with_outbound_buffer_size(16)
            .with_max_transfer_size(16);

        let result = StreamDevice::new(bus.clone(), MockMapper::new(), MockDelay::new(), config);

        assert_eq!(result.unwrap_err(), Error::Alloc(AllocationError::OutOfMemory));
        assert!(bus.writes().is_empty());
    }

    #[test]
    fn configure_failure_is_reported() {
        let bus = Arc::new(MockBus::new());
        bus.fail_writes(true);
        let result = StreamDevice::new(
            bus,
            MockMapper::new(),
            MockDelay::new(),
            DeviceConfig::new().with_inbound_buffer_size(16),
        );
        assert_eq!(result.unwrap_err(), Error::Device(DeviceError::RegisterIo));
    }

    #[test]
    fn reconfigure_repeats_bring_up() {
        let f = fixture(2, 32);
        f.device.reconfigure().unwrap();
        assert_eq!(f.bus.writes().len(), 5);
    }

    #[test]
    fn reconfigure_keeps_full_ring_masked() {
        let f = fixture(2, 16);
        f.device.deliver_inbound(b"a").unwrap();
        f.device.deliver_inbound(b"b").unwrap();

        f.device.reconfigure().unwrap();
        assert_eq!(
            f.bus.register(DCSR2_OFFSET),
            DCSR2_EN_WRITE_REQ | DCSR2_MASK_WRITE_REQ
        );

        // Draining still unmasks through the armed token
        let mut buffer = [0u8; 16];
        f.device.open().try_read(&mut buffer).unwrap();
        assert_eq!(f.bus.register(DCSR2_OFFSET), DCSR2_EN_WRITE_REQ);
    }

    #[test]
    fn reconfigure_with_free_slots_leaves_unmasked() {
        let f = fixture(2, 16);
        f.device.deliver_inbound(b"a").unwrap();

        f.device.reconfigure().unwrap();
        assert_eq!(f.bus.register(DCSR2_OFFSET), DCSR2_EN_WRITE_REQ);
    }

    #[test]
    fn fresh_device_exposes_ring_state() {
        let f = fixture(3, 16);
        assert_eq!(f.device.config().inbound_buffers, 3);
        assert_eq!(f.device.next_inbound_index(), 0);
        assert_eq!(f.device.pending_writes(), 0);
        assert_eq!(f.device.stats(), DeviceStats::default());
    }
}
