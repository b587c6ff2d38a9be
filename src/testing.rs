//! Testing utilities and mock implementations
//!
//! This module provides mock implementations for testing the DMA core
//! on the host without hardware access.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::vec::Vec;

use crate::driver::config::DeviceConfig;
use crate::driver::device::StreamDevice;
use crate::driver::error::{DeviceError, DeviceResult};
use crate::hal::{DmaDirection, DmaMapper, RegisterBus};

// =============================================================================
// Mock Register Bus
// =============================================================================

/// Mock register bus for testing without hardware
///
/// Registers default to zero. Every write is logged so tests can verify
/// the exact register sequence.
///
/// # Example
///
/// ```ignore
/// let bus = MockBus::new();
/// bus.set_register(DCSR2_OFFSET, DCSR2_EN_WRITE_REQ);
///
/// let regs = DeviceRegs::new(bus);
/// regs.set_interrupt_mask(DCSR2_MASK_WRITE_REQ, true).unwrap();
/// ```
#[derive(Debug, Default)]
pub struct MockBus {
    /// Register values: offset -> value
    registers: Mutex<HashMap<usize, u32>>,
    /// Record of writes: (offset, value)
    write_log: Mutex<Vec<(usize, u32)>>,
    /// Whether reads should fail
    fail_reads: AtomicBool,
    /// Whether writes should fail
    fail_writes: AtomicBool,
}

impl MockBus {
    /// Create a new mock bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a register value without logging a write
    pub fn set_register(&self, offset: usize, value: u32) {
        self.registers.lock().unwrap().insert(offset, value);
    }

    /// Get the current value of a register
    pub fn register(&self, offset: usize) -> u32 {
        self.registers
            .lock()
            .unwrap()
            .get(&offset)
            .copied()
            .unwrap_or(0)
    }

    /// Get all writes that have been made
    pub fn writes(&self) -> Vec<(usize, u32)> {
        self.write_log.lock().unwrap().clone()
    }

    /// Get all writes made to one register
    pub fn writes_to(&self, offset: usize) -> Vec<u32> {
        self.writes()
            .into_iter()
            .filter(|(o, _)| *o == offset)
            .map(|(_, v)| v)
            .collect()
    }

    /// Clear the write log
    pub fn clear_writes(&self) {
        self.write_log.lock().unwrap().clear();
    }

    /// Copy of the whole register map
    pub fn snapshot(&self) -> HashMap<usize, u32> {
        self.registers.lock().unwrap().clone()
    }

    /// Make subsequent reads fail
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent writes fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl RegisterBus for MockBus {
    fn read32(&self, offset: usize) -> DeviceResult<u32> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DeviceError::RegisterIo);
        }
        Ok(self.register(offset))
    }

    fn write32(&self, offset: usize, value: u32) -> DeviceResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DeviceError::RegisterIo);
        }
        self.write_log.lock().unwrap().push((offset, value));
        self.registers.lock().unwrap().insert(offset, value);
        Ok(())
    }
}

// =============================================================================
// Mock Delay
// =============================================================================

/// Mock delay for testing without actual timing
///
/// Records delays for verification without actually waiting. Clones share
/// the same counter, so a test can keep one while the device owns another.
#[derive(Debug, Default, Clone)]
pub struct MockDelay {
    /// Total nanoseconds delayed
    total_ns: Arc<AtomicU64>,
}

impl MockDelay {
    /// Create a new mock delay
    pub fn new() -> Self {
        Self::default()
    }

    /// Get total nanoseconds that were "delayed"
    pub fn total_ns(&self) -> u64 {
        self.total_ns.load(Ordering::SeqCst)
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns.fetch_add(ns as u64, Ordering::SeqCst);
    }
}

// =============================================================================
// Mock DMA Mapper
// =============================================================================

/// Mock DMA mapper handing out sequential fake bus addresses
#[derive(Debug)]
pub struct MockMapper {
    next_address: AtomicU32,
    fail: AtomicBool,
    /// Record of mappings: (address, length, direction)
    mapped: Mutex<Vec<(u32, usize, DmaDirection)>>,
    unmapped: AtomicUsize,
}

impl Default for MockMapper {
    fn default() -> Self {
        Self {
            next_address: AtomicU32::new(0x1000_0000),
            fail: AtomicBool::new(false),
            mapped: Mutex::new(Vec::new()),
            unmapped: AtomicUsize::new(0),
        }
    }
}

impl MockMapper {
    /// Create a new mock mapper
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent mappings fail
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// All successful mappings so far
    pub fn mappings(&self) -> Vec<(u32, usize, DmaDirection)> {
        self.mapped.lock().unwrap().clone()
    }

    /// Number of unmap calls
    pub fn unmap_count(&self) -> usize {
        self.unmapped.load(Ordering::SeqCst)
    }
}

impl DmaMapper for MockMapper {
    fn map(&self, buffer: &[u8], direction: DmaDirection) -> DeviceResult<u32> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DeviceError::MappingFailed);
        }
        let address = self.next_address.fetch_add(0x1_0000, Ordering::SeqCst);
        self.mapped
            .lock()
            .unwrap()
            .push((address, buffer.len(), direction));
        Ok(address)
    }

    fn unmap(&self, _address: u32, _length: usize, _direction: DmaDirection) {
        self.unmapped.fetch_add(1, Ordering::SeqCst);
    }
}

// =============================================================================
// Device Fixture
// =============================================================================

/// Device type used throughout the unit tests
pub type TestDevice = StreamDevice<Arc<MockBus>, Arc<MockMapper>, MockDelay>;

/// A device with its mocks still reachable from the test
pub struct Fixture {
    pub device: Arc<TestDevice>,
    pub bus: Arc<MockBus>,
    pub mapper: Arc<MockMapper>,
}

/// Build a configured device with `buffers` per ring of `size` bytes each
pub fn fixture(buffers: usize, size: usize) -> Fixture {
    fixture_with(
        DeviceConfig::new()
            .with_inbound_buffers(buffers)
            .with_outbound_buffers(buffers)
            .with_inbound_buffer_size(size)
            .with_outbound_buffer_size(size)
            .with_max_transfer_size(size as u32),
    )
}

/// Build a configured device from an explicit configuration
pub fn fixture_with(config: DeviceConfig) -> Fixture {
    let bus = Arc::new(MockBus::new());
    let mapper = Arc::new(MockMapper::new());
    let device = StreamDevice::new(bus.clone(), mapper.clone(), MockDelay::new(), config)
        .map(Arc::new)
        .unwrap();
    bus.clear_writes();
    Fixture {
        device,
        bus,
        mapper,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_bus_logs_writes_and_stores_values() {
        let bus = MockBus::new();
        bus.write32(0x04, 1).unwrap();
        bus.write32(0x08, 2).unwrap();

        assert_eq!(bus.writes(), vec![(0x04, 1), (0x08, 2)]);
        assert_eq!(bus.read32(0x08).unwrap(), 2);
        assert_eq!(bus.read32(0x0C).unwrap(), 0);
    }

    #[test]
    fn mock_bus_failure_injection() {
        let bus = MockBus::new();
        bus.fail_reads(true);
        assert_eq!(bus.read32(0), Err(DeviceError::RegisterIo));
        bus.fail_writes(true);
        assert_eq!(bus.write32(0, 1), Err(DeviceError::RegisterIo));
        assert!(bus.writes().is_empty());
    }

    #[test]
    fn mock_mapper_hands_out_distinct_addresses() {
        let mapper = MockMapper::new();
        let a = mapper.map(&[0u8; 4], DmaDirection::ToDevice).unwrap();
        let b = mapper.map(&[0u8; 4], DmaDirection::ToDevice).unwrap();
        assert_ne!(a, b);
        assert_eq!(mapper.mappings().len(), 2);
    }

    #[test]
    fn mock_delay_clones_share_counter() {
        use embedded_hal::delay::DelayNs;

        let delay = MockDelay::new();
        let mut owned = delay.clone();
        owned.delay_us(3);
        assert_eq!(delay.total_ns(), 3_000);
    }
}
