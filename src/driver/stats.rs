//! Transfer statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the device's transfer counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceStats {
    /// Bytes delivered to readers
    pub bytes_read: u64,
    /// Buffers delivered to readers
    pub buffers_read: u64,
    /// Bytes accepted from writers
    pub bytes_written: u64,
    /// Buffers accepted from writers
    pub buffers_written: u64,
    /// Outbound bursts programmed into the device
    pub bursts_started: u64,
    /// Outbound completions handled
    pub write_completions: u64,
    /// Inbound completions handled
    pub read_completions: u64,
    /// Inbound completions rejected because the ring was full
    pub overruns: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    bytes_read: AtomicU64,
    buffers_read: AtomicU64,
    bytes_written: AtomicU64,
    buffers_written: AtomicU64,
    bursts_started: AtomicU64,
    write_completions: AtomicU64,
    read_completions: AtomicU64,
    overruns: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record_read(&self, bytes: usize) {
        self.bytes_read.fetch_add(bytes as u64, Ordering::Relaxed);
        self.buffers_read.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write(&self, bytes: usize) {
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
        self.buffers_written.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_burst(&self) {
        self.bursts_started.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write_completion(&self) {
        self.write_completions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_read_completion(&self) {
        self.read_completions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_overrun(&self) {
        self.overruns.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> DeviceStats {
        DeviceStats {
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            buffers_read: self.buffers_read.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            buffers_written: self.buffers_written.load(Ordering::Relaxed),
            bursts_started: self.bursts_started.load(Ordering::Relaxed),
            write_completions: self.write_completions.load(Ordering::Relaxed),
            read_completions: self.read_completions.load(Ordering::Relaxed),
            overruns: self.overruns.load(Ordering::Relaxed),
        }
    }
}
