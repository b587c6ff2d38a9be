//! Configuration types for the streaming DMA device

use core::time::Duration;

use super::error::{ConfigError, ConfigResult};
use crate::internal::constants::{
    DEFAULT_INBOUND_BUFFERS, DEFAULT_INBOUND_BUFFER_SIZE, DEFAULT_MAX_TRANSFER_SIZE,
    DEFAULT_OUTBOUND_BUFFERS, DEFAULT_OUTBOUND_BUFFER_SIZE, RESET_HOLD_US,
};

/// Complete device configuration
///
/// Fixed for the lifetime of a [`StreamDevice`](super::device::StreamDevice):
/// ring geometry cannot change once the buffers are allocated.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceConfig {
    /// Number of buffers in the inbound (read) ring
    pub inbound_buffers: usize,
    /// Number of buffers in the outbound (write) ring
    pub outbound_buffers: usize,
    /// Size of each inbound buffer in bytes
    pub inbound_buffer_size: usize,
    /// Size of each outbound buffer in bytes (largest accepted write)
    pub outbound_buffer_size: usize,
    /// Value programmed into the maximum transfer size register
    pub max_transfer_size: u32,
    /// Time the reset bit is held during configuration
    pub reset_hold_us: u32,
    /// Upper bound on each blocking wait, `None` to wait indefinitely
    pub wait_timeout_ms: Option<u32>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceConfig {
    /// Create a new configuration with defaults
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inbound_buffers: DEFAULT_INBOUND_BUFFERS,
            outbound_buffers: DEFAULT_OUTBOUND_BUFFERS,
            inbound_buffer_size: DEFAULT_INBOUND_BUFFER_SIZE,
            outbound_buffer_size: DEFAULT_OUTBOUND_BUFFER_SIZE,
            max_transfer_size: DEFAULT_MAX_TRANSFER_SIZE,
            reset_hold_us: RESET_HOLD_US,
            wait_timeout_ms: None,
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Set the number of inbound buffers
    #[must_use]
    pub const fn with_inbound_buffers(mut self, count: usize) -> Self {
        self.inbound_buffers = count;
        self
    }

    /// Set the number of outbound buffers
    #[must_use]
    pub const fn with_outbound_buffers(mut self, count: usize) -> Self {
        self.outbound_buffers = count;
        self
    }

    /// Set the inbound buffer size
    #[must_use]
    pub const fn with_inbound_buffer_size(mut self, size: usize) -> Self {
        self.inbound_buffer_size = size;
        self
    }

    /// Set the outbound buffer size
    #[must_use]
    pub const fn with_outbound_buffer_size(mut self, size: usize) -> Self {
        self.outbound_buffer_size = size;
        self
    }

    /// Set the maximum transfer size register value
    #[must_use]
    pub const fn with_max_transfer_size(mut self, size: u32) -> Self {
        self.max_transfer_size = size;
        self
    }

    /// Set the reset hold time
    #[must_use]
    pub const fn with_reset_hold_us(mut self, us: u32) -> Self {
        self.reset_hold_us = us;
        self
    }

    /// Bound every blocking wait by `ms` milliseconds
    #[must_use]
    pub const fn with_wait_timeout_ms(mut self, ms: u32) -> Self {
        self.wait_timeout_ms = Some(ms);
        self
    }

    /// Blocking wait bound as a [`Duration`]
    #[must_use]
    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_ms
            .map(|ms| Duration::from_millis(u64::from(ms)))
    }

    /// Check the configuration before anything is allocated.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidPoolSize`] if either ring would be empty
    /// - [`ConfigError::InvalidBufferSize`] if a buffer size is zero or does
    ///   not fit the 32-bit size register
    /// - [`ConfigError::InvalidTransferSize`] if the maximum transfer size
    ///   cannot cover one outbound buffer
    pub fn validate(&self) -> ConfigResult<()> {
        if self.inbound_buffers == 0 || self.outbound_buffers == 0 {
            return Err(ConfigError::InvalidPoolSize);
        }

        let representable = |size: usize| size > 0 && u32::try_from(size).is_ok();
        if !representable(self.inbound_buffer_size) || !representable(self.outbound_buffer_size)
        {
            return Err(ConfigError::InvalidBufferSize);
        }

        if (self.max_transfer_size as usize) < self.outbound_buffer_size {
            return Err(ConfigError::InvalidTransferSize);
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let config = DeviceConfig::new();

        assert_eq!(config.inbound_buffers, DEFAULT_INBOUND_BUFFERS);
        assert_eq!(config.outbound_buffers, DEFAULT_OUTBOUND_BUFFERS);
        assert_eq!(config.inbound_buffer_size, 128 * 1024);
        assert_eq!(config.outbound_buffer_size, 128 * 1024);
        assert_eq!(config.reset_hold_us, RESET_HOLD_US);
        assert_eq!(config.wait_timeout(), None);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn config_default_trait_matches_new() {
        assert_eq!(DeviceConfig::default(), DeviceConfig::new());
    }

    #[test]
    fn builder_sets_fields() {
        let config = DeviceConfig::new()
            .with_inbound_buffers(2)
            .with_outbound_buffers(3)
            .with_inbound_buffer_size(512)
            .with_outbound_buffer_size(256)
            .with_max_transfer_size(1024)
            .with_reset_hold_us(5)
            .with_wait_timeout_ms(250);

        assert_eq!(config.inbound_buffers, 2);
        assert_eq!(config.outbound_buffers, 3);
        assert_eq!(config.inbound_buffer_size, 512);
        assert_eq!(config.outbound_buffer_size, 256);
        assert_eq!(config.max_transfer_size, 1024);
        assert_eq!(config.reset_hold_us, 5);
        assert_eq!(config.wait_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn empty_pool_is_rejected() {
        assert_eq!(
            DeviceConfig::new().with_inbound_buffers(0).validate(),
            Err(ConfigError::InvalidPoolSize)
        );
        assert_eq!(
            DeviceConfig::new().with_outbound_buffers(0).validate(),
            Err(ConfigError::InvalidPoolSize)
        );
    }

    #[test]
    fn zero_buffer_size_is_rejected() {
        assert_eq!(
            DeviceConfig::new().with_inbound_buffer_size(0).validate(),
            Err(ConfigError::InvalidBufferSize)
        );
        assert_eq!(
            DeviceConfig::new().with_outbound_buffer_size(0).validate(),
            Err(ConfigError::InvalidBufferSize)
        );
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn buffer_size_beyond_size_register_is_rejected() {
        let config = DeviceConfig::new().with_inbound_buffer_size(u32::MAX as usize + 1);
        assert_eq!(config.validate(), Err(ConfigError::InvalidBufferSize));
    }

    #[test]
    fn transfer_size_below_buffer_size_is_rejected() {
        let config = DeviceConfig::new()
            .with_outbound_buffer_size(4096)
            .with_max_transfer_size(4095);
        assert_eq!(config.validate(), Err(ConfigError::InvalidTransferSize));
    }
}
