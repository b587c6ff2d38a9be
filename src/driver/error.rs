//! Error types for the streaming DMA driver
//!
//! Errors are organized by domain for better diagnostics:
//! - [`IoError`]: Per-call argument, cancellation and blocking outcomes
//! - [`AllocationError`]: Buffer ring construction failures
//! - [`ConfigError`]: Rejected device configuration
//! - [`DeviceError`]: DMA mapping and register access failures
//! - [`TransferError`]: Data delivery failures on the read path
//!
//! The unified [`Error`] enum wraps all domain errors and is returned
//! by most driver methods.

// =============================================================================
// I/O Errors
// =============================================================================

/// Per-call errors raised by read, write and control requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoError {
    /// Zero-length or oversized write, or malformed control request
    InvalidArgument,
    /// Blocking wait interrupted by the caller's cancel token
    Cancelled,
    /// Blocking wait exceeded the configured timeout
    Timeout,
    /// Non-blocking call could not proceed immediately
    WouldBlock,
}

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IoError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            IoError::InvalidArgument => "invalid argument",
            IoError::Cancelled => "wait cancelled",
            IoError::Timeout => "operation timed out",
            IoError::WouldBlock => "operation would block",
        }
    }
}

// =============================================================================
// Allocation Errors
// =============================================================================

/// Buffer ring allocation errors
///
/// These are fatal to device creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AllocationError {
    /// A descriptor arena or backing buffer could not be obtained
    OutOfMemory,
}

impl core::fmt::Display for AllocationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AllocationError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            AllocationError::OutOfMemory => "out of memory",
        }
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration errors, detected before anything is allocated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Ring pool size must be at least one buffer
    InvalidPoolSize,
    /// Buffer size must be non-zero and representable in the size register
    InvalidBufferSize,
    /// Maximum transfer size must cover one outbound buffer
    InvalidTransferSize,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::InvalidPoolSize => "invalid buffer pool size",
            ConfigError::InvalidBufferSize => "invalid buffer size",
            ConfigError::InvalidTransferSize => "invalid maximum transfer size",
        }
    }
}

// =============================================================================
// Device Errors
// =============================================================================

/// DMA mapping, register access and interrupt-side protocol errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceError {
    /// Buffer could not be mapped to a device-visible DMA address
    MappingFailed,
    /// Register read or write failed (bad offset, bus fault)
    RegisterIo,
    /// Device completed an inbound buffer while none was free
    Overrun,
    /// Completion reported for a buffer other than the next in ring order
    OutOfOrder,
    /// Outbound completion reported while no burst was running
    UnexpectedCompletion,
}

impl core::fmt::Display for DeviceError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DeviceError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DeviceError::MappingFailed => "DMA mapping failed",
            DeviceError::RegisterIo => "register access failed",
            DeviceError::Overrun => "inbound ring overrun",
            DeviceError::OutOfOrder => "completion out of ring order",
            DeviceError::UnexpectedCompletion => "completion without running burst",
        }
    }
}

// =============================================================================
// Transfer Errors
// =============================================================================

/// Read path delivery errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferError {
    /// Caller's buffer is smaller than the delivered payload.
    ///
    /// The payload is consumed from the ring regardless.
    BufferTooSmall,
}

impl core::fmt::Display for TransferError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TransferError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransferError::BufferTooSmall => "buffer too small for payload",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// Match on the inner domain error for specific handling:
/// ```ignore
/// match handle.read(&mut buf) {
///     Err(Error::Io(IoError::Cancelled)) => { /* ... */ }
///     Err(Error::Transfer(TransferError::BufferTooSmall)) => { /* ... */ }
///     Err(Error::Device(DeviceError::RegisterIo)) => { /* ... */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// I/O error
    Io(IoError),
    /// Allocation error
    Alloc(AllocationError),
    /// Configuration error
    Config(ConfigError),
    /// Device error
    Device(DeviceError),
    /// Transfer error
    Transfer(TransferError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io: {}", e.as_str()),
            Error::Alloc(e) => write!(f, "alloc: {}", e.as_str()),
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Device(e) => write!(f, "device: {}", e.as_str()),
            Error::Transfer(e) => write!(f, "transfer: {}", e.as_str()),
        }
    }
}

impl std::error::Error for Error {}

// From impls for automatic conversion
impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::Io(e)
    }
}

impl From<AllocationError> for Error {
    fn from(e: AllocationError) -> Self {
        Error::Alloc(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<DeviceError> for Error {
    fn from(e: DeviceError) -> Self {
        Error::Device(e)
    }
}

impl From<TransferError> for Error {
    fn from(e: TransferError) -> Self {
        Error::Transfer(e)
    }
}

/// Result type alias for driver operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for per-call blocking operations
pub type IoResult<T> = core::result::Result<T, IoError>;

/// Result type alias for ring allocation
pub type AllocResult<T> = core::result::Result<T, AllocationError>;

/// Result type alias for configuration validation
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for register and mapping operations
pub type DeviceResult<T> = core::result::Result<T, DeviceError>;

// =============================================================================
// Unit Tests
// =============================================================================
