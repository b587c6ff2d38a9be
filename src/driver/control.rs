//! Control channel.
//!
//! Raw register pass-through and device reset. Requests arrive either as a
//! typed [`ControlCommand`] or as a numeric code plus [`RegisterAccess`]
//! block, decoded with [`ControlCommand::from_raw`].

use embedded_hal::delay::DelayNs;

use super::device::StreamDevice;
use super::error::{IoError, IoResult, Result};
use crate::hal::{DmaMapper, RegisterBus};
use crate::internal::fmt::debug;
use crate::sync::gate::Wait;

/// Control code: write `value` to the register at `offset`
pub const WRITE_CMD: u32 = 0x01;
/// Control code: read the register at `offset`
pub const READ_CMD: u32 = 0x02;
/// Control code: re-run the device configure sequence
pub const DEVICE_RESET: u32 = 0x03;

/// Argument block of a raw control request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(C)]
pub struct RegisterAccess {
    /// Value to write (ignored by reads and resets)
    pub value: u32,
    /// Byte offset into the register window
    pub offset: i32,
}

/// A decoded control request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlCommand {
    /// Write a raw register
    WriteRegister {
        /// Byte offset into the register window
        offset: usize,
        /// Value to write
        value: u32,
    },
    /// Read a raw register
    ReadRegister {
        /// Byte offset into the register window
        offset: usize,
    },
    /// Re-run the configure sequence; buffer rings are left untouched
    ResetDevice,
}

impl ControlCommand {
    /// Decode a numeric control code and its argument block.
    ///
    /// # Errors
    ///
    /// [`IoError::InvalidArgument`] for unknown codes and negative offsets.
    pub fn from_raw(code: u32, access: RegisterAccess) -> IoResult<Self> {
        let offset = || usize::try_from(access.offset).map_err(|_| IoError::InvalidArgument);
        match code {
            WRITE_CMD => Ok(ControlCommand::WriteRegister {
                offset: offset()?,
                value: access.value,
            }),
            READ_CMD => Ok(ControlCommand::ReadRegister { offset: offset()? }),
            DEVICE_RESET => Ok(ControlCommand::ResetDevice),
            _ => Err(IoError::InvalidArgument),
        }
    }

    /// Numeric control code of this command
    pub const fn code(&self) -> u32 {
        match self {
            ControlCommand::WriteRegister { .. } => WRITE_CMD,
            ControlCommand::ReadRegister { .. } => READ_CMD,
            ControlCommand::ResetDevice => DEVICE_RESET,
        }
    }
}

impl<B, M, D> StreamDevice<B, M, D>
where
    B: RegisterBus,
    M: DmaMapper,
    D: DelayNs,
{
    /// Execute `command` under exclusive access.
    ///
    /// Returns the register value for [`ControlCommand::ReadRegister`] and
    /// `None` otherwise.
    pub(crate) fn control_with(&self, command: ControlCommand, wait: Wait<'_>) -> Result<Option<u32>> {
        let _exclusive = self.gate.acquire_exclusive(wait)?;

        match command {
            ControlCommand::WriteRegister { offset, value } => {
                self.regs.write_register(offset, value)?;
                debug!("control: wrote {:#x} to {:#x}", value, offset);
                Ok(None)
            }
            ControlCommand::ReadRegister { offset } => {
                let value = self.regs.read_register(offset)?;
                debug!("control: read {:#x} from {:#x}", value, offset);
                Ok(Some(value))
            }
            ControlCommand::ResetDevice => {
                debug!("control: device reset");
                self.reconfigure()?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::error::{DeviceError, Error};
    use crate::internal::register::{DCSR0_OFFSET, DMA_TRANS_MAX_SIZE_OFFSET};
    use crate::testing::fixture;

    #[test]
    fn decode_known_codes() {
        let access = RegisterAccess {
            value: 0xABCD,
            offset: 0x20,
        };

        assert_eq!(
            ControlCommand::from_raw(WRITE_CMD, access),
            Ok(ControlCommand::WriteRegister {
                offset: 0x20,
                value: 0xABCD
            })
        );
        assert_eq!(
            ControlCommand::from_raw(READ_CMD, access),
            Ok(ControlCommand::ReadRegister { offset: 0x20 })
        );
        assert_eq!(
            ControlCommand::from_raw(DEVICE_RESET, access),
            Ok(ControlCommand::ResetDevice)
        );
    }

    #[test]
    fn decode_rejects_unknown_code() {
        assert_eq!(
            ControlCommand::from_raw(0x7F, RegisterAccess::default()),
            Err(IoError::InvalidArgument)
        );
    }

    #[test]
    fn decode_rejects_negative_offset() {
        let access = RegisterAccess {
            value: 0,
            offset: -4,
        };
        assert_eq!(
            ControlCommand::from_raw(READ_CMD, access),
            Err(IoError::InvalidArgument)
        );
        // Resets carry no offset
        assert_eq!(
            ControlCommand::from_raw(DEVICE_RESET, access),
            Ok(ControlCommand::ResetDevice)
        );
    }

    #[test]
    fn code_round_trips_through_decoder() {
        for command in [
            ControlCommand::WriteRegister {
                offset: 4,
                value: 1,
            },
            ControlCommand::ReadRegister { offset: 4 },
            ControlCommand::ResetDevice,
        ] {
            let access = RegisterAccess {
                value: 1,
                offset: 4,
            };
            assert_eq!(ControlCommand::from_raw(command.code(), access), Ok(command));
        }
    }

    #[test]
    fn register_pass_through() {
        let f = fixture(2, 16);

        let wrote = f.device.control_with(
            ControlCommand::WriteRegister {
                offset: 0x40,
                value: 0x1234,
            },
            Wait::Poll,
        );
        assert_eq!(wrote, Ok(None));
        assert_eq!(f.bus.writes(), vec![(0x40, 0x1234)]);

        let read = f
            .device
            .control_with(ControlCommand::ReadRegister { offset: 0x40 }, Wait::Poll);
        assert_eq!(read, Ok(Some(0x1234)));
    }

    #[test]
    fn reset_reruns_configure() {
        let f = fixture(2, 16);
        f.bus.set_register(DMA_TRANS_MAX_SIZE_OFFSET, 0);

        assert_eq!(
            f.device.control_with(ControlCommand::ResetDevice, Wait::Poll),
            Ok(None)
        );
        assert_eq!(f.bus.writes_to(DCSR0_OFFSET).len(), 2);
        assert_eq!(f.bus.register(DMA_TRANS_MAX_SIZE_OFFSET), 16);
    }

    #[test]
    fn control_waits_for_exclusive_access() {
        let f = fixture(2, 16);
        let _busy = f.device.gate.acquire_exclusive(Wait::Poll).unwrap();

        assert_eq!(
            f.device.control_with(ControlCommand::ResetDevice, Wait::Poll),
            Err(Error::Io(IoError::WouldBlock))
        );
        assert!(f.bus.writes().is_empty());
    }

    #[test]
    fn bus_failure_is_reported() {
        let f = fixture(2, 16);
        f.bus.fail_reads(true);
        assert_eq!(
            f.device
                .control_with(ControlCommand::ReadRegister { offset: 0 }, Wait::Poll),
            Err(Error::Device(DeviceError::RegisterIo))
        );
    }
}
