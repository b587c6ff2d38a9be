//! Streaming DMA mapping
//!
//! Transfer buffers live in ordinary host memory. Before the device can
//! read one, it has to be mapped to a bus address the device can reach.

use crate::driver::error::{DeviceError, DeviceResult};

/// Direction of a streaming DMA mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaDirection {
    /// Host memory read by the device (outbound bursts)
    ToDevice,
    /// Host memory written by the device (inbound buffers)
    FromDevice,
}

/// Trait for mapping transfer buffers to device-visible addresses.
///
/// The device's address register is 32 bits wide, so mappings must land in
/// the low 4 GiB of bus address space.
pub trait DmaMapper {
    /// Map `buffer` for DMA, returning its bus address
    fn map(&self, buffer: &[u8], direction: DmaDirection) -> DeviceResult<u32>;

    /// Release a mapping previously returned by [`DmaMapper::map`]
    fn unmap(&self, address: u32, length: usize, direction: DmaDirection) {
        let _ = (address, length, direction);
    }
}

/// Mapper that hands the device the buffer's own address.
///
/// Only meaningful for simulated devices living in the same address space
/// as the driver. Real hardware needs a mapper over the platform's DMA API;
/// a process virtual address is not a bus address. Buffers above 4 GiB (or
/// at address zero) cannot be mapped.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMapper;

impl DmaMapper for IdentityMapper {
    fn map(&self, buffer: &[u8], _direction: DmaDirection) -> DeviceResult<u32> {
        u32::try_from(buffer.as_ptr() as usize)
            .ok()
            .filter(|address| *address != 0)
            .ok_or(DeviceError::MappingFailed)
    }
}

impl<T: DmaMapper + ?Sized> DmaMapper for std::sync::Arc<T> {
    #[inline]
    fn map(&self, buffer: &[u8], direction: DmaDirection) -> DeviceResult<u32> {
        (**self).map(buffer, direction)
    }

    #[inline]
    fn unmap(&self, address: u32, length: usize, direction: DmaDirection) {
        (**self).unmap(address, length, direction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_mapper_agrees_with_address_width() {
        let buffer = vec![0u8; 64];
        let address = buffer.as_ptr() as usize;

        let mapped = IdentityMapper.map(&buffer, DmaDirection::ToDevice);
        if address <= u32::MAX as usize {
            assert_eq!(mapped, Ok(address as u32));
        } else {
            assert_eq!(mapped, Err(DeviceError::MappingFailed));
        }
    }

    #[test]
    fn default_unmap_is_noop() {
        IdentityMapper.unmap(0x1000, 64, DmaDirection::ToDevice);
    }
}
