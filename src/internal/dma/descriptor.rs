//! Transfer buffer descriptor.

use crate::driver::error::{AllocResult, AllocationError};

/// One fixed-size transfer buffer in a [`BufferRing`](super::BufferRing).
#[derive(Debug)]
pub struct BufferDescriptor {
    data: Box<[u8]>,
    data_length: usize,
    next: usize,
}

impl BufferDescriptor {
    /// Allocate a zeroed buffer of `size` bytes linked to `next`.
    ///
    /// Reserves fallibly, so an impossible size reports
    /// [`AllocationError::OutOfMemory`] instead of aborting.
    pub fn allocate(size: usize, next: usize) -> AllocResult<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|_| AllocationError::OutOfMemory)?;
        data.resize(size, 0);

        Ok(Self {
            data: data.into_boxed_slice(),
            data_length: 0,
            next,
        })
    }

    /// Index of the following descriptor in the ring
    #[inline(always)]
    #[must_use]
    pub const fn next(&self) -> usize {
        self.next
    }

    /// Size of the backing buffer
    #[inline(always)]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of valid bytes
    #[inline(always)]
    #[must_use]
    pub const fn data_length(&self) -> usize {
        self.data_length
    }

    /// Record the number of valid bytes, clamped to the buffer size
    #[inline(always)]
    pub fn set_data_length(&mut self, length: usize) {
        self.data_length = length.min(self.data.len());
    }

    /// The valid bytes
    #[inline(always)]
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.data_length]
    }

    /// Copy `bytes` into the buffer and set the valid length.
    ///
    /// Copies at most [`capacity`](Self::capacity) bytes and returns how
    /// many were taken.
    pub fn fill(&mut self, bytes: &[u8]) -> usize {
        let len = bytes.len().min(self.data.len());
        self.data[..len].copy_from_slice(&bytes[..len]);
        self.data_length = len;
        len
    }
}
