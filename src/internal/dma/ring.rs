//! Circular ring of transfer buffers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::descriptor::BufferDescriptor;
use crate::driver::error::{AllocResult, AllocationError};
use crate::hal::DmaDirection;

/// Transfer direction of a ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Device-to-host; the device produces, readers consume
    Inbound,
    /// Host-to-device; writers produce, the device consumes
    Outbound,
}

impl Direction {
    /// Streaming mapping direction for buffers of this ring
    #[inline]
    pub const fn dma_direction(self) -> DmaDirection {
        match self {
            Direction::Inbound => DmaDirection::FromDevice,
            Direction::Outbound => DmaDirection::ToDevice,
        }
    }
}

/// Which of the two ring cursors to address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Cursor {
    /// Next descriptor to fill
    Producer,
    /// Next descriptor to drain
    Consumer,
}

/// Circular descriptor ring with a producer and a consumer cursor.
///
/// Each cursor has exactly one mover at a time (the flow-control gate
/// guarantees it); the cursors themselves are atomics so the other side
/// can read them.
#[derive(Debug)]
pub struct BufferRing {
    direction: Direction,
    buffer_size: usize,
    descriptors: Vec<Mutex<BufferDescriptor>>,
    producer: AtomicUsize,
    consumer: AtomicUsize,
}

impl BufferRing {
    /// Allocate `count` descriptors of `buffer_size` bytes each and link
    /// them into a cycle.
    ///
    /// `count` must be non-zero. On failure everything allocated so far is
    /// released before returning.
    pub fn allocate(direction: Direction, count: usize, buffer_size: usize) -> AllocResult<Self> {
        debug_assert!(count > 0, "ring needs at least one descriptor");

        let mut descriptors = Vec::new();
        descriptors
            .try_reserve_exact(count)
            .map_err(|_| AllocationError::OutOfMemory)?;

        for index in 0..count {
            let next = if index + 1 == count { 0 } else { index + 1 };
            descriptors.push(Mutex::new(BufferDescriptor::allocate(buffer_size, next)?));
        }

        Ok(Self {
            direction,
            buffer_size,
            descriptors,
            producer: AtomicUsize::new(0),
            consumer: AtomicUsize::new(0),
        })
    }

    /// Direction this ring serves
    #[inline(always)]
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Number of descriptors in the ring
    #[inline(always)]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.descriptors.len()
    }

    /// Size of each descriptor's buffer
    #[inline(always)]
    #[must_use]
    pub const fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Current index of `cursor`
    #[inline(always)]
    #[must_use]
    pub fn index(&self, cursor: Cursor) -> usize {
        self.cursor(cursor).load(Ordering::SeqCst)
    }

    /// Move `cursor` one step along the `next` link and return the new index.
    pub fn advance(&self, cursor: Cursor) -> usize {
        let cell = self.cursor(cursor);
        let next = self.lock(cell.load(Ordering::SeqCst)).next();
        cell.store(next, Ordering::SeqCst);
        next
    }

    /// Run `f` with exclusive access to the descriptor at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`capacity`](Self::capacity).
    pub fn with_descriptor<R>(&self, index: usize, f: impl FnOnce(&mut BufferDescriptor) -> R) -> R {
        f(&mut self.lock(index))
    }

    fn cursor(&self, cursor: Cursor) -> &AtomicUsize {
        match cursor {
            Cursor::Producer => &self.producer,
            Cursor::Consumer => &self.consumer,
        }
    }

    fn lock(&self, index: usize) -> MutexGuard<'_, BufferDescriptor> {
        self.descriptors[index]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// Tests
// =============================================================================
