//! DMA Buffer Rings
//!
//! This module provides the buffer pools the streaming DMA core hands to
//! the device in strict order. All buffers are allocated once, when the
//! device is created, and live until it is dropped.
//!
//! # Architecture
//!
//! - [`BufferRing`]: Arena of descriptors linked into a cycle, with a
//!   producer and a consumer cursor
//! - [`BufferDescriptor`]: One fixed-size transfer buffer plus the number
//!   of valid bytes in it
//!
//! One ring exists per direction: [`Direction::Inbound`] buffers are
//! filled by the device and drained by readers, [`Direction::Outbound`]
//! buffers are filled by writers and drained by the device.
//!
//! # Example
//!
//! ```ignore
//! let ring = BufferRing::allocate(Direction::Outbound, 4, 4096)?;
//!
//! let index = ring.index(Cursor::Producer);
//! ring.with_descriptor(index, |desc| desc.fill(b"payload"));
//! ring.advance(Cursor::Producer);
//! ```

mod descriptor;
mod ring;

pub use descriptor::BufferDescriptor;
pub use ring::{BufferRing, Cursor, Direction};
