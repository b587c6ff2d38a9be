//! Internal Implementation Details
//!
//! This module contains implementation details that are not part of the public API.
//! Types in this module may change without notice between minor versions.
//!
//! # Contents
//!
//! - `fmt`: Logging shims over the `log` facade
//! - `constants`: Default pool geometry and timing
//! - `register`: BAR0 register layout and accessors
//! - `dma`: Buffer descriptors and rings
//!
//! # Stability
//!
//! **WARNING:** This module is `pub(crate)` only. Do not depend on any types
//! or functions in this module from external code. They are subject to change
//! without notice.

pub(crate) mod fmt;

pub(crate) mod constants;
pub(crate) mod dma;
pub(crate) mod register;
