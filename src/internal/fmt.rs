//! Logging shims.
//!
//! Forward to the `log` facade when the `log` feature is enabled and expand
//! to nothing otherwise, so call sites need no `#[cfg]` of their own.

#![allow(unused_macros)]

macro_rules! trace {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(feature = "log")]
        ::log::trace!($s $(, $x)*);
        #[cfg(not(feature = "log"))]
        let _ = ($( & $x ),*);
    }};
}

macro_rules! debug {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(feature = "log")]
        ::log::debug!($s $(, $x)*);
        #[cfg(not(feature = "log"))]
        let _ = ($( & $x ),*);
    }};
}

macro_rules! warn_ {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(feature = "log")]
        ::log::warn!($s $(, $x)*);
        #[cfg(not(feature = "log"))]
        let _ = ($( & $x ),*);
    }};
}

macro_rules! error {
    ($s:literal $(, $x:expr)* $(,)?) => {{
        #[cfg(feature = "log")]
        ::log::error!($s $(, $x)*);
        #[cfg(not(feature = "log"))]
        let _ = ($( & $x ),*);
    }};
}

pub(crate) use {debug, error, trace};
// A bare `warn` shim collides with the built-in `#[warn]` attribute.
pub(crate) use warn_ as warn;
