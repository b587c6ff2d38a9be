//! Async/await support for device handles.
//!
//! The futures here poll the non-blocking handle calls and park on the
//! gate's wakers, which the completion path wakes whenever a counter or
//! the exclusive token changes. One read and one write task per device
//! can be parked at a time; a later registration replaces the earlier one.

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use embedded_hal::delay::DelayNs;

use crate::driver::error::{Error, IoError, Result};
use crate::driver::handle::DeviceHandle;
use crate::hal::{DmaMapper, RegisterBus};

fn would_block<T>(result: &Result<T>) -> bool {
    matches!(result, Err(Error::Io(IoError::WouldBlock)))
}

/// Future for async read operations.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct ReadFuture<'a, B, M, D> {
    handle: &'a DeviceHandle<B, M, D>,
    buffer: &'a mut [u8],
}

impl<'a, B, M, D> ReadFuture<'a, B, M, D> {
    /// Create a new read future.
    pub fn new(handle: &'a DeviceHandle<B, M, D>, buffer: &'a mut [u8]) -> Self {
        Self { handle, buffer }
    }
}

impl<B, M, D> Future for ReadFuture<'_, B, M, D>
where
    B: RegisterBus,
    M: DmaMapper,
    D: DelayNs,
{
    type Output = Result<usize>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        let result = this.handle.try_read(this.buffer);
        if !would_block(&result) {
            return Poll::Ready(result);
        }

        this.handle.device().gate().register_read_waker(cx.waker());
        let result = this.handle.try_read(this.buffer);
        if would_block(&result) {
            Poll::Pending
        } else {
            Poll::Ready(result)
        }
    }
}

/// Future for async write operations.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct WriteFuture<'a, B, M, D> {
    handle: &'a DeviceHandle<B, M, D>,
    data: &'a [u8],
}

impl<'a, B, M, D> WriteFuture<'a, B, M, D> {
    /// Create a new write future.
    pub fn new(handle: &'a DeviceHandle<B, M, D>, data: &'a [u8]) -> Self {
        Self { handle, data }
    }
}

impl<B, M, D> Future for WriteFuture<'_, B, M, D>
where
    B: RegisterBus,
    M: DmaMapper,
    D: DelayNs,
{
    type Output = Result<usize>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        let result = this.handle.try_write(this.data);
        if !would_block(&result) {
            return Poll::Ready(result);
        }

        this.handle.device().gate().register_write_waker(cx.waker());
        let result = this.handle.try_write(this.data);
        if would_block(&result) {
            Poll::Pending
        } else {
            Poll::Ready(result)
        }
    }
}

/// Extension trait providing async methods for device handles.
pub trait AsyncDeviceExt {
    /// Read the oldest inbound buffer asynchronously.
    fn read_async<'a>(&'a self, buffer: &'a mut [u8]) -> impl Future<Output = Result<usize>>;

    /// Queue one outbound buffer asynchronously.
    fn write_async<'a>(&'a self, data: &'a [u8]) -> impl Future<Output = Result<usize>>;
}

impl<B, M, D> AsyncDeviceExt for DeviceHandle<B, M, D>
where
    B: RegisterBus,
    M: DmaMapper,
    D: DelayNs,
{
    fn read_async<'a>(&'a self, buffer: &'a mut [u8]) -> impl Future<Output = Result<usize>> {
        ReadFuture::new(self, buffer)
    }

    fn write_async<'a>(&'a self, data: &'a [u8]) -> impl Future<Output = Result<usize>> {
        WriteFuture::new(self, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::primitives::tests::{WakeCounter, test_waker};
    use crate::testing::fixture;
    use core::pin::pin;

    #[test]
    fn read_future_ready_when_data_waiting() {
        let f = fixture(2, 16);
        f.device.deliver_inbound(b"now").unwrap();
        let handle = f.device.open();
        let mut buffer = [0u8; 16];

        let counter = WakeCounter::new();
        let waker = test_waker(counter.clone());
        let mut cx = Context::from_waker(&waker);

        let mut future = pin!(handle.read_async(&mut buffer));
        assert_eq!(future.as_mut().poll(&mut cx), Poll::Ready(Ok(3)));
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn read_future_wakes_on_delivery() {
        let f = fixture(2, 16);
        let handle = f.device.open();
        let mut buffer = [0u8; 16];

        let counter = WakeCounter::new();
        let waker = test_waker(counter.clone());
        let mut cx = Context::from_waker(&waker);

        {
            let mut future = pin!(handle.read_async(&mut buffer));
            assert_eq!(future.as_mut().poll(&mut cx), Poll::Pending);

            f.device.deliver_inbound(b"later").unwrap();
            assert_eq!(counter.count(), 1);
            assert_eq!(future.as_mut().poll(&mut cx), Poll::Ready(Ok(5)));
        }
        assert_eq!(&buffer[..5], b"later");
    }

    #[test]
    fn idle_read_future_does_not_wake_itself() {
        let f = fixture(2, 16);
        let handle = f.device.open();
        let mut buffer = [0u8; 16];

        let counter = WakeCounter::new();
        let waker = test_waker(counter.clone());
        let mut cx = Context::from_waker(&waker);

        let mut future = pin!(handle.read_async(&mut buffer));
        for _ in 0..5 {
            assert_eq!(future.as_mut().poll(&mut cx), Poll::Pending);
        }
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn idle_write_future_does_not_wake_itself() {
        let f = fixture(1, 16);
        let handle = f.device.open();
        handle.try_write(b"fill").unwrap();

        let counter = WakeCounter::new();
        let waker = test_waker(counter.clone());
        let mut cx = Context::from_waker(&waker);

        let mut future = pin!(handle.write_async(b"next"));
        for _ in 0..5 {
            assert_eq!(future.as_mut().poll(&mut cx), Poll::Pending);
        }
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn write_future_wakes_on_completion() {
        let f = fixture(1, 16);
        let handle = f.device.open();
        handle.try_write(b"fill").unwrap();

        let counter = WakeCounter::new();
        let waker = test_waker(counter.clone());
        let mut cx = Context::from_waker(&waker);

        let mut future = pin!(handle.write_async(b"next"));
        assert_eq!(future.as_mut().poll(&mut cx), Poll::Pending);

        f.device.notify_write_slot_freed().unwrap();
        assert_eq!(counter.count(), 1);
        assert_eq!(future.as_mut().poll(&mut cx), Poll::Ready(Ok(4)));
    }

    #[test]
    fn write_future_reports_invalid_argument_immediately() {
        let f = fixture(1, 4);
        let handle = f.device.open();

        let counter = WakeCounter::new();
        let waker = test_waker(counter.clone());
        let mut cx = Context::from_waker(&waker);

        let mut future = pin!(handle.write_async(b"too long"));
        assert_eq!(
            future.as_mut().poll(&mut cx),
            Poll::Ready(Err(Error::Io(IoError::InvalidArgument)))
        );
    }
}
