//! Transport trait definitions
//!
//! These traits use `maybe_async` to support both sync and async modes.
//! - By default, traits are async (suitable for Embassy or any executor)
//! - With the `is_sync` feature, traits become synchronous

use crate::error::Result;
use maybe_async::maybe_async;

/// Byte-level SPI transport (sync or async depending on `is_sync` feature)
///
/// The driver never touches a peripheral directly. Every bus transaction
/// is expressed as `select`, one or more `transmit`/`receive` calls, then
/// `deselect`. Implementations report failures as
/// [`Error::DeviceError`](crate::Error::DeviceError); the driver propagates
/// them unchanged.
///
/// The driver assumes exclusive use of the transport for the whole of one
/// logical operation. Nothing else may drive the bus between `select` and
/// `deselect`.
///
/// ## Example
///
/// ```ignore
/// #[maybe_async]
/// impl Transport for MySpi {
///     async fn select(&mut self) -> Result<()> {
///         self.cs.set_low().map_err(|_| Error::transport())
///     }
///     async fn deselect(&mut self) -> Result<()> {
///         self.cs.set_high().map_err(|_| Error::transport())
///     }
///     async fn transmit(&mut self, data: &[u8]) -> Result<()> {
///         self.bus.write(data).await.map_err(|_| Error::transport())
///     }
///     async fn receive(&mut self, buf: &mut [u8]) -> Result<()> {
///         self.bus.read(buf).await.map_err(|_| Error::transport())
///     }
///     async fn delay_ms(&mut self, ms: u32) {
///         Timer::after_millis(ms as u64).await
///     }
/// }
/// ```
#[maybe_async(AFIT)]
pub trait Transport {
    /// Bring up the underlying peripheral
    ///
    /// Called once from `DeviceHandle::init`. The default does nothing.
    async fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Assert chip select
    async fn select(&mut self) -> Result<()>;

    /// Release chip select
    async fn deselect(&mut self) -> Result<()>;

    /// Clock `data` out to the chip
    async fn transmit(&mut self, data: &[u8]) -> Result<()>;

    /// Clock `buf.len()` bytes in from the chip
    async fn receive(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Delay for the specified number of milliseconds
    ///
    /// In async mode this is the point where the driver yields between
    /// status polls.
    async fn delay_ms(&mut self, ms: u32);
}

// Blanket impl for boxed transports to allow trait objects (sync mode only)
// In async mode, traits with async fn are not object-safe
#[cfg(all(feature = "alloc", feature = "is_sync"))]
impl Transport for alloc::boxed::Box<dyn Transport + Send> {
    fn init(&mut self) -> Result<()> {
        (**self).init()
    }

    fn select(&mut self) -> Result<()> {
        (**self).select()
    }

    fn deselect(&mut self) -> Result<()> {
        (**self).deselect()
    }

    fn transmit(&mut self, data: &[u8]) -> Result<()> {
        (**self).transmit(data)
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).receive(buf)
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}
