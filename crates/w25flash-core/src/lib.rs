//! w25flash-core - Driver for Winbond W25Qxx serial NOR flash
//!
//! This crate talks to W25Q10 through W25Q256 chips over a byte-level SPI
//! [`Transport`](transport::Transport) supplied by the caller. It identifies
//! the chip from its JEDEC ID, validates every request against the detected
//! geometry, and sequences the Write Enable / busy-wait dance that program
//! and erase operations need. It is `no_std` compatible for use in embedded
//! environments.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`), TOML
//!   configuration and `std::error::Error` impls
//! - `alloc` - Enable heap allocation (boxed transports)
//! - `is_sync` - Compile the driver as blocking code instead of async
//!
//! # Example
//!
//! ```ignore
//! use w25flash_core::{flash::DeviceHandle, transport::Transport};
//!
//! fn probe_chip<T: Transport>(spi: &mut T) {
//!     let mut flash = DeviceHandle::new(spi);
//!     match flash.init() {
//!         Ok(()) => {
//!             let info = flash.info().unwrap();
//!             println!("Found: {}", info.chip_type.name());
//!             println!("Size: {} bytes", info.capacity_bytes);
//!         }
//!         Err(e) => println!("Init failed: {}", e),
//!     }
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
// Allow async fn in traits - we use maybe-async for dual sync/async support
#![allow(async_fn_in_trait)]

// Only the boxed transport impl needs alloc
#[cfg(all(feature = "alloc", feature = "is_sync"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod chip;
pub mod error;
pub mod flash;
pub mod protocol;
pub mod spi;
pub mod transport;

pub use error::{DeviceFault, Error, ParamError, Result};
