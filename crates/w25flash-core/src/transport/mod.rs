//! Transport abstraction
//!
//! This module defines the capability set the driver calls through to
//! reach the chip: chip select, byte transmit/receive and a millisecond delay.

mod traits;

pub use traits::*;
