//! Device handle and driver configuration
//!
//! This module provides [`DeviceHandle`], the unit of state every flash
//! operation takes, and the [`DriverConfig`] that tunes its state machine.

mod config;
mod device;

pub use config::*;
pub use device::DeviceHandle;
