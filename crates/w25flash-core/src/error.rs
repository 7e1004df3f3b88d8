//! Error types for w25flash-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Why a parameter was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamError {
    /// A zero-length read or program was requested
    ZeroLength,
    /// The requested range does not fit inside the chip
    OutOfRange {
        /// Start address of the request
        addr: u32,
        /// Length of the request in bytes
        len: usize,
        /// Capacity of the detected chip
        capacity: u32,
    },
    /// Page program payload exceeds one page
    PageOverflow {
        /// Payload length
        len: usize,
    },
    /// Address cannot be expressed with a 3-byte address
    AddressTooWide {
        /// The offending address
        addr: u32,
    },
    /// Erase address is not aligned to the erase unit (strict mode only)
    Misaligned {
        /// The offending address
        addr: u32,
        /// Erase unit size in bytes
        unit: u32,
    },
    /// The handle has not been initialized
    Uninitialized,
}

/// Details about a device-level failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceFault {
    /// JEDEC manufacturer byte did not match the expected vendor
    UnknownManufacturer {
        /// Manufacturer byte read from the chip
        found: u8,
    },
    /// JEDEC capacity code is not in the chip table
    UnknownCapacity {
        /// Capacity code read from the chip
        code: u8,
    },
    /// Transport-level failure (select, transmit, receive)
    Transport,
    /// Transport initialization failed
    TransportInit,
    /// Write enable latch did not set after WREN
    WriteEnableFailed,
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A parameter was out of range or otherwise unusable
    InvalidParameter(ParamError),
    /// The ready-wait loop exhausted its poll budget
    Timeout,
    /// The chip or its transport misbehaved
    DeviceError(DeviceFault),
    /// Operation invoked before a successful `init`
    NotInitialized,
}

impl Error {
    /// Shorthand for a transport failure
    pub const fn transport() -> Self {
        Self::DeviceError(DeviceFault::Transport)
    }

    /// Returns true for any `InvalidParameter` variant
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::InvalidParameter(_))
    }

    /// Returns true for any `DeviceError` variant
    pub fn is_device_error(&self) -> bool {
        matches!(self, Self::DeviceError(_))
    }
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroLength => write!(f, "zero-length request"),
            Self::OutOfRange {
                addr,
                len,
                capacity,
            } => write!(
                f,
                "range 0x{:08X}+{} exceeds capacity of {} bytes",
                addr, len, capacity
            ),
            Self::PageOverflow { len } => {
                write!(f, "page program of {} bytes exceeds one page", len)
            }
            Self::AddressTooWide { addr } => {
                write!(f, "address 0x{:08X} does not fit in 24 bits", addr)
            }
            Self::Misaligned { addr, unit } => write!(
                f,
                "address 0x{:08X} is not aligned to {} byte erase unit",
                addr, unit
            ),
            Self::Uninitialized => write!(f, "handle not initialized"),
        }
    }
}

impl fmt::Display for DeviceFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownManufacturer { found } => {
                write!(f, "unknown manufacturer ID 0x{:02X}", found)
            }
            Self::UnknownCapacity { code } => write!(f, "unknown capacity code 0x{:02X}", code),
            Self::Transport => write!(f, "transport failure"),
            Self::TransportInit => write!(f, "transport initialization failed"),
            Self::WriteEnableFailed => write!(f, "write enable latch not set"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter(e) => write!(f, "invalid parameter: {}", e),
            Self::Timeout => write!(f, "timed out waiting for device ready"),
            Self::DeviceError(e) => write!(f, "device error: {}", e),
            Self::NotInitialized => write!(f, "device not initialized"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
