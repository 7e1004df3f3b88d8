//! SPI framing types and opcodes
//!
//! This module provides the command frame used for every chip-select
//! bracketed transaction, the address encoding, the W25Qxx opcode set and
//! the status register layout.

mod address;
mod command;
pub mod opcodes;
mod status;

pub use address::AddressWidth;
pub use command::{SpiCommand, MAX_HEADER_LEN};
pub use opcodes::*;
pub use status::{Status1, Status2, StatusRegister};
