//! Protocol implementations
//!
//! This module contains the W25Qxx command sequences: one function per
//! chip-select bracketed transaction, plus the bounded status polls built
//! on top of them.

mod w25q;

pub use w25q::*;
