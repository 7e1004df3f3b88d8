//! Flash chip types and descriptor table
//!
//! This module provides types for describing a detected chip and the
//! table that maps JEDEC capacity codes to chip geometry.

mod table;
mod types;

pub use table::*;
pub use types::*;
