//! Capacity code lookup table

use crate::error::{DeviceFault, Error, Result};

use super::types::{manufacturer, ChipDescriptor, ChipType};

/// One row of a chip table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipEntry {
    /// Part type reported for this code
    pub chip_type: ChipType,
    /// JEDEC capacity code (third RDID byte)
    pub capacity_code: u8,
    /// Capacity in bytes
    pub capacity_bytes: u32,
}

impl ChipEntry {
    /// Create a new table entry
    pub const fn new(chip_type: ChipType, capacity_code: u8, capacity_bytes: u32) -> Self {
        Self {
            chip_type,
            capacity_code,
            capacity_bytes,
        }
    }
}

const KIB: u32 = 1024;
const MIB: u32 = 1024 * 1024;

static WINBOND_ENTRIES: [ChipEntry; 9] = [
    ChipEntry::new(ChipType::W25Q10, 0x11, 128 * KIB),
    ChipEntry::new(ChipType::W25Q20, 0x12, 256 * KIB),
    ChipEntry::new(ChipType::W25Q40, 0x13, 512 * KIB),
    ChipEntry::new(ChipType::W25Q80, 0x14, MIB),
    ChipEntry::new(ChipType::W25Q16, 0x15, 2 * MIB),
    ChipEntry::new(ChipType::W25Q32, 0x16, 4 * MIB),
    ChipEntry::new(ChipType::W25Q64, 0x17, 8 * MIB),
    ChipEntry::new(ChipType::W25Q128, 0x18, 16 * MIB),
    ChipEntry::new(ChipType::W25Q256, 0x19, 32 * MIB),
];

/// Maps JEDEC identification bytes to a [`ChipDescriptor`]
///
/// The lookup is an explicit table rather than arithmetic on the capacity
/// code, so parts with irregular encodings can be described by supplying a
/// custom table to the device handle.
#[derive(Debug, Clone, Copy)]
pub struct ChipTable<'a> {
    /// Manufacturer byte every entry belongs to
    pub manufacturer_id: u8,
    /// Known capacity codes
    pub entries: &'a [ChipEntry],
}

impl ChipTable<'static> {
    /// Winbond W25Q10 .. W25Q256
    pub const WINBOND: ChipTable<'static> = ChipTable {
        manufacturer_id: manufacturer::WINBOND,
        entries: &WINBOND_ENTRIES,
    };
}

impl Default for ChipTable<'static> {
    fn default() -> Self {
        Self::WINBOND
    }
}

impl<'a> ChipTable<'a> {
    /// Create a table for a different vendor or part list
    pub const fn new(manufacturer_id: u8, entries: &'a [ChipEntry]) -> Self {
        Self {
            manufacturer_id,
            entries,
        }
    }

    /// Find the entry for a capacity code
    pub fn lookup(&self, capacity_code: u8) -> Option<&'a ChipEntry> {
        self.entries
            .iter()
            .find(|e| e.capacity_code == capacity_code)
    }

    /// Resolve a JEDEC ID (manufacturer, memory type, capacity code)
    pub fn resolve(&self, jedec: [u8; 3]) -> Result<ChipDescriptor> {
        let [manufacturer_id, memory_type, capacity_code] = jedec;

        if manufacturer_id != self.manufacturer_id {
            return Err(Error::DeviceError(DeviceFault::UnknownManufacturer {
                found: manufacturer_id,
            }));
        }

        let entry = self
            .lookup(capacity_code)
            .ok_or(Error::DeviceError(DeviceFault::UnknownCapacity {
                code: capacity_code,
            }))?;

        Ok(ChipDescriptor::new(
            entry.chip_type,
            manufacturer_id,
            memory_type,
            capacity_code,
            entry.capacity_bytes,
        ))
    }

    /// Iterate over all entries
    pub fn iter(&self) -> impl Iterator<Item = &'a ChipEntry> + 'a {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::{BLOCK_SIZE, PAGE_SIZE, SECTOR_SIZE};

    #[test]
    fn test_capacity_doubles_per_code() {
        for code in 0x11u8..=0x19 {
            let chip = ChipTable::WINBOND.resolve([0xEF, 0x40, code]).unwrap();
            let expected = 1u32 << (17 + (code - 0x11) as u32);
            assert_eq!(chip.capacity_bytes, expected, "code 0x{:02X}", code);
            assert_eq!(chip.page_count * PAGE_SIZE, expected);
            assert_eq!(chip.sector_count * SECTOR_SIZE, expected);
            assert_eq!(chip.block_count * BLOCK_SIZE, expected);
            assert!(chip.is_consistent());
        }
    }

    #[test]
    fn test_w25q16_descriptor() {
        let chip = ChipTable::WINBOND.resolve([0xEF, 0x40, 0x15]).unwrap();
        assert_eq!(chip.chip_type, ChipType::W25Q16);
        assert_eq!(chip.capacity_bytes, 2_097_152);
        assert_eq!(chip.page_count, 8192);
        assert_eq!(chip.sector_count, 512);
        assert_eq!(chip.block_count, 32);
        assert_eq!(chip.memory_type, 0x40);
    }

    #[test]
    fn test_unknown_manufacturer() {
        let err = ChipTable::WINBOND.resolve([0xC2, 0x20, 0x15]).unwrap_err();
        assert_eq!(
            err,
            Error::DeviceError(DeviceFault::UnknownManufacturer { found: 0xC2 })
        );
    }

    #[test]
    fn test_unknown_capacity() {
        for code in [0x10u8, 0x1A, 0x00, 0xFF] {
            let err = ChipTable::WINBOND.resolve([0xEF, 0x40, code]).unwrap_err();
            assert_eq!(err, Error::DeviceError(DeviceFault::UnknownCapacity { code }));
        }
    }

    #[test]
    fn test_custom_table() {
        static ENTRIES: [ChipEntry; 1] = [ChipEntry::new(ChipType::W25Q80, 0x40, 1024 * 1024)];
        let table = ChipTable::new(0xEF, &ENTRIES);
        let chip = table.resolve([0xEF, 0x60, 0x40]).unwrap();
        assert_eq!(chip.chip_type, ChipType::W25Q80);
        assert!(table.resolve([0xEF, 0x40, 0x14]).is_err());
    }
}
