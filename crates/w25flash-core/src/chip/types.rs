//! Flash chip type definitions

/// Page size in bytes (smallest programmable unit)
pub const PAGE_SIZE: u32 = 256;
/// Sector size in bytes (smallest erase unit)
pub const SECTOR_SIZE: u32 = 4096;
/// 32KB block size in bytes
pub const BLOCK_32K_SIZE: u32 = 32 * 1024;
/// 64KB block size in bytes
pub const BLOCK_SIZE: u32 = 64 * 1024;

/// Erased flash reads as all ones
pub const ERASED_VALUE: u8 = 0xFF;

/// Known W25Qxx parts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ChipType {
    /// Not detected, or detection failed
    #[default]
    Unknown,
    /// 1 Mbit (128 KiB)
    W25Q10,
    /// 2 Mbit (256 KiB)
    W25Q20,
    /// 4 Mbit (512 KiB)
    W25Q40,
    /// 8 Mbit (1 MiB)
    W25Q80,
    /// 16 Mbit (2 MiB)
    W25Q16,
    /// 32 Mbit (4 MiB)
    W25Q32,
    /// 64 Mbit (8 MiB)
    W25Q64,
    /// 128 Mbit (16 MiB)
    W25Q128,
    /// 256 Mbit (32 MiB)
    W25Q256,
}

impl ChipType {
    /// Marketing name of the part
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::W25Q10 => "W25Q10",
            Self::W25Q20 => "W25Q20",
            Self::W25Q40 => "W25Q40",
            Self::W25Q80 => "W25Q80",
            Self::W25Q16 => "W25Q16",
            Self::W25Q32 => "W25Q32",
            Self::W25Q64 => "W25Q64",
            Self::W25Q128 => "W25Q128",
            Self::W25Q256 => "W25Q256",
        }
    }
}

/// Erase granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum EraseKind {
    /// 4KB sector erase (0x20)
    Sector,
    /// 32KB block erase (0x52)
    Block32K,
    /// 64KB block erase (0xD8)
    Block64K,
    /// Whole chip erase (0xC7), takes no address
    Chip,
}

impl EraseKind {
    /// Opcode for this erase
    pub const fn opcode(&self) -> u8 {
        use crate::spi::opcodes;
        match self {
            Self::Sector => opcodes::SE_20,
            Self::Block32K => opcodes::BE_52,
            Self::Block64K => opcodes::BE_D8,
            Self::Chip => opcodes::CE_C7,
        }
    }

    /// Size of the erase unit in bytes, `None` for chip erase
    pub const fn unit_size(&self) -> Option<u32> {
        match self {
            Self::Sector => Some(SECTOR_SIZE),
            Self::Block32K => Some(BLOCK_32K_SIZE),
            Self::Block64K => Some(BLOCK_SIZE),
            Self::Chip => None,
        }
    }
}

/// Geometry and identity of a detected chip
///
/// Invariant: `capacity_bytes == page_size * page_count
/// == sector_size * sector_count == block_size * block_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct ChipDescriptor {
    /// Part type
    pub chip_type: ChipType,
    /// JEDEC manufacturer ID (0xEF for Winbond)
    pub manufacturer_id: u8,
    /// JEDEC memory type byte
    pub memory_type: u8,
    /// JEDEC capacity code
    pub device_id: u8,
    /// Total capacity in bytes
    pub capacity_bytes: u32,
    /// Page size in bytes
    pub page_size: u32,
    /// Sector size in bytes
    pub sector_size: u32,
    /// Block size in bytes
    pub block_size: u32,
    /// Number of pages
    pub page_count: u32,
    /// Number of sectors
    pub sector_count: u32,
    /// Number of 64KB blocks
    pub block_count: u32,
}

impl ChipDescriptor {
    /// Build a descriptor with the standard W25Qxx geometry
    pub const fn new(
        chip_type: ChipType,
        manufacturer_id: u8,
        memory_type: u8,
        device_id: u8,
        capacity_bytes: u32,
    ) -> Self {
        Self {
            chip_type,
            manufacturer_id,
            memory_type,
            device_id,
            capacity_bytes,
            page_size: PAGE_SIZE,
            sector_size: SECTOR_SIZE,
            block_size: BLOCK_SIZE,
            page_count: capacity_bytes / PAGE_SIZE,
            sector_count: capacity_bytes / SECTOR_SIZE,
            block_count: capacity_bytes / BLOCK_SIZE,
        }
    }

    /// Check if an address is valid for this chip
    pub fn is_valid_address(&self, addr: u32) -> bool {
        addr < self.capacity_bytes
    }

    /// Check if an address range is valid for this chip
    pub fn is_valid_range(&self, addr: u32, len: usize) -> bool {
        // Use u64 arithmetic to avoid wrapping when addr + len > u32::MAX
        let end = addr as u64 + len as u64;
        end <= self.capacity_bytes as u64
    }

    /// Start of the sector containing `addr`, with the sector index
    pub fn sector_start(&self, addr: u32) -> (u32, u32) {
        let index = addr / self.sector_size;
        (index * self.sector_size, index)
    }

    /// Start of the 32KB block containing `addr`, with the block index
    pub fn block32_start(&self, addr: u32) -> (u32, u32) {
        let size = self.block_size / 2;
        let index = addr / size;
        (index * size, index)
    }

    /// Start of the 64KB block containing `addr`, with the block index
    pub fn block64_start(&self, addr: u32) -> (u32, u32) {
        let index = addr / self.block_size;
        (index * self.block_size, index)
    }

    /// Check the geometry invariant
    pub fn is_consistent(&self) -> bool {
        let cap = self.capacity_bytes as u64;
        self.page_size as u64 * self.page_count as u64 == cap
            && self.sector_size as u64 * self.sector_count as u64 == cap
            && self.block_size as u64 * self.block_count as u64 == cap
    }
}

/// JEDEC manufacturer IDs
pub mod manufacturer {
    /// Winbond
    pub const WINBOND: u8 = 0xEF;
}
