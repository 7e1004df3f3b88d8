//! Status register layout

use bitflags::bitflags;

use super::opcodes;

bitflags! {
    /// Status Register 1
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status1: u8 {
        /// Erase/program in progress
        const BUSY = 1 << 0;
        /// Write Enable Latch
        const WEL  = 1 << 1;
        /// Block Protect bit 0
        const BP0  = 1 << 2;
        /// Block Protect bit 1
        const BP1  = 1 << 3;
        /// Block Protect bit 2
        const BP2  = 1 << 4;
        /// Top/Bottom Protect
        const TB   = 1 << 5;
        /// Sector/Block Protect
        const SEC  = 1 << 6;
        /// Status Register Protect
        const SRP  = 1 << 7;
    }
}

bitflags! {
    /// Status Register 2
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status2: u8 {
        /// Status Register Lock
        const SRL = 1 << 0;
        /// Quad Enable
        const QE  = 1 << 1;
        /// Security Register Lock bit 1
        const LB1 = 1 << 3;
        /// Security Register Lock bit 2
        const LB2 = 1 << 4;
        /// Security Register Lock bit 3
        const LB3 = 1 << 5;
        /// Complement Protect
        const CMP = 1 << 6;
        /// Erase/Program Suspend Status
        const SUS = 1 << 7;
    }
}

/// One of the three status registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum StatusRegister {
    /// Status Register 1 (BUSY, WEL, block protect)
    One,
    /// Status Register 2 (QE, lock bits, SUS)
    Two,
    /// Status Register 3 (WPS, driver strength)
    Three,
}

impl StatusRegister {
    /// Opcode that reads this register
    pub const fn read_opcode(&self) -> u8 {
        match self {
            Self::One => opcodes::RDSR,
            Self::Two => opcodes::RDSR2,
            Self::Three => opcodes::RDSR3,
        }
    }

    /// Opcode that writes this register
    pub const fn write_opcode(&self) -> u8 {
        match self {
            Self::One => opcodes::WRSR,
            Self::Two => opcodes::WRSR2,
            Self::Three => opcodes::WRSR3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status1_bits() {
        let sr = Status1::from_bits_retain(0x03);
        assert!(sr.contains(Status1::BUSY));
        assert!(sr.contains(Status1::WEL));
        assert!(!sr.contains(Status1::SRP));
    }

    #[test]
    fn test_register_opcodes() {
        assert_eq!(StatusRegister::One.read_opcode(), 0x05);
        assert_eq!(StatusRegister::Two.read_opcode(), 0x35);
        assert_eq!(StatusRegister::Three.read_opcode(), 0x15);
        assert_eq!(StatusRegister::One.write_opcode(), 0x01);
        assert_eq!(StatusRegister::Two.write_opcode(), 0x31);
        assert_eq!(StatusRegister::Three.write_opcode(), 0x11);
    }
}
