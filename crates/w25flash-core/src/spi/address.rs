//! Address width types

/// Address width for SPI commands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AddressWidth {
    /// No address phase
    #[default]
    None,
    /// 3-byte (24-bit) address, MSB first - supports up to 16 MiB
    ThreeByte,
}

impl AddressWidth {
    /// Returns the number of address bytes
    pub const fn bytes(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::ThreeByte => 3,
        }
    }

    /// Returns the maximum addressable size in bytes
    pub const fn max_size(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::ThreeByte => 16 * 1024 * 1024, // 16 MiB
        }
    }

    /// Check that `address` survives encoding without truncation
    pub const fn fits(&self, address: u32) -> bool {
        match self {
            Self::None => true,
            Self::ThreeByte => address < self.max_size(),
        }
    }

    /// Encode an address into bytes
    pub fn encode(&self, address: u32, buf: &mut [u8]) {
        match self {
            Self::None => {}
            Self::ThreeByte => {
                buf[0] = (address >> 16) as u8;
                buf[1] = (address >> 8) as u8;
                buf[2] = address as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_byte_encoding_is_msb_first() {
        let mut buf = [0u8; 3];
        AddressWidth::ThreeByte.encode(0x12_3456, &mut buf);
        assert_eq!(buf, [0x12, 0x34, 0x56]);
    }

    #[test]
    fn test_fits() {
        assert!(AddressWidth::ThreeByte.fits(0x00FF_FFFF));
        assert!(!AddressWidth::ThreeByte.fits(0x0100_0000));
        assert!(AddressWidth::None.fits(u32::MAX));
    }
}
