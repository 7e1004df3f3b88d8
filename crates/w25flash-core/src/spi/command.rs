//! SPI command structure

use super::AddressWidth;

/// Longest header any command produces: opcode, 3 address bytes, 4 dummy bytes
pub const MAX_HEADER_LEN: usize = 8;

/// A single chip-select bracketed SPI transaction
///
/// Designed to avoid allocation - uses slices for data.
/// The lifetime parameter `'a` ties the command to the buffers it references.
pub struct SpiCommand<'a> {
    /// The opcode byte
    pub opcode: u8,

    /// Address (if any)
    pub address: Option<u32>,

    /// Address width
    pub address_width: AddressWidth,

    /// Number of dummy bytes clocked out after the address
    pub dummy_bytes: u8,

    /// Data to write after opcode/address/dummy
    pub write_data: &'a [u8],

    /// Buffer to read into (mutable)
    pub read_buf: &'a mut [u8],
}

impl<'a> SpiCommand<'a> {
    /// Create a simple command with no address or data (e.g., WREN, WRDI)
    pub fn simple(opcode: u8) -> Self {
        Self {
            opcode,
            address: None,
            address_width: AddressWidth::None,
            dummy_bytes: 0,
            write_data: &[],
            read_buf: &mut [],
        }
    }

    /// Create a read register command with no address (e.g., RDSR)
    pub fn read_reg(opcode: u8, buf: &'a mut [u8]) -> Self {
        Self {
            read_buf: buf,
            ..Self::simple(opcode)
        }
    }

    /// Create a write register command with no address (e.g., WRSR)
    pub fn write_reg(opcode: u8, data: &'a [u8]) -> Self {
        Self {
            write_data: data,
            ..Self::simple(opcode)
        }
    }

    /// Create a read command with 3-byte address (e.g., READ)
    pub fn read_3b(opcode: u8, addr: u32, buf: &'a mut [u8]) -> Self {
        Self {
            address: Some(addr),
            address_width: AddressWidth::ThreeByte,
            read_buf: buf,
            ..Self::simple(opcode)
        }
    }

    /// Create a write command with 3-byte address (e.g., PP)
    pub fn write_3b(opcode: u8, addr: u32, data: &'a [u8]) -> Self {
        Self {
            address: Some(addr),
            address_width: AddressWidth::ThreeByte,
            write_data: data,
            ..Self::simple(opcode)
        }
    }

    /// Create an erase command with 3-byte address
    pub fn erase_3b(opcode: u8, addr: u32) -> Self {
        Self {
            address: Some(addr),
            address_width: AddressWidth::ThreeByte,
            ..Self::simple(opcode)
        }
    }

    /// Set the number of dummy bytes
    pub fn with_dummy_bytes(mut self, count: u8) -> Self {
        self.dummy_bytes = count;
        self
    }

    /// Returns true if this command has a read phase
    pub fn has_read(&self) -> bool {
        !self.read_buf.is_empty()
    }

    /// Returns true if this command has a write phase
    pub fn has_write(&self) -> bool {
        !self.write_data.is_empty()
    }

    /// Number of header bytes (opcode, address, dummy)
    pub fn header_len(&self) -> usize {
        1 + self.address_width.bytes() as usize + self.dummy_bytes as usize
    }

    /// Encode opcode, address and dummy bytes into `buf`
    ///
    /// Returns the number of bytes written. Dummy bytes are sent as 0x00.
    pub fn encode_header(&self, buf: &mut [u8; MAX_HEADER_LEN]) -> usize {
        let len = self.header_len();
        buf[0] = self.opcode;
        let addr_len = self.address_width.bytes() as usize;
        if let Some(addr) = self.address {
            self.address_width.encode(addr, &mut buf[1..1 + addr_len]);
        }
        buf[1 + addr_len..len].fill(0);
        len
    }

    /// Calculate the total number of bytes clocked during the transaction
    pub fn total_bytes(&self) -> usize {
        self.header_len() + self.write_data.len() + self.read_buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spi::opcodes;

    #[test]
    fn test_read_frame_layout() {
        let mut buf = [0u8; 16];
        let cmd = SpiCommand::read_3b(opcodes::READ, 0x00_1000, &mut buf);
        let mut header = [0u8; MAX_HEADER_LEN];
        let len = cmd.encode_header(&mut header);
        assert_eq!(&header[..len], &[0x03, 0x00, 0x10, 0x00]);
        assert_eq!(cmd.total_bytes(), 4 + 16);
    }

    #[test]
    fn test_simple_frame_is_opcode_only() {
        let cmd = SpiCommand::simple(opcodes::CE_C7);
        let mut header = [0xAAu8; MAX_HEADER_LEN];
        let len = cmd.encode_header(&mut header);
        assert_eq!(&header[..len], &[0xC7]);
        assert!(!cmd.has_read());
        assert!(!cmd.has_write());
    }

    #[test]
    fn test_dummy_bytes_are_zeroed() {
        let mut id = [0u8; 8];
        let cmd = SpiCommand::read_reg(opcodes::RDUID, &mut id).with_dummy_bytes(4);
        let mut header = [0xAAu8; MAX_HEADER_LEN];
        let len = cmd.encode_header(&mut header);
        assert_eq!(&header[..len], &[0x4B, 0, 0, 0, 0]);
    }
}
