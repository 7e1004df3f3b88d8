//! w25flash-dummy - In-memory W25Qxx flash emulator for testing
//!
//! This crate provides a simulated Winbond chip that implements the
//! [`Transport`] trait at the byte level. Bytes clocked out between
//! `select` and `deselect` are collected into a frame and decoded the way
//! the silicon does it: reads are answered while the frame is open,
//! everything else takes effect when chip select is released.
//!
//! It's useful for testing and development without real hardware.

mod error;

pub use error::{DummyError, Result as DummyResult};

use std::path::Path;

use w25flash_core::chip::{ChipTable, ERASED_VALUE, PAGE_SIZE};
use w25flash_core::error::{Error, Result};
use w25flash_core::spi::{opcodes, Status1, Status2};
use w25flash_core::transport::Transport;

/// Writable bits of status register 1 (BUSY and WEL are read-only)
const SR1_WRITABLE: u8 = 0xFC;
/// Writable bits of status register 2 (SUS and the reserved bit are read-only)
const SR2_WRITABLE: u8 = 0x7B;

/// Configuration for the dummy flash
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Bytes returned by JEDEC ID (manufacturer, memory type, capacity code)
    pub jedec_id: [u8; 3],
    /// Flash size in bytes
    pub size: usize,
    /// Value returned by Read Unique ID
    pub unique_id: [u8; 8],
    /// Status reads that report BUSY after each program, erase or status write
    pub busy_polls: u32,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            jedec_id: [0xEF, 0x40, 0x15], // W25Q16
            size: 2 * 1024 * 1024,
            unique_id: [0xD2, 0x64, 0x8C, 0x3B, 0x17, 0x5A, 0x21, 0x2E],
            busy_polls: 0,
        }
    }
}

impl DummyConfig {
    /// Configuration for a Winbond part with the given capacity code
    pub fn winbond(capacity_code: u8) -> DummyResult<Self> {
        let entry = ChipTable::WINBOND
            .lookup(capacity_code)
            .ok_or(DummyError::UnsupportedCapacity(capacity_code))?;
        Ok(Self {
            jedec_id: [0xEF, 0x40, capacity_code],
            size: entry.capacity_bytes as usize,
            ..Self::default()
        })
    }

    /// Override the JEDEC ID without changing the size
    pub fn with_jedec_id(mut self, jedec_id: [u8; 3]) -> Self {
        self.jedec_id = jedec_id;
        self
    }

    /// Set how many status reads stay BUSY after a program or erase
    pub fn with_busy_polls(mut self, polls: u32) -> Self {
        self.busy_polls = polls;
        self
    }

    /// Device ID byte returned by the 0x90 and 0xAB commands
    pub fn device_id(&self) -> u8 {
        self.jedec_id[2].wrapping_sub(1)
    }
}

/// One completed chip-select bracket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Bytes clocked out by the host (opcode, address, dummy, payload)
    pub tx: Vec<u8>,
    /// Number of bytes clocked in by the host
    pub rx_len: usize,
    /// A transfer inside the bracket failed; the frame had no effect
    pub aborted: bool,
}

impl Frame {
    /// Opcode of the frame, if any byte was sent
    pub fn opcode(&self) -> Option<u8> {
        self.tx.first().copied()
    }
}

/// Bus activity as seen by the chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    /// Chip select asserted
    Select,
    /// Chip select released
    Deselect,
    /// Bytes clocked out by the host
    Transmit(usize),
    /// Bytes clocked in by the host
    Receive(usize),
}

#[derive(Debug, Default)]
struct Faults {
    init: bool,
    transmit_in: Option<u32>,
    receive_in: Option<u32>,
}

/// Dummy flash chip
///
/// Emulates a W25Qxx chip in memory for testing purposes.
pub struct DummyFlash {
    config: DummyConfig,
    data: Vec<u8>,
    sr1: u8,
    sr2: u8,
    sr3: u8,
    wel: bool,
    volatile_wel: bool,
    busy_left: u32,
    suspended_busy: u32,
    stuck_busy: bool,
    wel_never_sets: bool,
    powered_down: bool,
    reset_enabled: bool,
    selected: bool,
    frame: Vec<u8>,
    received: usize,
    frame_aborted: bool,
    frames: Vec<Frame>,
    events: Vec<BusEvent>,
    faults: Faults,
    delay_total_ms: u64,
    delay_calls: u64,
}

impl DummyFlash {
    /// Create a new dummy flash with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let data = vec![ERASED_VALUE; config.size];
        Self {
            config,
            data,
            sr1: 0,
            sr2: 0,
            sr3: 0,
            wel: false,
            volatile_wel: false,
            busy_left: 0,
            suspended_busy: 0,
            stuck_busy: false,
            wel_never_sets: false,
            powered_down: false,
            reset_enabled: false,
            selected: false,
            frame: Vec::new(),
            received: 0,
            frame_aborted: false,
            frames: Vec::new(),
            events: Vec::new(),
            faults: Faults::default(),
            delay_total_ms: 0,
            delay_calls: 0,
        }
    }

    /// Create a new dummy flash with default configuration (W25Q16)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create a dummy flash with pre-filled data
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut flash = Self::new(config);
        let len = core::cmp::min(initial_data.len(), flash.data.len());
        flash.data[..len].copy_from_slice(&initial_data[..len]);
        flash
    }

    /// Create a dummy flash from an image file
    ///
    /// Images shorter than the chip are padded with erased bytes.
    pub fn from_image_file(config: DummyConfig, path: impl AsRef<Path>) -> DummyResult<Self> {
        let path = path.as_ref();
        let image = std::fs::read(path).map_err(|source| DummyError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        if image.len() > config.size {
            return Err(DummyError::ImageTooLarge {
                found: image.len(),
                capacity: config.size,
            });
        }
        log::debug!("dummy: loaded {} byte image from {}", image.len(), path.display());
        Ok(Self::with_data(config, &image))
    }

    /// Write the flash contents to an image file
    pub fn save_image(&self, path: impl AsRef<Path>) -> DummyResult<()> {
        let path = path.as_ref();
        std::fs::write(path, &self.data).map_err(|source| DummyError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get a reference to the flash data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the flash data
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Completed frames, oldest first
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Every select, deselect and transfer, oldest first
    pub fn bus_events(&self) -> &[BusEvent] {
        &self.events
    }

    /// Forget recorded frames, bus events and delays
    pub fn clear_log(&mut self) {
        self.frames.clear();
        self.events.clear();
        self.delay_total_ms = 0;
        self.delay_calls = 0;
    }

    /// Returns true if no select was issued while already selected and the
    /// bus ended deselected
    pub fn chip_select_balanced(&self) -> bool {
        let mut selected = false;
        for event in &self.events {
            match event {
                BusEvent::Select if selected => return false,
                BusEvent::Select => selected = true,
                BusEvent::Deselect => selected = false,
                _ => {}
            }
        }
        !selected
    }

    /// Opcodes of completed, non-aborted frames
    pub fn opcodes(&self) -> Vec<u8> {
        self.frames
            .iter()
            .filter(|f| !f.aborted)
            .filter_map(Frame::opcode)
            .collect()
    }

    /// Total milliseconds requested through `delay_ms`
    pub fn delay_total_ms(&self) -> u64 {
        self.delay_total_ms
    }

    /// Number of `delay_ms` calls
    pub fn delay_calls(&self) -> u64 {
        self.delay_calls
    }

    /// Returns true while in deep power down
    pub fn is_powered_down(&self) -> bool {
        self.powered_down
    }

    /// Status register 1 as the next read would see it, without consuming
    /// a busy poll
    pub fn peek_status1(&self) -> Status1 {
        let mut status = Status1::from_bits_retain(self.sr1 & SR1_WRITABLE);
        status.set(Status1::WEL, self.wel);
        status.set(Status1::BUSY, self.is_busy_now());
        status
    }

    /// Status register 2
    pub fn peek_status2(&self) -> Status2 {
        Status2::from_bits_retain(self.sr2)
    }

    /// Raw status register 3
    pub fn peek_status3(&self) -> u8 {
        self.sr3
    }

    /// Change how many status reads stay BUSY after each program or erase
    pub fn set_busy_polls(&mut self, polls: u32) {
        self.config.busy_polls = polls;
    }

    /// Report BUSY on every status read, forever
    pub fn set_stuck_busy(&mut self, stuck: bool) {
        self.stuck_busy = stuck;
    }

    /// Ignore Write Enable so WEL never sets
    pub fn set_wel_never_sets(&mut self, never: bool) {
        self.wel_never_sets = never;
    }

    /// Pretend an internal operation is running for `polls` status reads
    pub fn start_busy(&mut self, polls: u32) {
        self.busy_left = polls;
    }

    /// Make the next transport `init` fail
    pub fn fail_init(&mut self, fail: bool) {
        self.faults.init = fail;
    }

    /// Fail the transmit after `n` more successful ones
    pub fn fail_transmit_after(&mut self, n: u32) {
        self.faults.transmit_in = Some(n);
    }

    /// Fail the receive after `n` more successful ones
    pub fn fail_receive_after(&mut self, n: u32) {
        self.faults.receive_in = Some(n);
    }

    fn is_busy_now(&self) -> bool {
        self.stuck_busy || self.busy_left > 0
    }

    /// Status register 1 as returned on the bus; consumes one busy poll
    fn read_status1_byte(&mut self) -> u8 {
        let status = self.peek_status1();
        if self.busy_left > 0 {
            self.busy_left -= 1;
        }
        status.bits()
    }

    fn address(&self, frame: &[u8]) -> usize {
        let addr = ((frame[1] as usize) << 16) | ((frame[2] as usize) << 8) | frame[3] as usize;
        addr % self.data.len()
    }

    fn fault_hit(slot: &mut Option<u32>) -> bool {
        match slot {
            Some(0) => {
                *slot = None;
                true
            }
            Some(n) => {
                *n -= 1;
                false
            }
            None => false,
        }
    }

    /// Produce the byte at `index` of the read phase of the current frame
    fn output_byte(&mut self, index: usize) -> u8 {
        let Some(&opcode) = self.frame.first() else {
            return ERASED_VALUE;
        };
        // Release Power Down with dummy bytes answers even while powered down
        if opcode == opcodes::RDP && self.frame.len() >= 4 {
            return self.config.device_id();
        }
        if self.powered_down {
            return ERASED_VALUE;
        }

        match opcode {
            opcodes::RDSR => return self.read_status1_byte(),
            opcodes::RDSR2 => return self.sr2,
            opcodes::RDSR3 => return self.sr3,
            _ => {}
        }

        // Array and ID reads are not serviced while an operation runs
        if self.is_busy_now() {
            return ERASED_VALUE;
        }

        match opcode {
            opcodes::RDID => self.config.jedec_id.get(index).copied().unwrap_or(0),
            opcodes::REMS if self.frame.len() >= 4 => {
                let swap = (self.frame[3] & 1) as usize;
                if (index + swap) % 2 == 0 {
                    self.config.jedec_id[0]
                } else {
                    self.config.device_id()
                }
            }
            opcodes::RDUID if self.frame.len() >= 5 => {
                self.config.unique_id.get(index).copied().unwrap_or(0)
            }
            opcodes::READ if self.frame.len() >= 4 => {
                let addr = self.address(&self.frame);
                self.data[(addr + index) % self.data.len()]
            }
            _ => ERASED_VALUE,
        }
    }

    /// Apply the effects of a frame once chip select is released
    fn complete_frame(&mut self, tx: &[u8]) {
        let Some(&opcode) = tx.first() else {
            return;
        };
        let reset_armed = self.reset_enabled;
        self.reset_enabled = opcode == opcodes::RSTEN;

        if self.powered_down {
            if opcode == opcodes::RDP {
                log::trace!("dummy: release from power down");
                self.powered_down = false;
            }
            return;
        }

        if self.is_busy_now() {
            if opcode == opcodes::SUSPEND {
                self.suspend();
            } else {
                log::trace!("dummy: ignoring opcode 0x{:02X} while busy", opcode);
            }
            return;
        }

        match opcode {
            opcodes::WREN => {
                if !self.wel_never_sets {
                    self.wel = true;
                }
            }
            opcodes::WRDI => {
                self.wel = false;
                self.volatile_wel = false;
            }
            opcodes::VWREN => self.volatile_wel = true,
            opcodes::WRSR | opcodes::WRSR2 | opcodes::WRSR3 if tx.len() >= 2 => {
                self.write_status(opcode, &tx[1..]);
            }
            opcodes::PP if tx.len() > 4 && self.wel => self.program(tx),
            opcodes::SE_20 if tx.len() >= 4 && self.wel => self.erase(tx, 4 * 1024),
            opcodes::BE_52 if tx.len() >= 4 && self.wel => self.erase(tx, 32 * 1024),
            opcodes::BE_D8 if tx.len() >= 4 && self.wel => self.erase(tx, 64 * 1024),
            opcodes::CE_C7 if self.wel => self.erase_chip(),
            opcodes::DP => {
                log::trace!("dummy: entering power down");
                self.powered_down = true;
            }
            opcodes::RESUME => self.resume(),
            opcodes::RST if reset_armed => self.reset(),
            _ => {}
        }
    }

    fn finish_write(&mut self) {
        self.wel = false;
        self.volatile_wel = false;
        self.busy_left = self.config.busy_polls;
    }

    fn write_status(&mut self, opcode: u8, values: &[u8]) {
        let volatile = self.volatile_wel && !self.wel;
        if !self.wel && !self.volatile_wel {
            return;
        }
        match opcode {
            opcodes::WRSR => {
                self.sr1 = values[0] & SR1_WRITABLE;
                if let Some(&sr2) = values.get(1) {
                    self.sr2 = (self.sr2 & !SR2_WRITABLE) | (sr2 & SR2_WRITABLE);
                }
            }
            opcodes::WRSR2 => self.sr2 = (self.sr2 & !SR2_WRITABLE) | (values[0] & SR2_WRITABLE),
            _ => self.sr3 = values[0],
        }
        if volatile {
            self.wel = false;
            self.volatile_wel = false;
        } else {
            self.finish_write();
        }
    }

    fn program(&mut self, tx: &[u8]) {
        let page = PAGE_SIZE as usize;
        let addr = self.address(tx);
        let payload = &tx[4..];
        // Only the last page worth of data is latched
        let payload = &payload[payload.len().saturating_sub(page)..];
        let base = addr - addr % page;
        let offset = addr % page;

        log::debug!("dummy: program 0x{:06X}+{}", addr, payload.len());
        for (i, &byte) in payload.iter().enumerate() {
            // Flash programming: can only change 1 -> 0
            self.data[base + (offset + i) % page] &= byte;
        }
        self.finish_write();
    }

    fn erase(&mut self, tx: &[u8], unit: usize) {
        let addr = self.address(tx);
        let start = addr & !(unit - 1);
        let end = core::cmp::min(start + unit, self.data.len());

        log::debug!("dummy: erase 0x{:06X}..0x{:06X}", start, end);
        self.data[start..end].fill(ERASED_VALUE);
        self.finish_write();
    }

    fn erase_chip(&mut self) {
        log::debug!("dummy: chip erase");
        self.data.fill(ERASED_VALUE);
        self.finish_write();
    }

    fn suspend(&mut self) {
        if self.sr2 & Status2::SUS.bits() != 0 {
            return;
        }
        self.suspended_busy = self.busy_left;
        self.busy_left = 0;
        self.sr2 |= Status2::SUS.bits();
    }

    fn resume(&mut self) {
        if self.sr2 & Status2::SUS.bits() == 0 {
            return;
        }
        self.sr2 &= !Status2::SUS.bits();
        self.busy_left = self.suspended_busy;
        self.suspended_busy = 0;
    }

    fn reset(&mut self) {
        log::debug!("dummy: software reset");
        self.wel = false;
        self.volatile_wel = false;
        self.busy_left = 0;
        self.suspended_busy = 0;
        self.sr2 &= !Status2::SUS.bits();
    }
}

impl Transport for DummyFlash {
    fn init(&mut self) -> Result<()> {
        if self.faults.init {
            return Err(Error::transport());
        }
        Ok(())
    }

    fn select(&mut self) -> Result<()> {
        self.events.push(BusEvent::Select);
        if self.selected {
            log::warn!("dummy: select while already selected");
        }
        self.selected = true;
        self.frame.clear();
        self.received = 0;
        self.frame_aborted = false;
        Ok(())
    }

    fn deselect(&mut self) -> Result<()> {
        self.events.push(BusEvent::Deselect);
        if !self.selected {
            return Ok(());
        }
        self.selected = false;

        let tx = core::mem::take(&mut self.frame);
        if !self.frame_aborted {
            self.complete_frame(&tx);
        }
        if let Some(&opcode) = tx.first() {
            log::trace!("dummy: frame 0x{:02X} tx={} rx={}", opcode, tx.len(), self.received);
        }
        self.frames.push(Frame {
            tx,
            rx_len: self.received,
            aborted: self.frame_aborted,
        });
        Ok(())
    }

    fn transmit(&mut self, data: &[u8]) -> Result<()> {
        if !self.selected {
            return Err(Error::transport());
        }
        if Self::fault_hit(&mut self.faults.transmit_in) {
            self.frame_aborted = true;
            return Err(Error::transport());
        }
        self.events.push(BusEvent::Transmit(data.len()));
        self.frame.extend_from_slice(data);
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<()> {
        if !self.selected {
            return Err(Error::transport());
        }
        if Self::fault_hit(&mut self.faults.receive_in) {
            self.frame_aborted = true;
            return Err(Error::transport());
        }
        self.events.push(BusEvent::Receive(buf.len()));
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.output_byte(self.received + i);
        }
        self.received += buf.len();
        Ok(())
    }

    fn delay_ms(&mut self, ms: u32) {
        // No delay needed for in-memory operations
        self.delay_total_ms += ms as u64;
        self.delay_calls += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use w25flash_core::chip::EraseKind;
    use w25flash_core::protocol;
    use w25flash_core::spi::StatusRegister;

    #[test]
    fn test_read_jedec_id() {
        let mut flash = DummyFlash::new_default();
        let id = protocol::read_jedec_id(&mut flash).unwrap();
        assert_eq!(id, [0xEF, 0x40, 0x15]);
    }

    #[test]
    fn test_winbond_config_sizes() {
        let config = DummyConfig::winbond(0x17).unwrap();
        assert_eq!(config.size, 8 * 1024 * 1024);
        assert!(matches!(
            DummyConfig::winbond(0x30),
            Err(DummyError::UnsupportedCapacity(0x30))
        ));
    }

    #[test]
    fn test_read_write() {
        let mut flash = DummyFlash::new_default();

        let data = [0x12, 0x34, 0x56, 0x78];
        protocol::write_enable(&mut flash).unwrap();
        protocol::program_page_3b(&mut flash, 0x1000, &data).unwrap();

        let mut buf = [0u8; 4];
        protocol::read_3b(&mut flash, 0x1000, &mut buf).unwrap();
        assert_eq!(buf, data);
    }

    #[test]
    fn test_program_without_wel_is_ignored() {
        let mut flash = DummyFlash::new_default();
        protocol::program_page_3b(&mut flash, 0, &[0x00; 4]).unwrap();
        assert!(flash.data()[..4].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_program_only_clears_bits() {
        let mut flash = DummyFlash::new_default();
        protocol::write_enable(&mut flash).unwrap();
        protocol::program_page_3b(&mut flash, 0, &[0xF0]).unwrap();
        protocol::write_enable(&mut flash).unwrap();
        protocol::program_page_3b(&mut flash, 0, &[0x3C]).unwrap();
        assert_eq!(flash.data()[0], 0x30);
    }

    #[test]
    fn test_program_wraps_within_page() {
        let mut flash = DummyFlash::new_default();
        protocol::write_enable(&mut flash).unwrap();
        protocol::program_page_3b(&mut flash, 0x1FE, &[0x01, 0x02, 0x03, 0x04]).unwrap();
        assert_eq!(&flash.data()[0x1FE..0x200], &[0x01, 0x02]);
        assert_eq!(&flash.data()[0x100..0x102], &[0x03, 0x04]);
        assert_eq!(flash.data()[0x200], 0xFF);
    }

    #[test]
    fn test_wel_cleared_after_program() {
        let mut flash = DummyFlash::new_default();
        protocol::write_enable(&mut flash).unwrap();
        assert!(protocol::check_wel(&mut flash).unwrap());
        protocol::program_page_3b(&mut flash, 0, &[0x00]).unwrap();
        assert!(!protocol::check_wel(&mut flash).unwrap());
    }

    #[test]
    fn test_erase_aligns_down() {
        let mut flash = DummyFlash::with_data(DummyConfig::default(), &[0x00; 0x3000]);

        protocol::write_enable(&mut flash).unwrap();
        protocol::erase_3b(&mut flash, EraseKind::Sector, 0x1234).unwrap();

        assert!(flash.data()[0x1000..0x2000].iter().all(|&b| b == 0xFF));
        assert_eq!(flash.data()[0x0FFF], 0x00);
        assert_eq!(flash.data()[0x2000], 0x00);
    }

    #[test]
    fn test_busy_polls_counted_down() {
        let mut flash = DummyFlash::new(DummyConfig::default().with_busy_polls(2));
        protocol::write_enable(&mut flash).unwrap();
        protocol::program_page_3b(&mut flash, 0, &[0x00]).unwrap();

        assert!(protocol::is_busy(&mut flash).unwrap());
        assert!(protocol::is_busy(&mut flash).unwrap());
        assert!(!protocol::is_busy(&mut flash).unwrap());
    }

    #[test]
    fn test_poll_ready_reports_busy() {
        let mut flash = DummyFlash::new_default();
        assert_eq!(protocol::poll_ready(&mut flash).unwrap(), protocol::ReadyState::Ready);

        flash.start_busy(1);
        assert_eq!(protocol::poll_ready(&mut flash).unwrap(), protocol::ReadyState::Busy);
        assert_eq!(protocol::poll_ready(&mut flash).unwrap(), protocol::ReadyState::Ready);
    }

    #[test]
    fn test_device_id_wakes_chip() {
        let mut flash = DummyFlash::new_default();
        protocol::power_down(&mut flash).unwrap();

        assert_eq!(protocol::read_device_id(&mut flash).unwrap(), 0x14);
        assert!(!flash.is_powered_down());
        assert_eq!(flash.frames().last().unwrap().tx, vec![0xAB, 0, 0, 0]);
    }

    #[test]
    fn test_power_down_ignores_commands() {
        let mut flash = DummyFlash::new_default();
        protocol::power_down(&mut flash).unwrap();
        assert!(flash.is_powered_down());
        assert_eq!(protocol::read_jedec_id(&mut flash).unwrap(), [0xFF; 3]);

        protocol::release_power_down(&mut flash).unwrap();
        assert!(!flash.is_powered_down());
        assert_eq!(protocol::read_jedec_id(&mut flash).unwrap(), [0xEF, 0x40, 0x15]);
    }

    #[test]
    fn test_status_register_write() {
        let mut flash = DummyFlash::new_default();
        protocol::write_enable(&mut flash).unwrap();
        protocol::write_status(&mut flash, StatusRegister::Two, 0xFF).unwrap();
        // SUS and the reserved bit are read-only
        assert_eq!(flash.peek_status2().bits(), 0x7B);
        assert!(!flash.peek_status1().contains(Status1::WEL));
    }

    #[test]
    fn test_ids() {
        let mut flash = DummyFlash::new_default();
        assert_eq!(protocol::read_manufacturer_device_id(&mut flash).unwrap(), (0xEF, 0x14));
        assert_eq!(
            protocol::read_unique_id(&mut flash).unwrap(),
            DummyConfig::default().unique_id
        );
    }

    #[test]
    fn test_transmit_fault_aborts_frame() {
        let mut flash = DummyFlash::new_default();
        protocol::write_enable(&mut flash).unwrap();
        // Header goes through, payload fails
        flash.fail_transmit_after(1);
        let err = protocol::program_page_3b(&mut flash, 0, &[0x00; 8]).unwrap_err();
        assert_eq!(err, Error::transport());

        assert!(flash.data()[..8].iter().all(|&b| b == 0xFF));
        assert!(flash.frames().last().unwrap().aborted);
        assert!(flash.chip_select_balanced());
    }

    #[test]
    fn test_image_round_trip() {
        let path = std::env::temp_dir().join(format!("w25flash-dummy-{}.bin", std::process::id()));
        let mut flash = DummyFlash::new(DummyConfig::winbond(0x11).unwrap());
        flash.data_mut()[..4].copy_from_slice(&[1, 2, 3, 4]);
        flash.save_image(&path).unwrap();

        let loaded = DummyFlash::from_image_file(DummyConfig::winbond(0x11).unwrap(), &path).unwrap();
        assert_eq!(loaded.data(), flash.data());

        let too_small = DummyConfig {
            size: 16,
            ..DummyConfig::default()
        };
        assert!(matches!(
            DummyFlash::from_image_file(too_small, &path),
            Err(DummyError::ImageTooLarge { .. })
        ));
        std::fs::remove_file(&path).unwrap();
    }
}
