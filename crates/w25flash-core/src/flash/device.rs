//! W25Qxx device handle
//!
//! This module provides `DeviceHandle`, which pairs a borrowed
//! [`Transport`] with the descriptor resolved at detection time and
//! enforces the rules every mutating operation follows:
//!
//! 1. validate the request against the chip geometry
//! 2. wait for BUSY to clear
//! 3. send Write Enable (program/erase/status writes only)
//! 4. send the command frame
//! 5. wait for BUSY to clear again (program/erase completion barrier)
//!
//! Uses `maybe_async` to support both sync and async modes.

use crate::chip::{ChipDescriptor, ChipTable, ChipType, EraseKind};
use crate::error::{DeviceFault, Error, ParamError, Result};
use crate::flash::config::{DriverConfig, EraseAlignment, WriteEnableMode};
use crate::protocol;
use crate::spi::{AddressWidth, Status2, StatusRegister};
use crate::transport::Transport;
use maybe_async::maybe_async;

/// Handle for one physical W25Qxx chip
///
/// The handle borrows the transport for its whole lifetime, so the borrow
/// checker guarantees exclusive use of the bus. Sharing a chip between
/// callers requires wrapping the handle in an external lock.
///
/// # Example
///
/// ```ignore
/// use w25flash_core::flash::DeviceHandle;
///
/// fn dump_first_page<T: Transport>(spi: &mut T) -> Result<[u8; 256]> {
///     let mut flash = DeviceHandle::new(spi);
///     flash.init()?;
///
///     let mut page = [0u8; 256];
///     flash.read(0, &mut page)?;
///     Ok(page)
/// }
/// ```
pub struct DeviceHandle<'a, T: Transport + ?Sized> {
    transport: &'a mut T,
    table: ChipTable<'a>,
    config: DriverConfig,
    info: ChipDescriptor,
    initialized: bool,
}

impl<'a, T: Transport + ?Sized> DeviceHandle<'a, T> {
    /// Create an uninitialized handle with the default configuration
    pub fn new(transport: &'a mut T) -> Self {
        Self::with_config(transport, DriverConfig::default())
    }

    /// Create an uninitialized handle with the given configuration
    pub fn with_config(transport: &'a mut T, config: DriverConfig) -> Self {
        Self {
            transport,
            table: ChipTable::WINBOND,
            config,
            info: ChipDescriptor::default(),
            initialized: false,
        }
    }

    /// Use a custom chip table for detection
    pub fn with_table(mut self, table: ChipTable<'a>) -> Self {
        self.table = table;
        self
    }

    /// Get the driver configuration
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Replace the driver configuration
    pub fn set_config(&mut self, config: DriverConfig) {
        self.config = config;
    }

    /// Returns true after a successful `init`
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Chip type from the last detection attempt
    ///
    /// `Unknown` before detection and after a failed detection.
    pub fn chip_type(&self) -> ChipType {
        self.info.chip_type
    }

    /// Get a mutable reference to the underlying transport
    pub fn transport(&mut self) -> &mut T {
        self.transport
    }

    /// Return a copy of the detected chip descriptor
    ///
    /// # Errors
    /// * `InvalidParameter(Uninitialized)` - handle not initialized
    pub fn info(&self) -> Result<ChipDescriptor> {
        if !self.initialized {
            return Err(Error::InvalidParameter(ParamError::Uninitialized));
        }
        Ok(self.info)
    }

    /// Mark the handle uninitialized
    ///
    /// The descriptor is left in place but no operation will use it until
    /// the next `init`.
    ///
    /// # Errors
    /// * `InvalidParameter(Uninitialized)` - handle was not initialized
    pub fn deinit(&mut self) -> Result<()> {
        if !self.initialized {
            return Err(Error::InvalidParameter(ParamError::Uninitialized));
        }
        self.initialized = false;
        log::debug!("w25q: deinitialized {}", self.info.chip_type.name());
        Ok(())
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    /// Validate a read or program range
    fn check_range(&self, addr: u32, len: usize) -> Result<()> {
        if len == 0 {
            return Err(Error::InvalidParameter(ParamError::ZeroLength));
        }
        if !self.info.is_valid_range(addr, len) {
            return Err(Error::InvalidParameter(ParamError::OutOfRange {
                addr,
                len,
                capacity: self.info.capacity_bytes,
            }));
        }
        // Only the last byte needs checking, the range is already bounded
        let last = addr + (len as u32 - 1);
        if !AddressWidth::ThreeByte.fits(last) {
            return Err(Error::InvalidParameter(ParamError::AddressTooWide { addr: last }));
        }
        Ok(())
    }

    /// Validate an erase address for the given unit
    fn check_erase(&self, kind: EraseKind, addr: u32) -> Result<()> {
        let Some(unit) = kind.unit_size() else {
            return Ok(());
        };
        if !self.info.is_valid_address(addr) {
            return Err(Error::InvalidParameter(ParamError::OutOfRange {
                addr,
                len: 1,
                capacity: self.info.capacity_bytes,
            }));
        }
        if !AddressWidth::ThreeByte.fits(addr) {
            return Err(Error::InvalidParameter(ParamError::AddressTooWide { addr }));
        }
        if self.config.erase_alignment == EraseAlignment::Strict && addr % unit != 0 {
            return Err(Error::InvalidParameter(ParamError::Misaligned { addr, unit }));
        }
        Ok(())
    }
}

#[maybe_async]
impl<'a, T: Transport + ?Sized> DeviceHandle<'a, T> {
    /// Bring the chip up and detect it
    ///
    /// Initializes the transport, releases chip select, wakes the chip from
    /// power down and runs detection. On success the handle is initialized.
    ///
    /// # Errors
    /// * `DeviceError(TransportInit)` - transport initialization failed
    /// * `DeviceError(UnknownManufacturer | UnknownCapacity)` - detection failed
    pub async fn init(&mut self) -> Result<()> {
        self.initialized = false;

        if let Err(e) = self.transport.init().await {
            log::error!("w25q: transport init failed: {}", e);
            return Err(Error::DeviceError(DeviceFault::TransportInit));
        }

        self.transport.deselect().await?;
        self.wake_up().await?;
        self.detect().await?;

        self.initialized = true;
        log::debug!(
            "w25q: initialized {} ({} bytes)",
            self.info.chip_type.name(),
            self.info.capacity_bytes
        );
        Ok(())
    }

    /// Read the raw 3-byte JEDEC ID
    pub async fn read_jedec_id(&mut self) -> Result<[u8; 3]> {
        protocol::read_jedec_id(self.transport).await
    }

    /// Read the manufacturer ID and capacity code
    pub async fn read_id(&mut self) -> Result<(u8, u8)> {
        let [manufacturer, _, capacity] = self.read_jedec_id().await?;
        Ok((manufacturer, capacity))
    }

    /// Identify the chip and populate the descriptor
    ///
    /// On failure the chip type becomes `Unknown` and the handle is no
    /// longer initialized.
    ///
    /// # Errors
    /// * `DeviceError(UnknownManufacturer)` - manufacturer byte does not match the table
    /// * `DeviceError(UnknownCapacity)` - capacity code not in the table
    pub async fn detect(&mut self) -> Result<ChipDescriptor> {
        let jedec = self.read_jedec_id().await?;
        log::debug!(
            "w25q: JEDEC ID {:02X} {:02X} {:02X}",
            jedec[0],
            jedec[1],
            jedec[2]
        );

        match self.table.resolve(jedec) {
            Ok(info) => {
                self.info = info;
                Ok(info)
            }
            Err(e) => {
                log::warn!("w25q: detection failed: {}", e);
                self.info.chip_type = ChipType::Unknown;
                self.initialized = false;
                Err(e)
            }
        }
    }

    /// Block until the chip reports not busy
    ///
    /// # Errors
    /// * `Timeout` - BUSY still set after the configured poll budget
    pub async fn wait_ready(&mut self) -> Result<()> {
        self.ensure_initialized()?;
        self.wait_ready_raw().await
    }

    async fn wait_ready_raw(&mut self) -> Result<()> {
        protocol::wait_ready(
            self.transport,
            self.config.poll_interval_ms,
            self.config.effective_polls(),
        )
        .await
    }

    /// Send Write Enable according to the configured policy
    ///
    /// # Errors
    /// * `DeviceError(WriteEnableFailed)` - verify mode only, WEL never set
    pub async fn write_enable(&mut self) -> Result<()> {
        self.ensure_initialized()?;
        self.write_enable_raw().await
    }

    async fn write_enable_raw(&mut self) -> Result<()> {
        match self.config.write_enable {
            WriteEnableMode::FireAndForget => protocol::write_enable(self.transport).await,
            WriteEnableMode::Verify => {
                protocol::write_enable_verified(
                    self.transport,
                    self.config.poll_interval_ms,
                    self.config.effective_polls(),
                )
                .await
            }
        }
    }

    /// Send Write Disable
    pub async fn write_disable(&mut self) -> Result<()> {
        self.ensure_initialized()?;
        self.wait_ready_raw().await?;
        protocol::write_disable(self.transport).await
    }

    /// Read `buf.len()` bytes starting at `addr`
    ///
    /// On error the contents of `buf` are unspecified.
    ///
    /// # Errors
    /// * `NotInitialized` - `init` has not succeeded
    /// * `InvalidParameter` - empty buffer or range beyond the chip
    /// * `Timeout` - chip stayed busy
    pub async fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        self.ensure_initialized()?;
        self.check_range(addr, buf.len())?;

        self.wait_ready_raw().await?;
        log::trace!("w25q: read 0x{:06X}+{}", addr, buf.len());
        protocol::read_3b(self.transport, addr, buf).await
    }

    /// Program up to one page at `addr`
    ///
    /// The target bytes should be erased. Data that runs past the end of
    /// the page wraps to the start of the same page, as the chip does.
    /// Returns once the program has completed on chip.
    ///
    /// # Errors
    /// * `NotInitialized` - `init` has not succeeded
    /// * `InvalidParameter` - empty data, more than one page, or range beyond the chip
    /// * `Timeout` - chip stayed busy before or after the program
    pub async fn write_page(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        self.ensure_initialized()?;
        if data.len() > self.info.page_size as usize {
            return Err(Error::InvalidParameter(ParamError::PageOverflow { len: data.len() }));
        }
        self.check_range(addr, data.len())?;

        let page_offset = addr % self.info.page_size;
        if page_offset as usize + data.len() > self.info.page_size as usize {
            log::debug!(
                "w25q: program at 0x{:06X}+{} wraps within its page",
                addr,
                data.len()
            );
        }

        self.wait_ready_raw().await?;
        self.write_enable_raw().await?;
        log::trace!("w25q: program 0x{:06X}+{}", addr, data.len());
        protocol::program_page_3b(self.transport, addr, data).await?;
        self.wait_ready_raw().await
    }

    /// Program `data` at `addr`, splitting at page boundaries
    ///
    /// Each page goes through [`write_page`](Self::write_page). There is no
    /// rollback: if a page fails, pages already programmed stay programmed.
    pub async fn write(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        self.ensure_initialized()?;
        self.check_range(addr, data.len())?;

        let page_size = self.info.page_size as usize;
        let mut offset = 0usize;
        let mut current_addr = addr;

        while offset < data.len() {
            let page_offset = (current_addr as usize) % page_size;
            let chunk_size = core::cmp::min(page_size - page_offset, data.len() - offset);
            let chunk = &data[offset..offset + chunk_size];

            if let Err(e) = self.write_page(current_addr, chunk).await {
                log::error!(
                    "w25q: program failed at 0x{:06X} after {} of {} bytes: {}",
                    current_addr,
                    offset,
                    data.len(),
                    e
                );
                return Err(e);
            }

            offset += chunk_size;
            current_addr += chunk_size as u32;
        }

        Ok(())
    }

    /// Erase one unit of the given granularity
    ///
    /// With [`EraseAlignment::Unchecked`] a misaligned `addr` erases the
    /// unit containing it. `addr` is ignored for [`EraseKind::Chip`].
    /// Returns once the erase has completed on chip.
    ///
    /// # Errors
    /// * `NotInitialized` - `init` has not succeeded
    /// * `InvalidParameter` - address beyond the chip, or misaligned in strict mode
    /// * `Timeout` - chip stayed busy before or after the erase
    pub async fn erase(&mut self, kind: EraseKind, addr: u32) -> Result<()> {
        self.ensure_initialized()?;
        self.check_erase(kind, addr)?;

        self.wait_ready_raw().await?;
        self.write_enable_raw().await?;
        log::trace!("w25q: erase {:?} at 0x{:06X}", kind, addr);
        protocol::erase_3b(self.transport, kind, addr).await?;
        self.wait_ready_raw().await
    }

    /// Erase the 4KB sector containing `addr`
    pub async fn erase_sector(&mut self, addr: u32) -> Result<()> {
        self.erase(EraseKind::Sector, addr).await
    }

    /// Erase the 32KB block containing `addr`
    pub async fn erase_block_32k(&mut self, addr: u32) -> Result<()> {
        self.erase(EraseKind::Block32K, addr).await
    }

    /// Erase the 64KB block containing `addr`
    pub async fn erase_block_64k(&mut self, addr: u32) -> Result<()> {
        self.erase(EraseKind::Block64K, addr).await
    }

    /// Erase the whole chip
    pub async fn erase_chip(&mut self) -> Result<()> {
        self.erase(EraseKind::Chip, 0).await
    }

    /// Enter deep power down
    ///
    /// Does not wait for the chip to be ready first.
    pub async fn power_down(&mut self) -> Result<()> {
        self.ensure_initialized()?;
        protocol::power_down(self.transport).await
    }

    /// Release deep power down and wait the configured wake delay
    ///
    /// Allowed before `init`, which calls it.
    pub async fn wake_up(&mut self) -> Result<()> {
        protocol::release_power_down(self.transport).await?;
        self.transport.delay_ms(self.config.wake_delay_ms).await;
        Ok(())
    }

    /// Single non-blocking BUSY check
    pub async fn is_busy(&mut self) -> Result<bool> {
        self.ensure_initialized()?;
        protocol::is_busy(self.transport).await
    }

    /// Read one status register
    pub async fn read_status(&mut self, reg: StatusRegister) -> Result<u8> {
        self.ensure_initialized()?;
        protocol::read_status(self.transport, reg).await
    }

    /// Write one status register
    ///
    /// With `volatile` the value is written with the volatile enable (0x50)
    /// and is lost at power off; otherwise the configured Write Enable
    /// policy applies and the value is stored.
    pub async fn write_status(&mut self, reg: StatusRegister, value: u8, volatile: bool) -> Result<()> {
        self.ensure_initialized()?;
        self.wait_ready_raw().await?;
        if volatile {
            protocol::write_enable_volatile(self.transport).await?;
        } else {
            self.write_enable_raw().await?;
        }
        protocol::write_status(self.transport, reg, value).await?;
        self.wait_ready_raw().await
    }

    /// Read the 64-bit factory unique ID
    pub async fn read_unique_id(&mut self) -> Result<[u8; 8]> {
        self.ensure_initialized()?;
        self.wait_ready_raw().await?;
        protocol::read_unique_id(self.transport).await
    }

    /// Read manufacturer and device ID with the legacy 0x90 command
    pub async fn read_manufacturer_device_id(&mut self) -> Result<(u8, u8)> {
        self.ensure_initialized()?;
        self.wait_ready_raw().await?;
        protocol::read_manufacturer_device_id(self.transport).await
    }

    /// Read the legacy one-byte device ID (0xAB + 3 dummy bytes)
    ///
    /// The same opcode releases deep power down, so this does not wait for
    /// ready first and waits the configured wake delay afterwards.
    pub async fn read_device_id(&mut self) -> Result<u8> {
        self.ensure_initialized()?;
        let id = protocol::read_device_id(self.transport).await?;
        self.transport.delay_ms(self.config.wake_delay_ms).await;
        Ok(id)
    }

    /// Suspend an in-progress erase or program
    ///
    /// Returns `Ok(false)` without sending anything if the chip is idle or
    /// already suspended.
    pub async fn suspend(&mut self) -> Result<bool> {
        self.ensure_initialized()?;
        let sr2 = protocol::read_status2(self.transport).await?;
        if sr2.contains(Status2::SUS) || !protocol::is_busy(self.transport).await? {
            return Ok(false);
        }
        protocol::suspend(self.transport).await?;
        self.transport.delay_ms(1).await;
        Ok(true)
    }

    /// Resume a suspended erase or program
    ///
    /// Returns `Ok(false)` without sending anything if nothing is suspended
    /// or the chip is busy.
    pub async fn resume(&mut self) -> Result<bool> {
        self.ensure_initialized()?;
        let sr2 = protocol::read_status2(self.transport).await?;
        if !sr2.contains(Status2::SUS) || protocol::is_busy(self.transport).await? {
            return Ok(false);
        }
        protocol::resume(self.transport).await?;
        Ok(true)
    }

    /// Software reset once the chip is idle
    pub async fn reset(&mut self) -> Result<()> {
        self.ensure_initialized()?;
        self.wait_ready_raw().await?;
        protocol::software_reset(self.transport).await
    }
}

// The emulator crate turns on `is_sync` for the whole workspace, so run
// these with `cargo test -p w25flash-core` to get the async build.
#[cfg(all(test, not(feature = "is_sync")))]
mod async_tests {
    use super::*;
    use crate::spi::opcodes;

    /// W25Q16 whose status register never clears BUSY
    #[derive(Default)]
    struct StuckBusy {
        opcode: Option<u8>,
        selects: u32,
        deselects: u32,
        delays: u32,
    }

    impl Transport for StuckBusy {
        async fn select(&mut self) -> Result<()> {
            self.opcode = None;
            self.selects += 1;
            Ok(())
        }

        async fn deselect(&mut self) -> Result<()> {
            self.deselects += 1;
            Ok(())
        }

        async fn transmit(&mut self, data: &[u8]) -> Result<()> {
            if self.opcode.is_none() {
                self.opcode = data.first().copied();
            }
            Ok(())
        }

        async fn receive(&mut self, buf: &mut [u8]) -> Result<()> {
            match self.opcode {
                Some(opcodes::RDID) => buf.copy_from_slice(&[0xEF, 0x40, 0x15][..buf.len()]),
                Some(opcodes::RDSR) => buf.fill(0x01),
                _ => buf.fill(0xFF),
            }
            Ok(())
        }

        async fn delay_ms(&mut self, _ms: u32) {
            self.delays += 1;
            tokio::task::yield_now().await;
        }
    }

    fn block_on<F: core::future::Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(fut)
    }

    #[test]
    fn test_async_init_and_timeout() {
        let mut bus = StuckBusy::default();
        block_on(async {
            let config = DriverConfig::default().with_ready_polls(7);
            let mut flash = DeviceHandle::with_config(&mut bus, config);

            flash.init().await.unwrap();
            assert_eq!(flash.chip_type(), ChipType::W25Q16);
            assert_eq!(flash.transport().delays, 1);

            assert_eq!(flash.wait_ready().await, Err(Error::Timeout));
            // Wake delay plus one yield per poll
            assert_eq!(flash.transport().delays, 8);
        });
        // init releases chip select once before the first command
        assert_eq!(bus.deselects, bus.selects + 1);
    }

    #[test]
    fn test_async_range_rejected_before_bus() {
        let mut bus = StuckBusy::default();
        block_on(async {
            let mut flash = DeviceHandle::new(&mut bus);
            let mut buf = [0u8; 2];
            assert_eq!(flash.read(0, &mut buf).await, Err(Error::NotInitialized));

            flash.init().await.unwrap();
            let selects = flash.transport().selects;

            assert_eq!(
                flash.read(0x1F_FFFF, &mut buf).await,
                Err(Error::InvalidParameter(ParamError::OutOfRange {
                    addr: 0x1F_FFFF,
                    len: 2,
                    capacity: 0x20_0000,
                }))
            );
            assert_eq!(
                flash.write_page(0, &[0u8; 257]).await,
                Err(Error::InvalidParameter(ParamError::PageOverflow { len: 257 }))
            );
            assert_eq!(flash.transport().selects, selects);
        });
    }
}
