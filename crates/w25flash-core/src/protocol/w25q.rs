//! W25Qxx protocol implementation
//!
//! Uses `maybe_async` to support both sync and async modes:
//! - With `is_sync` feature: blocking/synchronous
//! - Without `is_sync` feature: async (for Embassy or any executor)
//!
//! These functions issue raw frames and perform no geometry validation and
//! no write-enable sequencing. [`DeviceHandle`](crate::flash::DeviceHandle)
//! layers those rules on top.

use crate::chip::EraseKind;
use crate::error::{DeviceFault, Error, Result};
use crate::spi::{opcodes, SpiCommand, Status1, Status2, StatusRegister, MAX_HEADER_LEN};
use crate::transport::Transport;
use maybe_async::maybe_async;

/// Outcome of the ready-wait state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// An internal erase/program is still running
    Busy,
    /// BUSY is clear, the chip accepts commands
    Ready,
    /// The poll budget ran out while the chip was still busy
    TimedOut,
}

/// Execute one chip-select bracketed command
///
/// Sends the header (opcode, address, dummy bytes), then the write payload,
/// then reads into the read buffer. Chip select is released even if a
/// transfer inside the bracket fails; the transfer error is returned.
#[maybe_async]
pub async fn execute<T: Transport + ?Sized>(transport: &mut T, cmd: &mut SpiCommand<'_>) -> Result<()> {
    let mut header = [0u8; MAX_HEADER_LEN];
    let header_len = cmd.encode_header(&mut header);

    transport.select().await?;

    let result = transfer(transport, &header[..header_len], cmd).await;
    let released = transport.deselect().await;

    if let Err(e) = result {
        log::trace!("opcode 0x{:02X} failed inside chip select: {}", cmd.opcode, e);
        return Err(e);
    }
    released
}

#[maybe_async]
async fn transfer<T: Transport + ?Sized>(
    transport: &mut T,
    header: &[u8],
    cmd: &mut SpiCommand<'_>,
) -> Result<()> {
    transport.transmit(header).await?;
    if cmd.has_write() {
        transport.transmit(cmd.write_data).await?;
    }
    if cmd.has_read() {
        transport.receive(cmd.read_buf).await?;
    }
    Ok(())
}

/// Read the 3-byte JEDEC ID (manufacturer, memory type, capacity code)
#[maybe_async]
pub async fn read_jedec_id<T: Transport + ?Sized>(transport: &mut T) -> Result<[u8; 3]> {
    let mut buf = [0u8; 3];
    let mut cmd = SpiCommand::read_reg(opcodes::RDID, &mut buf);
    execute(transport, &mut cmd).await?;
    Ok(buf)
}

/// Read the manufacturer and device ID with the legacy 0x90 command
#[maybe_async]
pub async fn read_manufacturer_device_id<T: Transport + ?Sized>(transport: &mut T) -> Result<(u8, u8)> {
    let mut buf = [0u8; 2];
    let mut cmd = SpiCommand::read_3b(opcodes::REMS, 0, &mut buf);
    execute(transport, &mut cmd).await?;
    Ok((buf[0], buf[1]))
}

/// Read the legacy device ID with Release Power Down (0xAB + 3 dummy bytes)
///
/// The chip also leaves deep power down on this command.
#[maybe_async]
pub async fn read_device_id<T: Transport + ?Sized>(transport: &mut T) -> Result<u8> {
    let mut buf = [0u8; 1];
    let mut cmd = SpiCommand::read_reg(opcodes::RDP, &mut buf).with_dummy_bytes(3);
    execute(transport, &mut cmd).await?;
    Ok(buf[0])
}

/// Read the 64-bit factory unique ID
#[maybe_async]
pub async fn read_unique_id<T: Transport + ?Sized>(transport: &mut T) -> Result<[u8; 8]> {
    let mut buf = [0u8; 8];
    let mut cmd = SpiCommand::read_reg(opcodes::RDUID, &mut buf).with_dummy_bytes(4);
    execute(transport, &mut cmd).await?;
    Ok(buf)
}

/// Read one of the status registers
#[maybe_async]
pub async fn read_status<T: Transport + ?Sized>(transport: &mut T, reg: StatusRegister) -> Result<u8> {
    let mut buf = [0u8; 1];
    let mut cmd = SpiCommand::read_reg(reg.read_opcode(), &mut buf);
    execute(transport, &mut cmd).await?;
    Ok(buf[0])
}

/// Read the status register 1
#[maybe_async]
pub async fn read_status1<T: Transport + ?Sized>(transport: &mut T) -> Result<Status1> {
    let raw = read_status(transport, StatusRegister::One).await?;
    Ok(Status1::from_bits_retain(raw))
}

/// Read the status register 2
#[maybe_async]
pub async fn read_status2<T: Transport + ?Sized>(transport: &mut T) -> Result<Status2> {
    let raw = read_status(transport, StatusRegister::Two).await?;
    Ok(Status2::from_bits_retain(raw))
}

/// Write one status register (caller sends the enable first)
#[maybe_async]
pub async fn write_status<T: Transport + ?Sized>(
    transport: &mut T,
    reg: StatusRegister,
    value: u8,
) -> Result<()> {
    let data = [value];
    let mut cmd = SpiCommand::write_reg(reg.write_opcode(), &data);
    execute(transport, &mut cmd).await
}

/// Sample the BUSY bit once
///
/// Returns `Busy` or `Ready`; never loops or delays.
#[maybe_async]
pub async fn poll_ready<T: Transport + ?Sized>(transport: &mut T) -> Result<ReadyState> {
    let status = read_status1(transport).await?;
    if status.contains(Status1::BUSY) {
        Ok(ReadyState::Busy)
    } else {
        Ok(ReadyState::Ready)
    }
}

/// Check if a write or erase operation is in progress
///
/// A single status read; never loops or delays.
#[maybe_async]
pub async fn is_busy<T: Transport + ?Sized>(transport: &mut T) -> Result<bool> {
    Ok(poll_ready(transport).await? == ReadyState::Busy)
}

/// Check if the Write Enable Latch is set
#[maybe_async]
pub async fn check_wel<T: Transport + ?Sized>(transport: &mut T) -> Result<bool> {
    let status = read_status1(transport).await?;
    Ok(status.contains(Status1::WEL))
}

/// Send the Write Enable command
#[maybe_async]
pub async fn write_enable<T: Transport + ?Sized>(transport: &mut T) -> Result<()> {
    let mut cmd = SpiCommand::simple(opcodes::WREN);
    execute(transport, &mut cmd).await
}

/// Send the volatile status register Write Enable command
#[maybe_async]
pub async fn write_enable_volatile<T: Transport + ?Sized>(transport: &mut T) -> Result<()> {
    let mut cmd = SpiCommand::simple(opcodes::VWREN);
    execute(transport, &mut cmd).await
}

/// Send the Write Disable command
#[maybe_async]
pub async fn write_disable<T: Transport + ?Sized>(transport: &mut T) -> Result<()> {
    let mut cmd = SpiCommand::simple(opcodes::WRDI);
    execute(transport, &mut cmd).await
}

/// Poll status register 1 until `done` holds or the budget runs out
///
/// Reads the register up to `max_polls` times, sleeping `poll_interval_ms`
/// after every read that does not satisfy `done`.
#[maybe_async]
async fn poll_status1<T, F>(
    transport: &mut T,
    poll_interval_ms: u32,
    max_polls: u32,
    done: F,
) -> Result<ReadyState>
where
    T: Transport + ?Sized,
    F: Fn(Status1) -> bool,
{
    for _ in 0..max_polls {
        let status = read_status1(transport).await?;
        if done(status) {
            return Ok(ReadyState::Ready);
        }
        transport.delay_ms(poll_interval_ms).await;
    }
    Ok(ReadyState::TimedOut)
}

/// Wait for the BUSY bit to clear
///
/// Polls the status register until BUSY clears, waiting
/// `poll_interval_ms` between reads, for at most `max_polls` reads.
///
/// # Errors
/// * `Timeout` - BUSY still set after `max_polls` reads
#[maybe_async]
pub async fn wait_ready<T: Transport + ?Sized>(
    transport: &mut T,
    poll_interval_ms: u32,
    max_polls: u32,
) -> Result<()> {
    let state = poll_status1(transport, poll_interval_ms, max_polls, |sr| {
        !sr.contains(Status1::BUSY)
    })
    .await?;

    match state {
        ReadyState::Ready => Ok(()),
        _ => {
            log::warn!("device still busy after {} polls", max_polls);
            Err(Error::Timeout)
        }
    }
}

/// Send Write Enable and confirm WEL is set
///
/// # Errors
/// * `DeviceError(WriteEnableFailed)` - WEL still clear after `max_polls` reads
#[maybe_async]
pub async fn write_enable_verified<T: Transport + ?Sized>(
    transport: &mut T,
    poll_interval_ms: u32,
    max_polls: u32,
) -> Result<()> {
    write_enable(transport).await?;

    let state = poll_status1(transport, poll_interval_ms, max_polls, |sr| {
        sr.contains(Status1::WEL)
    })
    .await?;

    match state {
        ReadyState::Ready => Ok(()),
        _ => {
            log::warn!("write enable latch not set after {} polls", max_polls);
            Err(Error::DeviceError(DeviceFault::WriteEnableFailed))
        }
    }
}

/// Read data using 3-byte addressing
#[maybe_async]
pub async fn read_3b<T: Transport + ?Sized>(transport: &mut T, addr: u32, buf: &mut [u8]) -> Result<()> {
    let mut cmd = SpiCommand::read_3b(opcodes::READ, addr, buf);
    execute(transport, &mut cmd).await
}

/// Send a Page Program frame
///
/// The data must not cross a page boundary; the chip wraps inside the page.
/// The caller sends Write Enable first and waits for completion after.
#[maybe_async]
pub async fn program_page_3b<T: Transport + ?Sized>(transport: &mut T, addr: u32, data: &[u8]) -> Result<()> {
    let mut cmd = SpiCommand::write_3b(opcodes::PP, addr, data);
    execute(transport, &mut cmd).await
}

/// Send an erase frame
///
/// `addr` is ignored for [`EraseKind::Chip`], which is opcode-only.
/// The caller sends Write Enable first and waits for completion after.
#[maybe_async]
pub async fn erase_3b<T: Transport + ?Sized>(transport: &mut T, kind: EraseKind, addr: u32) -> Result<()> {
    let mut cmd = match kind {
        EraseKind::Chip => SpiCommand::simple(kind.opcode()),
        _ => SpiCommand::erase_3b(kind.opcode(), addr),
    };
    execute(transport, &mut cmd).await
}

/// Enter deep power down
#[maybe_async]
pub async fn power_down<T: Transport + ?Sized>(transport: &mut T) -> Result<()> {
    let mut cmd = SpiCommand::simple(opcodes::DP);
    execute(transport, &mut cmd).await
}

/// Release from deep power down (no delay)
#[maybe_async]
pub async fn release_power_down<T: Transport + ?Sized>(transport: &mut T) -> Result<()> {
    let mut cmd = SpiCommand::simple(opcodes::RDP);
    execute(transport, &mut cmd).await
}

/// Send Erase/Program Suspend
#[maybe_async]
pub async fn suspend<T: Transport + ?Sized>(transport: &mut T) -> Result<()> {
    let mut cmd = SpiCommand::simple(opcodes::SUSPEND);
    execute(transport, &mut cmd).await
}

/// Send Erase/Program Resume
#[maybe_async]
pub async fn resume<T: Transport + ?Sized>(transport: &mut T) -> Result<()> {
    let mut cmd = SpiCommand::simple(opcodes::RESUME);
    execute(transport, &mut cmd).await
}

/// Send software reset sequence
#[maybe_async]
pub async fn software_reset<T: Transport + ?Sized>(transport: &mut T) -> Result<()> {
    let mut cmd = SpiCommand::simple(opcodes::RSTEN);
    execute(transport, &mut cmd).await?;
    let mut cmd = SpiCommand::simple(opcodes::RST);
    execute(transport, &mut cmd).await?;
    transport.delay_ms(1).await;
    Ok(())
}
