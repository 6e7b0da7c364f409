//! # Serial TTY Transport
//!
//! This module provides communication with a thermal printer over a serial
//! line: a USB-serial adapter (`/dev/ttyUSB0`), an on-board UART
//! (`/dev/ttyS0`, `/dev/serial0`) or anything else that shows up as a TTY.
//!
//! ## TTY Configuration
//!
//! The device is opened in raw mode so binary data is transmitted without
//! modification:
//!
//! - **No input processing**: IGNBRK, BRKINT, PARMRK, ISTRIP, ICRNL, etc.
//! - **No output processing**: OPOST (no CR/LF translation)
//! - **8N1**: CS8, no parity, one stop bit
//! - **No echo, non-canonical**: ECHO, ECHONL, ICANON, ISIG, IEXTEN
//! - **No flow control in the driver**: IXON/IXOFF/IXANY and CRTSCTS off
//! - **Non-blocking reads**: VMIN = 0, VTIME = 0
//!
//! Software XON/XOFF must stay off: 0x11 and 0x13 appear in heat
//! configuration and barcode payloads. Hardware flow control stays off
//! because the printer's ready/busy output is polled by
//! [`crate::flow::FlowControl`], not by the kernel.
//!
//! ## Handshake Wiring
//!
//! Printers with a DTR (ready/busy) output are usually wired to the
//! adapter's CTS input. [`SerialTransport::modem_line`] returns a
//! [`ModemLine`] reading any of the four modem inputs via `TIOCMGET`.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ByteTransport, HandshakeLine};
use crate::error::TermicaError;

/// Default serial device path
pub const DEFAULT_DEVICE: &str = "/dev/ttyUSB0";

/// # Serial Printer Transport
///
/// ## Example
///
/// ```no_run
/// use termica::transport::{ByteTransport, SerialTransport};
///
/// let mut transport = SerialTransport::open("/dev/ttyUSB0", 19200)?;
/// transport.send(0x1B)?;
/// transport.send(b'@')?;
///
/// # Ok::<(), termica::error::TermicaError>(())
/// ```
pub struct SerialTransport {
    file: File,
    baud_rate: u32,
}

impl SerialTransport {
    /// Open a serial connection to the printer.
    ///
    /// ## Errors
    ///
    /// Returns an error if:
    /// - The device doesn't exist
    /// - Permission denied (may need the dialout group)
    /// - The baud rate has no termios speed constant
    /// - TTY configuration fails
    pub fn open<P: AsRef<Path>>(device: P, baud_rate: u32) -> Result<Self, TermicaError> {
        let path = device.as_ref();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(path)
            .map_err(|e| {
                TermicaError::Transport(format!("Failed to open {}: {}", path.display(), e))
            })?;

        configure_tty_raw(file.as_raw_fd(), baud_rate)?;
        debug!(device = %path.display(), baud_rate, "serial port configured");

        Ok(Self { file, baud_rate })
    }

    /// Baud rate the port was configured with.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Handshake input reading one of this port's modem lines.
    pub fn modem_line(&self, signal: ModemSignal) -> Result<ModemLine, TermicaError> {
        let file = self
            .file
            .try_clone()
            .map_err(|e| TermicaError::Transport(format!("Failed to clone port: {}", e)))?;
        Ok(ModemLine { file, signal })
    }
}

impl ByteTransport for SerialTransport {
    fn send(&mut self, byte: u8) -> Result<(), TermicaError> {
        self.file
            .write_all(&[byte])
            .map_err(|e| TermicaError::Transport(format!("Write failed: {}", e)))
    }

    fn bytes_available(&mut self) -> Result<usize, TermicaError> {
        bytes_waiting(self.file.as_raw_fd())
    }

    fn read_byte(&mut self) -> Result<Option<u8>, TermicaError> {
        let mut buf = [0u8; 1];
        match self.file.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(TermicaError::Transport(format!("Read failed: {}", e))),
        }
    }

    fn flush(&mut self) -> Result<(), TermicaError> {
        self.file
            .flush()
            .map_err(|e| TermicaError::Transport(format!("Flush failed: {}", e)))
    }
}

// ============================================================================
// MODEM LINES
// ============================================================================

/// Modem input a printer's ready/busy output can be wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModemSignal {
    #[default]
    Cts,
    Dsr,
    Dcd,
    Ri,
}

impl ModemSignal {
    #[cfg(unix)]
    fn mask(self) -> libc::c_int {
        match self {
            Self::Cts => libc::TIOCM_CTS,
            Self::Dsr => libc::TIOCM_DSR,
            Self::Dcd => libc::TIOCM_CAR,
            Self::Ri => libc::TIOCM_RNG,
        }
    }
}

/// Handshake input backed by a serial modem line.
pub struct ModemLine {
    file: File,
    signal: ModemSignal,
}

impl HandshakeLine for ModemLine {
    fn level(&mut self) -> Result<bool, TermicaError> {
        read_modem_line(self.file.as_raw_fd(), self.signal)
    }
}

// ============================================================================
// TTY HELPERS
// ============================================================================

/// Map a numeric baud rate to its termios speed constant.
#[cfg(unix)]
fn speed_constant(baud_rate: u32) -> Option<libc::speed_t> {
    Some(match baud_rate {
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115200 => libc::B115200,
        _ => return None,
    })
}

/// Configure a file descriptor for raw TTY mode at the given baud rate.
///
/// ## What Gets Disabled
///
/// - **Input flags**: IGNBRK, BRKINT, PARMRK, ISTRIP, INLCR, IGNCR, ICRNL, IXON, IXOFF, IXANY
/// - **Output flags**: OPOST
/// - **Local flags**: ECHO, ECHONL, ICANON, ISIG, IEXTEN
/// - **Control flags**: CSIZE, PARENB, CSTOPB, CRTSCTS (then CS8 | CLOCAL | CREAD is set)
#[cfg(unix)]
fn configure_tty_raw(fd: i32, baud_rate: u32) -> Result<(), TermicaError> {
    use std::mem::MaybeUninit;

    let speed = speed_constant(baud_rate).ok_or_else(|| {
        TermicaError::Transport(format!("Unsupported baud rate: {}", baud_rate))
    })?;

    let mut termios = MaybeUninit::uninit();
    let result = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
    if result != 0 {
        return Err(TermicaError::Transport(format!(
            "tcgetattr failed: {}",
            io::Error::last_os_error()
        )));
    }
    let mut termios = unsafe { termios.assume_init() };

    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);

    termios.c_oflag &= !libc::OPOST;

    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);

    termios.c_cflag &= !(libc::CSIZE | libc::PARENB | libc::CSTOPB | libc::CRTSCTS);
    termios.c_cflag |= libc::CS8 | libc::CLOCAL | libc::CREAD;

    // Reads return immediately with whatever is buffered
    termios.c_cc[libc::VMIN] = 0;
    termios.c_cc[libc::VTIME] = 0;

    let result = unsafe {
        libc::cfsetispeed(&mut termios, speed) | libc::cfsetospeed(&mut termios, speed)
    };
    if result != 0 {
        return Err(TermicaError::Transport(format!(
            "cfsetspeed failed: {}",
            io::Error::last_os_error()
        )));
    }

    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) };
    if result != 0 {
        return Err(TermicaError::Transport(format!(
            "tcsetattr failed: {}",
            io::Error::last_os_error()
        )));
    }

    Ok(())
}

#[cfg(not(unix))]
fn configure_tty_raw(_fd: i32, _baud_rate: u32) -> Result<(), TermicaError> {
    Ok(())
}

#[cfg(unix)]
fn bytes_waiting(fd: i32) -> Result<usize, TermicaError> {
    let mut count: libc::c_int = 0;
    let result = unsafe { libc::ioctl(fd, libc::FIONREAD, &mut count as *mut libc::c_int) };
    if result != 0 {
        return Err(TermicaError::Transport(format!(
            "FIONREAD failed: {}",
            io::Error::last_os_error()
        )));
    }
    Ok(count.max(0) as usize)
}

#[cfg(not(unix))]
fn bytes_waiting(_fd: i32) -> Result<usize, TermicaError> {
    Ok(0)
}

#[cfg(unix)]
fn read_modem_line(fd: i32, signal: ModemSignal) -> Result<bool, TermicaError> {
    let mut bits: libc::c_int = 0;
    let result = unsafe { libc::ioctl(fd, libc::TIOCMGET, &mut bits as *mut libc::c_int) };
    if result != 0 {
        return Err(TermicaError::Transport(format!(
            "TIOCMGET failed: {}",
            io::Error::last_os_error()
        )));
    }
    Ok(bits & signal.mask() != 0)
}

#[cfg(not(unix))]
fn read_modem_line(_fd: i32, _signal: ModemSignal) -> Result<bool, TermicaError> {
    Err(TermicaError::Transport(
        "Modem lines not supported on this platform".to_string(),
    ))
}

// ============================================================================
// TESTS
// ============================================================================
