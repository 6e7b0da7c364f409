//! # Printer Transport Layer
//!
//! This module provides the byte-level link to the printer and the optional
//! ready/busy handshake input.
//!
//! ## Available Transports
//!
//! - [`serial`]: Serial TTY (USB adapters, on-board UARTs) with modem-line
//!   handshake input
//! - [`memory`]: In-process transport that records output and answers
//!   status queries, for tests and dry runs
//!
//! Transports move single bytes and never wait. Pacing is done one layer up,
//! in [`crate::flow`].

pub mod memory;
pub mod serial;

pub use memory::{MemoryLine, MemoryTransport};
pub use serial::{ModemLine, ModemSignal, SerialTransport};

use crate::error::TermicaError;

/// A duplex byte stream to the printer.
pub trait ByteTransport: Send {
    /// Transmit exactly one byte.
    fn send(&mut self, byte: u8) -> Result<(), TermicaError>;

    /// Number of received bytes waiting to be read.
    fn bytes_available(&mut self) -> Result<usize, TermicaError>;

    /// Read one received byte, `None` if nothing is waiting.
    fn read_byte(&mut self) -> Result<Option<u8>, TermicaError>;

    /// Push any buffered output to the wire.
    fn flush(&mut self) -> Result<(), TermicaError> {
        Ok(())
    }
}

/// The printer's ready/busy output, as seen by the host.
pub trait HandshakeLine: Send {
    /// Electrical level of the line: `true` is high.
    fn level(&mut self) -> Result<bool, TermicaError>;
}
