//! # Flow-Control Gate
//!
//! The gate decides, before each byte, whether the printer can take it.
//! Small thermal printers have a tiny receive buffer and no reliable way to
//! say "stop" over the data line, so overrunning them silently drops bytes,
//! which corrupts whatever command was in flight.
//!
//! ## Modes
//!
//! | Mode | Before a byte | After a byte | After a newline |
//! |------|---------------|--------------|-----------------|
//! | Software-timed | wait for the resume time | resume = 2 × byte time | resume = 16 × dot feed time |
//! | Hardware handshake | poll ready line (timeout 5s) | resume = ¼ byte time | resume = 8 × dot feed time |
//!
//! A handshake timeout is counted and logged, then the byte is sent anyway.
//! A thermal printer has no mid-command abort, so stalling forever would be
//! worse than a possibly garbled line.
//!
//! ## Timing Constants
//!
//! ```text
//! byte_time_us = 10_000_000 / baud   (8 data bits + start + stop)
//! dot_print_us = 33                  (printhead, empirical)
//! dot_feed_us  = 333                 (paper motor, empirical)
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::clock::SharedClock;
use crate::error::TermicaError;
use crate::protocol::commands::LF;
use crate::transport::{ByteTransport, HandshakeLine};

/// Default time to wait for the ready line before sending anyway.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Time to print one dot row, microseconds.
pub const DOT_PRINT_TIME_US: u64 = 33;

/// Time to feed one dot row, microseconds.
pub const DOT_FEED_TIME_US: u64 = 333;

const HANDSHAKE_POLL_INTERVAL: Duration = Duration::from_millis(1);
const SOFTWARE_LINE_FEED_ROWS: u64 = 16;
const HARDWARE_LINE_FEED_ROWS: u64 = 8;

/// Which level of the ready line means "ready for data".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    #[default]
    ActiveLow,
    ActiveHigh,
}

impl Polarity {
    fn is_ready(self, level_high: bool) -> bool {
        match self {
            Self::ActiveLow => !level_high,
            Self::ActiveHigh => level_high,
        }
    }
}

/// Per-byte and per-dot timing derived from the baud rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub byte_time_us: u64,
    pub dot_print_time_us: u64,
    pub dot_feed_time_us: u64,
}

impl Timing {
    /// Timing for a line running at `baud_rate` (0 is treated as 19200).
    pub fn for_baud(baud_rate: u32) -> Self {
        let baud = if baud_rate == 0 { 19200 } else { baud_rate };
        Self {
            byte_time_us: 10_000_000 / u64::from(baud),
            dot_print_time_us: DOT_PRINT_TIME_US,
            dot_feed_time_us: DOT_FEED_TIME_US,
        }
    }
}

struct Handshake {
    line: Box<dyn HandshakeLine>,
    polarity: Polarity,
    timeout: Duration,
}

/// # Flow-Controlled Byte Writer
///
/// Owns the transport. Everything the encoder sends goes through
/// [`FlowControl::send_byte`] or [`FlowControl::send_char`].
///
/// ## Example
///
/// ```
/// use termica::flow::{FlowControl, ManualClock};
/// use termica::transport::MemoryTransport;
/// use std::sync::Arc;
///
/// let transport = MemoryTransport::new();
/// let clock = ManualClock::new();
/// let mut gate = FlowControl::new(Box::new(transport.clone()), Arc::new(clock.clone()), 19200);
///
/// gate.send_all(&[0x1B, b'@'])?;
/// assert_eq!(transport.sent(), vec![0x1B, 0x40]);
/// assert!(gate.is_ready());
/// # Ok::<(), termica::error::TermicaError>(())
/// ```
pub struct FlowControl {
    transport: Box<dyn ByteTransport>,
    clock: SharedClock,
    handshake: Option<Handshake>,
    timing: Timing,
    resume_at: Duration,
    timeouts: u32,
    bytes_sent: u64,
}

impl FlowControl {
    /// Software-timed gate.
    pub fn new(transport: Box<dyn ByteTransport>, clock: SharedClock, baud_rate: u32) -> Self {
        let timing = Timing::for_baud(baud_rate);
        debug!(
            byte_time_us = timing.byte_time_us,
            baud_rate, "flow control timing initialised"
        );
        Self {
            transport,
            clock,
            handshake: None,
            timing,
            resume_at: Duration::ZERO,
            timeouts: 0,
            bytes_sent: 0,
        }
    }

    /// Switch to hardware handshaking on `line`.
    pub fn with_handshake(
        mut self,
        line: Box<dyn HandshakeLine>,
        polarity: Polarity,
        timeout: Duration,
    ) -> Self {
        self.handshake = Some(Handshake {
            line,
            polarity,
            timeout,
        });
        self
    }

    pub fn handshake_enabled(&self) -> bool {
        self.handshake.is_some()
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Number of handshake waits that expired.
    pub fn timeouts(&self) -> u32 {
        self.timeouts
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// Whether the printer signals it can take data. Always true without
    /// handshake hardware. A line that can't be read counts as ready.
    pub fn is_ready(&mut self) -> bool {
        let Some(handshake) = self.handshake.as_mut() else {
            return true;
        };
        match handshake.line.level() {
            Ok(level) => handshake.polarity.is_ready(level),
            Err(e) => {
                debug!(error = %e, "handshake line unreadable, assuming ready");
                true
            }
        }
    }

    /// Poll the ready line for up to `timeout`.
    ///
    /// Returns whether the printer became ready. On expiry the timeout
    /// counter is incremented; this never fails.
    pub fn wait_ready(&mut self, timeout: Duration) -> bool {
        if self.handshake.is_none() {
            return true;
        }
        let start = self.clock.now();
        loop {
            if self.is_ready() {
                return true;
            }
            if self.clock.now().saturating_sub(start) >= timeout {
                self.timeouts += 1;
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    total = self.timeouts,
                    "handshake timeout, continuing"
                );
                return false;
            }
            self.clock.sleep(HANDSHAKE_POLL_INTERVAL);
        }
    }

    /// Wait for the device to finish a slow operation: the ready line with
    /// `handshake_timeout` when wired, otherwise a fixed `delay`.
    pub fn settle(&mut self, handshake_timeout: Duration, delay: Duration) {
        if self.handshake.is_some() {
            self.wait_ready(handshake_timeout);
        } else {
            self.clock.sleep(delay);
        }
    }

    /// Sleep for a fixed time regardless of mode.
    pub fn pause(&self, delay: Duration) {
        self.clock.sleep(delay);
    }

    fn wait_resume(&self) {
        let now = self.clock.now();
        if self.resume_at > now {
            self.clock.sleep(self.resume_at - now);
        }
    }

    fn set_resume(&mut self, delay_us: u64) {
        self.resume_at = self.clock.now() + Duration::from_micros(delay_us);
    }

    /// Send one command byte once the printer can take it.
    pub fn send_byte(&mut self, byte: u8) -> Result<(), TermicaError> {
        self.wait_resume();
        if let Some(timeout) = self.handshake.as_ref().map(|h| h.timeout) {
            self.wait_ready(timeout);
        }

        self.transport.send(byte)?;
        self.bytes_sent += 1;

        let margin = if self.handshake.is_some() {
            self.timing.byte_time_us / 4
        } else {
            self.timing.byte_time_us * 2
        };
        self.set_resume(margin);
        Ok(())
    }

    /// Send one text byte. A newline also reserves time for the paper feed.
    pub fn send_char(&mut self, byte: u8) -> Result<(), TermicaError> {
        self.send_byte(byte)?;
        if byte == LF {
            let rows = if self.handshake.is_some() {
                HARDWARE_LINE_FEED_ROWS
            } else {
                SOFTWARE_LINE_FEED_ROWS
            };
            self.set_resume(self.timing.dot_feed_time_us * rows);
        }
        Ok(())
    }

    /// Send a command sequence byte by byte.
    pub fn send_all(&mut self, bytes: &[u8]) -> Result<(), TermicaError> {
        for &b in bytes {
            self.send_byte(b)?;
        }
        Ok(())
    }

    /// Settle, then read one response byte if the printer sent one.
    pub fn read_response(
        &mut self,
        handshake_timeout: Duration,
        delay: Duration,
    ) -> Result<Option<u8>, TermicaError> {
        self.transport.flush()?;
        self.settle(handshake_timeout, delay);
        if self.transport.bytes_available()? > 0 {
            self.transport.read_byte()
        } else {
            Ok(None)
        }
    }

    /// Discard everything in the receive buffer.
    pub fn drain_input(&mut self) -> Result<usize, TermicaError> {
        let mut drained = 0;
        while self.transport.bytes_available()? > 0 {
            if self.transport.read_byte()?.is_none() {
                break;
            }
            drained += 1;
        }
        if drained > 0 {
            debug!(drained, "discarded stale input");
        }
        Ok(drained)
    }

    pub fn flush(&mut self) -> Result<(), TermicaError> {
        self.transport.flush()
    }
}

// ============================================================================
// TESTS
// ============================================================================
