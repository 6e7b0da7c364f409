//! # ESC/POS Device Commands
//!
//! This module implements the device-level command builders: initialization,
//! power management, paper feed, heat configuration, the buzzer and the
//! self-test page.
//!
//! ## Escape Sequence Structure
//!
//! Commands follow these patterns:
//! - Single byte: `LF`, `0xFF` (wake)
//! - Two bytes: `ESC @`, `DC2 T`
//! - Multi-byte with parameters: `ESC d n`, `ESC 7 n1 n2 n3`
//!
//! Every builder returns the raw bytes. Nothing here talks to a device; the
//! [`crate::encoder`] routes these sequences through the flow-control gate.
//!
//! ## Byte Order
//!
//! Multi-byte integers use **little-endian** encoding:
//! - `u16` value 0x1234 is sent as bytes `[0x34, 0x12]`

// ============================================================================
// ESCAPE SEQUENCE CONSTANTS
// ============================================================================

/// ESC (Escape) - Command prefix byte
///
/// Most ESC/POS commands begin with ESC (0x1B).
pub const ESC: u8 = 0x1B;

/// GS (Group Separator) - Extended command prefix
///
/// Used for barcodes, QR codes, inverse printing and status requests.
/// - Hex: 0x1D, Decimal: 29
pub const GS: u8 = 0x1D;

/// DC2 (Device Control 2) - Vendor command prefix
///
/// Used for print density and the self-test page.
/// - Hex: 0x12, Decimal: 18
pub const DC2: u8 = 0x12;

/// LF (Line Feed) - Print the line buffer and advance one line
pub const LF: u8 = 0x0A;

/// Wake byte. Any byte wakes a sleeping printer; 0xFF is ignored once awake.
pub const WAKE: u8 = 0xFF;

// ============================================================================
// INITIALIZATION & POWER
// ============================================================================

/// # Initialize Printer (ESC @)
///
/// Resets the printer to its power-on default state.
///
/// ## Protocol Details
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | ESC @ |
/// | Hex     | 1B 40 |
/// | Decimal | 27 64 |
///
/// ## What Gets Reset
///
/// - Print buffer is cleared
/// - Print mode (bold, underline, double size) disabled
/// - Alignment reset to left
/// - Line spacing reset to default
///
/// Heat settings survive a reset on most firmwares, but the encoder reissues
/// them after a wake anyway.
///
/// ## Example
///
/// ```
/// use termica::protocol::commands;
///
/// assert_eq!(commands::init(), vec![0x1B, 0x40]);
/// ```
#[inline]
pub fn init() -> Vec<u8> {
    vec![ESC, b'@']
}

/// # Wake (0xFF)
///
/// A single 0xFF byte. The printer needs roughly 50ms before it accepts the
/// next command, and the heat configuration must be resent afterwards.
#[inline]
pub fn wake() -> Vec<u8> {
    vec![WAKE]
}

/// # Sleep (ESC 8 0 0)
///
/// Puts the printer to sleep immediately. The two parameter bytes are the
/// sleep delay in seconds as a little-endian `u16`; zero means "now".
///
/// ## Protocol Details
///
/// | Format  | Bytes       |
/// |---------|-------------|
/// | ASCII   | ESC 8 0 0   |
/// | Hex     | 1B 38 00 00 |
#[inline]
pub fn sleep() -> Vec<u8> {
    vec![ESC, b'8', 0x00, 0x00]
}

/// # Set Online / Offline (ESC = n)
///
/// - `true`: printer accepts data (`ESC = 1`)
/// - `false`: printer ignores everything except `ESC =` (`ESC = 0`)
#[inline]
pub fn online(state: bool) -> Vec<u8> {
    vec![ESC, b'=', state as u8]
}

// ============================================================================
// PAPER FEED
// ============================================================================

/// # Feed Lines (ESC d n)
///
/// Prints the line buffer and feeds `n` lines.
///
/// ## Protocol Details
///
/// | Format  | Bytes     |
/// |---------|-----------|
/// | ASCII   | ESC d n   |
/// | Hex     | 1B 64 n   |
/// | Decimal | 27 100 n  |
///
/// ## Example
///
/// ```
/// use termica::protocol::commands;
///
/// assert_eq!(commands::feed_lines(3), vec![0x1B, 0x64, 0x03]);
/// ```
#[inline]
pub fn feed_lines(n: u8) -> Vec<u8> {
    vec![ESC, b'd', n]
}

// ============================================================================
// HEAT CONFIGURATION
// ============================================================================

/// # Heat Configuration (ESC 7 n1 n2 n3)
///
/// Configures the thermal printhead.
///
/// ## Parameters
///
/// - `dots`: max heating dots, in units of 8 dots (default 7 = 64 dots)
/// - `time`: heating time in units of 10µs (default 80 = 800µs)
/// - `interval`: heating interval in units of 10µs (default 2 = 20µs)
///
/// More dots and longer heat times print darker but slower and draw more
/// current from the supply.
///
/// ## Protocol Details
///
/// | Format  | Bytes               |
/// |---------|---------------------|
/// | ASCII   | ESC 7 n1 n2 n3      |
/// | Hex     | 1B 37 n1 n2 n3      |
#[inline]
pub fn heat_config(dots: u8, time: u8, interval: u8) -> Vec<u8> {
    vec![ESC, b'7', dots, time, interval]
}

/// # Print Density (DC2 # n)
///
/// Sets print density and break time. Both live in one byte: the high
/// nibble is the break time, the low nibble the density. The encoder packs
/// the same value into both halves.
///
/// ```
/// use termica::protocol::commands;
///
/// assert_eq!(commands::print_density(4), vec![0x12, 0x23, 0x44]);
/// ```
#[inline]
pub fn print_density(density: u8) -> Vec<u8> {
    let d = density & 0x0F;
    vec![DC2, b'#', (d << 4) | d]
}

/// # Self-Test Page (DC2 T)
///
/// Prints the firmware's built-in test page (about ten lines of output).
#[inline]
pub fn test_page() -> Vec<u8> {
    vec![DC2, b'T']
}

/// # Beep (ESC B n t)
///
/// Sounds the buzzer `n` times for `t` × 50ms each, on printers that have
/// one. Printers without a buzzer ignore it.
///
/// ```
/// use termica::protocol::commands;
///
/// assert_eq!(commands::beep(3, 3), vec![0x1B, 0x42, 3, 3]);
/// ```
#[inline]
pub fn beep(times: u8, duration: u8) -> Vec<u8> {
    vec![ESC, b'B', times, duration]
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Encode a u16 value as little-endian bytes [low, high]
///
/// ```
/// use termica::protocol::commands::u16_le;
///
/// assert_eq!(u16_le(0x1234), [0x34, 0x12]);
/// ```
#[inline]
pub const fn u16_le(value: u16) -> [u8; 2] {
    [value as u8, (value >> 8) as u8]
}

// ============================================================================
// TESTS
// ============================================================================
