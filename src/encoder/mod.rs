//! # Command Encoder
//!
//! Turns printer operations into ESC/POS byte sequences and pushes them
//! through the [`FlowControl`] gate, recording paper consumption in the
//! [`UsageLedger`] as it goes.
//!
//! The encoder owns the printer-side state the protocol can't report back:
//! the current print-mode byte, text size, output column, heat settings and
//! whether the device was put to sleep.
//!
//! ## Completion Waits
//!
//! Slow operations block until the printer is expected to be done. With a
//! handshake line wired the encoder waits for the line (up to the given
//! timeout); otherwise it sleeps a fixed time.
//!
//! | Operation | Handshake timeout | Fixed delay |
//! |-----------|-------------------|-------------|
//! | Wake | 3000 ms | 50 ms |
//! | Reset | 5000 ms | 500 ms |
//! | Feed n | n×100 + 1000 ms | n×50 + 200 ms |
//! | Barcode | 5000 ms | 300 ms |
//! | QR size / error level | 1000 ms | 10 ms |
//! | QR store data | 3000 ms | 50 ms |
//! | QR print | 10000 ms | 300 ms |
//! | Rotation change | 500 ms | 50 ms |
//! | Rotated character | 2000 ms | 100 ms |
//! | Bitmap band of n rows | n×10 + 1000 ms | n×3 + 50 ms |
//! | Status query | 1000 ms | 100 ms |

pub mod layout;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::TermicaError;
use crate::flow::FlowControl;
use crate::protocol::barcode::{barcode1d, qr};
use crate::protocol::commands::{self, LF};
use crate::protocol::graphics;
use crate::protocol::status::{self, DeviceFlags};
use crate::protocol::text::{self, Alignment, HT, Rotation, TextSize};
use crate::usage::UsageLedger;

/// Most characters emitted on the 90° rotated path.
pub const MAX_ROTATED_CHARS: usize = 20;

/// Lines the built-in self-test page is accounted as.
const TEST_PAGE_LINES: u32 = 10;

/// Lines a barcode is accounted as.
const BARCODE_LINES: u32 = 3;

/// Lines a QR code is accounted as (the trailing feed is counted separately).
const QR_LINES: u32 = 8;

#[derive(Debug, Clone, Copy)]
struct Wait {
    handshake: Duration,
    delay: Duration,
}

impl Wait {
    const fn ms(handshake: u64, delay: u64) -> Self {
        Self {
            handshake: Duration::from_millis(handshake),
            delay: Duration::from_millis(delay),
        }
    }

    fn feed(lines: u8) -> Self {
        let n = u64::from(lines);
        Self::ms(n * 100 + 1000, n * 50 + 200)
    }

    fn raster(rows: u16) -> Self {
        let n = u64::from(rows);
        Self::ms(n * 10 + 1000, n * 3 + 50)
    }
}

const WAKE_WAIT: Wait = Wait::ms(3000, 50);
const RESET_WAIT: Wait = Wait::ms(5000, 500);
const BARCODE_WAIT: Wait = Wait::ms(5000, 300);
const QR_CONFIG_WAIT: Wait = Wait::ms(1000, 10);
const QR_STORE_WAIT: Wait = Wait::ms(3000, 50);
const QR_PRINT_WAIT: Wait = Wait::ms(10000, 300);
const ROTATION_WAIT: Wait = Wait::ms(500, 50);
const ROTATED_CHAR_WAIT: Wait = Wait::ms(2000, 100);
const STATUS_WAIT: Wait = Wait::ms(1000, 100);

/// Buzzer pattern: three beeps of 150ms.
const BEEP_TIMES: u8 = 3;
const BEEP_DURATION: u8 = 3;

const RECOVERY_RESET_PAUSE: Duration = Duration::from_millis(1000);
const RECOVERY_WAKE_PAUSE: Duration = Duration::from_millis(500);

/// Printhead heating parameters.
///
/// More dots and longer heat time print darker and slower; a longer interval
/// lets the head cool between rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatConfig {
    /// Heating dots (units of 8 dots), 1..=15
    pub dots: u8,
    /// Heating time (units of 10µs), 50..=200
    pub time: u8,
    /// Heat interval (units of 10µs), 1..=10
    pub interval: u8,
    /// Print density, 0..=15
    pub density: u8,
}

impl Default for HeatConfig {
    fn default() -> Self {
        Self {
            dots: 7,
            time: 80,
            interval: 2,
            density: 4,
        }
    }
}

/// Check a bitmap's dimensions against its data before anything is sent.
pub fn validate_bitmap(width: u16, height: u16, data: &[u8]) -> Result<(), TermicaError> {
    if width == 0 || width > graphics::MAX_WIDTH_DOTS {
        return Err(TermicaError::InvalidPayload(format!(
            "bitmap width must be 1..={} dots, got {}",
            graphics::MAX_WIDTH_DOTS,
            width
        )));
    }
    if height == 0 {
        return Err(TermicaError::InvalidPayload("bitmap height is zero".into()));
    }
    let expected = graphics::row_bytes(width) * height as usize;
    if data.len() != expected {
        return Err(TermicaError::InvalidPayload(format!(
            "bitmap {}x{} needs {} bytes, got {}",
            width,
            height,
            expected,
            data.len()
        )));
    }
    Ok(())
}

/// Text lines a bitmap of `height` dots is accounted as.
pub fn bitmap_lines(height: u16) -> u32 {
    u32::from(height).div_ceil(u32::from(text::DEFAULT_LINE_HEIGHT))
}

/// A set of style changes. `None` leaves a setting as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleChange {
    pub upside_down: Option<bool>,
    pub double_strike: Option<bool>,
    /// Extra dots after each character
    pub char_spacing: Option<u8>,
    /// Ascending columns; empty clears every stop
    pub tab_stops: Option<Vec<u8>>,
}

/// # ESC/POS Command Encoder
///
/// ## Example
///
/// ```
/// use std::sync::Arc;
/// use termica::encoder::{Encoder, HeatConfig};
/// use termica::flow::{FlowControl, ManualClock};
/// use termica::transport::MemoryTransport;
/// use termica::usage::UsageLedger;
///
/// let transport = MemoryTransport::new();
/// let gate = FlowControl::new(Box::new(transport.clone()), Arc::new(ManualClock::new()), 19200);
/// let mut encoder = Encoder::new(gate, UsageLedger::in_memory(), HeatConfig::default());
///
/// encoder.set_bold(true)?;
/// encoder.print_text("Hello")?;
/// assert_eq!(transport.sent(), b"\x1bE\x01Hello\n".to_vec());
/// assert_eq!(encoder.ledger().counters().lines, 1);
/// # Ok::<(), termica::error::TermicaError>(())
/// ```
pub struct Encoder {
    gate: FlowControl,
    ledger: UsageLedger,
    heat: HeatConfig,
    print_mode: u8,
    size: TextSize,
    column: usize,
    tab_stops: Vec<u8>,
    asleep: bool,
}

impl Encoder {
    pub fn new(gate: FlowControl, ledger: UsageLedger, heat: HeatConfig) -> Self {
        Self {
            gate,
            ledger,
            heat,
            print_mode: 0,
            size: TextSize::Small,
            column: 0,
            tab_stops: text::FIRMWARE_TAB_STOPS.to_vec(),
            asleep: false,
        }
    }

    pub fn gate(&self) -> &FlowControl {
        &self.gate
    }

    pub fn gate_mut(&mut self) -> &mut FlowControl {
        &mut self.gate
    }

    pub fn ledger(&self) -> &UsageLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut UsageLedger {
        &mut self.ledger
    }

    pub fn heat(&self) -> HeatConfig {
        self.heat
    }

    pub fn size(&self) -> TextSize {
        self.size
    }

    pub fn print_mode(&self) -> u8 {
        self.print_mode
    }

    /// Current output column, reset by newlines and at the line width.
    pub fn column(&self) -> usize {
        self.column
    }

    /// Tab stop columns the printer was last told about.
    pub fn tab_stops(&self) -> &[u8] {
        &self.tab_stops
    }

    pub fn is_asleep(&self) -> bool {
        self.asleep
    }

    fn command(&mut self, bytes: Vec<u8>) -> Result<(), TermicaError> {
        self.gate.send_all(&bytes)
    }

    fn settle(&mut self, wait: Wait) {
        self.gate.settle(wait.handshake, wait.delay);
    }

    // ========================================================================
    // DEVICE CONTROL
    // ========================================================================

    /// Wake the printer and re-send the heat configuration.
    pub fn wake(&mut self) -> Result<(), TermicaError> {
        self.command(commands::wake())?;
        self.settle(WAKE_WAIT);
        self.asleep = false;
        let HeatConfig {
            dots,
            time,
            interval,
            ..
        } = self.heat;
        self.set_heat_config(dots, time, interval)
    }

    pub fn sleep(&mut self) -> Result<(), TermicaError> {
        self.command(commands::sleep())?;
        self.asleep = true;
        debug!("printer put to sleep");
        Ok(())
    }

    /// `ESC @`, then wait for the printer to reinitialise.
    pub fn reset(&mut self) -> Result<(), TermicaError> {
        self.command(commands::init())?;
        self.settle(RESET_WAIT);
        self.print_mode = 0;
        self.size = TextSize::Small;
        self.column = 0;
        self.tab_stops = text::FIRMWARE_TAB_STOPS.to_vec();
        Ok(())
    }

    /// Put every setting the encoder tracks back to its default.
    pub fn set_default(&mut self) -> Result<(), TermicaError> {
        self.set_online(true)?;
        self.justify(Alignment::Left)?;
        self.set_inverse(false)?;
        self.set_bold(false)?;
        self.set_underline(false)?;
        self.set_size(TextSize::Small)?;
        self.set_line_height(text::DEFAULT_LINE_HEIGHT)?;
        self.set_barcode_height(barcode1d::DEFAULT_HEIGHT)?;
        self.set_charset(0)?;
        self.set_code_page(0)
    }

    pub fn set_online(&mut self, online: bool) -> Result<(), TermicaError> {
        self.command(commands::online(online))
    }

    /// Basic heat configuration (`ESC 7`). Remembered and re-sent on wake.
    pub fn set_heat_config(&mut self, dots: u8, time: u8, interval: u8) -> Result<(), TermicaError> {
        self.command(commands::heat_config(dots, time, interval))?;
        self.heat.dots = dots;
        self.heat.time = time;
        self.heat.interval = interval;
        Ok(())
    }

    /// Heat configuration plus print density (`ESC 7` + `DC2 #`).
    pub fn set_heat_config_advanced(&mut self, heat: HeatConfig) -> Result<(), TermicaError> {
        self.command(commands::heat_config(heat.dots, heat.time, heat.interval))?;
        self.command(commands::print_density(heat.density))?;
        self.heat = heat;
        debug!(
            dots = heat.dots,
            time = heat.time,
            interval = heat.interval,
            density = heat.density,
            "heat configuration applied"
        );
        Ok(())
    }

    /// Sound the buzzer, if the printer has one.
    pub fn beep(&mut self) -> Result<(), TermicaError> {
        self.command(commands::beep(BEEP_TIMES, BEEP_DURATION))
    }

    /// Discard whatever the printer sent that nobody read.
    pub fn drain_input(&mut self) -> Result<usize, TermicaError> {
        self.gate.drain_input()
    }

    /// Operator-invoked recovery: drain, reset, wake, reapply heat and
    /// defaults.
    pub fn recover(&mut self) -> Result<(), TermicaError> {
        info!("attempting printer recovery");
        self.drain_input()?;
        self.reset()?;
        self.gate.pause(RECOVERY_RESET_PAUSE);
        self.wake()?;
        self.gate.pause(RECOVERY_WAKE_PAUSE);
        self.set_heat_config_advanced(self.heat)?;
        self.set_default()?;
        info!("printer recovery complete");
        Ok(())
    }

    // ========================================================================
    // TEXT STYLE
    // ========================================================================

    pub fn set_bold(&mut self, on: bool) -> Result<(), TermicaError> {
        self.command(text::bold(on))
    }

    pub fn set_underline(&mut self, on: bool) -> Result<(), TermicaError> {
        self.command(text::underline(on))
    }

    pub fn set_inverse(&mut self, on: bool) -> Result<(), TermicaError> {
        self.command(text::inverse(on))
    }

    pub fn set_double_strike(&mut self, on: bool) -> Result<(), TermicaError> {
        self.command(text::double_strike(on))
    }

    /// Upside-down printing; applies from the next line.
    pub fn set_upside_down(&mut self, on: bool) -> Result<(), TermicaError> {
        self.command(text::upside_down(on))
    }

    pub fn set_char_spacing(&mut self, dots: u8) -> Result<(), TermicaError> {
        self.command(text::char_spacing(dots))
    }

    /// Program tab stops. Out-of-order columns are dropped (see
    /// [`text::tab_stops`]); the accepted list drives column tracking.
    pub fn set_tab_stops(&mut self, stops: &[u8]) -> Result<(), TermicaError> {
        let cmd = text::tab_stops(stops);
        let accepted = cmd[2..cmd.len() - 1].to_vec();
        self.command(cmd)?;
        self.tab_stops = accepted;
        Ok(())
    }

    /// Move to the next tab stop.
    pub fn tab(&mut self) -> Result<(), TermicaError> {
        self.write_text("\t").map(|_| ())
    }

    /// Apply each change that is set, in field order.
    pub fn apply_style(&mut self, style: &StyleChange) -> Result<(), TermicaError> {
        if let Some(on) = style.upside_down {
            self.set_upside_down(on)?;
        }
        if let Some(on) = style.double_strike {
            self.set_double_strike(on)?;
        }
        if let Some(dots) = style.char_spacing {
            self.set_char_spacing(dots)?;
        }
        if let Some(stops) = &style.tab_stops {
            self.set_tab_stops(stops)?;
        }
        Ok(())
    }

    fn set_mode_bit(&mut self, mask: u8, on: bool) -> Result<(), TermicaError> {
        if on {
            self.print_mode |= mask;
        } else {
            self.print_mode &= !mask;
        }
        self.command(text::print_mode(self.print_mode))
    }

    pub fn set_double_height(&mut self, on: bool) -> Result<(), TermicaError> {
        self.set_mode_bit(text::DOUBLE_HEIGHT_MASK, on)
    }

    pub fn set_double_width(&mut self, on: bool) -> Result<(), TermicaError> {
        self.set_mode_bit(text::DOUBLE_WIDTH_MASK, on)
    }

    /// Clear every print-mode bit.
    pub fn normal(&mut self) -> Result<(), TermicaError> {
        self.print_mode = 0;
        self.command(text::print_mode(0))
    }

    /// Select a text size. Also sets the line width used for column
    /// tracking and two-column layout.
    pub fn set_size(&mut self, size: TextSize) -> Result<(), TermicaError> {
        self.print_mode = size.mode();
        self.size = size;
        self.column = 0;
        self.command(text::print_mode(self.print_mode))
    }

    pub fn justify(&mut self, alignment: Alignment) -> Result<(), TermicaError> {
        self.command(text::justify(alignment))
    }

    pub fn set_line_height(&mut self, height: u8) -> Result<(), TermicaError> {
        self.command(text::line_height(height))
    }

    pub fn set_barcode_height(&mut self, height: u8) -> Result<(), TermicaError> {
        self.command(barcode1d::height(height))
    }

    pub fn set_charset(&mut self, charset: u8) -> Result<(), TermicaError> {
        self.command(text::charset(charset))
    }

    pub fn set_code_page(&mut self, code_page: u8) -> Result<(), TermicaError> {
        self.command(text::code_page(code_page))
    }

    // ========================================================================
    // PAPER MOVEMENT
    // ========================================================================

    /// Feed `lines` lines and wait for the motor.
    pub fn feed(&mut self, lines: u8) -> Result<(), TermicaError> {
        self.command(commands::feed_lines(lines))?;
        self.settle(Wait::feed(lines));
        self.column = 0;
        self.ledger.record(0, 0, u32::from(lines));
        Ok(())
    }

    /// Built-in self-test page (`DC2 T`).
    pub fn test_page(&mut self) -> Result<(), TermicaError> {
        self.command(commands::test_page())?;
        self.ledger.record(0, TEST_PAGE_LINES, 0);
        Ok(())
    }

    // ========================================================================
    // TEXT OUTPUT
    // ========================================================================

    /// Send text bytes with newline pacing; returns the newlines sent.
    fn write_text(&mut self, s: &str) -> Result<u32, TermicaError> {
        let width = self.size.columns();
        let mut newlines = 0;
        for &b in s.as_bytes() {
            self.gate.send_char(b)?;
            if b == LF {
                newlines += 1;
                self.column = 0;
            } else if b == HT {
                // the printer ignores HT with no stop left on the line
                let column = self.column;
                if let Some(stop) = self
                    .tab_stops
                    .iter()
                    .map(|&s| usize::from(s))
                    .find(|&s| s > column && s < width)
                {
                    self.column = stop;
                }
            } else {
                self.column += 1;
                if self.column >= width {
                    self.column = 0;
                }
            }
        }
        Ok(newlines)
    }

    /// Print `s` as one or more lines. A trailing newline is added when
    /// missing. Empty text prints nothing.
    pub fn print_text(&mut self, s: &str) -> Result<(), TermicaError> {
        if s.is_empty() {
            return Ok(());
        }
        let mut lines = self.write_text(s)?;
        if !s.ends_with('\n') {
            lines += self.write_text("\n")?;
        }
        self.ledger.record(s.chars().count() as u32, lines, 0);
        Ok(())
    }

    fn print_rows(&mut self, rows: &[String]) -> Result<(), TermicaError> {
        for row in rows {
            self.write_text(row)?;
            self.write_text("\n")?;
            self.ledger.record(row.chars().count() as u32, 1, 0);
        }
        Ok(())
    }

    /// Left and right text on the same line(s), padded with spaces or dots
    /// to the width of `size`. Size returns to Small afterwards.
    pub fn print_two_column(
        &mut self,
        left: &str,
        right: &str,
        fill_dots: bool,
        size: TextSize,
    ) -> Result<(), TermicaError> {
        self.set_size(size)?;
        let pad = if fill_dots { '.' } else { ' ' };
        let rows = layout::two_column(left, right, size.columns(), pad);
        self.print_rows(&rows)?;
        self.set_size(TextSize::Small)
    }

    /// Two or three column table row at Small width.
    pub fn print_table_row(
        &mut self,
        col1: &str,
        col2: &str,
        col3: Option<&str>,
    ) -> Result<(), TermicaError> {
        let rows = layout::table_row(col1, col2, col3, TextSize::Small.columns());
        self.print_rows(&rows)
    }

    /// Centered divider line followed by a one-line feed.
    pub fn print_separator(&mut self) -> Result<(), TermicaError> {
        self.justify(Alignment::Center)?;
        self.print_text(layout::SEPARATOR)?;
        self.justify(Alignment::Left)?;
        self.feed(1)
    }

    /// Short self-test: a greeting and two lines of feed.
    pub fn test(&mut self) -> Result<(), TermicaError> {
        self.print_text("Hello World!")?;
        self.feed(2)
    }

    // ========================================================================
    // BARCODES
    // ========================================================================

    pub fn print_barcode(
        &mut self,
        kind: barcode1d::BarcodeType,
        data: &str,
    ) -> Result<(), TermicaError> {
        if data.is_empty() {
            return Err(TermicaError::InvalidPayload("empty barcode data".into()));
        }
        if data.bytes().any(|b| b == 0) {
            return Err(TermicaError::InvalidPayload(
                "barcode data cannot contain NUL".into(),
            ));
        }
        self.command(barcode1d::barcode(kind, data.as_bytes()))?;
        self.settle(BARCODE_WAIT);
        self.ledger.record(data.len() as u32, BARCODE_LINES, 0);
        Ok(())
    }

    /// QR Code Model 2. Each phase waits for the printer; rendering the
    /// symbol is the slowest thing the printer does.
    pub fn print_qr_code(
        &mut self,
        data: &str,
        module_size: u8,
        level: qr::QrErrorLevel,
    ) -> Result<(), TermicaError> {
        if data.is_empty() {
            return Err(TermicaError::InvalidPayload("empty QR data".into()));
        }
        if data.len() > qr::MAX_DATA_LEN {
            return Err(TermicaError::InvalidPayload(format!(
                "QR data is {} bytes, limit is {}",
                data.len(),
                qr::MAX_DATA_LEN
            )));
        }

        self.command(qr::set_module_size(module_size))?;
        self.settle(QR_CONFIG_WAIT);
        self.command(qr::set_error_correction(level))?;
        self.settle(QR_CONFIG_WAIT);
        self.command(qr::store_data(data.as_bytes()))?;
        self.settle(QR_STORE_WAIT);
        self.command(qr::print())?;
        self.settle(QR_PRINT_WAIT);

        self.feed(2)?;
        self.ledger.record(data.len() as u32, QR_LINES, 0);
        Ok(())
    }

    // ========================================================================
    // BITMAPS
    // ========================================================================

    /// Print a raster image `width` dots wide, rows packed MSB-first and
    /// padded to whole bytes. Images taller than [`graphics::MAX_BAND_ROWS`]
    /// go out in bands, each followed by a wait.
    pub fn print_bitmap(&mut self, width: u16, height: u16, data: &[u8]) -> Result<(), TermicaError> {
        validate_bitmap(width, height, data)?;
        for (rows, band) in graphics::raster_bands(width, height, data) {
            self.command(band)?;
            self.settle(Wait::raster(rows));
        }
        self.column = 0;
        self.ledger.record(0, bitmap_lines(height), 0);
        debug!(width, height, "bitmap printed");
        Ok(())
    }

    // ========================================================================
    // ROTATION
    // ========================================================================

    pub fn set_rotation(&mut self, rotation: Rotation) -> Result<(), TermicaError> {
        self.command(text::rotation(rotation))?;
        self.settle(ROTATION_WAIT);
        Ok(())
    }

    /// Print rotated text.
    ///
    /// At 90° the printer's buffer overruns at full speed and mangles
    /// glyphs, so that path prints at Small size, centered, one character at
    /// a time with a feed and a wait after each (at most
    /// [`MAX_ROTATED_CHARS`] characters, spaces shown as `.`). Other
    /// rotations print normally.
    pub fn print_rotated_text(&mut self, s: &str, rotation: Rotation) -> Result<(), TermicaError> {
        if s.is_empty() {
            return Ok(());
        }
        if rotation != Rotation::Cw90 {
            self.set_rotation(rotation)?;
            self.print_text(s)?;
            return self.set_rotation(Rotation::None);
        }

        self.set_size(TextSize::Small)?;
        self.justify(Alignment::Center)?;
        self.set_rotation(Rotation::Cw90)?;

        let mut buf = [0u8; 4];
        for c in s.chars().take(MAX_ROTATED_CHARS) {
            match c {
                '\n' => {}
                ' ' => {
                    self.write_text(".")?;
                    self.ledger.record(1, 0, 0);
                    self.feed(1)?;
                }
                _ => {
                    self.write_text(c.encode_utf8(&mut buf))?;
                    self.ledger.record(1, 0, 0);
                    self.feed(2)?;
                    self.settle(ROTATED_CHAR_WAIT);
                }
            }
        }

        self.set_rotation(Rotation::None)?;
        self.justify(Alignment::Left)?;
        self.set_size(TextSize::Small)?;
        self.feed(3)
    }

    // ========================================================================
    // STATUS
    // ========================================================================

    /// Ask the printer whether it has paper. No answer counts as present:
    /// plenty of clones never implement `ESC v`.
    pub fn has_paper(&mut self) -> Result<bool, TermicaError> {
        self.command(status::paper_status_request())?;
        let response = self
            .gate
            .read_response(STATUS_WAIT.handshake, STATUS_WAIT.delay)?;
        Ok(response.is_none_or(status::paper_present))
    }

    /// Cover, cutter and online flags. Without a handshake line the printer
    /// can't be trusted to answer, so the assumed defaults are returned.
    pub fn detailed_status(&mut self) -> Result<DeviceFlags, TermicaError> {
        if !self.gate.handshake_enabled() {
            return Ok(DeviceFlags::ASSUMED);
        }
        self.command(status::detailed_status_request())?;
        match self
            .gate
            .read_response(STATUS_WAIT.handshake, STATUS_WAIT.delay)?
        {
            Some(byte) => Ok(DeviceFlags::from_response(byte)),
            None => Err(TermicaError::CommunicationError(
                "no response to detailed status request".into(),
            )),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{Clock, ManualClock, Polarity};
    use crate::protocol::barcode::barcode1d::BarcodeType;
    use crate::protocol::barcode::qr::QrErrorLevel;
    use crate::transport::{MemoryLine, MemoryTransport};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn encoder() -> (Encoder, MemoryTransport, ManualClock) {
        let transport = MemoryTransport::new();
        let clock = ManualClock::new();
        let gate = FlowControl::new(
            Box::new(transport.clone()),
            Arc::new(clock.clone()),
            19200,
        );
        let encoder = Encoder::new(gate, UsageLedger::in_memory(), HeatConfig::default());
        (encoder, transport, clock)
    }

    fn hardware_encoder(line: &MemoryLine) -> (Encoder, MemoryTransport) {
        let transport = MemoryTransport::new();
        let gate = FlowControl::new(
            Box::new(transport.clone()),
            Arc::new(ManualClock::new()),
            19200,
        )
        .with_handshake(
            Box::new(line.clone()),
            Polarity::ActiveLow,
            Duration::from_millis(5000),
        );
        let encoder = Encoder::new(gate, UsageLedger::in_memory(), HeatConfig::default());
        (encoder, transport)
    }

    #[test]
    fn test_wake_reapplies_heat() {
        let (mut enc, transport, clock) = encoder();
        enc.sleep().unwrap();
        assert!(enc.is_asleep());
        transport.clear_sent();

        enc.wake().unwrap();
        assert!(!enc.is_asleep());
        assert_eq!(transport.sent(), vec![0xFF, 0x1B, b'7', 7, 80, 2]);
        assert!(clock.now() >= Duration::from_millis(50));
    }

    #[test]
    fn test_set_default_sequence() {
        let (mut enc, transport, _) = encoder();
        enc.set_default().unwrap();
        assert_eq!(
            transport.sent(),
            vec![
                0x1B, b'=', 1, // online
                0x1B, b'a', 0, // left
                0x1D, b'B', 0, // inverse off
                0x1B, b'E', 0, // bold off
                0x1B, b'-', 0, // underline off
                0x1B, b'!', 0, // small
                0x1B, b'3', 32, // line height
                0x1D, b'h', 50, // barcode height
                0x1B, b'R', 0, // charset
                0x1B, b't', 0, // code page
            ]
        );
    }

    #[test]
    fn test_double_height_and_width_share_mode_byte() {
        let (mut enc, transport, _) = encoder();
        enc.set_double_height(true).unwrap();
        enc.set_double_width(true).unwrap();
        enc.set_double_height(false).unwrap();
        assert_eq!(
            transport.sent(),
            vec![0x1B, b'!', 0x10, 0x1B, b'!', 0x30, 0x1B, b'!', 0x20]
        );
        enc.normal().unwrap();
        assert_eq!(enc.print_mode(), 0);
    }

    #[test]
    fn test_print_text_counts_usage() {
        let (mut enc, transport, _) = encoder();
        enc.print_text("Hello\nWorld").unwrap();
        assert_eq!(transport.sent(), b"Hello\nWorld\n".to_vec());
        let counters = enc.ledger().counters();
        assert_eq!(counters.characters, 11);
        assert_eq!(counters.lines, 2);

        enc.print_text("").unwrap();
        assert_eq!(enc.ledger().counters().characters, 11);
    }

    #[test]
    fn test_column_tracking() {
        let (mut enc, _, _) = encoder();
        enc.write_text("abc").unwrap();
        assert_eq!(enc.column(), 3);
        enc.write_text(&"x".repeat(29)).unwrap();
        assert_eq!(enc.column(), 0);
        enc.set_size(TextSize::Large).unwrap();
        enc.write_text(&"x".repeat(17)).unwrap();
        assert_eq!(enc.column(), 1);
    }

    #[test]
    fn test_feed_waits_and_records() {
        let (mut enc, transport, clock) = encoder();
        enc.feed(3).unwrap();
        assert_eq!(transport.sent(), vec![0x1B, b'd', 3]);
        assert!(clock.now() >= Duration::from_millis(350));
        assert_eq!(enc.ledger().counters().feeds, 3);
        assert_eq!(enc.ledger().usage_mm(), 12.0);
    }

    #[test]
    fn test_two_column_output() {
        let (mut enc, transport, _) = encoder();
        enc.print_two_column("Coffee", "$3.50", true, TextSize::Small)
            .unwrap();
        let mut expected = vec![0x1B, b'!', 0x00];
        expected.extend(format!("Coffee{}$3.50\n", ".".repeat(21)).bytes());
        expected.extend([0x1B, b'!', 0x00]);
        assert_eq!(transport.sent(), expected);
        assert_eq!(enc.ledger().counters().characters, 32);
    }

    #[test]
    fn test_barcode_sequence() {
        let (mut enc, transport, clock) = encoder();
        enc.print_barcode(BarcodeType::Code39, "ABC").unwrap();
        assert_eq!(
            transport.sent(),
            vec![
                0x1D, b'H', 2, 0x1D, b'w', 3, 0x1D, b'k', 4, b'A', b'B', b'C', 0x00
            ]
        );
        assert!(clock.now() >= Duration::from_millis(300));
        assert_eq!(enc.ledger().counters().lines, 3);
        assert!(enc.print_barcode(BarcodeType::Code128, "").is_err());
    }

    #[test]
    fn test_qr_phases() {
        let (mut enc, transport, _) = encoder();
        enc.print_qr_code("hi", 6, QrErrorLevel::M).unwrap();
        let sent = transport.sent();
        let mut expected = qr::set_module_size(6);
        expected.extend(qr::set_error_correction(QrErrorLevel::M));
        expected.extend(qr::store_data(b"hi"));
        expected.extend(qr::print());
        expected.extend(commands::feed_lines(2));
        assert_eq!(sent, expected);
        let counters = enc.ledger().counters();
        assert_eq!((counters.characters, counters.lines, counters.feeds), (2, 8, 2));
    }

    #[test]
    fn test_qr_rejects_oversized_payload() {
        let (mut enc, transport, _) = encoder();
        let data = "x".repeat(qr::MAX_DATA_LEN + 1);
        assert!(matches!(
            enc.print_qr_code(&data, 6, QrErrorLevel::L),
            Err(TermicaError::InvalidPayload(_))
        ));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_rotated_90_is_character_by_character() {
        let (mut enc, transport, _) = encoder();
        enc.print_rotated_text("A B", Rotation::Cw90).unwrap();
        let sent = transport.sent();

        let mut expected = vec![0x1B, b'!', 0x00, 0x1B, b'a', 1, 0x1B, b'V', 1];
        expected.extend([b'A', 0x1B, b'd', 2]);
        expected.extend([b'.', 0x1B, b'd', 1]);
        expected.extend([b'B', 0x1B, b'd', 2]);
        expected.extend([0x1B, b'V', 0, 0x1B, b'a', 0, 0x1B, b'!', 0x00, 0x1B, b'd', 3]);
        assert_eq!(sent, expected);
        assert_eq!(enc.ledger().counters().characters, 3);
    }

    #[test]
    fn test_rotated_90_truncates() {
        let (mut enc, _, _) = encoder();
        enc.print_rotated_text(&"Z".repeat(30), Rotation::Cw90)
            .unwrap();
        assert_eq!(enc.ledger().counters().characters, MAX_ROTATED_CHARS as u32);
    }

    #[test]
    fn test_rotated_180_prints_normally() {
        let (mut enc, transport, _) = encoder();
        enc.print_rotated_text("up", Rotation::Cw180).unwrap();
        assert_eq!(
            transport.sent(),
            vec![0x1B, b'V', 2, b'u', b'p', b'\n', 0x1B, b'V', 0]
        );
    }

    #[test]
    fn test_has_paper() {
        let (mut enc, transport, _) = encoder();
        assert!(enc.has_paper().unwrap());
        transport.set_paper(false);
        assert!(!enc.has_paper().unwrap());
        transport.set_paper(true);
        assert!(enc.has_paper().unwrap());
    }

    #[test]
    fn test_detailed_status_defaults_without_handshake() {
        let (mut enc, transport, _) = encoder();
        assert_eq!(enc.detailed_status().unwrap(), DeviceFlags::ASSUMED);
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_detailed_status_with_handshake() {
        let line = MemoryLine::new(false);
        let (mut enc, transport) = hardware_encoder(&line);
        assert!(matches!(
            enc.detailed_status(),
            Err(TermicaError::CommunicationError(_))
        ));

        transport.respond_to(status::detailed_status_request(), 0x04);
        let flags = enc.detailed_status().unwrap();
        assert!(flags.cover_open);
        assert!(flags.online);
    }

    #[test]
    fn test_recover_sequence() {
        let (mut enc, transport, _) = encoder();
        transport.push_incoming(&[9, 9]);
        enc.recover().unwrap();
        let sent = transport.sent();
        assert!(sent.starts_with(&[0x1B, b'@', 0xFF]));
        assert!(transport.sent_contains(&[0x12, b'#', 0x44]));
        assert!(sent.ends_with(&[0x1B, b't', 0]));
    }

    #[test]
    fn test_style_change_sequence() {
        let (mut enc, transport, _) = encoder();
        enc.apply_style(&StyleChange {
            upside_down: Some(true),
            double_strike: Some(false),
            char_spacing: Some(2),
            tab_stops: Some(vec![6, 12]),
        })
        .unwrap();
        assert_eq!(
            transport.sent(),
            vec![
                0x1B, b'{', 1, // upside-down
                0x1B, b'G', 0, // double-strike off
                0x1B, b' ', 2, // spacing
                0x1B, b'D', 6, 12, 0, // tab stops
            ]
        );
        assert_eq!(enc.tab_stops(), &[6u8, 12][..]);

        transport.clear_sent();
        enc.apply_style(&StyleChange::default()).unwrap();
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_tab_moves_to_next_stop() {
        let (mut enc, transport, _) = encoder();
        enc.write_text("ab").unwrap();
        enc.tab().unwrap();
        assert_eq!(enc.column(), 8);
        assert_eq!(transport.sent(), b"ab\t".to_vec());

        enc.set_tab_stops(&text::DEFAULT_TAB_STOPS).unwrap();
        enc.write_text("x\t").unwrap();
        assert_eq!(enc.column(), 12);

        // past the last stop HT does nothing
        enc.write_text(&"y".repeat(17)).unwrap();
        enc.tab().unwrap();
        assert_eq!(enc.column(), 29);

        enc.reset().unwrap();
        assert_eq!(enc.tab_stops(), &text::FIRMWARE_TAB_STOPS[..]);
    }

    #[test]
    fn test_beep() {
        let (mut enc, transport, _) = encoder();
        enc.beep().unwrap();
        assert_eq!(transport.sent(), vec![0x1B, b'B', 3, 3]);
    }

    #[test]
    fn test_bitmap_bands_and_accounting() {
        let (mut enc, transport, clock) = encoder();
        let data = vec![0xF0; 2 * 300];
        enc.print_bitmap(16, 300, &data).unwrap();

        let mut expected = graphics::raster(16, 255, &data[..2 * 255]);
        expected.extend(graphics::raster(16, 45, &data[2 * 255..]));
        assert_eq!(transport.sent(), expected);
        assert!(clock.now() >= Duration::from_millis(255 * 3 + 50 + 45 * 3 + 50));
        // 300 dots at 32 dots per line
        assert_eq!(enc.ledger().counters().lines, 10);
    }

    #[test]
    fn test_bitmap_rejects_bad_dimensions() {
        let (mut enc, transport, _) = encoder();
        for (width, height, len) in [(0, 1, 0), (385, 1, 49), (8, 0, 0), (20, 2, 4)] {
            assert!(matches!(
                enc.print_bitmap(width, height, &vec![0; len]),
                Err(TermicaError::InvalidPayload(_))
            ));
        }
        assert!(transport.sent().is_empty());
        assert_eq!(bitmap_lines(1), 1);
        assert_eq!(bitmap_lines(64), 2);
    }

    #[test]
    fn test_test_page_accounting() {
        let (mut enc, transport, _) = encoder();
        enc.test_page().unwrap();
        assert_eq!(transport.sent(), vec![0x12, b'T']);
        assert_eq!(enc.ledger().counters().lines, 10);
    }
}
