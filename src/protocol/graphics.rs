//! # ESC/POS Raster Graphics
//!
//! Bitmaps are sent with the raster bit-image command `GS v 0`.
//!
//! ## Bit Packing
//!
//! Each byte is eight horizontal dots:
//! - Bit 7 (MSB) = leftmost dot
//! - Bit 0 (LSB) = rightmost dot
//! - 1 = black (print), 0 = white (no print)
//!
//! Rows are padded to a whole number of bytes, so a 20-dot wide row takes
//! 3 bytes and the last 4 bits are ignored.
//!
//! ## 58mm Printers
//!
//! | Property | Value |
//! |----------|-------|
//! | Max print width | 384 dots (48 bytes) |
//! | Resolution | 203 DPI (~8 dots/mm) |
//!
//! Tall images are sent as several raster commands of at most
//! [`MAX_BAND_ROWS`] rows each; the small receive buffers on these printers
//! overflow on a single large command.

use super::commands::{GS, u16_le};

/// Widest image the printhead can print, in dots.
pub const MAX_WIDTH_DOTS: u16 = 384;

/// Rows per raster command when an image is split into bands.
pub const MAX_BAND_ROWS: u16 = 255;

/// Bytes per row for an image `width_dots` wide.
#[inline]
pub const fn row_bytes(width_dots: u16) -> usize {
    width_dots.div_ceil(8) as usize
}

/// # Print Raster Bit Image (GS v 0 m xL xH yL yH d1...dk)
///
/// ## Protocol Details
///
/// | Format  | Bytes |
/// |---------|-------|
/// | ASCII   | GS v 0 m xL xH yL yH d1...dk |
/// | Hex     | 1D 76 30 m xL xH yL yH d1...dk |
///
/// ## Parameters
///
/// - `m`: Scale mode (0 = normal)
/// - `xL, xH`: Width in **bytes**, little-endian
/// - `yL, yH`: Height in dots, little-endian
/// - `d1...dk`: Image data, k = width_bytes × height
///
/// ## Example
///
/// ```
/// use termica::protocol::graphics;
///
/// // 16 dots wide (2 bytes), 3 rows
/// let cmd = graphics::raster(16, 3, &[0xFF; 6]);
/// assert_eq!(&cmd[..8], &[0x1D, 0x76, 0x30, 0, 2, 0, 3, 0]);
/// assert_eq!(cmd.len(), 8 + 6);
/// ```
pub fn raster(width_dots: u16, height: u16, data: &[u8]) -> Vec<u8> {
    let width_bytes = row_bytes(width_dots);
    debug_assert!(
        data.len() == width_bytes * height as usize,
        "Raster data length mismatch. Expected {} ({} bytes × {} rows), got {}",
        width_bytes * height as usize,
        width_bytes,
        height,
        data.len()
    );

    let [xl, xh] = u16_le(width_bytes as u16);
    let [yl, yh] = u16_le(height);

    let mut cmd = Vec::with_capacity(8 + data.len());
    cmd.extend([GS, b'v', b'0', 0, xl, xh, yl, yh]);
    cmd.extend_from_slice(data);
    cmd
}

/// Split an image into raster commands of at most [`MAX_BAND_ROWS`] rows.
///
/// Yields `(rows, command)` pairs in print order.
pub fn raster_bands(
    width_dots: u16,
    height: u16,
    data: &[u8],
) -> impl Iterator<Item = (u16, Vec<u8>)> + '_ {
    let stride = row_bytes(width_dots);
    (0..height).step_by(MAX_BAND_ROWS as usize).map(move |top| {
        let rows = (height - top).min(MAX_BAND_ROWS);
        let start = top as usize * stride;
        let end = start + rows as usize * stride;
        (rows, raster(width_dots, rows, &data[start..end]))
    })
}

// ============================================================================
// TESTS
// ============================================================================
