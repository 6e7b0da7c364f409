//! # ESC/POS Text Styling Commands
//!
//! This module implements text formatting commands.
//!
//! ## Text Styling Overview
//!
//! | Style | Command | Effect |
//! |-------|---------|--------|
//! | Bold | ESC E n | **Emphasized** text |
//! | Underline | ESC - n | Underlined text |
//! | Inverse | GS B n | White on black |
//! | Double-strike | ESC G n | Each dot printed twice |
//! | Upside-down | ESC { n | Text printed rotated 180° |
//! | Double Height | ESC ! (bit 4) | 2x vertical size |
//! | Double Width | ESC ! (bit 5) | 2x horizontal size |
//! | Rotation | ESC V n | 0°/90°/180°/270° |
//!
//! Double height and double width share the single `ESC !` print-mode byte,
//! so toggling one of them means resending the whole mode. The encoder keeps
//! that byte as state; here we only build the sequence.
//!
//! ## Text Sizes
//!
//! | Size | Mode byte | Columns (58mm) |
//! |------|-----------|----------------|
//! | Small | 0x00 | 32 |
//! | Medium | 0x10 | 24 |
//! | Large | 0x30 | 16 |

use serde::{Deserialize, Serialize};

use super::commands::{ESC, GS};

/// Print-mode bit for double height (`ESC !`).
pub const DOUBLE_HEIGHT_MASK: u8 = 1 << 4;

/// Print-mode bit for double width (`ESC !`).
pub const DOUBLE_WIDTH_MASK: u8 = 1 << 5;

/// Minimum line height in dots accepted by [`line_height`].
pub const MIN_LINE_HEIGHT: u8 = 24;

/// Default line height in dots.
pub const DEFAULT_LINE_HEIGHT: u8 = 32;

/// HT (Horizontal Tab) - Move to the next tab stop
pub const HT: u8 = 0x09;

/// Most tab stops `ESC D` accepts.
pub const MAX_TAB_STOPS: usize = 32;

/// Tab stops every four columns across a Small line.
pub const DEFAULT_TAB_STOPS: [u8; 7] = [4, 8, 12, 16, 20, 24, 28];

/// Firmware tab stops after power-on or `ESC @`: every eight columns.
pub const FIRMWARE_TAB_STOPS: [u8; 3] = [8, 16, 24];

// ============================================================================
// TEXT ALIGNMENT
// ============================================================================

/// Text alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Left = 0,
    Center = 1,
    Right = 2,
}

impl Alignment {
    /// Map a numeric alignment (0 left, 1 center, anything else right).
    pub fn from_index(n: u8) -> Self {
        match n {
            0 => Self::Left,
            1 => Self::Center,
            _ => Self::Right,
        }
    }
}

/// # Set Justification (ESC a n)
///
/// ## Protocol Details
///
/// | Format  | Bytes    |
/// |---------|----------|
/// | ASCII   | ESC a n  |
/// | Hex     | 1B 61 n  |
///
/// ## Example
///
/// ```
/// use termica::protocol::text::{justify, Alignment};
///
/// assert_eq!(justify(Alignment::Center), vec![0x1B, 0x61, 0x01]);
/// ```
pub fn justify(alignment: Alignment) -> Vec<u8> {
    vec![ESC, b'a', alignment as u8]
}

// ============================================================================
// TEXT SIZE
// ============================================================================

/// Discrete text sizes, written through the `ESC !` print-mode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSize {
    #[default]
    Small,
    Medium,
    Large,
}

impl TextSize {
    /// Print-mode bits for this size.
    pub const fn mode(self) -> u8 {
        match self {
            Self::Small => 0x00,
            Self::Medium => DOUBLE_HEIGHT_MASK,
            Self::Large => DOUBLE_HEIGHT_MASK | DOUBLE_WIDTH_MASK,
        }
    }

    /// Characters per line at this size.
    pub const fn columns(self) -> usize {
        match self {
            Self::Small => 32,
            Self::Medium => 24,
            Self::Large => 16,
        }
    }

    /// Paper multiplier used when predicting usage for a job.
    pub const fn usage_multiplier(self) -> f32 {
        match self {
            Self::Small => 1.0,
            Self::Medium => 1.5,
            Self::Large => 2.0,
        }
    }

    /// Map a numeric size (1 small, 2 medium, 3+ large; 0 is treated as small).
    pub fn from_index(n: u8) -> Self {
        match n {
            0 | 1 => Self::Small,
            2 => Self::Medium,
            _ => Self::Large,
        }
    }

    /// Parse the single-letter form (`S`, `M`, `L`, any case).
    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'S' => Some(Self::Small),
            'M' => Some(Self::Medium),
            'L' => Some(Self::Large),
            _ => None,
        }
    }
}

/// # Select Print Mode (ESC ! n)
///
/// Writes the full print-mode byte. Bit 4 is double height, bit 5 double
/// width; the text sizes are combinations of the two.
///
/// ```
/// use termica::protocol::text::{print_mode, TextSize};
///
/// assert_eq!(print_mode(TextSize::Large.mode()), vec![0x1B, 0x21, 0x30]);
/// ```
#[inline]
pub fn print_mode(mode: u8) -> Vec<u8> {
    vec![ESC, b'!', mode]
}

// ============================================================================
// EMPHASIS
// ============================================================================

/// # Bold (ESC E n)
///
/// | State | Bytes |
/// |-------|-------|
/// | On    | 1B 45 01 |
/// | Off   | 1B 45 00 |
#[inline]
pub fn bold(state: bool) -> Vec<u8> {
    vec![ESC, b'E', state as u8]
}

/// # Underline (ESC - n)
#[inline]
pub fn underline(state: bool) -> Vec<u8> {
    vec![ESC, b'-', state as u8]
}

/// # Inverse / White-on-Black (GS B n)
#[inline]
pub fn inverse(state: bool) -> Vec<u8> {
    vec![GS, b'B', state as u8]
}

/// # Double-Strike (ESC G n)
///
/// Prints every dot twice. Darker than bold on faded paper, and slower.
#[inline]
pub fn double_strike(state: bool) -> Vec<u8> {
    vec![ESC, b'G', state as u8]
}

/// # Upside-Down (ESC { n)
///
/// | State | Bytes |
/// |-------|-------|
/// | On    | 1B 7B 01 |
/// | Off   | 1B 7B 00 |
///
/// Only takes effect at the start of a line.
#[inline]
pub fn upside_down(state: bool) -> Vec<u8> {
    vec![ESC, b'{', state as u8]
}

// ============================================================================
// LINE SPACING & CHARACTER TABLES
// ============================================================================

/// # Line Height (ESC 3 n)
///
/// Sets line spacing in dots. Values below 24 are raised to 24, the height
/// of one character row; anything less makes rows overlap.
///
/// ```
/// use termica::protocol::text::line_height;
///
/// assert_eq!(line_height(10), vec![0x1B, 0x33, 24]);
/// assert_eq!(line_height(32), vec![0x1B, 0x33, 32]);
/// ```
#[inline]
pub fn line_height(height: u8) -> Vec<u8> {
    vec![ESC, b'3', height.max(MIN_LINE_HEIGHT)]
}

/// # Character Spacing (ESC SP n)
///
/// Extra space to the right of each character, in dots.
///
/// ```
/// use termica::protocol::text::char_spacing;
///
/// assert_eq!(char_spacing(2), vec![0x1B, 0x20, 0x02]);
/// ```
#[inline]
pub fn char_spacing(dots: u8) -> Vec<u8> {
    vec![ESC, b' ', dots]
}

/// # Set Tab Stops (ESC D n1...nk NUL)
///
/// Columns must be ascending; anything that is not is dropped, as are stops
/// past [`MAX_TAB_STOPS`]. An empty list clears every stop.
///
/// ```
/// use termica::protocol::text::tab_stops;
///
/// assert_eq!(tab_stops(&[4, 8]), vec![0x1B, 0x44, 4, 8, 0]);
/// assert_eq!(tab_stops(&[8, 4, 12]), vec![0x1B, 0x44, 8, 12, 0]);
/// ```
pub fn tab_stops(stops: &[u8]) -> Vec<u8> {
    let mut cmd = vec![ESC, b'D'];
    let mut last = 0;
    for &stop in stops {
        if stop > last && cmd.len() - 2 < MAX_TAB_STOPS {
            cmd.push(stop);
            last = stop;
        }
    }
    cmd.push(0);
    cmd
}

/// # International Character Set (ESC R n)
#[inline]
pub fn charset(n: u8) -> Vec<u8> {
    vec![ESC, b'R', n]
}

/// # Character Code Page (ESC t n)
#[inline]
pub fn code_page(n: u8) -> Vec<u8> {
    vec![ESC, b't', n]
}

// ============================================================================
// ROTATION
// ============================================================================

/// Print rotation, clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    #[default]
    None = 0,
    Cw90 = 1,
    Cw180 = 2,
    Cw270 = 3,
}

impl Rotation {
    /// Map the low two bits of `n` to a rotation.
    pub fn from_index(n: u8) -> Self {
        match n & 0x03 {
            0 => Self::None,
            1 => Self::Cw90,
            2 => Self::Cw180,
            _ => Self::Cw270,
        }
    }
}

/// # Rotation (ESC V n)
///
/// ## Protocol Details
///
/// | n | Rotation |
/// |---|----------|
/// | 0 | 0° |
/// | 1 | 90° |
/// | 2 | 180° |
/// | 3 | 270° |
#[inline]
pub fn rotation(r: Rotation) -> Vec<u8> {
    vec![ESC, b'V', r as u8]
}

// ============================================================================
// TESTS
// ============================================================================
