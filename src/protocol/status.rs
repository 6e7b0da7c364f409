//! # Status Requests
//!
//! Builders for the two status queries and decoders for their one-byte
//! responses.
//!
//! ## Paper Status (ESC v 0)
//!
//! | Bit | Mask | Meaning when set |
//! |-----|------|------------------|
//! | 2 | 0x04 | Paper near end / out |
//! | 3 | 0x08 | Paper out |
//!
//! Paper counts as present only when both bits are clear.
//!
//! ## Detailed Status (GS r 1)
//!
//! Only meaningful on printers wired for hardware handshaking, where the
//! status line is reliable enough to trust.
//!
//! | Bit | Mask | Meaning when set |
//! |-----|------|------------------|
//! | 2 | 0x04 | Cover open |
//! | 3 | 0x08 | Auto-cutter error |
//! | 6 | 0x40 | Printer offline (error state) |

use serde::Serialize;

use super::commands::{ESC, GS};

const PAPER_MASK: u8 = 0x0C;
const COVER_OPEN_MASK: u8 = 0x04;
const CUTTER_ERROR_MASK: u8 = 0x08;
const OFFLINE_MASK: u8 = 0x40;

/// # Paper Status Request (ESC v 0)
#[inline]
pub fn paper_status_request() -> Vec<u8> {
    vec![ESC, b'v', 0x00]
}

/// # Detailed Status Request (GS r 1)
#[inline]
pub fn detailed_status_request() -> Vec<u8> {
    vec![GS, b'r', 0x01]
}

/// Decode a paper status response byte.
///
/// ```
/// use termica::protocol::status::paper_present;
///
/// assert!(paper_present(0x00));
/// assert!(!paper_present(0x0C));
/// assert!(!paper_present(0x04));
/// ```
#[inline]
pub fn paper_present(response: u8) -> bool {
    response & PAPER_MASK == 0
}

/// Decoded detailed status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceFlags {
    pub cover_open: bool,
    pub cutter_error: bool,
    pub online: bool,
}

impl DeviceFlags {
    /// Defaults reported when the device cannot be asked: online, no faults.
    pub const ASSUMED: Self = Self {
        cover_open: false,
        cutter_error: false,
        online: true,
    };

    /// Decode a `GS r 1` response byte.
    pub fn from_response(byte: u8) -> Self {
        Self {
            cover_open: byte & COVER_OPEN_MASK != 0,
            cutter_error: byte & CUTTER_ERROR_MASK != 0,
            online: byte & OFFLINE_MASK == 0,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests() {
        assert_eq!(paper_status_request(), vec![0x1B, 0x76, 0x00]);
        assert_eq!(detailed_status_request(), vec![0x1D, 0x72, 0x01]);
    }

    #[test]
    fn test_paper_bits() {
        assert!(paper_present(0x00));
        assert!(paper_present(0xF3));
        assert!(!paper_present(0x08));
    }

    #[test]
    fn test_device_flags() {
        assert_eq!(DeviceFlags::from_response(0x00), DeviceFlags::ASSUMED);

        let flags = DeviceFlags::from_response(0x4C);
        assert!(flags.cover_open);
        assert!(flags.cutter_error);
        assert!(!flags.online);
    }
}
