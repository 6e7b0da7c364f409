//! # ESC/POS Barcode Commands
//!
//! This module implements barcode generation commands.
//!
//! ## Supported Barcode Types
//!
//! | Type | Description | Density |
//! |------|-------------|---------|
//! | 1D (`GS k`) | UPC, EAN, Code39, Code128, ... | Low capacity |
//! | QR Code (`GS ( k`) | 2D matrix barcode, Model 2 | High capacity |
//!
//! ## 1D Barcode Usage
//!
//! ```
//! use termica::protocol::barcode::barcode1d::{self, BarcodeType};
//!
//! let data = barcode1d::barcode(BarcodeType::Code39, b"HELLO");
//! assert_eq!(&data[..9], &[0x1D, 0x48, 2, 0x1D, 0x77, 3, 0x1D, 0x6B, 4]);
//! assert_eq!(*data.last().unwrap(), 0x00);
//! ```
//!
//! ## QR Code Usage
//!
//! QR codes are printed in four phases. The printer needs time after each
//! one, so the encoder sends them separately instead of as one blob:
//!
//! 1. Set module size
//! 2. Set error correction level
//! 3. Store the data in the symbol buffer
//! 4. Print the stored symbol
//!
//! ```
//! use termica::protocol::barcode::qr::{self, QrErrorLevel};
//!
//! let mut data = Vec::new();
//! data.extend(qr::set_module_size(3));
//! data.extend(qr::set_error_correction(QrErrorLevel::M));
//! data.extend(qr::store_data(b"https://example.com"));
//! data.extend(qr::print());
//! ```

use super::commands::GS;

// ============================================================================
// 1D BARCODE COMMANDS (GS k)
// ============================================================================

/// 1D Barcode command builders
pub mod barcode1d {
    use serde::{Deserialize, Serialize};

    use super::GS;

    /// Default barcode height in dots.
    pub const DEFAULT_HEIGHT: u8 = 50;

    /// 1D Barcode type codes (`GS k m`, NUL-terminated form)
    ///
    /// | Type | Code | Data |
    /// |------|------|------|
    /// | UPC-A | 0 | 11-12 digits |
    /// | UPC-E | 1 | 11-12 digits |
    /// | EAN-13 | 2 | 12-13 digits |
    /// | EAN-8 | 3 | 7-8 digits |
    /// | Code39 | 4 | 0-9, A-Z, space, $%+-./ |
    /// | ITF | 5 | even number of digits |
    /// | Codabar | 6 | 0-9, $+-./:, A-D start/stop |
    /// | Code93 | 7 | ASCII |
    /// | Code128 | 8 | ASCII |
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum BarcodeType {
        UpcA = 0,
        UpcE = 1,
        Ean13 = 2,
        Ean8 = 3,
        Code39 = 4,
        Itf = 5,
        Codabar = 6,
        Code93 = 7,
        #[default]
        Code128 = 8,
    }

    impl BarcodeType {
        /// Look up a barcode type by its wire code.
        pub fn from_code(code: u8) -> Option<Self> {
            Some(match code {
                0 => Self::UpcA,
                1 => Self::UpcE,
                2 => Self::Ean13,
                3 => Self::Ean8,
                4 => Self::Code39,
                5 => Self::Itf,
                6 => Self::Codabar,
                7 => Self::Code93,
                8 => Self::Code128,
                _ => return None,
            })
        }

        /// Parse a barcode type name as used on the command line.
        pub fn parse(name: &str) -> Option<Self> {
            Some(match name.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
                "upca" => Self::UpcA,
                "upce" => Self::UpcE,
                "ean13" => Self::Ean13,
                "ean8" => Self::Ean8,
                "code39" => Self::Code39,
                "itf" => Self::Itf,
                "codabar" => Self::Codabar,
                "code93" => Self::Code93,
                "code128" => Self::Code128,
                _ => return None,
            })
        }
    }

    /// # Barcode Height (GS h n)
    ///
    /// Height in dots, at least 1.
    #[inline]
    pub fn height(n: u8) -> Vec<u8> {
        vec![GS, b'h', n.max(1)]
    }

    /// # Print 1D Barcode
    ///
    /// Emits the full sequence the printer expects:
    ///
    /// | Step | Bytes | Meaning |
    /// |------|-------|---------|
    /// | 1 | GS H 2 | Human-readable label below the bars |
    /// | 2 | GS w 3 | Module width 3 dots |
    /// | 3 | GS k m data NUL | Barcode type, data, terminator |
    pub fn barcode(kind: BarcodeType, data: &[u8]) -> Vec<u8> {
        let mut cmd = Vec::with_capacity(data.len() + 10);
        cmd.extend([GS, b'H', 2]);
        cmd.extend([GS, b'w', 3]);
        cmd.extend([GS, b'k', kind as u8]);
        cmd.extend_from_slice(data);
        cmd.push(0x00);
        cmd
    }
}

// ============================================================================
// QR CODE COMMANDS (GS ( k)
// ============================================================================

/// QR Code (Model 2) command builders
///
/// All QR functions share the `GS ( k pL pH cn fn ...` envelope where
/// `pL pH` is the little-endian length of everything after them and
/// `cn = 49` selects the QR symbology.
///
/// ## Function Numbers
///
/// | fn | Meaning |
/// |----|---------|
/// | 67 | Module size |
/// | 69 | Error correction level (`48 + n`) |
/// | 80 | Store symbol data |
/// | 81 | Print stored symbol |
///
/// These are the standard Epson numbers. Some Arduino-era drivers for the
/// same printers send the module size as fn 65 and the error level as fn 67
/// with a raw `0..=3`; fn 65 selects the QR model on standard firmware, so
/// those sequences are not reproduced here.
pub mod qr {
    use serde::{Deserialize, Serialize};

    use super::GS;
    use crate::protocol::commands::u16_le;

    /// Symbology selector for QR Code.
    const CN_QR: u8 = 49;

    /// Largest payload accepted by the encoder.
    pub const MAX_DATA_LEN: usize = 2048;

    /// QR Code error correction level
    ///
    /// | Level | Recovery |
    /// |-------|----------|
    /// | L | ~7% |
    /// | M | ~15% |
    /// | Q | ~25% |
    /// | H | ~30% |
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub enum QrErrorLevel {
        L = 0,
        #[default]
        M = 1,
        Q = 2,
        H = 3,
    }

    impl QrErrorLevel {
        /// Map 0..=3 to a level; larger values saturate at H.
        pub fn from_index(n: u8) -> Self {
            match n {
                0 => Self::L,
                1 => Self::M,
                2 => Self::Q,
                _ => Self::H,
            }
        }
    }

    /// # Set Module Size (GS ( k 3 0 49 67 n)
    ///
    /// Module (cell) size in dots, clamped to 1..=16.
    ///
    /// ## Protocol Details
    ///
    /// | Format | Bytes |
    /// |--------|-------|
    /// | Hex    | 1D 28 6B 03 00 31 43 n |
    pub fn set_module_size(size: u8) -> Vec<u8> {
        vec![GS, b'(', b'k', 3, 0, CN_QR, 67, size.clamp(1, 16)]
    }

    /// # Set Error Correction (GS ( k 3 0 49 69 n)
    ///
    /// `n` is `48 + level` (48 = L ... 51 = H).
    ///
    /// ## Protocol Details
    ///
    /// | Format | Bytes |
    /// |--------|-------|
    /// | Hex    | 1D 28 6B 03 00 31 45 n |
    pub fn set_error_correction(level: QrErrorLevel) -> Vec<u8> {
        vec![GS, b'(', b'k', 3, 0, CN_QR, 69, 48 + level as u8]
    }

    /// # Store Data (GS ( k pL pH 49 80 48 data)
    ///
    /// `pL pH` is `data.len() + 3`, little-endian.
    ///
    /// ```
    /// use termica::protocol::barcode::qr;
    ///
    /// let cmd = qr::store_data(b"abc");
    /// assert_eq!(cmd, vec![0x1D, 0x28, 0x6B, 6, 0, 49, 80, 48, b'a', b'b', b'c']);
    /// ```
    pub fn store_data(data: &[u8]) -> Vec<u8> {
        let len = (data.len() + 3).min(u16::MAX as usize) as u16;
        let [pl, ph] = u16_le(len);
        let mut cmd = vec![GS, b'(', b'k', pl, ph, CN_QR, 80, 48];
        cmd.extend_from_slice(data);
        cmd
    }

    /// # Print Stored Symbol (GS ( k 3 0 49 81 48)
    pub fn print() -> Vec<u8> {
        vec![GS, b'(', b'k', 3, 0, CN_QR, 81, 48]
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::barcode1d::{self, BarcodeType};
    use super::qr::{self, QrErrorLevel};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_barcode_sequence() {
        let cmd = barcode1d::barcode(BarcodeType::Ean13, b"123");
        assert_eq!(
            cmd,
            vec![
                0x1D, 0x48, 0x02, 0x1D, 0x77, 0x03, 0x1D, 0x6B, 0x02, b'1', b'2', b'3', 0x00
            ]
        );
    }

    #[test]
    fn test_barcode_height_minimum() {
        assert_eq!(barcode1d::height(0), vec![0x1D, 0x68, 1]);
        assert_eq!(barcode1d::height(50), vec![0x1D, 0x68, 50]);
    }

    #[test]
    fn test_barcode_type_lookup() {
        assert_eq!(BarcodeType::from_code(8), Some(BarcodeType::Code128));
        assert_eq!(BarcodeType::from_code(9), None);
        assert_eq!(BarcodeType::parse("EAN-13"), Some(BarcodeType::Ean13));
        assert_eq!(BarcodeType::parse("upc_a"), Some(BarcodeType::UpcA));
        assert_eq!(BarcodeType::parse("qr"), None);
    }

    #[test]
    fn test_qr_module_size() {
        assert_eq!(
            qr::set_module_size(3),
            vec![0x1D, 0x28, 0x6B, 3, 0, 49, 67, 3]
        );
        assert_eq!(qr::set_module_size(0)[7], 1);
        assert_eq!(qr::set_module_size(40)[7], 16);
    }

    #[test]
    fn test_qr_error_correction() {
        assert_eq!(
            qr::set_error_correction(QrErrorLevel::L),
            vec![0x1D, 0x28, 0x6B, 3, 0, 49, 69, 48]
        );
        assert_eq!(qr::set_error_correction(QrErrorLevel::H)[7], 51);
        assert_eq!(QrErrorLevel::from_index(9), QrErrorLevel::H);
    }

    #[test]
    fn test_qr_store_data_length_prefix() {
        let payload = vec![b'x'; 300];
        let cmd = qr::store_data(&payload);
        // 303 = 0x012F
        assert_eq!(&cmd[..8], &[0x1D, 0x28, 0x6B, 0x2F, 0x01, 49, 80, 48]);
        assert_eq!(cmd.len(), 8 + 300);
    }

    #[test]
    fn test_qr_print() {
        assert_eq!(qr::print(), vec![0x1D, 0x28, 0x6B, 3, 0, 49, 81, 48]);
    }
}
