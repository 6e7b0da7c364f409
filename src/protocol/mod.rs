//! # ESC/POS Protocol Implementation
//!
//! This module provides low-level command builders for the ESC/POS command
//! set spoken by small serial thermal printers (58mm panel printers and their
//! many clones).
//!
//! ## Module Structure
//!
//! - [`commands`]: Device commands (init, wake, sleep, feed, heat)
//! - [`text`]: Text styling (alignment, size, emphasis, spacing, tabs, rotation)
//! - [`barcode`]: 1D barcodes and QR codes
//! - [`graphics`]: Raster bitmaps
//! - [`status`]: Status requests and response decoding
//!
//! ## Usage Example
//!
//! ```
//! use termica::protocol::{commands, text};
//!
//! let mut data = Vec::new();
//! data.extend(commands::init());
//! data.extend(text::justify(text::Alignment::Center));
//! data.extend(text::bold(true));
//! data.extend(b"RECEIPT\n");
//! data.extend(text::bold(false));
//! data.extend(commands::feed_lines(3));
//! ```
//!
//! These builders only produce bytes. Sending them at a pace the printer can
//! absorb is the job of [`crate::flow`] and [`crate::encoder`].

pub mod barcode;
pub mod commands;
pub mod graphics;
pub mod status;
pub mod text;
