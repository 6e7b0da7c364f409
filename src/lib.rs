//! # termica - Serial Thermal Printer Driver
//!
//! termica drives the cheap ESC/POS thermal printers sold for hobby and
//! kiosk use: 58 mm paper, a serial TTL port, and no reliable way to say
//! "slow down". It provides:
//!
//! - **Flow control**: byte pacing derived from the baud rate, or a hardware
//!   ready/busy line with bounded waits
//! - **Command encoding**: text styling, layout helpers, barcodes, QR codes,
//!   raster bitmaps and rotated text, each followed by the wait the printer
//!   needs
//! - **Paper accounting**: a persisted usage ledger that refuses jobs the
//!   roll can't hold
//! - **Print queue**: bounded FIFO with inter-job spacing, driven by a
//!   cooperative `tick()`
//! - **Status monitoring**: periodic paper polling with change callbacks
//!
//! ## Quick Start
//!
//! ```no_run
//! use termica::printer::{PrinterSettings, ThermalPrinter};
//! use termica::protocol::text::{Alignment, TextSize};
//!
//! let settings = PrinterSettings::load("/etc/termica.toml")?;
//! let mut printer = ThermalPrinter::open(&settings)?;
//! printer.setup()?;
//!
//! printer.print_immediate("Hello", TextSize::Large, Alignment::Center, true)?;
//! printer.print_two_column("Coffee", "$3.50", true, TextSize::Small)?;
//!
//! printer.queue_separator(0)?;
//! loop {
//!     printer.tick();
//!     std::thread::sleep(std::time::Duration::from_millis(100));
//! }
//! # Ok::<(), termica::error::TermicaError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`protocol`] | ESC/POS byte builders and status decoding |
//! | [`transport`] | Serial port and in-memory transports |
//! | [`flow`] | Flow-control gate and clocks |
//! | [`encoder`] | Command encoder with per-command waits |
//! | [`usage`] | Paper usage ledger and its storage |
//! | [`queue`] | Print jobs and the job queue |
//! | [`printer`] | Settings, status monitor and the printer facade |
//! | [`server`] | HTTP JSON API |
//! | [`error`] | Error types |

pub mod encoder;
pub mod error;
pub mod flow;
pub mod printer;
pub mod protocol;
pub mod queue;
pub mod server;
pub mod transport;
pub mod usage;

// Re-exports for convenience
pub use error::TermicaError;
pub use printer::{PrinterSettings, ThermalPrinter};
pub use transport::SerialTransport;
