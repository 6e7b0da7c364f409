//! # Printer
//!
//! The layer hosts talk to.
//!
//! ## Modules
//!
//! - [`config`]: TOML settings with validation
//! - [`device`]: [`ThermalPrinter`], the facade over encoder, queue and monitor
//! - [`monitor`]: periodic paper polling and observers

pub mod config;
pub mod device;
pub mod monitor;

pub use config::{HandshakeSettings, PrinterSettings};
pub use device::{
    DetailedStatus, DeviceState, PerformanceStats, PrinterStatus, QueueStatus, ThermalPrinter,
};
pub use monitor::{PaperObserver, StatusMonitor};
