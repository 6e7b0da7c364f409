//! # Printer Settings
//!
//! Everything configurable about a printer, loaded once at startup from a
//! TOML file. Every field has a default, so an empty file is valid.
//!
//! ## Example
//!
//! ```toml
//! device = "/dev/serial0"
//! baud_rate = 9600
//! paper_roll_length_mm = 15000.0
//! usage_dir = "/var/lib/termica"
//!
//! [handshake]
//! line = "cts"
//! polarity = "active_low"
//! timeout_ms = 5000
//!
//! [heat]
//! dots = 11
//! time = 120
//! interval = 4
//! density = 6
//! ```
//!
//! [`PrinterSettings::validate`] never fails. Out-of-range values, a zero
//! status interval or handshake timeout among them, are put back to their
//! defaults with a warning, so a typo in the file can't stop the printer
//! from starting.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::encoder::HeatConfig;
use crate::error::TermicaError;
use crate::flow::{DEFAULT_HANDSHAKE_TIMEOUT, Polarity};
use crate::queue::{DEFAULT_CAPACITY, DEFAULT_INTER_JOB_DELAY};
use crate::transport::ModemSignal;
use crate::transport::serial::DEFAULT_DEVICE;
use crate::usage::{DEFAULT_LINE_HEIGHT_MM, DEFAULT_ROLL_LENGTH_MM};

pub const DEFAULT_BAUD_RATE: u32 = 19200;
pub const DEFAULT_STATUS_INTERVAL_MS: u64 = 10_000;

const COMMON_BAUD_RATES: [u32; 3] = [9600, 19200, 38400];
const MAX_LINE_HEIGHT_MM: f32 = 10.0;
const MAX_HEAT_INTENSITY: u32 = 800;
const MAX_INTER_JOB_DELAY_MS: u64 = 60_000;
const STATUS_INTERVAL_RANGE_MS: std::ops::RangeInclusive<u64> = 1_000..=3_600_000;
const HANDSHAKE_TIMEOUT_RANGE_MS: std::ops::RangeInclusive<u64> = 1..=60_000;

/// Ready/busy handshake wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandshakeSettings {
    pub line: ModemSignal,
    pub polarity: Polarity,
    pub timeout_ms: u64,
}

impl Default for HandshakeSettings {
    fn default() -> Self {
        Self {
            line: ModemSignal::Cts,
            polarity: Polarity::ActiveLow,
            timeout_ms: DEFAULT_HANDSHAKE_TIMEOUT.as_millis() as u64,
        }
    }
}

impl HandshakeSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Printer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterSettings {
    pub device: PathBuf,
    pub baud_rate: u32,
    /// Absent means software-timed flow control.
    pub handshake: Option<HandshakeSettings>,
    pub heat: HeatConfig,
    pub paper_roll_length_mm: f32,
    pub line_height_mm: f32,
    pub queue_capacity: usize,
    pub inter_job_delay_ms: u64,
    pub status_interval_ms: u64,
    /// Where usage counters are saved. Absent keeps them in memory only.
    pub usage_dir: Option<PathBuf>,
    pub startup_message: bool,
    pub auto_process_queue: bool,
}

impl Default for PrinterSettings {
    fn default() -> Self {
        Self {
            device: PathBuf::from(DEFAULT_DEVICE),
            baud_rate: DEFAULT_BAUD_RATE,
            handshake: None,
            heat: HeatConfig::default(),
            paper_roll_length_mm: DEFAULT_ROLL_LENGTH_MM,
            line_height_mm: DEFAULT_LINE_HEIGHT_MM,
            queue_capacity: DEFAULT_CAPACITY,
            inter_job_delay_ms: DEFAULT_INTER_JOB_DELAY.as_millis() as u64,
            status_interval_ms: DEFAULT_STATUS_INTERVAL_MS,
            usage_dir: None,
            startup_message: false,
            auto_process_queue: true,
        }
    }
}

impl PrinterSettings {
    /// Parse TOML and validate.
    pub fn from_toml(contents: &str) -> Result<Self, TermicaError> {
        let mut settings: Self = toml::from_str(contents)
            .map_err(|e| TermicaError::Config(format!("Failed to parse settings: {}", e)))?;
        settings.validate();
        Ok(settings)
    }

    /// Read, parse and validate a settings file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TermicaError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            TermicaError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let settings = Self::from_toml(&contents)?;
        info!(path = %path.display(), "loaded printer settings");
        Ok(settings)
    }

    pub fn inter_job_delay(&self) -> Duration {
        Duration::from_millis(self.inter_job_delay_ms)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }

    /// Clamp out-of-range values to defaults. Returns how many fields were
    /// changed.
    pub fn validate(&mut self) -> usize {
        let mut fixed = 0;

        if self.baud_rate == 0 {
            warn!("baud rate 0 is invalid, using {}", DEFAULT_BAUD_RATE);
            self.baud_rate = DEFAULT_BAUD_RATE;
            fixed += 1;
        } else if !COMMON_BAUD_RATES.contains(&self.baud_rate) {
            warn!(baud_rate = self.baud_rate, "unusual baud rate (most printers use 9600 or 19200)");
        }

        if !(self.paper_roll_length_mm > 0.0) {
            warn!(
                roll_length_mm = self.paper_roll_length_mm,
                "invalid paper roll length, using {}", DEFAULT_ROLL_LENGTH_MM
            );
            self.paper_roll_length_mm = DEFAULT_ROLL_LENGTH_MM;
            fixed += 1;
        }

        if !(self.line_height_mm > 0.0 && self.line_height_mm <= MAX_LINE_HEIGHT_MM) {
            warn!(
                line_height_mm = self.line_height_mm,
                "invalid line height, using {}", DEFAULT_LINE_HEIGHT_MM
            );
            self.line_height_mm = DEFAULT_LINE_HEIGHT_MM;
            fixed += 1;
        }

        if self.queue_capacity == 0 {
            warn!("queue capacity 0 is invalid, using {}", DEFAULT_CAPACITY);
            self.queue_capacity = DEFAULT_CAPACITY;
            fixed += 1;
        }

        let default_delay = DEFAULT_INTER_JOB_DELAY.as_millis() as u64;
        if self.inter_job_delay_ms > MAX_INTER_JOB_DELAY_MS {
            warn!(
                inter_job_delay_ms = self.inter_job_delay_ms,
                "inter-job delay above {}ms, using {}", MAX_INTER_JOB_DELAY_MS, default_delay
            );
            self.inter_job_delay_ms = default_delay;
            fixed += 1;
        }

        if !STATUS_INTERVAL_RANGE_MS.contains(&self.status_interval_ms) {
            warn!(
                status_interval_ms = self.status_interval_ms,
                "status interval out of range {:?}, using {}",
                STATUS_INTERVAL_RANGE_MS,
                DEFAULT_STATUS_INTERVAL_MS
            );
            self.status_interval_ms = DEFAULT_STATUS_INTERVAL_MS;
            fixed += 1;
        }

        if let Some(handshake) = &mut self.handshake {
            if !HANDSHAKE_TIMEOUT_RANGE_MS.contains(&handshake.timeout_ms) {
                let default_timeout = DEFAULT_HANDSHAKE_TIMEOUT.as_millis() as u64;
                warn!(
                    timeout_ms = handshake.timeout_ms,
                    "handshake timeout out of range {:?}, using {}",
                    HANDSHAKE_TIMEOUT_RANGE_MS,
                    default_timeout
                );
                handshake.timeout_ms = default_timeout;
                fixed += 1;
            }
        }

        fixed + self.validate_heat()
    }

    fn validate_heat(&mut self) -> usize {
        let defaults = HeatConfig::default();
        let heat = &mut self.heat;
        let mut fixed = 0;

        if !(1..=15).contains(&heat.dots) {
            warn!(dots = heat.dots, "heat dots out of range 1..=15, using {}", defaults.dots);
            heat.dots = defaults.dots;
            fixed += 1;
        }
        if !(50..=200).contains(&heat.time) {
            warn!(time = heat.time, "heat time out of range 50..=200, using {}", defaults.time);
            heat.time = defaults.time;
            fixed += 1;
        }
        if !(1..=10).contains(&heat.interval) {
            warn!(
                interval = heat.interval,
                "heat interval out of range 1..=10, using {}", defaults.interval
            );
            heat.interval = defaults.interval;
            fixed += 1;
        }
        if heat.density > 15 {
            warn!(density = heat.density, "density above 15, using {}", defaults.density);
            heat.density = defaults.density;
            fixed += 1;
        }

        let intensity = u32::from(heat.dots) * u32::from(heat.time) / u32::from(heat.interval);
        if intensity > MAX_HEAT_INTENSITY {
            warn!(intensity, "heat settings could overheat the printhead, using defaults");
            *heat = defaults;
            fixed += 1;
        }
        fixed
    }
}

// ============================================================================
// TESTS
// ============================================================================
