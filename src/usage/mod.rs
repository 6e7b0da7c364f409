//! # Paper Usage Ledger
//!
//! Counts what the printer has consumed and turns it into millimetres of
//! paper. The printer has no paper-length sensor, so this is the only way to
//! know how close the roll is to running out before the "paper out" switch
//! trips.
//!
//! ```text
//! usage_mm      = (lines + feeds) × mm_per_line
//! usage_percent = usage_mm / roll_length_mm × 100
//! ```
//!
//! Counters survive restarts through a [`UsageStore`]. They are saved every
//! 100 printed characters and on every reset.

pub mod store;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::TermicaError;
use crate::protocol::text::TextSize;
pub use store::{FileStore, MemoryStore, RECORD_LEN, UsageRecord, UsageStore};

/// Key the usage record is stored under.
pub const USAGE_KEY: &str = "paper_usage";

pub const DEFAULT_ROLL_LENGTH_MM: f32 = 30000.0;
pub const DEFAULT_LINE_HEIGHT_MM: f32 = 4.0;

/// Characters printed between automatic saves.
pub const PERSIST_EVERY_CHARS: u32 = 100;

/// Characters per line assumed when estimating wrapped text.
const ESTIMATE_WRAP_WIDTH: u32 = 32;

/// The three persisted counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UsageCounters {
    pub lines: u32,
    pub characters: u32,
    pub feeds: u32,
}

impl UsageCounters {
    pub fn to_record(&self) -> UsageRecord {
        let mut record = [0u8; RECORD_LEN];
        record[0..4].copy_from_slice(&self.lines.to_le_bytes());
        record[4..8].copy_from_slice(&self.characters.to_le_bytes());
        record[8..12].copy_from_slice(&self.feeds.to_le_bytes());
        record
    }

    pub fn from_record(record: &UsageRecord) -> Self {
        let word =
            |i: usize| u32::from_le_bytes([record[i], record[i + 1], record[i + 2], record[i + 3]]);
        Self {
            lines: word(0),
            characters: word(4),
            feeds: word(8),
        }
    }
}

/// Snapshot of the ledger for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UsageReport {
    #[serde(flatten)]
    pub counters: UsageCounters,
    pub usage_mm: f32,
    pub usage_percent: f32,
    pub remaining_mm: f32,
    pub roll_length_mm: f32,
    pub mm_per_line: f32,
}

/// Lines a block of free text is expected to take.
///
/// One line, plus one per newline, plus one per 32 characters without a
/// break. Used for budgeting only, not layout.
pub fn estimate_lines(text: &str) -> u32 {
    let mut lines = 1;
    let mut run = 0;
    for c in text.chars() {
        if c == '\n' {
            lines += 1;
            run = 0;
        } else {
            run += 1;
            if run >= ESTIMATE_WRAP_WIDTH {
                lines += 1;
                run = 0;
            }
        }
    }
    lines
}

/// # Usage Ledger
///
/// ## Example
///
/// ```
/// use termica::usage::{MemoryStore, UsageLedger};
///
/// let mut ledger = UsageLedger::new(Box::new(MemoryStore::new()), 30000.0, 4.0);
/// ledger.record(5, 1, 0);
/// ledger.record(0, 0, 2);
/// assert_eq!(ledger.usage_mm(), 12.0);
/// assert!(ledger.can_fit(7497));
/// assert!(!ledger.can_fit(7498));
/// ```
pub struct UsageLedger {
    counters: UsageCounters,
    roll_length_mm: f32,
    mm_per_line: f32,
    store: Box<dyn UsageStore>,
    chars_since_persist: u32,
}

impl UsageLedger {
    pub fn new(store: Box<dyn UsageStore>, roll_length_mm: f32, mm_per_line: f32) -> Self {
        Self {
            counters: UsageCounters::default(),
            roll_length_mm,
            mm_per_line,
            store,
            chars_since_persist: 0,
        }
    }

    /// Ledger with default calibration and a throwaway store.
    pub fn in_memory() -> Self {
        Self::new(
            Box::new(MemoryStore::new()),
            DEFAULT_ROLL_LENGTH_MM,
            DEFAULT_LINE_HEIGHT_MM,
        )
    }

    pub fn counters(&self) -> UsageCounters {
        self.counters
    }

    pub fn roll_length_mm(&self) -> f32 {
        self.roll_length_mm
    }

    pub fn mm_per_line(&self) -> f32 {
        self.mm_per_line
    }

    pub fn set_roll_length_mm(&mut self, mm: f32) -> Result<(), TermicaError> {
        if !(mm > 0.0) {
            return Err(TermicaError::InvalidPayload(format!(
                "roll length must be positive, got {}",
                mm
            )));
        }
        self.roll_length_mm = mm;
        info!(roll_length_mm = mm, "paper roll length set");
        Ok(())
    }

    pub fn set_mm_per_line(&mut self, mm: f32) -> Result<(), TermicaError> {
        if !(mm > 0.0) {
            return Err(TermicaError::InvalidPayload(format!(
                "line height must be positive, got {}",
                mm
            )));
        }
        self.mm_per_line = mm;
        info!(mm_per_line = mm, "line height calibration set");
        Ok(())
    }

    /// Add consumption. Saves the ledger every [`PERSIST_EVERY_CHARS`]
    /// characters; a failed save is logged and retried on the next trigger.
    pub fn record(&mut self, chars: u32, lines: u32, feeds: u32) {
        self.counters.characters = self.counters.characters.saturating_add(chars);
        self.counters.lines = self.counters.lines.saturating_add(lines);
        self.counters.feeds = self.counters.feeds.saturating_add(feeds);
        self.chars_since_persist = self.chars_since_persist.saturating_add(chars);

        if self.chars_since_persist >= PERSIST_EVERY_CHARS {
            if let Err(e) = self.persist() {
                warn!(error = %e, "failed to save paper usage");
            }
        }
    }

    pub fn usage_mm(&self) -> f32 {
        (self.counters.lines as f32 + self.counters.feeds as f32) * self.mm_per_line
    }

    pub fn usage_percent(&self) -> f32 {
        if self.roll_length_mm > 0.0 {
            self.usage_mm() / self.roll_length_mm * 100.0
        } else {
            0.0
        }
    }

    /// Paper left on the roll. Zero once usage passes the roll length.
    pub fn remaining_mm(&self) -> f32 {
        (self.roll_length_mm - self.usage_mm()).max(0.0)
    }

    /// Whether `estimated_lines` more lines fit on the remaining roll.
    pub fn can_fit(&self, estimated_lines: u32) -> bool {
        let needed = estimated_lines as f32 * self.mm_per_line;
        let remaining = self.roll_length_mm - self.usage_mm();
        debug!(needed_mm = needed, remaining_mm = remaining, "paper sufficiency check");
        needed <= remaining
    }

    /// [`Self::can_fit`] as a result carrying the shortfall.
    pub fn check_fit(&self, estimated_lines: u32) -> Result<(), TermicaError> {
        if self.can_fit(estimated_lines) {
            Ok(())
        } else {
            Err(TermicaError::InsufficientPaper {
                needed_mm: estimated_lines as f32 * self.mm_per_line,
                remaining_mm: self.remaining_mm(),
            })
        }
    }

    /// Paper `text` would use at `size`.
    pub fn predict_usage_mm(&self, text: &str, size: TextSize) -> f32 {
        estimate_lines(text) as f32 * self.mm_per_line * size.usage_multiplier()
    }

    /// Zero all counters and save immediately.
    pub fn reset(&mut self) -> Result<(), TermicaError> {
        self.counters = UsageCounters::default();
        info!("paper usage reset");
        self.persist()
    }

    pub fn persist(&mut self) -> Result<(), TermicaError> {
        self.store.save(USAGE_KEY, &self.counters.to_record())?;
        self.chars_since_persist = 0;
        debug!(
            lines = self.counters.lines,
            characters = self.counters.characters,
            feeds = self.counters.feeds,
            "paper usage saved"
        );
        Ok(())
    }

    /// Load saved counters. Returns `false` and keeps the current counters
    /// when nothing was saved yet.
    pub fn restore(&mut self) -> Result<bool, TermicaError> {
        match self.store.load(USAGE_KEY)? {
            Some(record) => {
                self.counters = UsageCounters::from_record(&record);
                info!(
                    usage_mm = self.usage_mm(),
                    usage_percent = self.usage_percent(),
                    "paper usage restored"
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn report(&self) -> UsageReport {
        UsageReport {
            counters: self.counters,
            usage_mm: self.usage_mm(),
            usage_percent: self.usage_percent(),
            remaining_mm: self.remaining_mm(),
            roll_length_mm: self.roll_length_mm,
            mm_per_line: self.mm_per_line,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
