//! # Error Types
//!
//! This module defines the error type used throughout the termica library.
//!
//! The first group of variants is the printer-facing result taxonomy: the
//! conditions a caller of the synchronous print surface is expected to check
//! and act on. The second group covers infrastructure failures (opening the
//! serial device, reading configuration, persisting usage counters).
//!
//! Handshake timeouts are deliberately absent: the flow-control gate counts
//! them and keeps going, see [`crate::flow::FlowControl::timeouts`].

use thiserror::Error;

/// Main error type for termica operations
#[derive(Debug, Error)]
pub enum TermicaError {
    /// Paper-presence check failed immediately before an operation
    #[error("Paper out")]
    PaperOut,

    /// Estimated job length exceeds the remaining roll capacity
    #[error("Insufficient paper: need {needed_mm:.1}mm, {remaining_mm:.1}mm remaining")]
    InsufficientPaper { needed_mm: f32, remaining_mm: f32 },

    /// Enqueue rejected because the queue is at capacity
    #[error("Print queue full ({capacity} jobs)")]
    QueueFull { capacity: usize },

    /// Printer is busy with another job or not accepting work
    #[error("Printer offline or busy")]
    PrinterOffline,

    /// No response to a status query
    #[error("Communication error: {0}")]
    CommunicationError(String),

    /// Cover open, only detectable with handshake hardware
    #[error("Printer cover open")]
    CoverOpen,

    /// Payload rejected before anything was sent to the printer
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Transport-level errors (connection, TTY setup)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration could not be read or parsed
    #[error("Config error: {0}")]
    Config(String),

    /// Usage persistence failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TermicaError {
    /// Stable short code, used in HTTP responses and CLI exit messages.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PaperOut => "PAPER_OUT",
            Self::InsufficientPaper { .. } => "INSUFFICIENT_PAPER",
            Self::QueueFull { .. } => "QUEUE_FULL",
            Self::PrinterOffline => "PRINTER_OFFLINE",
            Self::CommunicationError(_) => "COMMUNICATION_ERROR",
            Self::CoverOpen => "COVER_OPEN",
            Self::InvalidPayload(_) => "INVALID_PAYLOAD",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Io(_) => "IO_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(TermicaError::PaperOut.code(), "PAPER_OUT");
        assert_eq!(TermicaError::QueueFull { capacity: 10 }.code(), "QUEUE_FULL");
        assert_eq!(TermicaError::CoverOpen.code(), "COVER_OPEN");
    }

    #[test]
    fn test_insufficient_paper_message() {
        let err = TermicaError::InsufficientPaper {
            needed_mm: 12.0,
            remaining_mm: 10.0,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient paper: need 12.0mm, 10.0mm remaining"
        );
    }
}
