//! # In-Memory Transport
//!
//! A transport that never touches hardware. It records every byte sent and
//! can play a minimal printer: when the tail of the output matches a
//! registered request, the matching response byte is queued for reading.
//!
//! Handles are cheap clones sharing the same state, so a test can keep one
//! handle while the encoder owns another.
//!
//! ```
//! use termica::protocol::status;
//! use termica::transport::{ByteTransport, MemoryTransport};
//!
//! let transport = MemoryTransport::new();
//! transport.respond_to(status::paper_status_request(), 0x00);
//!
//! let mut handle = transport.clone();
//! for b in status::paper_status_request() {
//!     handle.send(b)?;
//! }
//! assert_eq!(handle.read_byte()?, Some(0x00));
//! # Ok::<(), termica::error::TermicaError>(())
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{ByteTransport, HandshakeLine};
use crate::error::TermicaError;
use crate::protocol::status;

#[derive(Default)]
struct MemoryState {
    sent: Vec<u8>,
    incoming: VecDeque<u8>,
    responses: Vec<(Vec<u8>, u8)>,
}

/// Recording transport with scripted responses.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that answers paper status queries with "paper present".
    pub fn with_paper() -> Self {
        let transport = Self::new();
        transport.set_paper(true);
        transport
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Answer `request` with `response` whenever the output ends with it.
    /// Replaces any previous response registered for the same request.
    pub fn respond_to(&self, request: Vec<u8>, response: u8) {
        let mut state = self.state();
        state.responses.retain(|(r, _)| *r != request);
        state.responses.push((request, response));
    }

    /// Stop answering `request`.
    pub fn silence(&self, request: &[u8]) {
        self.state().responses.retain(|(r, _)| r != request);
    }

    /// Script the answer to `ESC v 0`.
    pub fn set_paper(&self, present: bool) {
        let response = if present { 0x00 } else { 0x0C };
        self.respond_to(status::paper_status_request(), response);
    }

    /// Queue raw bytes for reading.
    pub fn push_incoming(&self, bytes: &[u8]) {
        self.state().incoming.extend(bytes);
    }

    /// Everything sent so far.
    pub fn sent(&self) -> Vec<u8> {
        self.state().sent.clone()
    }

    /// Forget recorded output.
    pub fn clear_sent(&self) {
        self.state().sent.clear();
    }

    /// Whether `needle` appears anywhere in the recorded output.
    pub fn sent_contains(&self, needle: &[u8]) -> bool {
        let state = self.state();
        !needle.is_empty() && state.sent.windows(needle.len()).any(|w| w == needle)
    }
}

impl ByteTransport for MemoryTransport {
    fn send(&mut self, byte: u8) -> Result<(), TermicaError> {
        let mut state = self.state();
        state.sent.push(byte);

        let reply = state
            .responses
            .iter()
            .find(|(request, _)| state.sent.ends_with(request))
            .map(|(_, response)| *response);
        if let Some(response) = reply {
            state.incoming.push_back(response);
        }
        Ok(())
    }

    fn bytes_available(&mut self) -> Result<usize, TermicaError> {
        Ok(self.state().incoming.len())
    }

    fn read_byte(&mut self) -> Result<Option<u8>, TermicaError> {
        Ok(self.state().incoming.pop_front())
    }
}

/// Handshake line with a level set from outside.
#[derive(Clone, Default)]
pub struct MemoryLine {
    level: Arc<AtomicBool>,
}

impl MemoryLine {
    pub fn new(level: bool) -> Self {
        Self {
            level: Arc::new(AtomicBool::new(level)),
        }
    }

    pub fn set_level(&self, level: bool) {
        self.level.store(level, Ordering::SeqCst);
    }
}

impl HandshakeLine for MemoryLine {
    fn level(&mut self) -> Result<bool, TermicaError> {
        Ok(self.level.load(Ordering::SeqCst))
    }
}

// ============================================================================
// TESTS
// ============================================================================
