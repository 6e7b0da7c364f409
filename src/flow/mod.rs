//! # Flow Control
//!
//! Pacing of the byte stream to the printer.
//!
//! - [`clock`]: time source used for every wait
//! - [`gate`]: the flow-control gate itself (software timing or hardware
//!   handshake)

pub mod clock;
pub mod gate;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use gate::{DEFAULT_HANDSHAKE_TIMEOUT, FlowControl, Polarity, Timing};
