//! Server state and configuration.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::error::TermicaError;
use crate::printer::ThermalPrinter;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// How often the background task drives the queue and status monitor.
    pub tick_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

/// Application state shared across handlers.
///
/// The printer lives behind a plain mutex: every printer call blocks on the
/// serial line, so all access goes through [`AppState::with_printer`] on the
/// blocking thread pool.
pub struct AppState {
    printer: Arc<Mutex<ThermalPrinter>>,
}

impl AppState {
    pub fn new(printer: ThermalPrinter) -> Self {
        Self {
            printer: Arc::new(Mutex::new(printer)),
        }
    }

    /// Run `f` with exclusive access to the printer.
    pub async fn with_printer<T, F>(&self, f: F) -> Result<T, TermicaError>
    where
        F: FnOnce(&mut ThermalPrinter) -> Result<T, TermicaError> + Send + 'static,
        T: Send + 'static,
    {
        let printer = self.printer.clone();
        tokio::task::spawn_blocking(move || f(&mut lock(&printer)))
            .await
            .map_err(|e| TermicaError::CommunicationError(format!("Printer task failed: {}", e)))?
    }
}

/// Lock the printer, recovering from a poisoned mutex.
pub(crate) fn lock(printer: &Mutex<ThermalPrinter>) -> MutexGuard<'_, ThermalPrinter> {
    printer.lock().unwrap_or_else(|e| e.into_inner())
}
