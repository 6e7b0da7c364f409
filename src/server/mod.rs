//! # HTTP Server
//!
//! JSON API over one [`ThermalPrinter`], for home automation and scripts.
//!
//! ## Usage
//!
//! ```bash
//! termica serve --listen 0.0.0.0:8080 --config /etc/termica.toml
//! ```
//!
//! ```bash
//! curl -X POST localhost:8080/api/jobs \
//!      -H 'content-type: application/json' \
//!      -d '{"kind": "text", "text": "Laundry done", "size": "medium"}'
//! ```
//!
//! A background task calls [`ThermalPrinter::tick`] on a fixed interval, so
//! queued jobs print and paper changes are noticed without any request
//! coming in.

mod handlers;
mod state;

pub use handlers::ApiError;
pub use state::{AppState, DEFAULT_LISTEN_ADDR, DEFAULT_TICK_INTERVAL, ServerConfig};

use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::TermicaError;
use crate::printer::ThermalPrinter;

/// Build the router. Split from [`serve`] so tests can drive it directly.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        // Synchronous printing
        .route("/api/print/text", post(handlers::print::text))
        .route("/api/print/immediate", post(handlers::print::immediate))
        .route("/api/print/two-column", post(handlers::print::two_column))
        .route("/api/print/table-row", post(handlers::print::table_row))
        .route("/api/print/barcode", post(handlers::print::barcode))
        .route("/api/print/qr", post(handlers::print::qr))
        .route("/api/print/rotated", post(handlers::print::rotated))
        .route("/api/print/separator", post(handlers::print::separator))
        .route("/api/print/bitmap", post(handlers::print::bitmap))
        .route("/api/style", put(handlers::print::style))
        .route("/api/beep", post(handlers::print::beep))
        .route("/api/feed", post(handlers::print::feed))
        // Device control
        .route("/api/wake", post(handlers::print::wake))
        .route("/api/sleep", post(handlers::print::sleep))
        .route("/api/test", post(handlers::print::test))
        .route("/api/test-page", post(handlers::print::test_page))
        .route("/api/recover", post(handlers::print::recover))
        // Queue
        .route(
            "/api/jobs",
            get(handlers::queue::list)
                .post(handlers::queue::enqueue)
                .delete(handlers::queue::clear),
        )
        .route("/api/jobs/flush", post(handlers::queue::flush))
        .route("/api/queue/settings", put(handlers::queue::settings))
        // Status and usage
        .route("/api/status", get(handlers::status::status))
        .route("/api/status/detailed", get(handlers::status::detailed))
        .route("/api/stats", get(handlers::status::performance))
        .route("/api/usage", get(handlers::status::usage))
        .route("/api/usage/reset", post(handlers::status::reset_usage))
        .route("/api/usage/calibration", put(handlers::status::calibrate))
        .route("/api/usage/predict", post(handlers::status::predict))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server and the background tick task. Runs until the
/// listener fails.
///
/// ## Example
///
/// ```no_run
/// use termica::printer::{PrinterSettings, ThermalPrinter};
/// use termica::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), termica::error::TermicaError> {
/// let mut printer = ThermalPrinter::open(&PrinterSettings::default())?;
/// printer.setup()?;
/// serve(printer, ServerConfig::default()).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(printer: ThermalPrinter, config: ServerConfig) -> Result<(), TermicaError> {
    let state = Arc::new(AppState::new(printer));

    tokio::spawn(drive_printer(state.clone(), config.tick_interval));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            TermicaError::Transport(format!("Failed to bind to {}: {}", config.listen_addr, e))
        })?;

    info!(listen = %config.listen_addr, "termica HTTP server listening");

    axum::serve(listener, app(state))
        .await
        .map_err(|e| TermicaError::Transport(format!("Server error: {}", e)))?;

    Ok(())
}

/// Background task: run the printer's scheduler pass forever.
async fn drive_printer(state: Arc<AppState>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        let result = state
            .with_printer(|p| {
                p.tick();
                Ok(())
            })
            .await;
        if let Err(e) = result {
            warn!(error = %e, "printer tick failed");
        }
    }
}
