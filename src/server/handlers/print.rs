//! Synchronous print handlers. Each call returns once the printer is
//! expected to be done.

use axum::{Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;

use crate::encoder::StyleChange;
use crate::protocol::barcode::barcode1d::BarcodeType;
use crate::protocol::barcode::qr::QrErrorLevel;
use crate::protocol::text::{Alignment, Rotation, TextSize};
use crate::queue::job::DEFAULT_QR_SIZE;

use super::super::state::AppState;
use super::{ApiResult, done};

fn default_qr_size() -> u8 {
    DEFAULT_QR_SIZE
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

/// POST /api/print/text - Print text after paper and roll checks.
pub async fn text(State(state): State<Arc<AppState>>, Json(req): Json<TextRequest>) -> ApiResult {
    let chars = req.text.chars().count();
    state.with_printer(move |p| p.print_text(&req.text)).await?;
    done(format!("Printed {} characters", chars))
}

#[derive(Debug, Deserialize)]
pub struct ImmediateRequest {
    pub text: String,
    #[serde(default)]
    pub size: TextSize,
    #[serde(default)]
    pub align: Alignment,
    #[serde(default)]
    pub bold: bool,
}

/// POST /api/print/immediate - Styled text, bypassing the queue. Refused
/// while a queued job is running.
pub async fn immediate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImmediateRequest>,
) -> ApiResult {
    state
        .with_printer(move |p| p.print_immediate(&req.text, req.size, req.align, req.bold))
        .await?;
    done("Printed")
}

#[derive(Debug, Deserialize)]
pub struct TwoColumnRequest {
    pub left: String,
    pub right: String,
    #[serde(default)]
    pub fill_dots: bool,
    #[serde(default)]
    pub size: TextSize,
}

/// POST /api/print/two-column
pub async fn two_column(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TwoColumnRequest>,
) -> ApiResult {
    state
        .with_printer(move |p| p.print_two_column(&req.left, &req.right, req.fill_dots, req.size))
        .await?;
    done("Printed two-column line")
}

#[derive(Debug, Deserialize)]
pub struct TableRowRequest {
    pub col1: String,
    pub col2: String,
    #[serde(default)]
    pub col3: Option<String>,
    #[serde(default)]
    pub header: bool,
}

/// POST /api/print/table-row
pub async fn table_row(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TableRowRequest>,
) -> ApiResult {
    state
        .with_printer(move |p| {
            p.print_table_row(&req.col1, &req.col2, req.col3.as_deref(), req.header)
        })
        .await?;
    done("Printed table row")
}

#[derive(Debug, Deserialize)]
pub struct BarcodeRequest {
    #[serde(default)]
    pub barcode_type: BarcodeType,
    pub data: String,
}

/// POST /api/print/barcode
pub async fn barcode(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BarcodeRequest>,
) -> ApiResult {
    state
        .with_printer(move |p| p.print_barcode(req.barcode_type, &req.data))
        .await?;
    done("Printed barcode")
}

#[derive(Debug, Deserialize)]
pub struct QrRequest {
    pub data: String,
    #[serde(default = "default_qr_size")]
    pub size: u8,
    #[serde(default)]
    pub error_correction: QrErrorLevel,
}

/// POST /api/print/qr
pub async fn qr(State(state): State<Arc<AppState>>, Json(req): Json<QrRequest>) -> ApiResult {
    state
        .with_printer(move |p| p.print_qr_code(&req.data, req.size, req.error_correction))
        .await?;
    done("Printed QR code")
}

#[derive(Debug, Deserialize)]
pub struct RotatedRequest {
    pub text: String,
    #[serde(default)]
    pub rotation: Rotation,
}

/// POST /api/print/rotated
pub async fn rotated(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RotatedRequest>,
) -> ApiResult {
    state
        .with_printer(move |p| p.print_rotated_text(&req.text, req.rotation))
        .await?;
    done("Printed rotated text")
}

#[derive(Debug, Deserialize)]
pub struct BitmapRequest {
    pub width: u16,
    pub height: u16,
    /// `height` rows of `ceil(width / 8)` bytes, MSB is the leftmost dot
    pub data: Vec<u8>,
}

/// POST /api/print/bitmap
pub async fn bitmap(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BitmapRequest>,
) -> ApiResult {
    let (width, height) = (req.width, req.height);
    state
        .with_printer(move |p| p.print_bitmap(width, height, &req.data))
        .await?;
    done(format!("Printed {}x{} bitmap", width, height))
}

/// PUT /api/style - Upside-down, double-strike, spacing and tab stops.
/// Fields left out are not touched.
pub async fn style(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StyleChange>,
) -> ApiResult {
    state.with_printer(move |p| p.set_style(&req)).await?;
    done("Style updated")
}

/// POST /api/print/separator
pub async fn separator(State(state): State<Arc<AppState>>) -> ApiResult {
    state.with_printer(|p| p.print_separator()).await?;
    done("Printed separator")
}

#[derive(Debug, Deserialize)]
pub struct FeedRequest {
    pub lines: u8,
}

/// POST /api/feed
pub async fn feed(State(state): State<Arc<AppState>>, Json(req): Json<FeedRequest>) -> ApiResult {
    state.with_printer(move |p| p.feed(req.lines)).await?;
    done(format!("Fed {} lines", req.lines))
}

/// POST /api/beep
pub async fn beep(State(state): State<Arc<AppState>>) -> ApiResult {
    state.with_printer(|p| p.beep()).await?;
    done("Beep sent")
}

/// POST /api/wake
pub async fn wake(State(state): State<Arc<AppState>>) -> ApiResult {
    state.with_printer(|p| p.wake()).await?;
    done("Printer awake")
}

/// POST /api/sleep
pub async fn sleep(State(state): State<Arc<AppState>>) -> ApiResult {
    state.with_printer(|p| p.sleep()).await?;
    done("Printer asleep")
}

/// POST /api/test - Short greeting.
pub async fn test(State(state): State<Arc<AppState>>) -> ApiResult {
    state.with_printer(|p| p.test_print()).await?;
    done("Test print sent")
}

/// POST /api/test-page - Firmware self-test page.
pub async fn test_page(State(state): State<Arc<AppState>>) -> ApiResult {
    state.with_printer(|p| p.test_page()).await?;
    done("Test page sent")
}

/// POST /api/recover - Operator-invoked recovery sequence.
pub async fn recover(State(state): State<Arc<AppState>>) -> ApiResult {
    state.with_printer(|p| p.recover_from_error()).await?;
    done("Recovery sequence complete")
}
