//! Status and paper usage handlers.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::protocol::text::TextSize;

use super::super::state::AppState;
use super::ApiResult;

/// GET /api/status - Driver state, queue and usage. Does not talk to the
/// printer.
pub async fn status(State(state): State<Arc<AppState>>) -> ApiResult {
    let status = state.with_printer(|p| Ok(p.status())).await?;
    Ok(Json(json!({ "success": true, "status": status })))
}

/// GET /api/status/detailed - Query paper and device flags now.
pub async fn detailed(State(state): State<Arc<AppState>>) -> ApiResult {
    let detailed = state.with_printer(|p| p.detailed_status()).await?;
    Ok(Json(json!({ "success": true, "status": detailed })))
}

/// GET /api/stats
pub async fn performance(State(state): State<Arc<AppState>>) -> ApiResult {
    let stats = state.with_printer(|p| Ok(p.performance_stats())).await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}

/// GET /api/usage
pub async fn usage(State(state): State<Arc<AppState>>) -> ApiResult {
    let usage = state.with_printer(|p| Ok(p.usage())).await?;
    Ok(Json(json!({ "success": true, "usage": usage })))
}

/// POST /api/usage/reset - Zero the counters after a roll change.
pub async fn reset_usage(State(state): State<Arc<AppState>>) -> ApiResult {
    let usage = state
        .with_printer(|p| {
            p.reset_usage()?;
            Ok(p.usage())
        })
        .await?;
    Ok(Json(json!({ "success": true, "usage": usage })))
}

#[derive(Debug, Deserialize)]
pub struct CalibrationRequest {
    pub roll_length_mm: Option<f32>,
    pub line_height_mm: Option<f32>,
}

/// PUT /api/usage/calibration - Roll length and/or mm per line.
pub async fn calibrate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CalibrationRequest>,
) -> ApiResult {
    let usage = state
        .with_printer(move |p| {
            if let Some(mm) = req.roll_length_mm {
                p.set_roll_length(mm)?;
            }
            if let Some(mm) = req.line_height_mm {
                p.set_line_height_calibration(mm)?;
            }
            Ok(p.usage())
        })
        .await?;
    Ok(Json(json!({ "success": true, "usage": usage })))
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub text: String,
    #[serde(default)]
    pub size: TextSize,
}

/// POST /api/usage/predict - Paper a text would use, without printing it.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PredictRequest>,
) -> ApiResult {
    let (predicted_mm, remaining_mm) = state
        .with_printer(move |p| {
            Ok((
                p.predict_usage_mm(&req.text, req.size),
                p.usage().remaining_mm,
            ))
        })
        .await?;
    Ok(Json(json!({
        "success": true,
        "predicted_mm": predicted_mm,
        "fits": predicted_mm <= remaining_mm,
    })))
}
