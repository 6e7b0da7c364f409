//! Print queue handlers.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::queue::JobKind;

use super::super::state::AppState;
use super::ApiResult;

const DEFAULT_FLUSH_TIMEOUT_MS: u64 = 30_000;

/// A job as posted: the job fields plus an optional priority.
///
/// ```json
/// {"kind": "text", "text": "Order #12", "size": "large", "priority": 2}
/// ```
#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    #[serde(flatten)]
    pub kind: JobKind,
    #[serde(default)]
    pub priority: u8,
}

/// POST /api/jobs - Queue a job. 429 when the queue is full.
pub async fn enqueue(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EnqueueRequest>,
) -> ApiResult {
    let (id, queued) = state
        .with_printer(move |p| {
            let id = p.enqueue(req.kind, req.priority)?;
            Ok((id, p.queue_len()))
        })
        .await?;
    Ok(Json(json!({ "success": true, "id": id, "queued": queued })))
}

/// GET /api/jobs - Pending jobs, oldest first.
pub async fn list(State(state): State<Arc<AppState>>) -> ApiResult {
    let jobs = state.with_printer(|p| Ok(p.pending_jobs())).await?;
    Ok(Json(json!({ "success": true, "length": jobs.len(), "jobs": jobs })))
}

/// DELETE /api/jobs - Drop every pending job.
pub async fn clear(State(state): State<Arc<AppState>>) -> ApiResult {
    let removed = state.with_printer(|p| Ok(p.clear_queue())).await?;
    Ok(Json(json!({ "success": true, "removed": removed })))
}

#[derive(Debug, Deserialize)]
pub struct FlushRequest {
    pub timeout_ms: u64,
}

/// POST /api/jobs/flush - Process the queue until empty or timed out.
/// The body is optional; the timeout defaults to 30 s.
pub async fn flush(
    State(state): State<Arc<AppState>>,
    body: Option<Json<FlushRequest>>,
) -> ApiResult {
    let timeout_ms = body.map_or(DEFAULT_FLUSH_TIMEOUT_MS, |Json(req)| req.timeout_ms);
    let timeout = Duration::from_millis(timeout_ms);
    let (drained, remaining) = state
        .with_printer(move |p| {
            let drained = p.flush_and_wait(timeout);
            Ok((drained, p.queue_len()))
        })
        .await?;
    Ok(Json(json!({
        "success": drained,
        "drained": drained,
        "remaining": remaining,
    })))
}

#[derive(Debug, Default, Deserialize)]
pub struct QueueSettingsRequest {
    pub capacity: Option<usize>,
    pub inter_job_delay_ms: Option<u64>,
    pub auto_process: Option<bool>,
}

/// PUT /api/queue/settings - Change any of capacity, delay, auto-processing.
pub async fn settings(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QueueSettingsRequest>,
) -> ApiResult {
    let status = state
        .with_printer(move |p| {
            if let Some(capacity) = req.capacity {
                p.set_queue_capacity(capacity);
            }
            if let Some(ms) = req.inter_job_delay_ms {
                p.set_inter_job_delay(Duration::from_millis(ms));
            }
            if let Some(enabled) = req.auto_process {
                p.set_auto_process(enabled);
            }
            Ok(p.status().queue)
        })
        .await?;
    Ok(Json(json!({ "success": true, "queue": status })))
}
