//! Route handlers

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{ApiError, AppState};
use crate::engine::ExtractionResponse;

#[derive(Debug, Deserialize)]
pub struct InvokeBody {
    pub input: Value,
}

#[derive(Debug, Deserialize)]
pub struct BatchBody {
    pub inputs: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct InvokeOutput {
    pub output: ExtractionResponse,
    pub metadata: RunMetadata,
}

/// `run_id` matches `parent_run_id` on the run's invocation log records
#[derive(Debug, Serialize)]
pub struct RunMetadata {
    pub run_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct BatchOutput {
    pub output: Vec<ExtractionResponse>,
    pub metadata: BatchMetadata,
}

#[derive(Debug, Serialize)]
pub struct BatchMetadata {
    pub run_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct TemplateInfo {
    pub name: &'static str,
    pub fields: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
    pub started_at: String,
    pub uptime_secs: u64,
}

/// `POST /invoke`
pub async fn invoke(
    State(state): State<AppState>,
    payload: Result<Json<InvokeBody>, JsonRejection>,
) -> Result<Json<InvokeOutput>, ApiError> {
    let Json(body) = payload?;
    let output = state.orchestrator.invoke(&body.input).await?;
    let run_id = output.run_id();

    Ok(Json(InvokeOutput {
        output,
        metadata: RunMetadata { run_id },
    }))
}

/// `POST /batch`
pub async fn batch(
    State(state): State<AppState>,
    payload: Result<Json<BatchBody>, JsonRejection>,
) -> Result<Json<BatchOutput>, ApiError> {
    let Json(body) = payload?;
    let output = state.orchestrator.batch(&body.inputs).await?;
    let run_ids = output.iter().map(ExtractionResponse::run_id).collect();

    Ok(Json(BatchOutput {
        output,
        metadata: BatchMetadata { run_ids },
    }))
}

/// `POST /extract`
pub async fn extract(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ExtractionResponse>, ApiError> {
    let Json(body) = payload?;
    Ok(Json(state.orchestrator.invoke(&body).await?))
}

/// `GET /templates`
pub async fn templates(State(state): State<AppState>) -> Json<Vec<TemplateInfo>> {
    let templates = state
        .orchestrator
        .registry()
        .iter()
        .map(|template| TemplateInfo {
            name: template.name,
            fields: template.field_names().collect(),
        })
        .collect();
    Json(templates)
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        started_at: state.started_at.to_rfc3339(),
        uptime_secs: state.uptime_secs(),
    })
}
