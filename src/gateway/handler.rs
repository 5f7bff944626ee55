use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::{DocumentId, DocumentRole, EvaluationResult, JobId, JobStatus};
use crate::gateway::error::GatewayError;
use crate::gateway::state::HandlerState;

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub role: String,
    pub filename: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub id: DocumentId,
    pub role: DocumentRole,
    pub filename: String,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub title: String,
    pub subject_id: String,
    pub reference_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EvaluateResponse {
    pub id: JobId,
    pub status: JobStatus,
}

/// Scores and narrative of a completed job.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResultBody {
    pub match_rate: f64,
    pub subject_feedback: String,
    pub reference_score: f64,
    pub reference_feedback: String,
    pub overall_summary: String,
}

impl From<EvaluationResult> for ResultBody {
    fn from(result: EvaluationResult) -> Self {
        Self {
            match_rate: result.match_rate,
            subject_feedback: result.subject_feedback,
            reference_score: result.reference_score,
            reference_feedback: result.reference_feedback,
            overall_summary: result.overall_summary,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobResultResponse {
    pub id: JobId,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultBody>,
}

#[instrument(skip(state, body), fields(role = %params.role, size = body.len()))]
pub async fn upload_handler(
    State(state): State<HandlerState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let role: DocumentRole = params
        .role
        .parse()
        .map_err(|e: crate::domain::DomainError| GatewayError::InvalidRequest(e.to_string()))?;

    let document = state
        .service
        .upload_document(role, &params.filename, &body)
        .await?;

    let response = UploadResponse {
        id: document.id,
        role: document.role,
        filename: document.filename,
    };
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

#[instrument(skip(state, request))]
pub async fn evaluate_handler(
    State(state): State<HandlerState>,
    Json(request): Json<serde_json::Value>,
) -> Result<Response, GatewayError> {
    let request: EvaluateRequest = serde_json::from_value(request)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid request schema: {}", e)))?;
    let subject_id = parse_id::<DocumentId>("subject_id", &request.subject_id)?;
    let reference_id = parse_id::<DocumentId>("reference_id", &request.reference_id)?;

    let job = state
        .service
        .submit(&request.title, subject_id, reference_id)
        .await?;
    debug!(job_id = %job.id(), "evaluation accepted");

    let response = EvaluateResponse {
        id: job.id(),
        status: job.status(),
    };
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

#[instrument(skip(state))]
pub async fn result_handler(
    State(state): State<HandlerState>,
    Path(id): Path<String>,
) -> Result<Json<JobResultResponse>, GatewayError> {
    let job_id = parse_id::<JobId>("id", &id)?;
    let view = state.service.get_status(job_id).await?;

    Ok(Json(JobResultResponse {
        id: view.job.id(),
        status: view.job.status(),
        error: view.job.error_message().map(str::to_string),
        result: view.result.map(ResultBody::from),
    }))
}

fn parse_id<T>(field: &str, raw: &str) -> Result<T, GatewayError>
where
    T: std::str::FromStr<Err = uuid::Error>,
{
    raw.trim()
        .parse()
        .map_err(|e| GatewayError::InvalidRequest(format!("{field} is not a valid id: {e}")))
}
