//! HTTP handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;

use crate::normalizer::RawReview;
use crate::pipeline::{PipelineContext, PipelineOutput};

pub struct AppState {
    pub context: Arc<PipelineContext>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    /// Review cells. Non-string values are accepted and treated as empty reviews.
    #[schema(value_type = Vec<Object>, example = json!(["Kopinya enak banget!", "Pelayanan lama"]))]
    pub reviews: Vec<RawReview>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub classifier_ready: bool,
    pub insights_configured: bool,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Label a batch of reviews and generate the business report.
#[utoipa::path(
    post,
    path = "/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Labeled rows and report", body = PipelineOutput),
        (status = 503, description = "Sentiment classifier unavailable", body = ErrorResponse)
    ),
    tag = "reviews"
)]
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<PipelineOutput>, ApiError> {
    match state.context.run(req.reviews).await {
        Ok(output) => Ok(Json(output)),
        Err(e) if e.is_unavailable() => {
            error!("🔥 Run failed, classifier unavailable: {}", e);
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    message: "Sentiment classifier is not available. Please check server logs."
                        .to_string(),
                }),
            ))
        }
        Err(e) => {
            error!("🔥 Run failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    message: format!("An error occurred during processing: {}", e),
                }),
            ))
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Component readiness", body = HealthResponse)),
    tag = "reviews"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let classifier_ready = state.context.classifier_ready();
    Json(HealthResponse {
        status: if classifier_ready { "ok" } else { "degraded" }.to_string(),
        classifier_ready,
        insights_configured: state.context.insights_configured(),
    })
}
