//! Persona responses handler.

use adtest_models::{JobId, PersonaResponsesSummary};
use axum::extract::{Path, State};
use axum::Json;

use crate::error::ApiResult;
use crate::state::AppState;

/// POST /{job_id}/responses
pub async fn persona_responses(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<PersonaResponsesSummary>> {
    let job_id = JobId::from(job_id);
    let summary = state.persona_responses().generate(&job_id).await?;
    Ok(Json(summary))
}
