//! Persona search handler.

use adtest_models::{JobId, SearchRequest, SearchResponse};
use axum::extract::{Path, State};
use axum::Json;
use tracing::info;
use validator::Validate;

use crate::error::ApiResult;
use crate::state::AppState;

/// POST /{job_id}/search
///
/// Starts a persona search for the job and returns immediately; personas
/// are saved to the job as the search finds them.
pub async fn search(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Json(request): Json<SearchRequest>,
) -> ApiResult<Json<SearchResponse>> {
    request.validate()?;

    let job_id = JobId::from(job_id);
    info!(job_id = %job_id, "Persona search requested");

    state
        .persona_search()
        .spawn(job_id, request.trimmed().to_string());

    Ok(Json(SearchResponse::accepted()))
}
