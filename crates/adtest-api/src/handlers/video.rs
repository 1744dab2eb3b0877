//! Video analysis handler.

use adtest_models::{JobId, VideoAnalysisRequest, VideoAnalysisResponse};
use axum::extract::{Path, State};
use axum::Json;
use tracing::info;
use validator::Validate;

use crate::error::ApiResult;
use crate::state::AppState;

/// POST /video/{job_id}/video
///
/// Analyzes the job's ad video and stores the analysis as the ad's
/// description. The body is optional; `video_url` overrides the job's
/// stored video location.
pub async fn analyze_video(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    request: Option<Json<VideoAnalysisRequest>>,
) -> ApiResult<Json<VideoAnalysisResponse>> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    request.validate()?;

    let job_id = JobId::from(job_id);
    info!(job_id = %job_id, "Video analysis requested");

    let analysis = state
        .video_analysis()
        .analyze(&job_id, request.video_url.as_deref())
        .await?;

    Ok(Json(analysis.into_response(&job_id)?))
}
