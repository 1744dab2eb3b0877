//! Ad video analysis.
//!
//! Fetches the job's video from storage, makes it compliant with the
//! indexing policy, uploads and indexes it, runs the structured analysis and
//! stores the result as the ad's description.

use std::sync::Arc;

use adtest_db::AdStore;
use adtest_media::CompliancePipeline;
use adtest_models::{AdAnalysis, AdId, JobId, VideoAnalysisResponse};
use adtest_storage::{BlobLocation, BlobStore};
use adtest_vendors::{upload_and_index, PollConfig, VideoIndexer};
use tracing::{info, Instrument};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::IndexSettings;

/// Outcome of a successful analysis.
#[derive(Debug, Clone)]
pub struct VideoAnalysis {
    pub ads_id: AdId,
    pub video_id: String,
    pub analysis: AdAnalysis,
}

impl VideoAnalysis {
    pub fn into_response(self, job_id: &JobId) -> ApiResult<VideoAnalysisResponse> {
        let analysis = serde_json::to_value(&self.analysis)
            .map_err(|e| ApiError::internal(format!("Failed to encode analysis: {}", e)))?;
        Ok(VideoAnalysisResponse {
            success: true,
            job_id: job_id.to_string(),
            ads_id: self.ads_id.to_string(),
            video_id: Some(self.video_id),
            analysis: Some(analysis),
            error: None,
        })
    }
}

/// Runs the analysis flow for a job.
#[derive(Clone)]
pub struct VideoAnalysisService {
    db: Arc<dyn AdStore>,
    storage: Arc<dyn BlobStore>,
    pipeline: Arc<CompliancePipeline>,
    indexer: Arc<dyn VideoIndexer>,
    index: IndexSettings,
}

impl VideoAnalysisService {
    pub fn new(
        db: Arc<dyn AdStore>,
        storage: Arc<dyn BlobStore>,
        pipeline: Arc<CompliancePipeline>,
        indexer: Arc<dyn VideoIndexer>,
        index: IndexSettings,
    ) -> Self {
        Self {
            db,
            storage,
            pipeline,
            indexer,
            index,
        }
    }

    /// Storage location of the job's video: the override when given,
    /// otherwise the job's own column.
    async fn resolve_location(
        &self,
        job_id: &JobId,
        video_url: Option<&str>,
    ) -> ApiResult<BlobLocation> {
        let raw = match video_url.map(str::trim).filter(|s| !s.is_empty()) {
            Some(url) => url.to_string(),
            None => self
                .db
                .get_job_video_location(job_id)
                .await?
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| {
                    ApiError::not_found(format!("No video associated with job {}", job_id))
                })?,
        };
        Ok(BlobLocation::parse(&raw)?)
    }

    /// Run the whole flow.
    pub async fn analyze(
        &self,
        job_id: &JobId,
        video_url: Option<&str>,
    ) -> ApiResult<VideoAnalysis> {
        let span = tracing::info_span!("video_analysis", job_id = %job_id);
        let result = self.analyze_inner(job_id, video_url).instrument(span).await;
        metrics::record_video_analysis(if result.is_ok() { "success" } else { "failure" });
        result
    }

    async fn analyze_inner(
        &self,
        job_id: &JobId,
        video_url: Option<&str>,
    ) -> ApiResult<VideoAnalysis> {
        // fail before any heavy work when the job has no ad to describe
        self.db.get_ad_for_job(job_id).await?;

        let location = self.resolve_location(job_id, video_url).await?;
        let bytes = self.storage.download(&location).await?;

        let video = self.pipeline.run_bytes(job_id.as_str(), &bytes).await?;
        drop(bytes);
        info!(
            transformed = video.was_transformed(),
            aspect_ratio = %video.metadata().aspect_ratio,
            "Video ready for indexing"
        );

        let index_id = self
            .indexer
            .get_or_create_index(&self.index.name, self.index.configured_id.as_deref())
            .await?;
        let video_id = upload_and_index(
            self.indexer.as_ref(),
            &index_id,
            video.path(),
            &PollConfig::indexing(&format!("video for job {}", job_id)),
        )
        .await?;
        // the processed file is no longer needed once indexed
        drop(video);

        let analysis = self.indexer.analyze(&video_id).await?;
        let ads_id = self.db.update_ad_description(job_id, &analysis.to_description()).await?;
        info!(ads_id = %ads_id, video_id = %video_id, "Ad description updated");

        Ok(VideoAnalysis {
            ads_id,
            video_id,
            analysis,
        })
    }
}
