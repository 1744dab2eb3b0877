//! Storage operations the HTTP services depend on.

use adtest_models::{Ad, AdId, Job, JobId, NewPersona, NewPersonaResponse, Persona};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[cfg(test)]
use mockall::automock;

use crate::error::DbResult;

/// Jobs, ads and personas of the ad-testing workflow.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AdStore: Send + Sync {
    /// Fetch a job row, `None` when it does not exist.
    async fn get_job(&self, job_id: &JobId) -> DbResult<Option<Job>>;

    /// Resolve the ad linked to a job.
    ///
    /// Fails with `NotFound` when the job, its `ads_id`, or the ad row is
    /// missing.
    async fn get_ad_for_job(&self, job_id: &JobId) -> DbResult<Ad>;

    /// Overwrite `ads.description` for the ad linked to a job.
    async fn update_ad_description(&self, job_id: &JobId, description: &str) -> DbResult<AdId>;

    async fn list_personas(&self, job_id: &JobId) -> DbResult<Vec<Persona>>;

    /// Insert a persona or update the one with the same job and LinkedIn URL.
    async fn upsert_persona(&self, persona: &NewPersona) -> DbResult<Persona>;

    async fn insert_persona_response(&self, response: &NewPersonaResponse) -> DbResult<()>;

    /// Stamp `jobs.personas_synced_at`.
    async fn mark_personas_synced(&self, job_id: &JobId, at: DateTime<Utc>) -> DbResult<()>;

    /// Stored video location (`jobs.video_url`) of a job.
    ///
    /// Fails with `NotFound` when the job does not exist; `None` when the
    /// job has no video.
    async fn get_job_video_location(&self, job_id: &JobId) -> DbResult<Option<String>>;
}
