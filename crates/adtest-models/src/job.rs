//! Job and ad records.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{AdId, JobId};

/// Row of the `jobs` table.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    pub id: JobId,
    /// Ad under test
    #[serde(default)]
    pub ads_id: Option<AdId>,
    /// Storage location of the uploaded ad video (`bucket/path`)
    #[serde(default)]
    pub video_url: Option<String>,
    /// Set once the persona search has finished syncing
    #[serde(default)]
    pub personas_synced_at: Option<DateTime<Utc>>,
}

/// Row of the `ads` table.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Ad {
    pub id: AdId,
    /// Analysis text produced by the video understanding step
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
}

impl Ad {
    /// Description text, empty when the ad has not been analyzed yet.
    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}
