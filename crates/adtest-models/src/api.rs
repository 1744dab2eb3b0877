//! HTTP request and response bodies.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{JobId, PersonaId};

/// Body of `POST /{job_id}/search`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, JsonSchema)]
pub struct SearchRequest {
    /// Natural-language description of the people to find
    #[validate(length(min = 1, message = "sentence must not be empty"))]
    pub sentence: String,
}

impl SearchRequest {
    /// Sentence with surrounding whitespace removed.
    pub fn trimmed(&self) -> &str {
        self.sentence.trim()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SearchResponse {
    pub success: bool,
    pub webset_id: Option<String>,
    pub items: Option<Vec<serde_json::Value>>,
    pub saved_personas_count: Option<usize>,
    pub error: Option<String>,
}

impl SearchResponse {
    /// Response returned once the background search has been dispatched.
    pub fn accepted() -> Self {
        Self {
            success: true,
            saved_personas_count: Some(0),
            ..Default::default()
        }
    }
}

/// Body of `POST /video/{job_id}/video`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, JsonSchema)]
pub struct VideoAnalysisRequest {
    /// Storage location (`bucket/path`); the job's column is used when absent
    #[serde(default)]
    #[validate(length(min = 1))]
    pub video_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoAnalysisResponse {
    pub success: bool,
    pub job_id: String,
    pub ads_id: String,
    pub video_id: Option<String>,
    pub analysis: Option<serde_json::Value>,
    pub error: Option<String>,
}

/// Outcome of one persona's reaction request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PersonaResponseResult {
    pub persona_id: PersonaId,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PersonaResponsesSummary {
    pub job_id: JobId,
    pub total_personas: usize,
    pub successful_responses: usize,
    pub failed_responses: usize,
    pub results: Vec<PersonaResponseResult>,
}

impl PersonaResponsesSummary {
    /// Count every outcome, keeping only the successful ones in `results`.
    pub fn from_results(job_id: JobId, results: Vec<PersonaResponseResult>) -> Self {
        let total = results.len();
        let results: Vec<_> = results.into_iter().filter(|r| r.success).collect();
        Self {
            job_id,
            total_personas: total,
            successful_responses: results.len(),
            failed_responses: total - results.len(),
            results,
        }
    }
}

/// Body of `POST /vapi/calls/create`. Missing fields fall back to configured defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, JsonSchema)]
pub struct CallRequest {
    #[serde(default)]
    pub assistant_id: Option<String>,
    #[serde(default)]
    pub phone_number_id: Option<String>,
    /// E.164 number to dial
    #[serde(default)]
    #[validate(length(min = 2, max = 20))]
    pub customer_number: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CallResponse {
    pub call_id: String,
    pub status: String,
    pub message: String,
}

/// Response of the preset call endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PresetCallResponse {
    pub call_id: String,
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_type: Option<String>,
    pub details: CallTarget,
}

/// Resolved parameters of a placed call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CallTarget {
    pub assistant_id: String,
    pub phone_number_id: String,
    pub customer_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CallStatusResponse {
    pub call_id: String,
    pub status: String,
    pub details: Option<serde_json::Value>,
}
