//! TwelveLabs video indexing and structured analysis.

use std::path::Path;

use adtest_models::{AdAnalysis, IndexTaskStatus};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

#[cfg(test)]
use mockall::automock;

use crate::config::TwelveLabsConfig;
use crate::error::{VendorError, VendorResult};
use crate::http::{build_client, send_json};
use crate::poll::{poll_until_terminal, PollConfig};

const VENDOR: &str = "TwelveLabs";

/// Index engine and options used when a new index has to be created.
pub mod index_defaults {
    pub const MODEL_NAME: &str = "marengo2.7";
    pub const MODEL_OPTIONS: &[&str] = &["visual", "audio", "generate"];
    pub const ADDONS: &[&str] = &["thumbnail"];
}

const ANALYSIS_PROMPT: &str = "Analyze this advertisement video and provide comprehensive insights:
1. A descriptive title for the ad
2. A detailed summary covering:
   - Main message and value proposition
   - Target audience appeal
   - Key visual and audio elements
   - Emotional tone and mood
   - Brand presence and messaging
   - Call-to-action effectiveness
3. Keywords for categorization (themes, emotions, techniques, etc.)
4. Creative strengths and potential areas for improvement";

const ANALYSIS_TEMPERATURE: f64 = 0.2;
const ANALYSIS_MAX_TOKENS: u32 = 2000;

fn analysis_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": {"type": "string"},
            "summary": {"type": "string"},
            "keywords": {"type": "array", "items": {"type": "string"}},
            "creative_elements": {
                "type": "object",
                "properties": {
                    "visual_style": {"type": "string"},
                    "audio_elements": {"type": "string"},
                    "emotional_tone": {"type": "string"},
                    "brand_presence": {"type": "string"},
                    "call_to_action": {"type": "string"}
                }
            },
            "strengths": {"type": "array", "items": {"type": "string"}},
            "improvement_areas": {"type": "array", "items": {"type": "string"}}
        },
        "required": ["title", "summary", "keywords"]
    })
}

/// Indexing task snapshot.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IndexTask {
    #[serde(rename = "_id")]
    pub id: String,
    pub status: IndexTaskStatus,
    #[serde(default)]
    pub video_id: Option<String>,
}

#[derive(Deserialize)]
struct IndexInfo {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    index_name: String,
}

#[derive(Deserialize)]
struct IndexList {
    #[serde(default)]
    data: Vec<IndexInfo>,
}

#[derive(Deserialize)]
struct CreatedResource {
    #[serde(rename = "_id")]
    id: String,
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    data: Value,
}

/// Video upload, indexing and analysis.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VideoIndexer: Send + Sync {
    /// Reuse `configured_id` if it still exists, else the index called
    /// `name`, else create one.
    async fn get_or_create_index<'a>(
        &self,
        name: &str,
        configured_id: Option<&'a str>,
    ) -> VendorResult<String>;

    /// Upload a video file into an index; returns the task id.
    async fn create_task(&self, index_id: &str, video: &Path) -> VendorResult<String>;

    async fn get_task(&self, task_id: &str) -> VendorResult<IndexTask>;

    /// Structured ad analysis of an indexed video.
    async fn analyze(&self, video_id: &str) -> VendorResult<AdAnalysis>;
}

/// Upload `video`, wait for indexing, and return the indexed video id.
pub async fn upload_and_index(
    indexer: &dyn VideoIndexer,
    index_id: &str,
    video: &Path,
    poll: &PollConfig,
) -> VendorResult<String> {
    let task_id = indexer.create_task(index_id, video).await?;
    info!(task_id = %task_id, index_id, operation = %poll.operation, "Video upload initiated");

    let task_ref = task_id.as_str();
    let task = poll_until_terminal(
        poll,
        move || indexer.get_task(task_ref),
        |task: &IndexTask| task.status,
        IndexTaskStatus::TERMINAL,
    )
    .await?;

    if task.status != IndexTaskStatus::Ready {
        return Err(VendorError::task_failed(format!(
            "Video upload failed with status: {}",
            task.status
        )));
    }

    let video_id = task
        .video_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            VendorError::invalid_response(VENDOR, "No video_id returned from completed task")
        })?;

    info!(task_id = %task_id, video_id = %video_id, "Video indexed");
    Ok(video_id)
}

/// TwelveLabs API client.
#[derive(Clone)]
pub struct TwelveLabsClient {
    http: Client,
    config: TwelveLabsConfig,
}

impl TwelveLabsClient {
    pub fn new(config: TwelveLabsConfig) -> VendorResult<Self> {
        Ok(Self {
            http: build_client(config.timeout)?,
            config,
        })
    }

    pub fn config(&self) -> &TwelveLabsConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn find_index_by_name(&self, name: &str) -> VendorResult<Option<String>> {
        let list: IndexList = send_json(
            VENDOR,
            "list_indexes",
            self.http
                .get(self.url("/indexes"))
                .header("x-api-key", &self.config.api_key)
                .query(&[("index_name", name)]),
        )
        .await?;
        Ok(list.data.into_iter().find(|idx| idx.index_name == name).map(|idx| idx.id))
    }
}

/// Parse the `data` field of an analyze response, which holds the
/// schema-shaped answer either as a JSON string or as an object.
fn parse_analysis(data: Value) -> VendorResult<AdAnalysis> {
    let parsed = match data {
        Value::String(text) => serde_json::from_str(&text),
        other => serde_json::from_value(other),
    };
    parsed.map_err(|e| {
        VendorError::invalid_response(VENDOR, format!("analysis does not match schema: {}", e))
    })
}

#[async_trait]
impl VideoIndexer for TwelveLabsClient {
    async fn get_or_create_index<'a>(
        &self,
        name: &str,
        configured_id: Option<&'a str>,
    ) -> VendorResult<String> {
        if let Some(id) = configured_id {
            let existing: VendorResult<IndexInfo> = send_json(
                VENDOR,
                "get_index",
                self.http
                    .get(self.url(&format!("/indexes/{}", id)))
                    .header("x-api-key", &self.config.api_key),
            )
            .await;
            match existing {
                Ok(index) => {
                    info!(
                        index_id = %index.id,
                        index_name = %index.index_name,
                        "Using configured index"
                    );
                    return Ok(index.id);
                }
                Err(e) => warn!(
                    index_id = id,
                    error = %e,
                    "Configured index unavailable, falling back to lookup"
                ),
            }
        }

        match self.find_index_by_name(name).await {
            Ok(Some(id)) => {
                info!(index_id = %id, index_name = name, "Found existing index");
                return Ok(id);
            }
            Ok(None) => {}
            Err(e) => warn!(index_name = name, error = %e, "Could not list indexes"),
        }

        let created: CreatedResource = send_json(
            VENDOR,
            "create_index",
            self.http
                .post(self.url("/indexes"))
                .header("x-api-key", &self.config.api_key)
                .json(&json!({
                    "index_name": name,
                    "models": [{
                        "model_name": index_defaults::MODEL_NAME,
                        "model_options": index_defaults::MODEL_OPTIONS,
                    }],
                    "addons": index_defaults::ADDONS,
                })),
        )
        .await?;

        info!(index_id = %created.id, index_name = name, "Index created");
        Ok(created.id)
    }

    async fn create_task(&self, index_id: &str, video: &Path) -> VendorResult<String> {
        let file = tokio::fs::File::open(video).await?;
        let size = file.metadata().await?.len();
        let file_name = video
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "video.mp4".to_string());

        // streamed from disk, the processed video can be up to 2 GiB
        let part = Part::stream_with_length(Body::from(file), size)
            .file_name(file_name.clone())
            .mime_str("video/mp4")?;
        let form = Form::new()
            .text("index_id", index_id.to_string())
            .text("enable_video_stream", "true")
            .part("video_file", part);

        info!(file = %file_name, size, index_id, "Uploading video");
        let created: CreatedResource = send_json(
            VENDOR,
            "create_task",
            self.http
                .post(self.url("/tasks"))
                .header("x-api-key", &self.config.api_key)
                .timeout(self.config.upload_timeout)
                .multipart(form),
        )
        .await?;

        Ok(created.id)
    }

    async fn get_task(&self, task_id: &str) -> VendorResult<IndexTask> {
        send_json(
            VENDOR,
            "get_task",
            self.http
                .get(self.url(&format!("/tasks/{}", task_id)))
                .header("x-api-key", &self.config.api_key),
        )
        .await
    }

    async fn analyze(&self, video_id: &str) -> VendorResult<AdAnalysis> {
        let payload = json!({
            "video_id": video_id,
            "prompt": ANALYSIS_PROMPT,
            "temperature": ANALYSIS_TEMPERATURE,
            "stream": false,
            "response_format": {
                "type": "json_schema",
                "json_schema": analysis_schema(),
            },
            "max_tokens": ANALYSIS_MAX_TOKENS,
        });

        let response: AnalyzeResponse = send_json(
            VENDOR,
            "analyze",
            self.http
                .post(self.url("/analyze"))
                .header("x-api-key", &self.config.api_key)
                .json(&payload),
        )
        .await?;

        let analysis = parse_analysis(response.data)?;
        info!(
            video_id,
            title = %analysis.title,
            keywords = analysis.keywords.len(),
            "Video analyzed"
        );
        Ok(analysis)
    }
}
