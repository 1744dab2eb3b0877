//! API integration tests against in-memory doubles of every backend.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use adtest_api::{create_router, ApiConfig, AppState, CallPresets, IndexSettings};
use adtest_db::{AdStore, DbError, DbResult};
use adtest_media::compliance::aspect_ratio_label;
use adtest_media::{CompliancePipeline, MediaError, MediaProber, MediaResult, MediaTranscoder};
use adtest_models::{
    Ad, AdAnalysis, AdId, CallTarget, IndexTaskStatus, Job, JobId, MediaMetadata, NewPersona,
    NewPersonaResponse, Persona, PersonaId, TransformPlan, WebsetItem, WebsetStatus,
};
use adtest_storage::{BlobLocation, BlobStore, StorageError, StorageResult};
use adtest_vendors::{
    CallDetails, IndexTask, LlmClient, PersonaSearch, VendorError, VendorResult, VideoIndexer,
    VoiceCaller, Webset,
};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

// ============================================================================
// Doubles
// ============================================================================

#[derive(Default)]
struct FakeStore {
    jobs: HashMap<String, Job>,
    ads: Mutex<HashMap<String, Ad>>,
    personas: HashMap<String, Vec<Persona>>,
    upserts: Mutex<Vec<NewPersona>>,
    responses: Mutex<Vec<NewPersonaResponse>>,
    synced: Mutex<Vec<(JobId, DateTime<Utc>)>>,
}

impl FakeStore {
    fn with_job(mut self, id: &str, ads_id: Option<&str>, video_url: Option<&str>) -> Self {
        self.jobs.insert(
            id.to_string(),
            Job {
                id: JobId::from(id),
                ads_id: ads_id.map(AdId::from),
                video_url: video_url.map(str::to_string),
                personas_synced_at: None,
            },
        );
        if let Some(ad) = ads_id {
            self.ads.lock().unwrap().insert(
                ad.to_string(),
                Ad {
                    id: AdId::from(ad),
                    description: Some("A runner laces up at dawn".into()),
                    video_url: None,
                },
            );
        }
        self
    }

    fn with_persona(mut self, job_id: &str, id: &str, name: &str) -> Self {
        self.personas.entry(job_id.to_string()).or_default().push(Persona {
            id: PersonaId::from(id),
            job_id: JobId::from(job_id),
            linkedin_url: Some(format!("https://linkedin.com/in/{}", id)),
            name: Some(name.to_string()),
            location: Some("Ohio".into()),
            position: Some("Nurse".into()),
            description: None,
            prompt: None,
        });
        self
    }

    fn job(&self, job_id: &JobId) -> DbResult<&Job> {
        self.jobs
            .get(job_id.as_str())
            .ok_or_else(|| DbError::NotFound(format!("Job with id {} not found", job_id)))
    }
}

#[async_trait]
impl AdStore for FakeStore {
    async fn get_job(&self, job_id: &JobId) -> DbResult<Option<Job>> {
        Ok(self.jobs.get(job_id.as_str()).cloned())
    }

    async fn get_ad_for_job(&self, job_id: &JobId) -> DbResult<Ad> {
        let ads_id = self
            .job(job_id)?
            .ads_id
            .clone()
            .ok_or_else(|| DbError::NotFound(format!("No ad associated with job {}", job_id)))?;
        self.ads
            .lock()
            .unwrap()
            .get(ads_id.as_str())
            .cloned()
            .ok_or_else(|| DbError::NotFound(format!("Ad with id {} not found", ads_id)))
    }

    async fn update_ad_description(&self, job_id: &JobId, description: &str) -> DbResult<AdId> {
        let mut ad = self.get_ad_for_job(job_id).await?;
        ad.description = Some(description.to_string());
        let id = ad.id.clone();
        self.ads.lock().unwrap().insert(id.to_string(), ad);
        Ok(id)
    }

    async fn list_personas(&self, job_id: &JobId) -> DbResult<Vec<Persona>> {
        Ok(self.personas.get(job_id.as_str()).cloned().unwrap_or_default())
    }

    async fn upsert_persona(&self, persona: &NewPersona) -> DbResult<Persona> {
        self.upserts.lock().unwrap().push(persona.clone());
        Ok(Persona {
            id: PersonaId::from("saved"),
            job_id: persona.job_id.clone(),
            linkedin_url: Some(persona.linkedin_url.clone()),
            name: Some(persona.name.clone()),
            location: Some(persona.location.clone()),
            position: Some(persona.position.clone()),
            description: Some(persona.description.clone()),
            prompt: Some(persona.prompt.clone()),
        })
    }

    async fn insert_persona_response(&self, response: &NewPersonaResponse) -> DbResult<()> {
        self.responses.lock().unwrap().push(response.clone());
        Ok(())
    }

    async fn mark_personas_synced(&self, job_id: &JobId, at: DateTime<Utc>) -> DbResult<()> {
        self.synced.lock().unwrap().push((job_id.clone(), at));
        Ok(())
    }

    async fn get_job_video_location(&self, job_id: &JobId) -> DbResult<Option<String>> {
        Ok(self.job(job_id)?.video_url.clone())
    }
}

struct FakeStorage;

#[async_trait]
impl BlobStore for FakeStorage {
    async fn download(&self, location: &BlobLocation) -> StorageResult<Vec<u8>> {
        if location.bucket == "videos" {
            Ok(b"not really an mp4".to_vec())
        } else {
            Err(StorageError::not_found(location.to_string()))
        }
    }
}

/// Reports `metadata` for the uploaded video and times out on any re-probe.
struct FakeProber {
    metadata: MediaMetadata,
    calls: AtomicUsize,
}

#[async_trait]
impl MediaProber for FakeProber {
    async fn extract(&self, _path: &Path) -> MediaResult<MediaMetadata> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            Ok(self.metadata.clone())
        } else {
            Err(MediaError::probe_failed("timed out after 30 seconds", None))
        }
    }
}

#[derive(Default)]
struct FakeTranscoder {
    calls: AtomicUsize,
}

#[async_trait]
impl MediaTranscoder for FakeTranscoder {
    async fn transform(
        &self,
        _input: &Path,
        _output: &Path,
        _plan: &TransformPlan,
    ) -> MediaResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn metadata(width: u32, height: u32, duration: f64) -> MediaMetadata {
    MediaMetadata {
        width,
        height,
        duration,
        file_size_bytes: 17,
        video_codec: "h264".into(),
        audio_codec: "aac".into(),
        aspect_ratio: aspect_ratio_label(width, height),
    }
}

struct FakeSearch;

#[async_trait]
impl PersonaSearch for FakeSearch {
    async fn create_webset(
        &self,
        query: &str,
        count: u32,
        entity_type: &str,
    ) -> VendorResult<Webset> {
        assert_eq!(count, 10);
        assert_eq!(entity_type, "person");
        assert!(!query.is_empty());
        Ok(Webset {
            id: "ws_1".into(),
            status: WebsetStatus::Running,
        })
    }

    async fn get_webset(&self, webset_id: &str) -> VendorResult<Webset> {
        Ok(Webset {
            id: webset_id.to_string(),
            status: WebsetStatus::Idle,
        })
    }

    async fn list_items(&self, _webset_id: &str) -> VendorResult<Vec<WebsetItem>> {
        let item: WebsetItem = serde_json::from_value(json!({
            "id": "item_1",
            "properties": {
                "url": "https://linkedin.com/in/sam",
                "description": "ICU nurse",
                "person": {"name": "Sam Lee", "location": "Columbus, OH", "position": "Nurse"}
            }
        }))
        .unwrap();
        Ok(vec![item])
    }
}

#[derive(Default)]
struct FakeIndexer {
    uploads: AtomicUsize,
}

#[async_trait]
impl VideoIndexer for FakeIndexer {
    async fn get_or_create_index<'a>(
        &self,
        name: &str,
        configured_id: Option<&'a str>,
    ) -> VendorResult<String> {
        assert_eq!(name, "test-index");
        Ok(configured_id.unwrap_or("idx_new").to_string())
    }

    async fn create_task(&self, index_id: &str, video: &Path) -> VendorResult<String> {
        assert_eq!(index_id, "idx_1");
        assert!(video.exists(), "processed video must exist during upload");
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok("task_1".into())
    }

    async fn get_task(&self, task_id: &str) -> VendorResult<IndexTask> {
        Ok(IndexTask {
            id: task_id.to_string(),
            status: IndexTaskStatus::Ready,
            video_id: Some("vid_1".into()),
        })
    }

    async fn analyze(&self, video_id: &str) -> VendorResult<AdAnalysis> {
        assert_eq!(video_id, "vid_1");
        Ok(serde_json::from_value(json!({
            "title": "Dawn Run",
            "summary": "A runner starts the day.",
            "keywords": ["running", "morning"],
            "strengths": ["Clear message"],
            "improvement_areas": []
        }))
        .unwrap())
    }
}

/// Answers every prompt except those for personas named "Fail".
struct FakeLlm;

#[async_trait]
impl LlmClient for FakeLlm {
    async fn complete(&self, prompt: &str) -> VendorResult<String> {
        if prompt.contains("Name: Fail") {
            return Err(VendorError::Api {
                vendor: "Anthropic",
                status: 529,
                body: "overloaded".into(),
            });
        }
        Ok("It makes me want to go for a run.".into())
    }
}

#[derive(Default)]
struct FakeCaller {
    placed: Mutex<Vec<(CallTarget, Option<String>)>>,
}

#[async_trait]
impl VoiceCaller for FakeCaller {
    async fn create_call<'a>(
        &self,
        target: &CallTarget,
        customer_name: Option<&'a str>,
    ) -> VendorResult<String> {
        self.placed
            .lock()
            .unwrap()
            .push((target.clone(), customer_name.map(str::to_string)));
        Ok("call_1".into())
    }

    async fn get_call(&self, call_id: &str) -> VendorResult<CallDetails> {
        if call_id == "missing" {
            return Err(VendorError::Api {
                vendor: "Vapi",
                status: 404,
                body: "Call not found".into(),
            });
        }
        Ok(CallDetails {
            id: call_id.to_string(),
            status: "ended".into(),
            raw: json!({"id": call_id, "status": "ended", "endedReason": "customer-ended-call"}),
        })
    }
}

// ============================================================================
// Harness
// ============================================================================

struct TestApp {
    router: Router,
    store: Arc<FakeStore>,
    transcoder: Arc<FakeTranscoder>,
    indexer: Arc<FakeIndexer>,
    caller: Arc<FakeCaller>,
    _work_dir: TempDir,
}

fn default_target() -> CallTarget {
    CallTarget {
        assistant_id: "asst_default".into(),
        phone_number_id: "phone_1".into(),
        customer_number: "+15550100".into(),
    }
}

fn test_app_with(store: FakeStore, probe: MediaMetadata, config: ApiConfig) -> TestApp {
    let work_dir = tempfile::tempdir().unwrap();
    let store = Arc::new(store);
    let transcoder = Arc::new(FakeTranscoder::default());
    let indexer = Arc::new(FakeIndexer::default());
    let caller = Arc::new(FakeCaller::default());

    let pipeline = CompliancePipeline::new(
        Arc::new(FakeProber {
            metadata: probe,
            calls: AtomicUsize::new(0),
        }),
        transcoder.clone(),
        work_dir.path(),
    );

    let state = AppState {
        config,
        db: store.clone(),
        storage: Arc::new(FakeStorage),
        pipeline: Arc::new(pipeline),
        search: Arc::new(FakeSearch),
        indexer: indexer.clone(),
        llm: Arc::new(FakeLlm),
        caller: caller.clone(),
        calls: CallPresets {
            default_target: default_target(),
            male_assistant_id: None,
            female_assistant_id: Some("asst_female".into()),
        },
        index: IndexSettings {
            name: "test-index".into(),
            configured_id: Some("idx_1".into()),
        },
    };

    TestApp {
        router: create_router(state, None),
        store,
        transcoder,
        indexer,
        caller,
        _work_dir: work_dir,
    }
}

fn test_app(store: FakeStore) -> TestApp {
    test_app_with(store, metadata(1920, 1080, 30.0), ApiConfig::default())
}

fn seeded_store() -> FakeStore {
    FakeStore::default()
        .with_job("job-1", Some("ad-1"), Some("videos/job-1/ad.mp4"))
        .with_job("job-2", None, None)
        .with_persona("job-1", "p-1", "Sam Lee")
        .with_persona("job-1", "p-2", "Fail")
}

async fn send(router: &Router, request: Request<Body>) -> Response {
    router.clone().oneshot(request).await.unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder().method("POST").uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_root_endpoint() {
    let app = test_app(seeded_store());
    let response = send(&app.router, get("/")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"Hello": "World"}));
}

#[tokio::test]
async fn test_health_endpoint_sets_headers() {
    let app = test_app(seeded_store());
    let response = send(&app.router, get("/health")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = test_app(seeded_store());
    let request = Request::builder()
        .uri("/healthz")
        .header("X-Request-ID", "req-42")
        .body(Body::empty())
        .unwrap();
    let response = send(&app.router, request).await;
    assert_eq!(response.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn test_metrics_route_absent_when_disabled() {
    let app = test_app(seeded_store());
    let response = send(&app.router, get("/metrics")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Persona search
// ============================================================================

#[tokio::test]
async fn test_search_rejects_empty_sentence() {
    let app = test_app(seeded_store());
    let response = send(&app.router, post_json("/job-1/search", json!({"sentence": ""}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().starts_with("Validation error"));
}

#[tokio::test]
async fn test_search_returns_immediately_and_syncs_in_background() {
    let app = test_app(seeded_store());
    let response = send(
        &app.router,
        post_json("/job-1/search", json!({"sentence": "  nurses in Ohio  "})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "success": true,
            "webset_id": null,
            "items": null,
            "saved_personas_count": 0,
            "error": null
        })
    );

    let store = app.store.clone();
    tokio::time::timeout(Duration::from_secs(5), async move {
        while store.synced.lock().unwrap().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("background search should mark the job synced");

    let synced = app.store.synced.lock().unwrap();
    assert_eq!(synced[0].0.as_str(), "job-1");

    // saved while polling and again after the terminal status
    let upserts = app.store.upserts.lock().unwrap();
    assert_eq!(upserts.len(), 2);
    assert_eq!(upserts[0].name, "Sam Lee");
    assert_eq!(upserts[0].linkedin_url, "https://linkedin.com/in/sam");
    assert_eq!(upserts[0].prompt, "nurses in Ohio");
    assert_eq!(upserts[0].job_id.as_str(), "job-1");
}

// ============================================================================
// Persona responses
// ============================================================================

#[tokio::test]
async fn test_persona_responses_counts_failures() {
    let app = test_app(seeded_store());
    let response = send(&app.router, post_empty("/job-1/responses")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["job_id"], "job-1");
    assert_eq!(body["total_personas"], 2);
    assert_eq!(body["successful_responses"], 1);
    assert_eq!(body["failed_responses"], 1);
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["results"][0]["persona_id"], "p-1");
    assert_eq!(body["results"][0]["success"], true);

    let stored = app.store.responses.lock().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].persona_id.as_str(), "p-1");
    assert!(stored[0]
        .conversation
        .prompt
        .contains("You are viewing this ad: A runner laces up at dawn."));
    assert_eq!(stored[0].conversation.response, "It makes me want to go for a run.");
}

#[tokio::test]
async fn test_persona_responses_not_found_cases() {
    let app = test_app(seeded_store().with_job("job-3", Some("ad-3"), None));

    let response = send(&app.router, post_empty("/missing/responses")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["detail"], "Job with id missing not found");

    let response = send(&app.router, post_empty("/job-2/responses")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["detail"], "No ad associated with job job-2");

    let response = send(&app.router, post_empty("/job-3/responses")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["detail"], "No personas found for job job-3");
}

// ============================================================================
// Video analysis
// ============================================================================

#[tokio::test]
async fn test_video_analysis_for_compliant_video() {
    let app = test_app(seeded_store());
    let response = send(&app.router, post_empty("/video/job-1/video")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["job_id"], "job-1");
    assert_eq!(body["ads_id"], "ad-1");
    assert_eq!(body["video_id"], "vid_1");
    assert_eq!(body["analysis"]["title"], "Dawn Run");

    assert_eq!(app.transcoder.calls.load(Ordering::SeqCst), 0);
    assert_eq!(app.indexer.uploads.load(Ordering::SeqCst), 1);

    let ads = app.store.ads.lock().unwrap();
    let description = ads["ad-1"].description.clone().unwrap();
    assert!(description.starts_with("Title: Dawn Run"));
    assert!(description.contains("Keywords: running, morning"));
}

#[tokio::test]
async fn test_video_analysis_rejects_unfixable_video() {
    let app = test_app_with(seeded_store(), metadata(1920, 1080, 2.0), ApiConfig::default());
    let response = send(&app.router, post_empty("/video/job-1/video")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert!(body["detail"]
        .as_str()
        .unwrap()
        .starts_with("Video has unfixable issues"));
    assert_eq!(app.transcoder.calls.load(Ordering::SeqCst), 0);
    assert_eq!(app.indexer.uploads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_video_analysis_reprobe_failure_is_server_error() {
    // too small, so the pipeline transforms and then re-probes the output
    let app = test_app_with(seeded_store(), metadata(200, 200, 30.0), ApiConfig::default());
    let response = send(&app.router, post_empty("/video/job-1/video")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(
        body["detail"],
        "FFprobe failed to read video: timed out after 30 seconds"
    );
    assert_eq!(app.transcoder.calls.load(Ordering::SeqCst), 1);
    assert_eq!(app.indexer.uploads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_video_analysis_location_errors() {
    let app = test_app(seeded_store().with_job("job-4", Some("ad-4"), None));

    // job without a stored video
    let response = send(&app.router, post_empty("/video/job-4/video")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["detail"], "No video associated with job job-4");

    // override pointing at an object that does not exist
    let response = send(
        &app.router,
        post_json("/video/job-4/video", json!({"video_url": "archive/old.mp4"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // override that is not a storage location
    let response = send(
        &app.router,
        post_json("/video/job-4/video", json!({"video_url": "no-slash"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Voice calls
// ============================================================================

#[tokio::test]
async fn test_call_index_and_health() {
    let app = test_app(seeded_store());

    let body = body_json(send(&app.router, get("/vapi/")).await).await;
    assert_eq!(body["endpoints"]["create_custom_call"], "/vapi/calls/create");

    let body = body_json(send(&app.router, get("/vapi/health")).await).await;
    assert_eq!(body, json!({"status": "healthy", "service": "Vapi Call API", "version": "1.0.0"}));
}

#[tokio::test]
async fn test_custom_call_uses_defaults_for_missing_fields() {
    let app = test_app(seeded_store());
    let response = send(
        &app.router,
        post_json(
            "/vapi/calls/create",
            json!({"customer_number": "+15550199", "customer_name": "Jordan"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["call_id"], "call_1");
    assert_eq!(body["status"], "created");
    assert_eq!(body["message"], "Call created successfully to +15550199");

    let placed = app.caller.placed.lock().unwrap();
    assert_eq!(placed[0].0.assistant_id, "asst_default");
    assert_eq!(placed[0].0.customer_number, "+15550199");
    assert_eq!(placed[0].1.as_deref(), Some("Jordan"));
}

#[tokio::test]
async fn test_preset_calls() {
    let app = test_app(seeded_store());

    let body = body_json(send(&app.router, post_empty("/vapi/calls")).await).await;
    assert_eq!(body["message"], "Call created successfully with default values");
    assert_eq!(body["details"]["assistant_id"], "asst_default");
    assert!(body.get("voice_type").is_none());

    let body = body_json(send(&app.router, post_empty("/vapi/calls/female")).await).await;
    assert_eq!(body["voice_type"], "female");
    assert_eq!(body["details"]["assistant_id"], "asst_female");
    assert_eq!(body["details"]["phone_number_id"], "phone_1");

    let response = send(&app.router, post_empty("/vapi/calls/male")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await["detail"],
        "VAPI_MALE_ASSISTANT_ID is not configured"
    );

    assert_eq!(app.caller.placed.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_call_status() {
    let app = test_app(seeded_store());

    let response = send(&app.router, get("/vapi/calls/call_1/status")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["call_id"], "call_1");
    assert_eq!(body["status"], "ended");
    assert_eq!(body["details"]["endedReason"], "customer-ended-call");

    let response = send(&app.router, get("/vapi/calls/missing/status")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["detail"], "Vapi API error: Call not found");
}

// ============================================================================
// Rate limiting
// ============================================================================

#[tokio::test]
async fn test_rate_limit_per_client_ip() {
    let config = ApiConfig {
        rate_limit_rps: 1,
        ..Default::default()
    };
    let app = test_app_with(seeded_store(), metadata(1920, 1080, 30.0), config);

    let from = |ip: &str| {
        Request::builder()
            .uri("/vapi/health")
            .header("X-Forwarded-For", ip)
            .body(Body::empty())
            .unwrap()
    };

    assert_eq!(send(&app.router, from("203.0.113.9")).await.status(), StatusCode::OK);
    let limited = send(&app.router, from("203.0.113.9")).await;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.headers()["retry-after"], "1");

    assert_eq!(send(&app.router, from("203.0.113.10")).await.status(), StatusCode::OK);

    // health checks are outside the limiter
    assert_eq!(send(&app.router, get("/health")).await.status(), StatusCode::OK);
}
