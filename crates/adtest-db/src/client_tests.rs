//! Tests for the PostgREST client against a mock server.

use std::time::Duration;

use adtest_models::{Conversation, JobId, NewPersona, NewPersonaResponse, PersonaId};
use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::client::{DbConfig, SupabaseDb};
use crate::error::DbError;
use crate::retry::RetryConfig;
use crate::store::AdStore;

// =============================================================================
// Test Helpers
// =============================================================================

fn test_config(url: &str) -> DbConfig {
    DbConfig {
        url: url.to_string(),
        key: "test-key".to_string(),
        timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
        retry: RetryConfig {
            max_retries: 2,
            base_delay_ms: 1,
            max_delay_ms: 5,
        },
    }
}

async fn setup() -> (MockServer, SupabaseDb) {
    let server = MockServer::start().await;
    let db = SupabaseDb::new(test_config(&server.uri())).unwrap();
    (server, db)
}

fn new_persona() -> NewPersona {
    NewPersona {
        job_id: JobId::from("job-1"),
        linkedin_url: "https://linkedin.com/in/jdoe".into(),
        name: "Jordan Doe".into(),
        location: "Lisbon".into(),
        position: "Nurse".into(),
        description: "ICU nurse".into(),
        prompt: "nurses in Lisbon".into(),
    }
}

fn persona_row(id: i64) -> serde_json::Value {
    json!({
        "id": id,
        "job_id": "job-1",
        "linkedin_url": "https://linkedin.com/in/jdoe",
        "name": "Jordan Doe",
        "location": "Lisbon",
        "position": "Nurse",
        "description": "ICU nurse",
        "prompt": "nurses in Lisbon"
    })
}

// =============================================================================
// Error Type Tests
// =============================================================================

#[test]
fn test_error_from_http_status() {
    assert!(matches!(DbError::from_http_status(429, "slow down"), DbError::RateLimited(_)));
    assert!(matches!(DbError::from_http_status(503, "down"), DbError::ServerError(503, _)));
    assert!(matches!(DbError::from_http_status(404, "gone"), DbError::NotFound(_)));
    assert!(matches!(DbError::from_http_status(401, "jwt"), DbError::PermissionDenied(_)));
    assert!(matches!(DbError::from_http_status(400, "bad"), DbError::RequestFailed(_)));
}

#[test]
fn test_error_retryability() {
    assert!(DbError::from_http_status(429, "").is_retryable());
    assert!(DbError::from_http_status(502, "").is_retryable());
    assert!(!DbError::from_http_status(400, "").is_retryable());
    assert!(!DbError::from_http_status(409, "").is_retryable());
    assert!(!DbError::not_found("Job with id x not found").is_retryable());
}

#[test]
fn test_error_http_status_round_trip() {
    for code in [403u16, 404, 409, 429, 500, 503] {
        assert_eq!(DbError::from_http_status(code, "").http_status(), Some(code));
    }
}

// =============================================================================
// Client Tests
// =============================================================================

#[tokio::test]
async fn test_get_job_sends_auth_headers_and_filter() {
    let (server, db) = setup().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/jobs"))
        .and(query_param("id", "eq.job-1"))
        .and(query_param("select", "*"))
        .and(header("apikey", "test-key"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "job-1", "ads_id": 5, "video_url": "videos/ad.mp4"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let job = db.get_job(&JobId::from("job-1")).await.unwrap().unwrap();
    assert_eq!(job.ads_id.unwrap().as_str(), "5");
    assert_eq!(job.video_url.as_deref(), Some("videos/ad.mp4"));
}

#[tokio::test]
async fn test_get_job_missing_is_none() {
    let (server, db) = setup().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    assert!(db.get_job(&JobId::from("nope")).await.unwrap().is_none());

    let err = db.get_job_video_location(&JobId::from("nope")).await.unwrap_err();
    assert_eq!(err.to_string(), "Job with id nope not found");
}

#[tokio::test]
async fn test_get_ad_for_job() {
    let (server, db) = setup().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/jobs"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": "job-1", "ads_id": "ad-9"}])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/ads"))
        .and(query_param("id", "eq.ad-9"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": "ad-9", "description": "A dog on a beach"}])),
        )
        .mount(&server)
        .await;

    let ad = db.get_ad_for_job(&JobId::from("job-1")).await.unwrap();
    assert_eq!(ad.description_or_empty(), "A dog on a beach");
}

#[tokio::test]
async fn test_get_ad_for_job_without_ad() {
    let (server, db) = setup().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/jobs"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": "job-1", "ads_id": null}])),
        )
        .mount(&server)
        .await;

    let err = db.get_ad_for_job(&JobId::from("job-1")).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "No ad associated with job job-1");
}

#[tokio::test]
async fn test_update_ad_description_patches_linked_ad() {
    let (server, db) = setup().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/jobs"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": "job-1", "ads_id": "ad-9"}])),
        )
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/ads"))
        .and(query_param("id", "eq.ad-9"))
        .and(header("prefer", "return=representation"))
        .and(body_partial_json(json!({"description": "Summary: upbeat"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": "ad-9", "description": "Summary: upbeat"}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let ad_id = db
        .update_ad_description(&JobId::from("job-1"), "Summary: upbeat")
        .await
        .unwrap();
    assert_eq!(ad_id.as_str(), "ad-9");
}

#[tokio::test]
async fn test_upsert_persona_inserts_when_absent() {
    let (server, db) = setup().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/persona"))
        .and(query_param("job_id", "eq.job-1"))
        .and(query_param("linkedin_url", "eq.https://linkedin.com/in/jdoe"))
        .and(query_param("select", "id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/persona"))
        .and(body_partial_json(json!({"job_id": "job-1", "name": "Jordan Doe"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([persona_row(11)])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/persona"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let saved = db.upsert_persona(&new_persona()).await.unwrap();
    assert_eq!(saved.id, PersonaId::from("11"));
}

#[tokio::test]
async fn test_upsert_persona_updates_existing_row() {
    let (server, db) = setup().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/persona"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 4}])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/persona"))
        .and(query_param("id", "eq.4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([persona_row(4)])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/persona"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let saved = db.upsert_persona(&new_persona()).await.unwrap();
    assert_eq!(saved.id.as_str(), "4");
}

#[tokio::test]
async fn test_insert_persona_response_and_mark_synced() {
    let (server, db) = setup().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/persona_responses"))
        .and(header("prefer", "return=minimal"))
        .and(body_partial_json(json!({
            "job_id": "job-1",
            "persona_id": "4",
            "conversation": {"prompt": "p", "response": "r"}
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/jobs"))
        .and(query_param("id", "eq.job-1"))
        .and(body_partial_json(json!({"personas_synced_at": "2026-01-02T03:04:05Z"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    db.insert_persona_response(&NewPersonaResponse {
        job_id: JobId::from("job-1"),
        persona_id: PersonaId::from("4"),
        conversation: Conversation {
            prompt: "p".into(),
            response: "r".into(),
        },
    })
    .await
    .unwrap();

    let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
    db.mark_personas_synced(&JobId::from("job-1"), at).await.unwrap();
}

#[tokio::test]
async fn test_retries_server_error_then_succeeds() {
    let (server, db) = setup().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/persona"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/persona"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([persona_row(1), persona_row(2)])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let personas = db.list_personas(&JobId::from("job-1")).await.unwrap();
    assert_eq!(personas.len(), 2);
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let (server, db) = setup().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/persona"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad filter"))
        .expect(1)
        .mount(&server)
        .await;

    let err = db.list_personas(&JobId::from("job-1")).await.unwrap_err();
    assert!(matches!(err, DbError::RequestFailed(ref msg) if msg.contains("bad filter")));
}

#[test]
fn test_client_rejects_invalid_key() {
    let config = DbConfig::new("https://abc.supabase.co/", "key");
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert!(SupabaseDb::new(config).is_ok());

    assert!(SupabaseDb::new(DbConfig::new("https://abc.supabase.co", "bad\nkey")).is_err());
}
