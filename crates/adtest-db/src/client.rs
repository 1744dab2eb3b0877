//! Supabase PostgREST client.
//!
//! Every request carries the service key both as `apikey` and as a bearer
//! token, is retried per [`RetryConfig`], and is recorded in the request
//! metrics with its final status.

use std::time::{Duration, Instant};

use adtest_models::{Ad, AdId, Job, JobId, NewPersona, NewPersonaResponse, Persona, PersonaId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, info_span, Instrument};

use crate::error::{DbError, DbResult};
use crate::metrics::record_request;
use crate::retry::{with_retry, RetryConfig};
use crate::store::AdStore;

const PREFER: &str = "Prefer";
const RETURN_REPRESENTATION: &str = "return=representation";
const RETURN_MINIMAL: &str = "return=minimal";

// =============================================================================
// Configuration
// =============================================================================

/// Relational store configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Project URL (`https://<ref>.supabase.co`)
    pub url: String,
    /// Service key
    pub key: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub retry: RetryConfig,
}

impl DbConfig {
    pub fn new(url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key: key.into(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            retry: RetryConfig::default(),
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> DbResult<Self> {
        let url = std::env::var("SUPABASE_URL").unwrap_or_default();
        let key = std::env::var("SUPABASE_KEY").unwrap_or_default();
        if url.is_empty() || key.is_empty() {
            return Err(DbError::not_configured("SUPABASE_URL and SUPABASE_KEY must be set"));
        }

        let connect_timeout_secs: u64 = std::env::var("SUPABASE_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            retry: RetryConfig::from_env(),
            ..Self::new(url, key)
        })
    }
}

// =============================================================================
// Client
// =============================================================================

#[derive(Deserialize)]
struct IdRow {
    id: PersonaId,
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

/// Supabase REST client for the ad-testing tables.
#[derive(Clone)]
pub struct SupabaseDb {
    http: Client,
    rest_url: String,
    retry: RetryConfig,
}

impl SupabaseDb {
    pub fn new(config: DbConfig) -> DbResult<Self> {
        let invalid_key = |_| DbError::not_configured("SUPABASE_KEY is not a valid header value");
        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(&config.key).map_err(invalid_key)?);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.key)).map_err(invalid_key)?,
        );

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .default_headers(headers)
            .user_agent(concat!("adtest-db/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            rest_url: format!("{}/rest/v1", config.url.trim_end_matches('/')),
            retry: config.retry,
        })
    }

    pub fn from_env() -> DbResult<Self> {
        Self::new(DbConfig::from_env()?)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.rest_url, table)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        operation: &str,
        table: &str,
        columns: &str,
        filters: &[(&str, String)],
    ) -> DbResult<Vec<T>> {
        let url = self.table_url(table);
        let response = self
            .execute(operation, table, || {
                self.http.get(&url).query(&[("select", columns)]).query(filters)
            })
            .await?;
        let rows: Vec<T> = response.json().await?;
        debug!(operation = %operation, table = %table, rows = rows.len(), "Selected rows");
        Ok(rows)
    }

    async fn write<B>(
        &self,
        operation: &str,
        table: &str,
        method: Method,
        filters: &[(&str, String)],
        body: &B,
        prefer: &'static str,
    ) -> DbResult<Response>
    where
        B: Serialize + Sync + ?Sized,
    {
        let url = self.table_url(table);
        self.execute(operation, table, || {
            self.http
                .request(method.clone(), &url)
                .query(filters)
                .header(PREFER, prefer)
                .json(body)
        })
        .await
    }

    async fn require_job(&self, job_id: &JobId) -> DbResult<Job> {
        self.get_job(job_id)
            .await?
            .ok_or_else(|| DbError::not_found(format!("Job with id {} not found", job_id)))
    }

    async fn get_ad(&self, ad_id: &AdId) -> DbResult<Option<Ad>> {
        let rows: Vec<Ad> = self.select("get_ad", "ads", "*", &[("id", eq(ad_id))]).await?;
        Ok(rows.into_iter().next())
    }

    /// Send a request built fresh for every attempt and return the
    /// successful response.
    async fn execute<F>(&self, operation: &str, table: &str, build: F) -> DbResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let span = info_span!("db_request", operation = %operation, table = %table);
        let build = &build;

        let start = Instant::now();
        let result = with_retry(&self.retry, operation, move || async move {
            let response = build().send().await?;
            let status = response.status();
            if status.is_success() {
                Ok(response)
            } else {
                Err(Self::handle_error_response(status, response).await)
            }
        })
        .instrument(span)
        .await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(response) => response.status().as_u16(),
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    async fn handle_error_response(status: StatusCode, response: Response) -> DbError {
        let retry_after_ms = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| secs * 1000);
        let url = response.url().path().to_string();
        let body = response.text().await.unwrap_or_default();

        match DbError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body)) {
            DbError::RateLimited(default_ms) => {
                DbError::RateLimited(retry_after_ms.unwrap_or(default_ms))
            }
            other => other,
        }
    }
}

fn first_row<T>(rows: Vec<T>, what: &str) -> DbResult<T> {
    rows.into_iter()
        .next()
        .ok_or_else(|| DbError::invalid_response(format!("{} returned no rows", what)))
}

#[async_trait]
impl AdStore for SupabaseDb {
    async fn get_job(&self, job_id: &JobId) -> DbResult<Option<Job>> {
        let rows: Vec<Job> = self.select("get_job", "jobs", "*", &[("id", eq(job_id))]).await?;
        Ok(rows.into_iter().next())
    }

    async fn get_ad_for_job(&self, job_id: &JobId) -> DbResult<Ad> {
        let job = self.require_job(job_id).await?;
        let ads_id = job
            .ads_id
            .ok_or_else(|| DbError::not_found(format!("No ad associated with job {}", job_id)))?;

        self.get_ad(&ads_id)
            .await?
            .ok_or_else(|| DbError::not_found(format!("Ad with id {} not found", ads_id)))
    }

    async fn update_ad_description(&self, job_id: &JobId, description: &str) -> DbResult<AdId> {
        let job = self.require_job(job_id).await?;
        let ads_id = job
            .ads_id
            .ok_or_else(|| DbError::not_found(format!("No ad associated with job {}", job_id)))?;

        let response = self
            .write(
                "update_ad_description",
                "ads",
                Method::PATCH,
                &[("id", eq(&ads_id))],
                &json!({ "description": description }),
                RETURN_REPRESENTATION,
            )
            .await?;
        let updated: Vec<Ad> = response.json().await?;
        if updated.is_empty() {
            return Err(DbError::not_found(format!("Ad with id {} not found", ads_id)));
        }

        info!(
            job_id = %job_id,
            ads_id = %ads_id,
            chars = description.len(),
            "Ad description updated"
        );
        Ok(ads_id)
    }

    async fn list_personas(&self, job_id: &JobId) -> DbResult<Vec<Persona>> {
        self.select("list_personas", "persona", "*", &[("job_id", eq(job_id))])
            .await
    }

    async fn upsert_persona(&self, persona: &NewPersona) -> DbResult<Persona> {
        let existing: Vec<IdRow> = self
            .select(
                "find_persona",
                "persona",
                "id",
                &[
                    ("job_id", eq(&persona.job_id)),
                    ("linkedin_url", eq(&persona.linkedin_url)),
                ],
            )
            .await?;

        let response = match existing.into_iter().next() {
            Some(row) => {
                debug!(persona_id = %row.id, "Updating existing persona");
                self.write(
                    "update_persona",
                    "persona",
                    Method::PATCH,
                    &[("id", eq(&row.id))],
                    persona,
                    RETURN_REPRESENTATION,
                )
                .await?
            }
            None => {
                self.write(
                    "insert_persona",
                    "persona",
                    Method::POST,
                    &[],
                    persona,
                    RETURN_REPRESENTATION,
                )
                .await?
            }
        };

        let saved = first_row(response.json::<Vec<Persona>>().await?, "persona upsert")?;
        info!(
            job_id = %persona.job_id,
            persona_id = %saved.id,
            name = %persona.name,
            "Saved persona"
        );
        Ok(saved)
    }

    async fn insert_persona_response(&self, response: &NewPersonaResponse) -> DbResult<()> {
        self.write(
            "insert_persona_response",
            "persona_responses",
            Method::POST,
            &[],
            response,
            RETURN_MINIMAL,
        )
        .await?;
        Ok(())
    }

    async fn mark_personas_synced(&self, job_id: &JobId, at: DateTime<Utc>) -> DbResult<()> {
        self.write(
            "mark_personas_synced",
            "jobs",
            Method::PATCH,
            &[("id", eq(job_id))],
            &json!({ "personas_synced_at": at }),
            RETURN_MINIMAL,
        )
        .await?;
        info!(job_id = %job_id, synced_at = %at, "Personas marked synced");
        Ok(())
    }

    async fn get_job_video_location(&self, job_id: &JobId) -> DbResult<Option<String>> {
        let job = self.require_job(job_id).await?;
        Ok(job.video_url.filter(|url| !url.trim().is_empty()))
    }
}
