//! Exa websets: people matching a natural-language query.

use adtest_models::{WebsetItem, WebsetStatus};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

#[cfg(test)]
use mockall::automock;

use crate::config::ExaConfig;
use crate::error::{VendorError, VendorResult};
use crate::http::{build_client, send_json};

const VENDOR: &str = "Exa";

/// Webset snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Webset {
    #[serde(default)]
    pub id: String,
    #[serde(default = "unknown_status")]
    pub status: WebsetStatus,
}

fn unknown_status() -> WebsetStatus {
    WebsetStatus::Unknown
}

#[derive(Deserialize)]
struct ItemsPage {
    #[serde(default)]
    data: Vec<WebsetItem>,
}

/// Entity search over the web.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PersonaSearch: Send + Sync {
    /// Start a webset search; returns the new webset.
    async fn create_webset(&self, query: &str, count: u32, entity_type: &str)
        -> VendorResult<Webset>;

    async fn get_webset(&self, webset_id: &str) -> VendorResult<Webset>;

    /// Items found so far.
    async fn list_items(&self, webset_id: &str) -> VendorResult<Vec<WebsetItem>>;
}

/// Exa API client.
#[derive(Clone)]
pub struct ExaClient {
    http: Client,
    config: ExaConfig,
}

impl ExaClient {
    pub fn new(config: ExaConfig) -> VendorResult<Self> {
        Ok(Self {
            http: build_client(config.timeout)?,
            config,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/websets/v0/websets{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl PersonaSearch for ExaClient {
    async fn create_webset(
        &self,
        query: &str,
        count: u32,
        entity_type: &str,
    ) -> VendorResult<Webset> {
        let payload = json!({
            "search": {
                "query": query,
                "count": count,
                "entity": { "type": entity_type }
            }
        });

        let webset: Webset = send_json(
            VENDOR,
            "create_webset",
            self.http
                .post(self.url(""))
                .header("x-api-key", &self.config.api_key)
                .json(&payload),
        )
        .await?;

        if webset.id.is_empty() {
            return Err(VendorError::invalid_response(VENDOR, "No webset ID returned from Exa API"));
        }

        info!(webset_id = %webset.id, count, entity_type, "Webset created");
        Ok(webset)
    }

    async fn get_webset(&self, webset_id: &str) -> VendorResult<Webset> {
        send_json(
            VENDOR,
            "get_webset",
            self.http
                .get(self.url(&format!("/{}", webset_id)))
                .header("x-api-key", &self.config.api_key),
        )
        .await
    }

    async fn list_items(&self, webset_id: &str) -> VendorResult<Vec<WebsetItem>> {
        let page: ItemsPage = send_json(
            VENDOR,
            "list_items",
            self.http
                .get(self.url(&format!("/{}/items", webset_id)))
                .header("x-api-key", &self.config.api_key),
        )
        .await?;
        Ok(page.data)
    }
}
