//! Vapi outbound voice calls.

use adtest_models::{CallStatus, CallTarget};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

#[cfg(test)]
use mockall::automock;

use crate::config::VapiConfig;
use crate::error::{VendorError, VendorResult};
use crate::http::{build_client, send_json};

const VENDOR: &str = "Vapi";

/// Call snapshot as returned by the vendor.
#[derive(Debug, Clone, PartialEq)]
pub struct CallDetails {
    pub id: String,
    /// Raw status string, `unknown` when absent
    pub status: String,
    /// Full call object
    pub raw: Value,
}

impl CallDetails {
    pub fn call_status(&self) -> CallStatus {
        serde_json::from_value(Value::String(self.status.clone())).unwrap_or(CallStatus::Unknown)
    }
}

#[derive(Deserialize)]
struct CreatedCall {
    #[serde(default)]
    id: String,
}

/// Outbound voice calls.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VoiceCaller: Send + Sync {
    /// Place a call; returns the call id.
    async fn create_call<'a>(
        &self,
        target: &CallTarget,
        customer_name: Option<&'a str>,
    ) -> VendorResult<String>;

    async fn get_call(&self, call_id: &str) -> VendorResult<CallDetails>;
}

/// Vapi API client.
#[derive(Clone)]
pub struct VapiClient {
    http: Client,
    config: VapiConfig,
}

impl VapiClient {
    pub fn new(config: VapiConfig) -> VendorResult<Self> {
        Ok(Self {
            http: build_client(config.timeout)?,
            config,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

fn call_payload(target: &CallTarget, customer_name: Option<&str>) -> Value {
    let mut customer = json!({ "number": target.customer_number });
    if let Some(name) = customer_name.filter(|n| !n.is_empty()) {
        customer["name"] = json!(name);
    }
    json!({
        "assistantId": target.assistant_id,
        "phoneNumberId": target.phone_number_id,
        "customer": customer,
    })
}

#[async_trait]
impl VoiceCaller for VapiClient {
    async fn create_call<'a>(
        &self,
        target: &CallTarget,
        customer_name: Option<&'a str>,
    ) -> VendorResult<String> {
        info!(
            customer_number = %target.customer_number,
            assistant_id = %target.assistant_id,
            "Creating call"
        );

        let created: CreatedCall = send_json(
            VENDOR,
            "create_call",
            self.http
                .post(self.url("/call"))
                .bearer_auth(&self.config.token)
                .json(&call_payload(target, customer_name)),
        )
        .await?;

        if created.id.is_empty() {
            return Err(VendorError::invalid_response(VENDOR, "call created without an id"));
        }

        info!(call_id = %created.id, "Call created");
        Ok(created.id)
    }

    async fn get_call(&self, call_id: &str) -> VendorResult<CallDetails> {
        let raw: Value = send_json(
            VENDOR,
            "get_call",
            self.http
                .get(self.url(&format!("/call/{}", call_id)))
                .bearer_auth(&self.config.token),
        )
        .await?;

        let status = raw
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();

        Ok(CallDetails {
            id: call_id.to_string(),
            status,
            raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn target() -> CallTarget {
        CallTarget {
            assistant_id: "asst_1".into(),
            phone_number_id: "phone_1".into(),
            customer_number: "+15550100".into(),
        }
    }

    fn client(server: &MockServer) -> VapiClient {
        VapiClient::new(VapiConfig {
            base_url: server.uri(),
            ..VapiConfig::new("vapi-token", target())
        })
        .unwrap()
    }

    #[test]
    fn test_call_payload_omits_empty_name() {
        let payload = call_payload(&target(), None);
        assert!(payload["customer"].get("name").is_none());
        assert_eq!(payload["assistantId"], "asst_1");

        let named = call_payload(&target(), Some("Sam"));
        assert_eq!(named["customer"]["name"], "Sam");
        assert!(call_payload(&target(), Some(""))["customer"].get("name").is_none());
    }

    #[tokio::test]
    async fn test_create_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/call"))
            .and(header("authorization", "Bearer vapi-token"))
            .and(body_json(json!({
                "assistantId": "asst_1",
                "phoneNumberId": "phone_1",
                "customer": {"number": "+15550100", "name": "Sam"}
            })))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"id": "call_1", "status": "queued"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server).create_call(&target(), Some("Sam")).await.unwrap();
        assert_eq!(id, "call_1");
    }

    #[tokio::test]
    async fn test_get_call_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/call/call_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "call_1",
                "status": "in-progress",
                "type": "outboundPhoneCall"
            })))
            .mount(&server)
            .await;

        let details = client(&server).get_call("call_1").await.unwrap();
        assert_eq!(details.status, "in-progress");
        assert_eq!(details.call_status(), CallStatus::InProgress);
        assert_eq!(details.raw["type"], "outboundPhoneCall");
    }

    #[tokio::test]
    async fn test_vendor_status_is_preserved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404).set_body_string("{\"message\":\"Call not found\"}"),
            )
            .mount(&server)
            .await;

        let err = client(&server).get_call("missing").await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.to_string(), "Vapi API error: {\"message\":\"Call not found\"}");
    }
}
