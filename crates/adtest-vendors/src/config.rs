//! Vendor credentials and endpoints.
//!
//! Every key is required at startup; base URLs can be overridden so tests
//! and staging can point clients elsewhere.

use std::time::Duration;

use adtest_models::CallTarget;

use crate::error::{VendorError, VendorResult};

fn required(key: &str) -> VendorResult<String> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(VendorError::not_configured(format!(
            "{} not found in environment variables",
            key
        ))),
    }
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    optional(key).unwrap_or_else(|| default.to_string())
}

/// Exa websets API.
#[derive(Debug, Clone)]
pub struct ExaConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl ExaConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.exa.ai".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_env() -> VendorResult<Self> {
        Ok(Self {
            base_url: env_or("EXA_BASE_URL", "https://api.exa.ai"),
            ..Self::new(required("EXA_API_KEY")?)
        })
    }
}

/// TwelveLabs indexing and analysis API.
#[derive(Debug, Clone)]
pub struct TwelveLabsConfig {
    pub api_key: String,
    pub base_url: String,
    /// Index to reuse when it still exists
    pub index_id: Option<String>,
    /// Index looked up (or created) by name otherwise
    pub index_name: String,
    pub timeout: Duration,
    /// Timeout for the multipart video upload
    pub upload_timeout: Duration,
}

impl TwelveLabsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.twelvelabs.io/v1.3".to_string(),
            index_id: None,
            index_name: "adtest-creative-ads".to_string(),
            timeout: Duration::from_secs(120),
            upload_timeout: Duration::from_secs(1800),
        }
    }

    pub fn from_env() -> VendorResult<Self> {
        let defaults = Self::new(required("TWELVELABS_API_KEY")?);
        Ok(Self {
            base_url: env_or("TWELVELABS_BASE_URL", &defaults.base_url),
            index_id: optional("TWELVELABS_INDEX_ID"),
            index_name: env_or("TWELVELABS_INDEX_NAME", &defaults.index_name),
            ..defaults
        })
    }
}

/// Anthropic messages API.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.anthropic.com".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 1024,
            timeout: Duration::from_secs(120),
        }
    }

    pub fn from_env() -> VendorResult<Self> {
        let defaults = Self::new(required("ANTHROPIC_API_KEY")?);
        Ok(Self {
            base_url: env_or("ANTHROPIC_BASE_URL", &defaults.base_url),
            model: env_or("ANTHROPIC_MODEL", &defaults.model),
            ..defaults
        })
    }
}

/// Vapi voice call API and the preset call targets.
#[derive(Debug, Clone)]
pub struct VapiConfig {
    pub token: String,
    pub base_url: String,
    /// Target used by the default and simple presets, and for fields a
    /// custom call leaves out
    pub default_target: CallTarget,
    pub male_assistant_id: Option<String>,
    pub female_assistant_id: Option<String>,
    pub timeout: Duration,
}

impl VapiConfig {
    pub fn new(token: impl Into<String>, default_target: CallTarget) -> Self {
        Self {
            token: token.into(),
            base_url: "https://api.vapi.ai".to_string(),
            default_target,
            male_assistant_id: None,
            female_assistant_id: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_env() -> VendorResult<Self> {
        let target = CallTarget {
            assistant_id: required("VAPI_ASSISTANT_ID")?,
            phone_number_id: required("VAPI_PHONE_NUMBER_ID")?,
            customer_number: required("VAPI_CUSTOMER_NUMBER")?,
        };
        Ok(Self {
            base_url: env_or("VAPI_BASE_URL", "https://api.vapi.ai"),
            male_assistant_id: optional("VAPI_MALE_ASSISTANT_ID"),
            female_assistant_id: optional("VAPI_FEMALE_ASSISTANT_ID"),
            ..Self::new(required("VAPI_TOKEN")?, target)
        })
    }
}

/// All vendor configuration, loaded together at startup.
#[derive(Debug, Clone)]
pub struct VendorConfig {
    pub exa: ExaConfig,
    pub twelvelabs: TwelveLabsConfig,
    pub anthropic: AnthropicConfig,
    pub vapi: VapiConfig,
}

impl VendorConfig {
    pub fn from_env() -> VendorResult<Self> {
        Ok(Self {
            exa: ExaConfig::from_env()?,
            twelvelabs: TwelveLabsConfig::from_env()?,
            anthropic: AnthropicConfig::from_env()?,
            vapi: VapiConfig::from_env()?,
        })
    }
}
