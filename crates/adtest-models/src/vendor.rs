//! Vendor-side task statuses and payloads.
//!
//! Each long-running vendor task exposes a status string; the enums here
//! close those sets and say which values are terminal so that polling
//! loops can stop.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{JobId, NewPersona};

/// Status of an entity-search webset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WebsetStatus {
    Pending,
    Running,
    Idle,
    Paused,
    Completed,
    #[serde(other)]
    Unknown,
}

impl WebsetStatus {
    /// Statuses after which the webset produces no new items.
    pub const TERMINAL: &'static [WebsetStatus] =
        &[WebsetStatus::Paused, WebsetStatus::Idle, WebsetStatus::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            WebsetStatus::Pending => "pending",
            WebsetStatus::Running => "running",
            WebsetStatus::Idle => "idle",
            WebsetStatus::Paused => "paused",
            WebsetStatus::Completed => "completed",
            WebsetStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for WebsetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a video indexing task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IndexTaskStatus {
    Validating,
    Pending,
    Queued,
    Indexing,
    Ready,
    Failed,
    #[serde(other)]
    Unknown,
}

impl IndexTaskStatus {
    pub const TERMINAL: &'static [IndexTaskStatus] =
        &[IndexTaskStatus::Ready, IndexTaskStatus::Failed];

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexTaskStatus::Validating => "validating",
            IndexTaskStatus::Pending => "pending",
            IndexTaskStatus::Queued => "queued",
            IndexTaskStatus::Indexing => "indexing",
            IndexTaskStatus::Ready => "ready",
            IndexTaskStatus::Failed => "failed",
            IndexTaskStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for IndexTaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of an outbound voice call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum CallStatus {
    Scheduled,
    Queued,
    Ringing,
    InProgress,
    Forwarding,
    Ended,
    #[serde(other)]
    Unknown,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Scheduled => "scheduled",
            CallStatus::Queued => "queued",
            CallStatus::Ringing => "ringing",
            CallStatus::InProgress => "in-progress",
            CallStatus::Forwarding => "forwarding",
            CallStatus::Ended => "ended",
            CallStatus::Unknown => "unknown",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CallStatus::Ended)
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Item returned by a webset (one matched person).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WebsetItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub properties: WebsetItemProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct WebsetItemProperties {
    /// Profile URL of the matched person
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub person: Option<WebsetPerson>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct WebsetPerson {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

impl WebsetItem {
    /// Map this item to a persona row for the given job and search prompt.
    pub fn to_new_persona(&self, job_id: &JobId, prompt: &str) -> NewPersona {
        let props = &self.properties;
        let person = props.person.clone().unwrap_or_default();
        NewPersona {
            job_id: job_id.clone(),
            linkedin_url: props.url.clone().unwrap_or_default(),
            name: person.name.unwrap_or_default(),
            location: person.location.unwrap_or_default(),
            position: person.position.unwrap_or_default(),
            description: props.description.clone().unwrap_or_default(),
            prompt: prompt.to_string(),
        }
    }

    /// Display name for logs.
    pub fn display_name(&self) -> &str {
        self.properties
            .person
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .unwrap_or("Unknown")
    }
}

/// Structured analysis of an ad video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AdAnalysis {
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creative_elements: Option<CreativeElements>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvement_areas: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct CreativeElements {
    #[serde(default)]
    pub visual_style: Option<String>,
    #[serde(default)]
    pub audio_elements: Option<String>,
    #[serde(default)]
    pub emotional_tone: Option<String>,
    #[serde(default)]
    pub brand_presence: Option<String>,
    #[serde(default)]
    pub call_to_action: Option<String>,
}

impl AdAnalysis {
    /// Plain-text rendering stored as the ad description and quoted in
    /// persona reaction prompts.
    pub fn to_description(&self) -> String {
        let mut lines = vec![
            format!("Title: {}", self.title),
            format!("Summary: {}", self.summary),
        ];

        if !self.keywords.is_empty() {
            lines.push(format!("Keywords: {}", self.keywords.join(", ")));
        }

        if let Some(elements) = &self.creative_elements {
            let labeled = [
                ("Visual style", &elements.visual_style),
                ("Audio", &elements.audio_elements),
                ("Emotional tone", &elements.emotional_tone),
                ("Brand presence", &elements.brand_presence),
                ("Call to action", &elements.call_to_action),
            ];
            for (label, value) in labeled {
                if let Some(text) = value.as_deref().filter(|t| !t.is_empty()) {
                    lines.push(format!("{}: {}", label, text));
                }
            }
        }

        if !self.strengths.is_empty() {
            lines.push(format!("Strengths: {}", self.strengths.join("; ")));
        }
        if !self.improvement_areas.is_empty() {
            lines.push(format!("Improvement areas: {}", self.improvement_areas.join("; ")));
        }

        lines.join("\n")
    }
}
