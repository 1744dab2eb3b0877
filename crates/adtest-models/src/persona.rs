//! Persona records and the synthetic reaction prompt.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{JobId, PersonaId};

/// Row of the `persona` table.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Persona {
    pub id: PersonaId,
    pub job_id: JobId,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Search sentence that produced this persona
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Persona record written by the search sync (no id yet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NewPersona {
    pub job_id: JobId,
    pub linkedin_url: String,
    pub name: String,
    pub location: String,
    pub position: String,
    pub description: String,
    pub prompt: String,
}

/// Prompt/response pair stored in `persona_responses.conversation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Conversation {
    pub prompt: String,
    pub response: String,
}

/// Row inserted into the `persona_responses` table.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NewPersonaResponse {
    pub job_id: JobId,
    pub persona_id: PersonaId,
    pub conversation: Conversation,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl Persona {
    /// Comma-separated description built from whichever columns are set.
    pub fn describe(&self) -> String {
        let fields = [
            ("Name", &self.name),
            ("Position", &self.position),
            ("Location", &self.location),
            ("Description", &self.description),
            ("LinkedIn", &self.linkedin_url),
        ];

        fields
            .iter()
            .filter_map(|(label, value)| non_empty(value).map(|v| format!("{}: {}", label, v)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Prompt asking the LLM to react to an ad as this persona.
    pub fn reaction_prompt(&self, ad_description: &str) -> String {
        format!(
            "You are {}. You are viewing this ad: {}. How does it make you feel? Describe your reaction to this ad.",
            self.describe(),
            ad_description
        )
    }
}
