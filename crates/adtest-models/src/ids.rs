//! Identifiers for rows in the relational store.
//!
//! Supabase tables may use either `uuid` or `bigint` primary keys, so every
//! identifier deserializes from a JSON string or a JSON number and is kept
//! as a string internally.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
        #[serde(transparent)]
        pub struct $name(
            #[serde(deserialize_with = "deserialize_id")]
            #[schemars(with = "String")]
            pub String,
        );

        impl $name {
            /// Create from an existing string.
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Get the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Identifier of an ad-testing job (`jobs.id`).
    JobId
);
string_id!(
    /// Identifier of an ad (`ads.id`).
    AdId
);
string_id!(
    /// Identifier of a persona (`persona.id`).
    PersonaId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_from_string_or_number() {
        let from_text: JobId = serde_json::from_str("\"job-1\"").unwrap();
        assert_eq!(from_text.as_str(), "job-1");

        let from_number: PersonaId = serde_json::from_str("42").unwrap();
        assert_eq!(from_number.as_str(), "42");
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = AdId::from("ad-7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"ad-7\"");
        assert_eq!(id.to_string(), "ad-7");
    }
}
