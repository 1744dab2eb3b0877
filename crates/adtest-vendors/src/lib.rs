//! Third-party API clients used by the AdTest backend.
//!
//! Each vendor capability is a trait with one reqwest-backed client:
//! - [`PersonaSearch`]: Exa websets (people matching a sentence)
//! - [`VideoIndexer`]: TwelveLabs indexing and structured analysis
//! - [`LlmClient`]: Anthropic messages API
//! - [`VoiceCaller`]: Vapi outbound calls
//!
//! Long-running vendor tasks are awaited with [`poll_until_terminal`].

pub mod anthropic;
pub mod config;
pub mod error;
pub mod exa;
mod http;
pub mod metrics;
pub mod poll;
pub mod twelvelabs;
pub mod vapi;

pub use anthropic::{AnthropicClient, LlmClient};
pub use config::{AnthropicConfig, ExaConfig, TwelveLabsConfig, VapiConfig, VendorConfig};
pub use error::{VendorError, VendorResult};
pub use exa::{ExaClient, PersonaSearch, Webset};
pub use poll::{poll_until_terminal, PollConfig};
pub use twelvelabs::{upload_and_index, IndexTask, TwelveLabsClient, VideoIndexer};
pub use vapi::{CallDetails, VapiClient, VoiceCaller};
