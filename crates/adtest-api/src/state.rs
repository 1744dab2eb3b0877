//! Application state.

use std::sync::Arc;

use adtest_db::{AdStore, DbConfig, SupabaseDb};
use adtest_media::CompliancePipeline;
use adtest_models::CallTarget;
use adtest_storage::{BlobStore, StorageConfig, SupabaseStorage};
use adtest_vendors::{
    AnthropicClient, ExaClient, LlmClient, PersonaSearch, TwelveLabsClient, VapiClient, VapiConfig,
    VendorConfig, VideoIndexer, VoiceCaller,
};
use tracing::info;

use crate::config::ApiConfig;
use crate::services::{PersonaResponseService, PersonaSearchService, VideoAnalysisService};

/// Call targets the preset endpoints dial.
#[derive(Debug, Clone)]
pub struct CallPresets {
    pub default_target: CallTarget,
    pub male_assistant_id: Option<String>,
    pub female_assistant_id: Option<String>,
}

impl CallPresets {
    /// Default target with a different assistant.
    pub fn with_assistant(&self, assistant_id: &str) -> CallTarget {
        CallTarget {
            assistant_id: assistant_id.to_string(),
            ..self.default_target.clone()
        }
    }
}

impl From<&VapiConfig> for CallPresets {
    fn from(config: &VapiConfig) -> Self {
        Self {
            default_target: config.default_target.clone(),
            male_assistant_id: config.male_assistant_id.clone(),
            female_assistant_id: config.female_assistant_id.clone(),
        }
    }
}

/// Video index the analysis endpoint uploads into.
#[derive(Debug, Clone)]
pub struct IndexSettings {
    pub name: String,
    /// Index to reuse when it still exists
    pub configured_id: Option<String>,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub db: Arc<dyn AdStore>,
    pub storage: Arc<dyn BlobStore>,
    pub pipeline: Arc<CompliancePipeline>,
    pub search: Arc<dyn PersonaSearch>,
    pub indexer: Arc<dyn VideoIndexer>,
    pub llm: Arc<dyn LlmClient>,
    pub caller: Arc<dyn VoiceCaller>,
    pub calls: CallPresets,
    pub index: IndexSettings,
}

impl AppState {
    /// Create new application state, building every client from the environment.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let db = SupabaseDb::new(DbConfig::from_env()?)?;
        info!("Connected to Supabase REST API");

        let storage = SupabaseStorage::new(StorageConfig::from_env()?);
        info!("Initialized storage client");

        let vendors = VendorConfig::from_env()?;
        let calls = CallPresets::from(&vendors.vapi);
        let index = IndexSettings {
            name: vendors.twelvelabs.index_name.clone(),
            configured_id: vendors.twelvelabs.index_id.clone(),
        };

        let search = ExaClient::new(vendors.exa)?;
        let indexer = TwelveLabsClient::new(vendors.twelvelabs)?;
        let llm = AnthropicClient::new(vendors.anthropic)?;
        let caller = VapiClient::new(vendors.vapi)?;
        info!("Initialized vendor clients");

        let pipeline = CompliancePipeline::from_config(&config.pipeline);

        Ok(Self {
            config,
            db: Arc::new(db),
            storage: Arc::new(storage),
            pipeline: Arc::new(pipeline),
            search: Arc::new(search),
            indexer: Arc::new(indexer),
            llm: Arc::new(llm),
            caller: Arc::new(caller),
            calls,
            index,
        })
    }

    pub fn persona_search(&self) -> PersonaSearchService {
        PersonaSearchService::new(self.db.clone(), self.search.clone())
    }

    pub fn video_analysis(&self) -> VideoAnalysisService {
        VideoAnalysisService::new(
            self.db.clone(),
            self.storage.clone(),
            self.pipeline.clone(),
            self.indexer.clone(),
            self.index.clone(),
        )
    }

    pub fn persona_responses(&self) -> PersonaResponseService {
        PersonaResponseService::new(self.db.clone(), self.llm.clone())
    }
}
