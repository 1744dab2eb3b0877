//! Background persona search.
//!
//! A search sentence becomes an entity-search webset. While the webset runs,
//! every poll saves the items found so far as personas of the job, so a
//! client reading the persona table sees results arrive incrementally. Once
//! the webset is terminal the job is stamped with `personas_synced_at`.

use std::sync::Arc;

use adtest_db::AdStore;
use adtest_models::{JobId, WebsetItem, WebsetStatus};
use adtest_vendors::{poll_until_terminal, PersonaSearch, PollConfig, VendorResult, Webset};
use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn, Instrument};

use crate::error::ApiResult;
use crate::metrics;

/// Number of people requested per search.
pub const SEARCH_RESULT_COUNT: u32 = 10;

/// Entity type requested from the search vendor.
pub const SEARCH_ENTITY_TYPE: &str = "person";

/// Runs persona searches for jobs.
#[derive(Clone)]
pub struct PersonaSearchService {
    db: Arc<dyn AdStore>,
    search: Arc<dyn PersonaSearch>,
}

impl PersonaSearchService {
    pub fn new(db: Arc<dyn AdStore>, search: Arc<dyn PersonaSearch>) -> Self {
        Self { db, search }
    }

    /// Run the search in the background. Failures are logged only.
    pub fn spawn(&self, job_id: JobId, sentence: String) -> JoinHandle<()> {
        let service = self.clone();
        let span = tracing::info_span!("persona_search", job_id = %job_id);

        tokio::spawn(
            async move {
                match service.run(&job_id, &sentence).await {
                    Ok(saved) => {
                        metrics::record_persona_search("completed");
                        info!(saved, "Persona search finished");
                    }
                    Err(e) => {
                        metrics::record_persona_search("failed");
                        error!(error = %e, "Persona search failed");
                    }
                }
            }
            .instrument(span),
        )
    }

    /// Search, save personas while polling, then mark the job synced.
    ///
    /// Returns the number of items in the final webset snapshot.
    pub async fn run(&self, job_id: &JobId, sentence: &str) -> ApiResult<usize> {
        let webset = self
            .search
            .create_webset(sentence, SEARCH_RESULT_COUNT, SEARCH_ENTITY_TYPE)
            .await?;
        info!(webset_id = %webset.id, "Webset created");

        let webset_id = webset.id.as_str();
        poll_until_terminal(
            &PollConfig::webset(webset_id),
            move || self.poll_once(job_id, webset_id, sentence),
            |w: &Webset| w.status,
            WebsetStatus::TERMINAL,
        )
        .await?;

        // the last poll may have raced the final items
        let items = self.search.list_items(webset_id).await?;
        self.save_personas(job_id, &items, sentence).await;

        self.db.mark_personas_synced(job_id, Utc::now()).await?;
        Ok(items.len())
    }

    /// One poll: fetch the webset status and save whatever items exist.
    async fn poll_once(
        &self,
        job_id: &JobId,
        webset_id: &str,
        sentence: &str,
    ) -> VendorResult<Webset> {
        let webset = self.search.get_webset(webset_id).await?;
        debug!(status = %webset.status, "Polling webset");

        match self.search.list_items(webset_id).await {
            Ok(items) if !items.is_empty() => {
                self.save_personas(job_id, &items, sentence).await;
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Could not fetch webset items during polling"),
        }

        Ok(webset)
    }

    /// Upsert each item as a persona. A failed item does not stop the rest.
    async fn save_personas(&self, job_id: &JobId, items: &[WebsetItem], prompt: &str) -> usize {
        let mut saved = 0;
        for item in items {
            let persona = item.to_new_persona(job_id, prompt);
            match self.db.upsert_persona(&persona).await {
                Ok(_) => {
                    saved += 1;
                    debug!(name = item.display_name(), "Saved persona");
                }
                Err(e) => warn!(name = item.display_name(), error = %e, "Error saving persona"),
            }
        }
        metrics::record_personas_saved(saved);
        saved
    }
}
