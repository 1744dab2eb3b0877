//! Synthetic persona reactions to an ad.

use std::sync::Arc;

use adtest_db::AdStore;
use adtest_models::{
    Conversation, JobId, NewPersonaResponse, Persona, PersonaResponseResult,
    PersonaResponsesSummary,
};
use adtest_vendors::LlmClient;
use futures::future::join_all;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::metrics;

/// Asks every persona of a job how the job's ad makes them feel.
#[derive(Clone)]
pub struct PersonaResponseService {
    db: Arc<dyn AdStore>,
    llm: Arc<dyn LlmClient>,
}

impl PersonaResponseService {
    pub fn new(db: Arc<dyn AdStore>, llm: Arc<dyn LlmClient>) -> Self {
        Self { db, llm }
    }

    /// Generate and store one reaction per persona, all concurrently.
    ///
    /// A persona whose completion or insert fails is counted as failed and
    /// left out of `results`; it never fails the whole request.
    pub async fn generate(&self, job_id: &JobId) -> ApiResult<PersonaResponsesSummary> {
        let ad = self.db.get_ad_for_job(job_id).await?;
        let ad_description = ad.description_or_empty();

        let personas = self.db.list_personas(job_id).await?;
        if personas.is_empty() {
            return Err(ApiError::not_found(format!("No personas found for job {}", job_id)));
        }

        let results = join_all(
            personas
                .iter()
                .map(|persona| self.respond(job_id, persona, ad_description)),
        )
        .await;

        let summary = PersonaResponsesSummary::from_results(job_id.clone(), results);
        info!(
            job_id = %job_id,
            total = summary.total_personas,
            successful = summary.successful_responses,
            failed = summary.failed_responses,
            "Persona responses generated"
        );
        Ok(summary)
    }

    async fn respond(
        &self,
        job_id: &JobId,
        persona: &Persona,
        ad_description: &str,
    ) -> PersonaResponseResult {
        let outcome = self.respond_inner(job_id, persona, ad_description).await;
        metrics::record_persona_response(outcome.is_ok());

        match outcome {
            Ok(response) => PersonaResponseResult {
                persona_id: persona.id.clone(),
                success: true,
                response: Some(response),
                error: None,
            },
            Err(e) => {
                warn!(persona_id = %persona.id, error = %e, "Persona response failed");
                PersonaResponseResult {
                    persona_id: persona.id.clone(),
                    success: false,
                    response: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    async fn respond_inner(
        &self,
        job_id: &JobId,
        persona: &Persona,
        ad_description: &str,
    ) -> ApiResult<String> {
        let prompt = persona.reaction_prompt(ad_description);
        let response = self.llm.complete(&prompt).await?;

        let record = NewPersonaResponse {
            job_id: job_id.clone(),
            persona_id: persona.id.clone(),
            conversation: Conversation {
                prompt,
                response: response.clone(),
            },
        };
        self.db.insert_persona_response(&record).await?;

        Ok(response)
    }
}
