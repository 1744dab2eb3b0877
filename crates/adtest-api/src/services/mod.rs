//! Business logic services.

pub mod persona_responses;
pub mod persona_search;
pub mod video_analysis;

pub use persona_responses::PersonaResponseService;
pub use persona_search::PersonaSearchService;
pub use video_analysis::{VideoAnalysis, VideoAnalysisService};
