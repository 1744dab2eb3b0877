//! Shared data models for the AdTest backend.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs, ads and personas stored in the relational store
//! - Video compliance metadata, issues and transform plans
//! - Video ingestion policy constants
//! - HTTP request/response bodies
//! - Vendor task statuses used by polling loops

pub mod api;
pub mod compliance;
pub mod ids;
pub mod job;
pub mod persona;
pub mod vendor;

// Re-export common types
pub use api::{
    CallRequest, CallResponse, CallStatusResponse, CallTarget, PersonaResponseResult,
    PersonaResponsesSummary, PresetCallResponse, SearchRequest, SearchResponse,
    VideoAnalysisRequest, VideoAnalysisResponse,
};
pub use compliance::{
    ComplianceIssue, IssueKind, MediaMetadata, PipelineStage, TransformPlan, ValidationResult,
};
pub use ids::{AdId, JobId, PersonaId};
pub use job::{Ad, Job};
pub use persona::{Conversation, NewPersona, NewPersonaResponse, Persona};
pub use vendor::{
    AdAnalysis, CallStatus, CreativeElements, IndexTaskStatus, WebsetItem, WebsetItemProperties,
    WebsetPerson, WebsetStatus,
};
