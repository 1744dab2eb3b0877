//! Video compliance pipeline over the FFmpeg CLI tools.
//!
//! This crate provides:
//! - FFprobe metadata extraction behind the [`MediaProber`] trait
//! - Pure policy validation, closest-ratio resolution and transform planning
//! - FFmpeg transform execution behind the [`MediaTranscoder`] trait
//! - The [`CompliancePipeline`] orchestrator with Drop-based temp file cleanup

pub mod command;
pub mod compliance;
pub mod error;
pub mod fs_utils;
pub mod metrics;
pub mod pipeline;
pub mod probe;
pub mod transform;

pub use command::{check_tool, FfmpegCommand};
pub use compliance::{build_plan, closest_ratio, scaled_resolution, validate};
pub use error::{MediaError, MediaResult};
pub use fs_utils::{materialize_input, ProcessedVideo};
pub use pipeline::{CompliancePipeline, PipelineConfig, PipelineLogger};
pub use probe::{parse_probe_output, FfprobeProber, MediaProber};
pub use transform::{build_transform_command, FfmpegTranscoder, MediaTranscoder};
