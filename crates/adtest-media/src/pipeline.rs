//! Compliance pipeline orchestration.
//!
//! One run walks `Probing -> Validating -> [Transforming -> Reprobing ->
//! Revalidating] -> Done`, ending early in `Rejected` when the video has an
//! issue no transform can fix, or in `Failed` when a tool step breaks.

use adtest_models::{MediaMetadata, PipelineStage};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempPath;
use tracing::{error, info, warn, Instrument, Span};

use crate::compliance::{build_plan, validate};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::{materialize_input, reserve_output_path, ProcessedVideo};
use crate::metrics;
use crate::probe::{FfprobeProber, MediaProber, DEFAULT_PROBE_TIMEOUT};
use crate::transform::{FfmpegTranscoder, MediaTranscoder, DEFAULT_TRANSFORM_TIMEOUT};

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory for temp media files
    pub work_dir: PathBuf,
    /// ffprobe binary name or path
    pub ffprobe_bin: String,
    /// ffmpeg binary name or path
    pub ffmpeg_bin: String,
    /// Timeout for a single probe
    pub probe_timeout: Duration,
    /// Timeout for a single transform
    pub transform_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir(),
            ffprobe_bin: "ffprobe".to_string(),
            ffmpeg_bin: "ffmpeg".to_string(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            transform_timeout: DEFAULT_TRANSFORM_TIMEOUT,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: std::env::var("MEDIA_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            ffprobe_bin: std::env::var("FFPROBE_PATH").unwrap_or(defaults.ffprobe_bin),
            ffmpeg_bin: std::env::var("FFMPEG_PATH").unwrap_or(defaults.ffmpeg_bin),
            probe_timeout: std::env::var("PROBE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.probe_timeout),
            transform_timeout: std::env::var("TRANSFORM_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.transform_timeout),
        }
    }
}

/// Structured stage logging for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineLogger {
    run_id: String,
}

impl PipelineLogger {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self { run_id: run_id.into() }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Log entry into a stage.
    pub fn stage(&self, stage: PipelineStage, message: &str) {
        info!(run_id = %self.run_id, stage = %stage, "{}", message);
    }

    /// Log the terminal stage for a failed run.
    pub fn log_error(&self, err: &MediaError) {
        let stage = terminal_stage(err);
        match stage {
            PipelineStage::Rejected => {
                warn!(run_id = %self.run_id, stage = %stage, error = %err, "Video rejected")
            }
            _ => error!(
                run_id = %self.run_id,
                stage = %stage,
                error = %err,
                "Video processing failed"
            ),
        }
    }

    pub fn create_span(&self) -> Span {
        tracing::info_span!("compliance_pipeline", run_id = %self.run_id)
    }
}

/// Terminal stage an error ends the run in.
pub fn terminal_stage(err: &MediaError) -> PipelineStage {
    if err.is_client_error() {
        PipelineStage::Rejected
    } else {
        PipelineStage::Failed
    }
}

/// Runs videos through probe, validation and, when needed, one transform.
#[derive(Clone)]
pub struct CompliancePipeline {
    prober: Arc<dyn MediaProber>,
    transcoder: Arc<dyn MediaTranscoder>,
    work_dir: PathBuf,
}

impl CompliancePipeline {
    pub fn new(
        prober: Arc<dyn MediaProber>,
        transcoder: Arc<dyn MediaTranscoder>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            prober,
            transcoder,
            work_dir: work_dir.into(),
        }
    }

    /// Pipeline over the real ffprobe/ffmpeg binaries.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            Arc::new(FfprobeProber::new(&config.ffprobe_bin, config.probe_timeout)),
            Arc::new(FfmpegTranscoder::new(&config.ffmpeg_bin, config.transform_timeout)),
            config.work_dir.clone(),
        )
    }

    /// Write `bytes` to a temp file and run the pipeline on it.
    pub async fn run_bytes(&self, run_id: &str, bytes: &[u8]) -> MediaResult<ProcessedVideo> {
        let input = materialize_input(bytes, &self.work_dir).await?;
        self.run(run_id, input).await
    }

    /// Run the pipeline, taking ownership of `input`.
    ///
    /// Every temp file is removed before this returns, except the one inside
    /// the returned [`ProcessedVideo`].
    pub async fn run(&self, run_id: &str, input: TempPath) -> MediaResult<ProcessedVideo> {
        let logger = PipelineLogger::new(run_id);
        let started = Instant::now();

        let result = self
            .run_stages(&logger, input)
            .instrument(logger.create_span())
            .await;

        match &result {
            Ok(video) => {
                let outcome = if video.was_transformed() { "transformed" } else { "compliant" };
                metrics::record_pipeline_run(outcome, started.elapsed());
            }
            Err(err) => {
                logger.log_error(err);
                metrics::record_pipeline_run(err.kind(), started.elapsed());
            }
        }

        result
    }

    async fn run_stages(
        &self,
        logger: &PipelineLogger,
        input: TempPath,
    ) -> MediaResult<ProcessedVideo> {
        logger.stage(PipelineStage::Probing, "Extracting video metadata");
        let metadata = self.prober.extract(&input).await?;

        logger.stage(PipelineStage::Validating, "Validating against ingestion policy");
        let validation = validate(&metadata);

        let unfixable = validation.unfixable();
        if !unfixable.is_empty() {
            return Err(MediaError::UnfixableIssue { issues: unfixable });
        }

        if validation.compliant {
            logger.stage(PipelineStage::Done, "Video already compliant, no transformation needed");
            return Ok(ProcessedVideo::new(input, metadata, false));
        }

        let plan = build_plan(&metadata, &validation)?;

        logger.stage(PipelineStage::Transforming, "Applying FFmpeg transformations");
        let output = reserve_output_path(&self.work_dir)?;
        let transformed = self.transcoder.transform(&input, &output, &plan).await;
        // the original is no longer needed whatever the outcome
        drop(input);
        transformed?;

        logger.stage(PipelineStage::Reprobing, "Re-probing transformed video");
        let new_metadata: MediaMetadata = self.prober.extract(&output).await?;

        logger.stage(PipelineStage::Revalidating, "Re-validating transformed video");
        let revalidation = validate(&new_metadata);
        if !revalidation.compliant {
            return Err(MediaError::StillNonCompliant {
                issues: revalidation.issues,
            });
        }

        logger.stage(PipelineStage::Done, "Transformed video validated successfully");
        Ok(ProcessedVideo::new(output, new_metadata, true))
    }
}
