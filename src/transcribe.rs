use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::{ExitPolicy, TranscriberConfig};
use crate::error::{PipelineError, Result};
use crate::subtitle::{remove_stale_output, require_output, settle_stage, SubtitlePaths};
use crate::tools::{ToolCommand, ToolRunner};

const STAGE: &str = "Whisper";

/// Produces the source-language subtitles for a video with the whisper CLI.
pub struct Transcriber<'a> {
    config: &'a TranscriberConfig,
    policy: ExitPolicy,
    runner: &'a dyn ToolRunner,
}

impl<'a> Transcriber<'a> {
    pub fn new(config: &'a TranscriberConfig, policy: ExitPolicy, runner: &'a dyn ToolRunner) -> Self {
        Self {
            config,
            policy,
            runner,
        }
    }

    /// Run whisper on `video` and return the transcript path.
    pub async fn transcribe(&self, video: &Path, paths: &SubtitlePaths) -> Result<PathBuf> {
        info!(
            "=== Step 1: Generating {} subtitles with Whisper ===",
            self.config.language
        );
        debug!(
            "Running Whisper with model: {}, language: {}",
            self.config.model, self.config.language
        );

        remove_stale_output(&paths.source).await?;

        let output_dir = if paths.video_dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            paths.video_dir.as_path()
        };
        let command = self.command(video, output_dir);

        let outcome = self.runner.run(&command).await?;
        settle_stage(STAGE, "whisper", outcome, self.policy, &paths.source)?;

        info!("Subtitles generated: {}", paths.source.display());
        Ok(paths.source.clone())
    }

    /// Skip transcription and reuse a transcript from an earlier run.
    pub fn use_existing(&self, paths: &SubtitlePaths) -> Result<PathBuf> {
        info!("=== Step 1: Skipping Whisper (using existing subtitles) ===");
        require_output(STAGE, &paths.source)
            .map_err(|_| PipelineError::FileNotFound(paths.source.clone()))?;
        Ok(paths.source.clone())
    }

    fn command(&self, video: &Path, output_dir: &Path) -> ToolCommand {
        ToolCommand::new(&self.config.binary_path, "Transcription")
            .path(video)
            .option("--model", &self.config.model)
            .option("--language", &self.config.language)
            .path_option("--output_dir", output_dir)
            .option("--output_format", "srt")
            .missing_hint("Install openai-whisper or set WHISPER_PATH.")
    }
}
