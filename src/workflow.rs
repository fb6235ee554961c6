use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::cli::{RunRequest, VideoSource};
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::fetch::Fetcher;
use crate::report::Report;
use crate::setup::SetupManager;
use crate::subtitle::{cleanup_progress_files, postprocess, SubtitlePaths};
use crate::transcribe::Transcriber;
use crate::translate::SubtitleTranslator;
use crate::tools::{ToolRunner, ToolRunnerFactory};

/// Drives one run: resolve the video, transcribe, translate, report.
///
/// Stages run strictly in order and the first failure ends the run.
pub struct Workflow {
    config: Config,
    runner: Box<dyn ToolRunner>,
}

impl Workflow {
    pub fn new(config: Config) -> Self {
        Self::with_runner(config, ToolRunnerFactory::create_runner())
    }

    pub fn with_runner(config: Config, runner: Box<dyn ToolRunner>) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Produce translated subtitles for the requested video.
    pub async fn run(&self, request: &RunRequest) -> Result<Report> {
        let video = self.resolve_source(&request.source).await?;
        let paths = SubtitlePaths::for_video(&video, &self.config.translator.target_lang)?;

        debug!("Video directory: {}", paths.video_dir.display());
        debug!("Video name (no ext): {}", paths.video_stem);
        debug!("Source SRT path: {}", paths.source.display());
        debug!("Translated SRT path: {}", paths.translated.display());

        let transcriber = Transcriber::new(
            &self.config.transcriber,
            self.config.exit_policy,
            self.runner.as_ref(),
        );
        let source_srt = if request.skip_transcription {
            transcriber.use_existing(&paths)?
        } else {
            transcriber.transcribe(&video, &paths).await?
        };

        let translator = SubtitleTranslator::new(
            &self.config.translator,
            self.config.exit_policy,
            self.runner.as_ref(),
        );
        let translated_srt = translator.translate(&source_srt, &paths.translated).await?;

        let (source_subtitles, translated_subtitles) = if self.config.output.canonical_names {
            postprocess(
                &paths,
                &self.config.translator.source_lang,
                &self.config.translator.target_lang,
            )
            .await
        } else {
            cleanup_progress_files(&paths.video_dir, &self.config.translator.target_lang).await;
            (source_srt, translated_srt)
        };

        debug!("Workflow finished");
        Ok(self.report(video, source_subtitles, translated_subtitles))
    }

    /// Rename and clean up subtitles of a previously processed video.
    pub async fn postprocess_only(&self, video: &Path) -> Result<Report> {
        if !video.is_file() {
            return Err(PipelineError::FileNotFound(video.to_path_buf()));
        }
        let paths = SubtitlePaths::for_video(video, &self.config.translator.target_lang)?;
        let (source_subtitles, translated_subtitles) = postprocess(
            &paths,
            &self.config.translator.source_lang,
            &self.config.translator.target_lang,
        )
        .await;

        Ok(self.report(video.to_path_buf(), source_subtitles, translated_subtitles))
    }

    /// Replace the yt-dlp executable with the latest release.
    pub async fn update_downloader(&self) -> Result<PathBuf> {
        SetupManager::new(&self.config.downloader, self.runner.as_ref())?
            .update_downloader()
            .await
    }

    async fn resolve_source(&self, source: &VideoSource) -> Result<PathBuf> {
        match source {
            VideoSource::File(path) => {
                if !path.is_file() {
                    return Err(PipelineError::FileNotFound(path.clone()));
                }
                info!("Processing video file: {}", path.display());
                Ok(path.clone())
            }
            VideoSource::Net(url) => {
                let fetcher = Fetcher::new(&self.config.downloader, self.runner.as_ref());
                fetcher.fetch(url, &self.config.downloader.download_dir).await
            }
        }
    }

    fn report(&self, video: PathBuf, source: PathBuf, translated: PathBuf) -> Report {
        Report {
            video,
            source_subtitles: source,
            translated_subtitles: translated,
            source_lang: self.config.translator.source_lang.clone(),
            target_lang: self.config.translator.target_lang.clone(),
        }
    }
}
