use clap::Parser;
use std::path::PathBuf;

use crate::error::{PipelineError, Result};

/// Video translation using whisper and an OpenAI-compatible model
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, arg_required_else_help = true)]
pub struct Args {
    /// Translate local video file
    #[arg(long, value_name = "PATH", conflicts_with = "net")]
    pub file: Option<PathBuf>,

    /// Download and translate video from URL (using yt-dlp)
    #[arg(long, value_name = "URL")]
    pub net: Option<String>,

    /// Skip Whisper transcription (use existing .srt file)
    #[arg(long)]
    pub skip_whisper: bool,

    /// Update yt-dlp to latest version
    #[arg(long)]
    pub update_ytdlp: bool,

    /// Run post-processing (rename and cleanup) for given video file
    #[arg(
        long,
        value_name = "VIDEO",
        conflicts_with_all = ["file", "net", "skip_whisper", "update_ytdlp"]
    )]
    pub postprocess_only: Option<PathBuf>,

    /// After translation, name the translation <video>.srt and keep the transcript as <video>_<source>.srt
    #[arg(long)]
    pub canonical_names: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Where the video comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    File(PathBuf),
    Net(String),
}

/// A translation run as requested on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub source: VideoSource,
    pub skip_transcription: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    UpdateDownloader,
    PostprocessOnly(PathBuf),
    Translate(RunRequest),
}

impl Args {
    /// Resolve the flags into the single action to perform.
    pub fn action(&self) -> Result<Action> {
        if self.update_ytdlp {
            return Ok(Action::UpdateDownloader);
        }
        if let Some(video) = &self.postprocess_only {
            return Ok(Action::PostprocessOnly(video.clone()));
        }

        let source = match (&self.file, &self.net) {
            (Some(path), None) => VideoSource::File(path.clone()),
            (None, Some(url)) => VideoSource::Net(url.clone()),
            (Some(_), Some(_)) => {
                return Err(PipelineError::Usage(
                    "--file and --net cannot be used together".to_string(),
                ));
            }
            (None, None) => {
                return Err(PipelineError::Usage(
                    "one of --file or --net is required".to_string(),
                ));
            }
        };

        Ok(Action::Translate(RunRequest {
            source,
            skip_transcription: self.skip_whisper,
        }))
    }
}
