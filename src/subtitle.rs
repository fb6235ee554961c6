use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::ExitPolicy;
use crate::error::{PipelineError, Result};
use crate::tools::ToolOutcome;

/// Subtitle file locations derived from a video path.
///
/// The transcript lives at `<dir>/<stem>.srt` and the translation at
/// `<dir>/<stem>_<target>.srt`, both next to the video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitlePaths {
    pub video_dir: PathBuf,
    pub video_stem: String,
    pub source: PathBuf,
    pub translated: PathBuf,
}

impl SubtitlePaths {
    pub fn for_video<P: AsRef<Path>>(video_path: P, target_lang: &str) -> Result<Self> {
        let video_path = video_path.as_ref();
        let video_stem = video_path
            .file_stem()
            .ok_or_else(|| {
                PipelineError::Usage(format!("Invalid video filename: {}", video_path.display()))
            })?
            .to_string_lossy()
            .to_string();
        let video_dir = video_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let source = video_dir.join(format!("{}.srt", video_stem));
        let translated = video_dir.join(format!("{}_{}.srt", video_stem, target_lang));

        Ok(Self {
            video_dir,
            video_stem,
            source,
            translated,
        })
    }

    /// Where the transcript ends up after canonical renaming
    pub fn renamed_source(&self, source_lang: &str) -> PathBuf {
        self.video_dir
            .join(format!("{}_{}.srt", self.video_stem, source_lang))
    }

    /// Where the translation ends up after canonical renaming
    pub fn canonical(&self) -> PathBuf {
        self.source.clone()
    }
}

/// Fail with [`PipelineError::OutputMissing`] unless `path` is an existing file.
pub fn require_output(stage: &str, path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(PipelineError::OutputMissing {
            stage: stage.to_string(),
            path: path.to_path_buf(),
        });
    }
    match std::fs::metadata(path) {
        Ok(metadata) if metadata.len() == 0 => {
            warn!("{} produced an empty file: {}", stage, path.display())
        }
        _ => {}
    }
    Ok(())
}

/// Decide whether a finished stage succeeded, given its exit status and expected output.
pub fn settle_stage(
    stage: &str,
    tool: &str,
    outcome: ToolOutcome,
    policy: ExitPolicy,
    output: &Path,
) -> Result<()> {
    debug!("{} exit status: {}", stage, outcome.status);
    if !outcome.success() {
        match policy {
            ExitPolicy::Strict => {
                return Err(PipelineError::ToolFailed {
                    tool: tool.to_string(),
                    status: outcome.status,
                });
            }
            ExitPolicy::Lenient => {
                warn!("{} exited with {}; checking its output anyway", tool, outcome.status)
            }
        }
    }
    require_output(stage, output)
}

/// Remove a leftover output from an earlier run so the next existence check
/// only sees what the tool writes now.
pub async fn remove_stale_output(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => {
            debug!("Removed stale output: {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PipelineError::Io(e)),
    }
}

/// Rename the subtitle pair to canonical names and drop translator progress files.
///
/// `<stem>.srt` moves to `<stem>_<source>.srt`, then `<stem>_<target>.srt` moves to
/// `<stem>.srt`. Failures are logged and skipped. Returns the final
/// (transcript, translation) paths.
pub async fn postprocess(
    paths: &SubtitlePaths,
    source_lang: &str,
    target_lang: &str,
) -> (PathBuf, PathBuf) {
    let source_final = paths.renamed_source(source_lang);
    let canonical = paths.canonical();

    if paths.source.is_file() {
        if let Err(e) = move_file(&paths.source, &source_final).await {
            debug!("Failed to rename source subtitles: {}", e);
        }
    }

    if paths.translated.is_file() {
        if let Err(e) = move_file(&paths.translated, &canonical).await {
            debug!("Failed to move translated subtitles to canonical name: {}", e);
        }
    }

    cleanup_progress_files(&paths.video_dir, target_lang).await;

    (source_final, canonical)
}

/// Delete the translator's `*.progress_<lang>.csv` files from `dir`.
pub async fn cleanup_progress_files(dir: &Path, target_lang: &str) -> usize {
    let suffix = format!(".progress_{}.csv", target_lang);
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };

    let mut removed = 0;
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !name.ends_with(&suffix) {
            continue;
        }
        match fs::remove_file(entry.path()).await {
            Ok(()) => {
                debug!("Removed progress CSV: {}", name);
                removed += 1;
            }
            Err(e) => debug!("Failed to remove {}: {}", name, e),
        }
    }

    if removed > 0 {
        info!("Removed {} translator progress file(s)", removed);
    }
    removed
}

/// Rename, falling back to copy and remove across filesystems.
async fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    fs::copy(from, to).await?;
    fs::remove_file(from).await
}
