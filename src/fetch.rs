use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::DownloaderConfig;
use crate::error::{PipelineError, Result};
use crate::tools::{is_executable, ToolCommand, ToolRunner};

pub const UPDATE_HINT: &str = "Run --update-ytdlp to install.";

/// Downloads a remote video with yt-dlp into a fixed-name file.
pub struct Fetcher<'a> {
    config: &'a DownloaderConfig,
    runner: &'a dyn ToolRunner,
}

impl<'a> Fetcher<'a> {
    pub fn new(config: &'a DownloaderConfig, runner: &'a dyn ToolRunner) -> Self {
        Self { config, runner }
    }

    /// Download `url` into `output_dir` and return the path of the produced file.
    pub async fn fetch(&self, url: &str, output_dir: &Path) -> Result<PathBuf> {
        info!("=== Downloading video from URL ===");
        debug!("URL: {}", url);
        debug!("Output directory: {}", output_dir.display());

        let binary = &self.config.binary_path;
        if !is_executable(binary) {
            return Err(PipelineError::ToolMissing {
                tool: "yt-dlp".to_string(),
                path: binary.clone(),
                hint: UPDATE_HINT.to_string(),
            });
        }

        fs::create_dir_all(output_dir).await?;
        self.remove_previous_downloads(output_dir).await;

        let template = output_dir.join(format!("{}.%(ext)s", self.config.output_name));
        let command = ToolCommand::new(binary, "Video download")
            .path_option("-o", &template)
            .arg(url)
            .missing_hint(UPDATE_HINT);

        let outcome = self.runner.run(&command).await?;
        if !outcome.success() {
            return Err(PipelineError::ToolFailed {
                tool: "yt-dlp".to_string(),
                status: outcome.status,
            });
        }

        let downloaded = resolve_download(output_dir, &self.config.output_name)?;
        info!("Downloaded: {}", downloaded.display());
        Ok(downloaded)
    }

    /// Files left by an earlier run would otherwise compete with the new download.
    async fn remove_previous_downloads(&self, output_dir: &Path) {
        for stale in matching_files(output_dir, &self.config.output_name, true) {
            match fs::remove_file(&stale).await {
                Ok(()) => debug!("Removed previous download: {}", stale.display()),
                Err(e) => warn!("Could not remove {}: {}", stale.display(), e),
            }
        }
    }
}

/// Newest file in `dir` named `<output_name>.<ext>`.
///
/// The extension is chosen by the downloader, so the file is found by listing.
pub fn resolve_download(dir: &Path, output_name: &str) -> Result<PathBuf> {
    let mut candidates: Vec<(SystemTime, PathBuf)> = matching_files(dir, output_name, false)
        .into_iter()
        .map(|path| {
            let modified = std::fs::metadata(&path)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, path)
        })
        .collect();

    if candidates.is_empty() {
        debug!("Looking in output_dir: {}", dir.display());
        debug!("Directory listing: {:?}", list_dir(dir));
        return Err(PipelineError::OutputMissing {
            stage: "Video download".to_string(),
            path: dir.join(format!("{}.*", output_name)),
        });
    }

    candidates.sort_by(|a, b| b.0.cmp(&a.0));
    let (_, newest) = candidates.swap_remove(0);
    debug!("Downloaded file: {}", newest.display());
    Ok(newest)
}

fn matching_files(dir: &Path, output_name: &str, include_partial: bool) -> Vec<PathBuf> {
    let prefix = format!("{}.", output_name);
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy();
            name.starts_with(&prefix)
                && (include_partial || !(name.ends_with(".part") || name.ends_with(".ytdl")))
        })
        .map(|entry| entry.into_path())
        .collect()
}

/// Names of the entries in `dir`, for diagnostics.
pub fn list_dir(dir: &Path) -> Vec<String> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect()
}
