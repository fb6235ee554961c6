use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::DownloaderConfig;
use crate::error::{PipelineError, Result};
use crate::tools::{ToolCommand, ToolRunner};

/// Installs or refreshes the yt-dlp executable.
pub struct SetupManager<'a> {
    client: Client,
    config: &'a DownloaderConfig,
    runner: &'a dyn ToolRunner,
}

impl<'a> SetupManager<'a> {
    pub fn new(config: &'a DownloaderConfig, runner: &'a dyn ToolRunner) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("translate-movie/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            config,
            runner,
        })
    }

    /// Download the latest release over the configured path and print its version.
    pub async fn update_downloader(&self) -> Result<PathBuf> {
        info!("=== Updating yt-dlp ===");
        let target = &self.config.binary_path;

        let bytes = self.download_release().await?;
        install_executable(target, &bytes)?;
        info!("yt-dlp updated successfully: {}", target.display());

        let version = ToolCommand::new(target, "Version check").arg("--version");
        let outcome = self.runner.run(&version).await?;
        if !outcome.success() {
            return Err(PipelineError::ToolFailed {
                tool: "yt-dlp".to_string(),
                status: outcome.status,
            });
        }

        Ok(target.clone())
    }

    async fn download_release(&self) -> Result<Vec<u8>> {
        let url = &self.config.release_url;
        info!("Downloading {}", url);

        let mut response = self.client.get(url).send().await?.error_for_status()?;

        let pb = ProgressBar::new(response.content_length().unwrap_or(0));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                .map_err(|e| PipelineError::Config(format!("Invalid progress template: {}", e)))?
                .progress_chars("#>-"),
        );

        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            bytes.extend_from_slice(&chunk);
            pb.set_position(bytes.len() as u64);
        }
        pb.finish_with_message("Downloaded yt-dlp");

        if bytes.is_empty() {
            return Err(PipelineError::Config(format!("Empty download from {}", url)));
        }
        Ok(bytes)
    }
}

/// Write `bytes` next to `target` and atomically move it into place as an executable.
pub fn install_executable(target: &Path, bytes: &[u8]) -> Result<()> {
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| permission_hint(e, target))?;
    temp.write_all(bytes)?;
    temp.flush()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(temp.path(), std::fs::Permissions::from_mode(0o755))?;
    }

    temp.persist(target)
        .map_err(|e| permission_hint(e.error, target))?;
    Ok(())
}

fn permission_hint(e: std::io::Error, target: &Path) -> PipelineError {
    if e.kind() == ErrorKind::PermissionDenied {
        PipelineError::NotWritable {
            path: target.to_path_buf(),
            hint: "Rerun with sufficient privileges or set YT_DLP_PATH to a writable location."
                .to_string(),
        }
    } else {
        PipelineError::Io(e)
    }
}
