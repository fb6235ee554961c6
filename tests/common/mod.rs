use assert_fs::prelude::*;
use assert_fs::TempDir;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use translate_movie::config::Config;
use translate_movie::error::Result;
use translate_movie::tools::{ToolCommand, ToolOutcome, ToolRunner};

/// What a fake tool does when invoked.
#[derive(Clone, Copy, Debug)]
pub struct Behaviour {
    pub writes_output: bool,
    pub exit_code: i32,
}

impl Behaviour {
    pub const OK: Behaviour = Behaviour {
        writes_output: true,
        exit_code: 0,
    };
}

/// Stand-in for yt-dlp, whisper and the translator that writes the files the real
/// tools would write.
#[derive(Clone)]
pub struct FakeTools {
    pub calls: Arc<Mutex<Vec<ToolCommand>>>,
    pub downloader: Behaviour,
    pub download_ext: &'static str,
    pub transcriber: Behaviour,
    pub translator: Behaviour,
}

impl Default for FakeTools {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            downloader: Behaviour::OK,
            download_ext: "mkv",
            transcriber: Behaviour::OK,
            translator: Behaviour::OK,
        }
    }
}

impl FakeTools {
    pub fn invoked(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.description.clone())
            .collect()
    }
}

#[async_trait]
impl ToolRunner for FakeTools {
    async fn run(&self, command: &ToolCommand) -> Result<ToolOutcome> {
        self.calls.lock().unwrap().push(command.clone());

        let (behaviour, output) = match command.description.as_str() {
            "Video download" => {
                let template = command.get_option("-o").unwrap();
                (self.downloader, PathBuf::from(template.replace("%(ext)s", self.download_ext)))
            }
            "Transcription" => {
                let video = Path::new(&command.args[0]);
                let dir = PathBuf::from(command.get_option("--output_dir").unwrap());
                let stem = video.file_stem().unwrap().to_string_lossy().to_string();
                (self.transcriber, dir.join(format!("{}.srt", stem)))
            }
            "Subtitle translation" => (
                self.translator,
                PathBuf::from(command.get_option("--output").unwrap()),
            ),
            other => panic!("unexpected tool: {other}"),
        };

        if behaviour.writes_output {
            std::fs::write(&output, "1\n00:00:00,000 --> 00:00:01,000\nline\n").unwrap();
        }
        Ok(ToolOutcome::from_code(behaviour.exit_code))
    }
}

/// Temp workspace holding a translator checkout, an executable yt-dlp and a download dir.
pub fn workspace() -> (TempDir, Config) {
    let temp = TempDir::new().unwrap();
    temp.child("translator/cli").create_dir_all().unwrap();
    temp.child("bin").create_dir_all().unwrap();
    temp.child("translator/cli/translator.mjs").touch().unwrap();
    temp.child("bin/yt-dlp").write_str("#!/bin/sh\n").unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(
            temp.child("bin/yt-dlp").path(),
            std::fs::Permissions::from_mode(0o755),
        )
        .unwrap();
    }

    let mut config = Config::default();
    config.translator.translator_path = temp.child("translator").path().to_path_buf();
    config.downloader.binary_path = temp.child("bin/yt-dlp").path().to_path_buf();
    config.downloader.download_dir = temp.child("Downloads").path().to_path_buf();
    (temp, config)
}
