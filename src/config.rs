use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};

/// Configuration file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "translate-movie.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub transcriber: TranscriberConfig,
    pub translator: TranslatorConfig,
    pub downloader: DownloaderConfig,
    pub output: OutputConfig,
    /// How tool exit codes are weighed against output files
    pub exit_policy: ExitPolicy,
    /// Verbose diagnostics on stderr
    pub debug: bool,
    /// Directory for the rolling log file; file logging is off when unset
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriberConfig {
    /// Path to the whisper executable
    pub binary_path: PathBuf,
    /// Whisper model size
    pub model: String,
    /// Spoken language of the video
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Node.js executable used to launch the translator
    pub node_path: PathBuf,
    /// Checkout of chatgpt-subtitle-translator
    pub translator_path: PathBuf,
    /// OpenAI-compatible endpoint, exported as OPENAI_BASE_URL
    pub endpoint: String,
    /// Exported as OPENAI_API_KEY
    pub api_key: String,
    /// Model identifier passed to the translator
    pub model: String,
    pub source_lang: String,
    pub target_lang: String,
    /// Lines per translation request, passed through untouched
    pub batch_sizes: BatchSizes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloaderConfig {
    /// Path to the yt-dlp executable
    pub binary_path: PathBuf,
    /// Fixed basename of the downloaded file; yt-dlp picks the extension
    pub output_name: String,
    /// Where network videos are saved
    pub download_dir: PathBuf,
    /// Release asset fetched by the update action
    pub release_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Rename subtitles after translation: `<stem>.srt` becomes the translation
    /// and the transcript moves to `<stem>_<source>.srt`
    pub canonical_names: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitPolicy {
    /// A stage succeeds only on exit code 0 and a present output file
    #[default]
    Strict,
    /// The output file alone decides; a nonzero exit code is only logged
    Lenient,
}

impl FromStr for ExitPolicy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(ExitPolicy::Strict),
            "lenient" => Ok(ExitPolicy::Lenient),
            _ => Err(PipelineError::Config(format!(
                "Invalid exit policy '{}'. Valid policies: strict, lenient",
                s
            ))),
        }
    }
}

/// Ordered batch-size hints for the translator.
///
/// Always non-empty and strictly positive. Displays in the literal list syntax the
/// translator expects on its command line, e.g. `[5,10]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct BatchSizes(Vec<u32>);

impl BatchSizes {
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

impl TryFrom<Vec<u32>> for BatchSizes {
    type Error = PipelineError;

    fn try_from(sizes: Vec<u32>) -> Result<Self> {
        if sizes.is_empty() {
            return Err(PipelineError::Config("Batch sizes must not be empty".to_string()));
        }
        if sizes.contains(&0) {
            return Err(PipelineError::Config("Batch sizes must be positive".to_string()));
        }
        Ok(Self(sizes))
    }
}

impl From<BatchSizes> for Vec<u32> {
    fn from(sizes: BatchSizes) -> Self {
        sizes.0
    }
}

impl FromStr for BatchSizes {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        let sizes: Vec<u32> = serde_json::from_str(s.trim()).map_err(|e| {
            PipelineError::Config(format!("Invalid batch sizes '{}': {}", s, e))
        })?;
        Self::try_from(sizes)
    }
}

impl fmt::Display for BatchSizes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "[{}]", joined)
    }
}

impl Default for BatchSizes {
    fn default() -> Self {
        Self(vec![5, 10])
    }
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::from("whisper"),
            model: "large".to_string(),
            language: "en".to_string(),
        }
    }
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            node_path: PathBuf::from("node"),
            translator_path: PathBuf::from("~/tools/translateMovie/chatgpt-subtitle-translator"),
            endpoint: "http://localhost:20000/v1".to_string(),
            api_key: "lm-studio".to_string(),
            model: "qwen3-30b-a3b-instruct-2507".to_string(),
            source_lang: "en".to_string(),
            target_lang: "pl".to_string(),
            batch_sizes: BatchSizes::default(),
        }
    }
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::from("/usr/local/bin/yt-dlp"),
            output_name: "ytDownloadedFile".to_string(),
            download_dir: PathBuf::from("~/Downloads"),
            release_url: "https://github.com/yt-dlp/yt-dlp/releases/latest/download/yt-dlp"
                .to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transcriber: TranscriberConfig::default(),
            translator: TranslatorConfig::default(),
            downloader: DownloaderConfig::default(),
            output: OutputConfig::default(),
            exit_policy: ExitPolicy::Strict,
            debug: false,
            log_dir: None,
        }
    }
}

/// Run configuration together with where its values came from.
///
/// Loading happens before logging is set up, so the origins are kept here and
/// logged once a subscriber exists.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    /// Configuration file that was read, if any
    pub file: Option<PathBuf>,
    /// Environment variables that overrode a setting
    pub env_overrides: Vec<&'static str>,
}

impl LoadedConfig {
    /// Log the configuration origins collected during loading.
    pub fn log_origins(&self) {
        if let Some(file) = &self.file {
            info!("Loaded configuration from {}", file.display());
        }
        for key in &self.env_overrides {
            debug!("{} overridden from environment", key);
        }
    }
}

impl Config {
    /// Build the run configuration: defaults, then the TOML file, then the process environment.
    pub fn load(config_path: Option<&Path>) -> Result<LoadedConfig> {
        let file = match config_path {
            Some(path) => Some(path.to_path_buf()),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Some(PathBuf::from(DEFAULT_CONFIG_FILE)),
            None => None,
        };
        let mut config = match &file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        let env_overrides = config.apply_env(|key| std::env::var(key).ok())?;
        config.expand_paths();
        Ok(LoadedConfig {
            config,
            file,
            env_overrides,
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        toml::from_str(&content)
            .map_err(|e| PipelineError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Override fields from environment variables resolved through `lookup`.
    ///
    /// Returns the names of the variables that were applied.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<Vec<&'static str>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut applied = Vec::new();

        let mut string = |key: &'static str, target: &mut String| {
            if let Some(value) = lookup(key) {
                applied.push(key);
                *target = value;
            }
        };
        string("WHISPER_MODEL", &mut self.transcriber.model);
        string("WHISPER_LANGUAGE", &mut self.transcriber.language);
        string("OPENAI_ENDPOINT", &mut self.translator.endpoint);
        string("OPENAI_API_KEY", &mut self.translator.api_key);
        string("OPENAI_MODEL", &mut self.translator.model);
        string("SOURCE_LANG", &mut self.translator.source_lang);
        string("TARGET_LANG", &mut self.translator.target_lang);
        string("YT_DLP_OUTPUT_NAME", &mut self.downloader.output_name);
        string("YT_DLP_RELEASE_URL", &mut self.downloader.release_url);

        let mut path = |key: &'static str, target: &mut PathBuf| {
            if let Some(value) = lookup(key) {
                applied.push(key);
                *target = PathBuf::from(value);
            }
        };
        path("WHISPER_PATH", &mut self.transcriber.binary_path);
        path("NODE_PATH_BIN", &mut self.translator.node_path);
        path("TRANSLATOR_PATH", &mut self.translator.translator_path);
        path("YT_DLP_PATH", &mut self.downloader.binary_path);
        path("DOWNLOAD_DIR", &mut self.downloader.download_dir);

        if let Some(value) = lookup("TRANSLATION_BATCH_SIZES") {
            self.translator.batch_sizes = value.parse()?;
            applied.push("TRANSLATION_BATCH_SIZES");
        }
        if let Some(value) = lookup("TOOL_EXIT_POLICY") {
            self.exit_policy = value.parse()?;
            applied.push("TOOL_EXIT_POLICY");
        }
        if let Some(value) = lookup("CANONICAL_SUBTITLES") {
            self.output.canonical_names = parse_flag(&value);
            applied.push("CANONICAL_SUBTITLES");
        }
        if let Some(value) = lookup("DEBUG") {
            self.debug = parse_flag(&value);
            applied.push("DEBUG");
        }
        if let Some(value) = lookup("LOG_DIR") {
            self.log_dir = Some(PathBuf::from(value));
            applied.push("LOG_DIR");
        }

        if self.downloader.output_name.is_empty() {
            return Err(PipelineError::Config(
                "Download output name must not be empty".to_string(),
            ));
        }
        if self.translator.target_lang.is_empty() {
            return Err(PipelineError::Config("Target language must not be empty".to_string()));
        }

        Ok(applied)
    }

    /// Expand `~` and `$HOME` prefixes in every path setting.
    pub fn expand_paths(&mut self) {
        let home = dirs::home_dir();
        let expand = |path: &mut PathBuf| *path = expand_home(path, home.as_deref());

        expand(&mut self.transcriber.binary_path);
        expand(&mut self.translator.node_path);
        expand(&mut self.translator.translator_path);
        expand(&mut self.downloader.binary_path);
        expand(&mut self.downloader.download_dir);
        if let Some(dir) = self.log_dir.as_mut() {
            expand(dir);
        }
    }
}

/// Interpret an environment toggle such as `DEBUG=TRUE`.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

fn expand_home(path: &Path, home: Option<&Path>) -> PathBuf {
    let Some(home) = home else {
        return path.to_path_buf();
    };
    let text = path.to_string_lossy();
    for prefix in ["~", "$HOME", "${HOME}"] {
        if text == prefix {
            return home.to_path_buf();
        }
        if let Some(rest) = text.strip_prefix(prefix).and_then(|r| r.strip_prefix('/')) {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
