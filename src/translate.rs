use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::{ExitPolicy, TranslatorConfig};
use crate::error::{PipelineError, Result};
use crate::fetch::list_dir;
use crate::subtitle::{remove_stale_output, settle_stage};
use crate::tools::{ToolCommand, ToolRunner};

const STAGE: &str = "Translation";

/// Translates a subtitle file with chatgpt-subtitle-translator.
pub struct SubtitleTranslator<'a> {
    config: &'a TranslatorConfig,
    policy: ExitPolicy,
    runner: &'a dyn ToolRunner,
}

impl<'a> SubtitleTranslator<'a> {
    pub fn new(config: &'a TranslatorConfig, policy: ExitPolicy, runner: &'a dyn ToolRunner) -> Self {
        Self {
            config,
            policy,
            runner,
        }
    }

    /// Location of the translator's CLI entry point
    pub fn script_path(&self) -> PathBuf {
        self.config.translator_path.join("cli").join("translator.mjs")
    }

    /// Translate `input` into `output` and return `output`.
    pub async fn translate(&self, input: &Path, output: &Path) -> Result<PathBuf> {
        info!(
            "=== Step 2: Translating subtitles to {} ===",
            self.config.target_lang
        );

        let script = self.script_path();
        if !script.is_file() {
            return Err(PipelineError::ToolMissing {
                tool: "chatgpt-subtitle-translator".to_string(),
                path: script,
                hint: "Set TRANSLATOR_PATH to your chatgpt-subtitle-translator checkout.".to_string(),
            });
        }

        debug!("OpenAI endpoint: {}", self.config.endpoint);
        debug!("OpenAI model: {}", self.config.model);
        debug!(
            "Translation: {} -> {}",
            self.config.source_lang, self.config.target_lang
        );
        debug!("Batch sizes: {}", self.config.batch_sizes);
        debug!("Translator path: {}", script.display());
        debug!("Input file: {}", input.display());
        debug!("Output file: {}", output.display());

        remove_stale_output(output).await?;

        let command = self.command(&script, input, output);
        let outcome = self.runner.run(&command).await?;

        if let Err(e) = settle_stage(STAGE, "translator", outcome, self.policy, output) {
            if let Some(dir) = output.parent() {
                debug!("Listing files in output directory: {:?}", list_dir(dir));
            }
            return Err(e);
        }

        info!("Translated subtitles: {}", output.display());
        Ok(output.to_path_buf())
    }

    fn command(&self, script: &Path, input: &Path, output: &Path) -> ToolCommand {
        ToolCommand::new(&self.config.node_path, "Subtitle translation")
            .path(script)
            .option("--from", &self.config.source_lang)
            .option("--to", &self.config.target_lang)
            .option("--model", &self.config.model)
            .path_option("--input", input)
            .path_option("--output", output)
            .arg("--no-use-moderator")
            .option("--batch-sizes", self.config.batch_sizes.to_string())
            .env("OPENAI_API_KEY", &self.config.api_key)
            .env("OPENAI_BASE_URL", &self.config.endpoint)
            .missing_hint("Install Node.js or set NODE_PATH_BIN.")
    }
}
