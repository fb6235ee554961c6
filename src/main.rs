//! translate-movie - command line entry point
//!
//! Parses arguments, builds the run configuration once, and hands it to the workflow.
//! Only the final report goes to stdout; everything else is logged on stderr.

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use translate_movie::cli::{Action, Args};
use translate_movie::config::Config;
use translate_movie::error::PipelineError;
use translate_movie::workflow::Workflow;

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    let loaded = match Config::load(args.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let mut config = loaded.config.clone();
    config.debug |= args.verbose;
    config.output.canonical_names |= args.canonical_names;

    if let Err(e) = setup_logging(config.debug, config.log_dir.as_deref()) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }
    loaded.log_origins();

    let debug_enabled = config.debug;
    match run(args, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(PipelineError::Usage(_)) = e.downcast_ref::<PipelineError>() {
                eprintln!("Error: {}\n", e);
                eprintln!("{}", Args::command().render_help());
            } else {
                if let Some(pipeline) = e.downcast_ref::<PipelineError>() {
                    debug!("Failure category: {:?}", pipeline.category());
                }
                eprintln!("Error: {}", e);
            }
            if debug_enabled {
                eprintln!("{:?}", e);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, config: Config) -> Result<()> {
    let action = args.action()?;
    let workflow = Workflow::new(config);

    match action {
        Action::UpdateDownloader => {
            let path = workflow.update_downloader().await?;
            info!("yt-dlp is ready at {}", path.display());
        }
        Action::PostprocessOnly(video) => {
            let report = workflow.postprocess_only(&video).await?;
            println!("{}", report);
        }
        Action::Translate(request) => {
            let report = workflow.run(&request).await?;
            println!("{}", report);
        }
    }

    debug!("translate-movie finished");
    Ok(())
}

/// Setup logging to stderr and, when a log directory is configured, to a daily file
fn setup_logging(debug: bool, log_dir: Option<&Path>) -> Result<()> {
    let log_level = if debug { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(debug)
        .with_line_number(debug);

    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = rolling::daily(dir, "translate-movie.log");
            let (non_blocking_file, guard) = non_blocking(file_appender);
            // Keep the guard alive for the duration of the program
            std::mem::forget(guard);

            Some(
                fmt::layer()
                    .with_writer(non_blocking_file)
                    .with_target(false)
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(false)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    debug!(
        "Logging initialized - level: {}, file: {}",
        log_level,
        log_dir
            .map(|d| d.join("translate-movie.log").display().to_string())
            .unwrap_or_else(|| "disabled".to_string())
    );

    Ok(())
}
