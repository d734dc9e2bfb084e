use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueHint};
use dialoguer::{theme::ColorfulTheme, Input};
use framegrab::config::{Config, ExtractionOptions};
use framegrab::core::ExecutionMode;
use framegrab::errors::FramegrabError;
use framegrab::events::LoggingEventSink;
use framegrab::pipeline::{render_failure, render_success, PipelineOrchestrator};
use framegrab::tools::ProcessRunner;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Video URL (prompted for when omitted on a terminal)
    url: Option<String>,

    /// Root directory for per-video output
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    output_dir: Option<PathBuf>,

    /// Directory searched for yt-dlp and ffmpeg before PATH
    #[arg(long, value_hint = ValueHint::DirPath)]
    bin_dir: Option<PathBuf>,

    /// Downloader program
    #[arg(long)]
    downloader: Option<String>,

    /// Transcoder program
    #[arg(long)]
    transcoder: Option<String>,

    /// Optional start time (e.g., 00:00:05)
    #[arg(long)]
    start: Option<String>,

    /// Optional duration (e.g., 10 for 10 seconds; or 00:00:10)
    #[arg(long)]
    duration: Option<String>,

    /// Write frames into this subdirectory of the video directory
    #[arg(long)]
    frames_subdir: Option<String>,

    /// Retry a failed download once with the full URL
    #[arg(long, action = ArgAction::SetTrue)]
    fallback_url: bool,

    /// Print terse failure reports
    #[arg(long, action = ArgAction::SetTrue)]
    production: bool,

    /// JSON configuration file
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    json_logs: bool,
}

impl Cli {
    fn apply(&self, mut config: Config) -> Config {
        if let Some(ref dir) = self.output_dir {
            config = config.with_output_root(dir);
        }
        if let Some(ref dir) = self.bin_dir {
            config = config.with_bin_dir(dir);
        }
        if let Some(ref program) = self.downloader {
            config.downloader.program.clone_from(program);
        }
        if let Some(ref program) = self.transcoder {
            config.transcoder.program.clone_from(program);
        }
        if self.production {
            config = config.with_mode(ExecutionMode::Production);
        }
        if self.fallback_url {
            config = config.with_download_fallback(true);
        }

        let extraction = ExtractionOptions {
            start_time: self.start.clone().or(config.extraction.start_time.take()),
            duration: self.duration.clone().or(config.extraction.duration.take()),
            frames_subdir: self
                .frames_subdir
                .clone()
                .or(config.extraction.frames_subdir.take()),
        };
        config.with_extraction(extraction)
    }
}

fn init_logging(verbose: bool, json: bool) {
    let default = if verbose { "framegrab=debug" } else { "framegrab=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Returns the URL argument, `None` when it should be prompted for, or
/// `MissingUrl` when there is no terminal to prompt on.
fn url_argument(url: Option<String>, interactive: bool) -> Result<Option<String>, FramegrabError> {
    match url.filter(|u| !u.trim().is_empty()) {
        Some(url) => Ok(Some(url)),
        None if interactive => Ok(None),
        None => Err(FramegrabError::MissingUrl),
    }
}

fn resolve_url(url: Option<String>) -> Result<String> {
    if let Some(url) = url_argument(url, std::io::stdin().is_terminal())? {
        return Ok(url);
    }

    let url = Input::<String>::with_theme(&ColorfulTheme::default())
        .with_prompt("Video URL")
        .interact_text()
        .context("reading the video URL")?;
    if url.trim().is_empty() {
        return Err(FramegrabError::MissingUrl.into());
    }
    Ok(url)
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = Config::load(cli.config.as_deref()).with_context(|| match cli.config {
        Some(ref path) => format!("loading configuration from {}", path.display()),
        None => "loading configuration".to_string(),
    })?;
    Ok(cli.apply(config))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config: {err:#}");
            return ExitCode::FAILURE;
        }
    };
    debug!(config = ?config, "Configuration loaded");

    let url = match resolve_url(cli.url.clone()) {
        Ok(url) => url,
        Err(err) => {
            match err.downcast_ref::<FramegrabError>() {
                Some(error) => eprintln!("{}", render_failure(error, config.mode)),
                None => eprintln!("{err:#}"),
            }
            return ExitCode::FAILURE;
        }
    };

    let orchestrator = PipelineOrchestrator::new(&config, Arc::new(ProcessRunner::new()))
        .with_event_sink(Arc::new(LoggingEventSink::debug()));

    match orchestrator.run(&url).await {
        Ok(report) => {
            println!("{}", render_success(&report));
            ExitCode::SUCCESS
        }
        Err(failure) => {
            eprintln!("{}", render_failure(&failure.error, config.mode));
            ExitCode::FAILURE
        }
    }
}
