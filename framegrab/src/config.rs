//! Configuration for pipeline runs.
//!
//! Values are layered: built-in defaults, then an optional JSON file, then
//! `FRAMEGRAB_*` environment variables. The binary applies its flags last.

use crate::core::ExecutionMode;
use crate::errors::FramegrabError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Selects development or production mode.
pub const ENV_MODE: &str = "FRAMEGRAB_ENV";
/// Overrides the output root.
pub const ENV_OUTPUT_DIR: &str = "FRAMEGRAB_OUTPUT_DIR";
/// Overrides the local tool directory.
pub const ENV_BIN_DIR: &str = "FRAMEGRAB_BIN_DIR";
/// Overrides the downloader program.
pub const ENV_DOWNLOADER: &str = "FRAMEGRAB_DOWNLOADER";
/// Overrides the transcoder program.
pub const ENV_TRANSCODER: &str = "FRAMEGRAB_TRANSCODER";

/// An external tool and how to probe it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Program name or path.
    pub program: String,
    /// Arguments for the preflight probe.
    pub probe_args: Vec<String>,
}

impl ToolConfig {
    /// Creates a tool config.
    #[must_use]
    pub fn new<I, S>(program: impl Into<String>, probe_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            probe_args: probe_args.into_iter().map(Into::into).collect(),
        }
    }

    /// Resolves the program to run.
    ///
    /// A bare name with an executable of the same name in `bin_dir` resolves
    /// to that file; otherwise the program is returned unchanged and looked
    /// up on `PATH` at spawn time.
    #[must_use]
    pub fn resolve(&self, bin_dir: &Path) -> PathBuf {
        let program = Path::new(&self.program);
        if program.components().count() == 1 {
            let local = bin_dir.join(program);
            if local.is_file() {
                return local;
            }
        }
        program.to_path_buf()
    }
}

fn default_downloader() -> ToolConfig {
    ToolConfig::new("yt-dlp", ["--version"])
}

fn default_transcoder() -> ToolConfig {
    ToolConfig::new("ffmpeg", ["-version"])
}

fn default_output_root() -> PathBuf {
    PathBuf::from("./output")
}

fn default_bin_dir() -> PathBuf {
    PathBuf::from("./bin")
}

/// Optional transcoder settings, all disabled by default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionOptions {
    /// Start offset passed as `-ss`.
    #[serde(default)]
    pub start_time: Option<String>,
    /// Duration passed as `-t`.
    #[serde(default)]
    pub duration: Option<String>,
    /// Subdirectory of the video directory that receives frames.
    #[serde(default)]
    pub frames_subdir: Option<String>,
}

/// Configuration for a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root under which per-video directories are created.
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
    /// Directory searched for local tool binaries before `PATH`.
    #[serde(default = "default_bin_dir")]
    pub bin_dir: PathBuf,
    /// The downloader tool.
    #[serde(default = "default_downloader")]
    pub downloader: ToolConfig,
    /// The transcoder tool.
    #[serde(default = "default_transcoder")]
    pub transcoder: ToolConfig,
    /// Failure report verbosity.
    #[serde(default)]
    pub mode: ExecutionMode,
    /// Retry a rejected identifier once with the raw URL.
    #[serde(default)]
    pub download_fallback: bool,
    /// Transcoder options.
    #[serde(default)]
    pub extraction: ExtractionOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            bin_dir: default_bin_dir(),
            downloader: default_downloader(),
            transcoder: default_transcoder(),
            mode: ExecutionMode::default(),
            download_fallback: false,
            extraction: ExtractionOptions::default(),
        }
    }
}

impl Config {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON configuration document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, FramegrabError> {
        serde_json::from_str(json).map_err(|e| FramegrabError::Config(e.to_string()))
    }

    /// Reads a JSON configuration file.
    pub fn from_file(path: &Path) -> Result<Self, FramegrabError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| FramegrabError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// Loads defaults or `path`, then applies the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, FramegrabError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(config.with_env(|key| std::env::var(key).ok()))
    }

    /// Applies `FRAMEGRAB_*` overrides read through `lookup`.
    #[must_use]
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(mode) = read(ENV_MODE) {
            self.mode = ExecutionMode::from_env_value(&mode);
        }
        if let Some(dir) = read(ENV_OUTPUT_DIR) {
            self.output_root = PathBuf::from(dir);
        }
        if let Some(dir) = read(ENV_BIN_DIR) {
            self.bin_dir = PathBuf::from(dir);
        }
        if let Some(program) = read(ENV_DOWNLOADER) {
            self.downloader.program = program;
        }
        if let Some(program) = read(ENV_TRANSCODER) {
            self.transcoder.program = program;
        }
        self
    }

    /// Sets the output root.
    #[must_use]
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    /// Sets the local tool directory.
    #[must_use]
    pub fn with_bin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.bin_dir = dir.into();
        self
    }

    /// Sets the execution mode.
    #[must_use]
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enables or disables the raw-URL download retry.
    #[must_use]
    pub fn with_download_fallback(mut self, enabled: bool) -> Self {
        self.download_fallback = enabled;
        self
    }

    /// Sets the extraction options.
    #[must_use]
    pub fn with_extraction(mut self, extraction: ExtractionOptions) -> Self {
        self.extraction = extraction;
        self
    }

    /// Returns the downloader program to run.
    #[must_use]
    pub fn downloader_program(&self) -> PathBuf {
        self.downloader.resolve(&self.bin_dir)
    }

    /// Returns the transcoder program to run.
    #[must_use]
    pub fn transcoder_program(&self) -> PathBuf {
        self.transcoder.resolve(&self.bin_dir)
    }
}
