//! Application configuration for bookrelease.
//!
//! The project config lives at `./bookrelease.toml` next to the book
//! sources; a user-wide fallback lives at `~/.bookrelease/bookrelease.toml`.
//! An explicit `--config` path overrides both. Missing files mean defaults.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{BookReleaseError, Result};
use crate::types::ChapterLayout;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "bookrelease.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".bookrelease";

static REPOSITORY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9-]*/[A-Za-z0-9._-]+$").expect("static regex")
});

// ---------------------------------------------------------------------------
// Config structs (matching bookrelease.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Required pre-rendered inputs.
    #[serde(default)]
    pub inputs: InputsConfig,

    /// Names of derived files.
    #[serde(default)]
    pub outputs: OutputsConfig,

    /// Page structure used to cut chapters.
    #[serde(default)]
    pub chapters: ChapterLayout,

    /// Remote release target.
    #[serde(default)]
    pub release: ReleaseTargetConfig,

    /// External tool selection.
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// A required input file and the command that produces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSpec {
    pub path: String,
    pub remedy: String,
}

impl InputSpec {
    fn new(path: &str, remedy: &str) -> Self {
        Self {
            path: path.into(),
            remedy: remedy.into(),
        }
    }
}

/// `[inputs]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputsConfig {
    #[serde(default = "default_bps_executive")]
    pub bps_executive: InputSpec,
    #[serde(default = "default_us_executive")]
    pub us_executive: InputSpec,
    #[serde(default = "default_cover")]
    pub cover: InputSpec,
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            bps_executive: default_bps_executive(),
            us_executive: default_us_executive(),
            cover: default_cover(),
        }
    }
}

impl InputsConfig {
    /// All inputs in preflight order.
    pub fn all(&self) -> [&InputSpec; 3] {
        [&self.bps_executive, &self.us_executive, &self.cover]
    }
}

fn default_bps_executive() -> InputSpec {
    InputSpec::new("main_bps.pdf", "lualatex main_bps.tex")
}
fn default_us_executive() -> InputSpec {
    InputSpec::new("main_us.pdf", "lualatex main_us.tex")
}
fn default_cover() -> InputSpec {
    InputSpec::new("cover.pdf", "lualatex cover.tex")
}

/// `[outputs]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputsConfig {
    /// Persistent trade-size derivative of the BPS edition.
    #[serde(default = "default_bps_trade")]
    pub bps_trade: String,
    /// Persistent trade-size derivative of the US edition.
    #[serde(default = "default_us_trade")]
    pub us_trade: String,
    /// Public copy of the BPS executive PDF (ephemeral).
    #[serde(default = "default_main_copy")]
    pub main_copy: String,
    /// Compressed BPS trade PDF (ephemeral).
    #[serde(default = "default_bps_preview")]
    pub bps_preview: String,
    /// Compressed US executive PDF (ephemeral).
    #[serde(default = "default_us_preview")]
    pub us_preview: String,
    /// Directory the chapter split writes into (ephemeral).
    #[serde(default = "default_chapters_dir")]
    pub chapters_dir: String,
}

impl Default for OutputsConfig {
    fn default() -> Self {
        Self {
            bps_trade: default_bps_trade(),
            us_trade: default_us_trade(),
            main_copy: default_main_copy(),
            bps_preview: default_bps_preview(),
            us_preview: default_us_preview(),
            chapters_dir: default_chapters_dir(),
        }
    }
}

fn default_bps_trade() -> String {
    "main_bps_trade.pdf".into()
}
fn default_us_trade() -> String {
    "main_us_trade.pdf".into()
}
fn default_main_copy() -> String {
    "Beyond_Popular_Science.pdf".into()
}
fn default_bps_preview() -> String {
    "Beyond_Popular_Science_preview.pdf".into()
}
fn default_us_preview() -> String {
    "Unpopular_Science_preview.pdf".into()
}
fn default_chapters_dir() -> String {
    "chapters_release".into()
}

/// `[release]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseTargetConfig {
    /// `owner/name` of the GitHub repository.
    #[serde(default = "default_repository")]
    pub repository: String,
    /// Tag the release is published under, replacing any prior one.
    #[serde(default = "default_tag")]
    pub tag: String,
    /// Release title.
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for ReleaseTargetConfig {
    fn default() -> Self {
        Self {
            repository: default_repository(),
            tag: default_tag(),
            title: default_title(),
        }
    }
}

fn default_repository() -> String {
    "beyond-popular-science/book".into()
}
fn default_tag() -> String {
    "latest".into()
}
fn default_title() -> String {
    "Latest Build".into()
}

/// Whether a stage shells out to an external script or runs in-process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolMode {
    External,
    Builtin,
}

/// `[tools]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_mode")]
    pub rescaler: ToolMode,
    #[serde(default = "default_mode")]
    pub splitter: ToolMode,
    /// Interpreter for the external scripts.
    #[serde(default = "default_python")]
    pub python: String,
    #[serde(default = "default_rescale_script")]
    pub rescale_script: String,
    #[serde(default = "default_split_script")]
    pub split_script: String,
    #[serde(default = "default_ghostscript")]
    pub ghostscript: String,
    #[serde(default = "default_gh")]
    pub gh: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            rescaler: default_mode(),
            splitter: default_mode(),
            python: default_python(),
            rescale_script: default_rescale_script(),
            split_script: default_split_script(),
            ghostscript: default_ghostscript(),
            gh: default_gh(),
        }
    }
}

fn default_mode() -> ToolMode {
    ToolMode::External
}
fn default_python() -> String {
    "python3".into()
}
fn default_rescale_script() -> String {
    "scale_pdf_to_trade.py".into()
}
fn default_split_script() -> String {
    "split_chapters.py".into()
}
fn default_ghostscript() -> String {
    "gs".into()
}
fn default_gh() -> String {
    "gh".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the user config directory (`~/.bookrelease/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BookReleaseError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.bookrelease/bookrelease.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Resolve and load the config.
///
/// Order: `explicit` path (must exist), `./bookrelease.toml`, the user
/// config file, then defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return load_config_from(path);
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return load_config_from(&local);
    }

    let path = config_file_path()?;
    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path and validate it.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BookReleaseError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        BookReleaseError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    tracing::debug!(?path, "loaded config");
    Ok(config)
}

/// Write a default config file to `path`, refusing to overwrite.
pub fn init_config(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Err(BookReleaseError::config(format!(
            "{} already exists",
            path.display()
        )));
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| BookReleaseError::io(parent, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| BookReleaseError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| BookReleaseError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path.to_path_buf())
}

/// Reject configs the pipeline cannot run with.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if !REPOSITORY_RE.is_match(&config.release.repository) {
        return Err(BookReleaseError::config(format!(
            "release.repository must look like `owner/name`, got `{}`",
            config.release.repository
        )));
    }
    if config.release.tag.trim().is_empty() {
        return Err(BookReleaseError::config("release.tag must not be empty"));
    }
    config.chapters.check()
}
