//! Shared types, error model, and configuration for bookrelease.
//!
//! This crate is the foundation depended on by all other bookrelease crates.
//! It provides:
//! - [`BookReleaseError`]: the unified error type
//! - Domain types ([`PageSize`], [`ChapterLayout`], [`ReleaseAsset`], [`DeleteOutcome`])
//! - Configuration ([`AppConfig`], config loading and validation)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CONFIG_FILE_NAME, InputSpec, InputsConfig, OutputsConfig, ReleaseTargetConfig,
    ToolMode, ToolsConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from, validate_config,
};
pub use error::{BookReleaseError, MissingInput, Result};
pub use types::{
    AssetKind, ChapterLayout, ChapterUnit, DeleteOutcome, Edition, POINTS_PER_INCH, PageSize,
    ReleaseAsset, UnitKind,
};
