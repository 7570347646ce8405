//! Core release orchestration for bookrelease.
//!
//! This crate provides:
//! - [`plan`]: resolved file locations for a run
//! - [`preflight`]: input and tool checks
//! - [`trade`] / [`preview`] / [`chapters`]: the PDF stages
//! - [`manifest`] / [`notes`] / [`publish`]: release packaging
//! - [`cleanup`]: removal of ephemeral files
//! - [`pipeline`]: the end-to-end `release` pipeline
//! - [`collect`]: chapter source concatenation
//! - [`index`]: subject index regeneration

pub mod chapters;
pub mod cleanup;
pub mod collect;
pub mod index;
pub mod manifest;
pub mod notes;
pub mod pipeline;
pub mod plan;
pub mod preflight;
pub mod preview;
pub mod publish;
pub mod trade;

#[cfg(test)]
mod testing;

pub use cleanup::CleanupReport;
pub use collect::{CollectReport, collect_chapters};
pub use index::{IndexPaths, IndexReport, regenerate_index};
pub use manifest::ReleaseManifest;
pub use pipeline::{
    ProgressReporter, ReleaseOptions, ReleaseResult, SilentProgress, build_notes,
    derive_all_trade, run_release,
};
pub use plan::ReleasePlan;
pub use preflight::run_preflight;
pub use publish::PublishReport;
pub use trade::TradeOutcome;
