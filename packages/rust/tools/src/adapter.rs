//! External-process adapter traits.
//!
//! The release pipeline only talks to its collaborators through these
//! traits, one method per tool invocation, so tests can substitute recording
//! mocks for the real programs.

use std::path::{Path, PathBuf};

use bookrelease_shared::{DeleteOutcome, Result};

/// Something preflight must find before the pipeline runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// A program that must be on `PATH`.
    Program(String),
    /// A script file that must exist.
    Script(PathBuf),
}

/// The PDF transformation tools: rescaler, compressor, splitter.
#[allow(async_fn_in_trait)]
pub trait Toolchain {
    /// Rescale `src` to trade size, writing `dst`.
    async fn rescale(&self, src: &Path, dst: &Path) -> Result<()>;

    /// Compress `src` with the preview profile, writing `dst`.
    async fn compress(&self, src: &Path, dst: &Path) -> Result<()>;

    /// Split `src` into chapter files inside `out_dir`.
    async fn split(&self, src: &Path, out_dir: &Path) -> Result<()>;

    /// Programs and scripts these tools need.
    fn requirements(&self) -> Vec<Requirement>;
}

/// Everything needed to create a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRequest {
    pub tag: String,
    pub title: String,
    pub notes: String,
    /// Files to upload, in manifest order.
    pub assets: Vec<PathBuf>,
}

/// The release-management tool.
#[allow(async_fn_in_trait)]
pub trait ReleasePublisher {
    /// Delete the release published under `tag`.
    async fn delete_release(&self, tag: &str) -> DeleteOutcome;

    /// Delete the git tag `tag` from the remote.
    async fn delete_tag(&self, tag: &str) -> DeleteOutcome;

    /// Create a release with every asset attached.
    async fn create_release(&self, request: &ReleaseRequest) -> Result<()>;

    /// Program preflight must find, if any.
    fn requirement(&self) -> Option<Requirement>;
}
