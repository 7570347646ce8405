//! Release publishing through the GitHub CLI.

use std::ffi::OsString;

use tracing::{info, instrument};

use bookrelease_shared::{BookReleaseError, DeleteOutcome, Result};

use crate::adapter::{ReleasePublisher, ReleaseRequest, Requirement};
use crate::process::{self, ProcessOutput};

/// Publishes to `repository` with the `gh` program.
#[derive(Debug, Clone)]
pub struct GhPublisher {
    gh: String,
    repository: String,
}

impl GhPublisher {
    pub fn new(gh: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            gh: gh.into(),
            repository: repository.into(),
        }
    }

    /// Arguments for `gh release create`.
    pub fn create_args(&self, request: &ReleaseRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "release",
            "create",
            request.tag.as_str(),
            "--repo",
            self.repository.as_str(),
            "--title",
            request.title.as_str(),
            "--notes",
            request.notes.as_str(),
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.extend(request.assets.iter().map(|p| p.as_os_str().to_os_string()));
        args
    }
}

impl ReleasePublisher for GhPublisher {
    #[instrument(skip(self), fields(repo = %self.repository))]
    async fn delete_release(&self, tag: &str) -> DeleteOutcome {
        let args = [
            "release",
            "delete",
            tag,
            "--repo",
            self.repository.as_str(),
            "--yes",
        ];
        classify(process::capture(&self.gh, args).await)
    }

    #[instrument(skip(self), fields(repo = %self.repository))]
    async fn delete_tag(&self, tag: &str) -> DeleteOutcome {
        let endpoint = format!("repos/{}/git/refs/tags/{tag}", self.repository);
        let args = ["api", "--method", "DELETE", endpoint.as_str()];
        classify(process::capture(&self.gh, args).await)
    }

    #[instrument(skip_all, fields(repo = %self.repository, tag = %request.tag, assets = request.assets.len()))]
    async fn create_release(&self, request: &ReleaseRequest) -> Result<()> {
        process::run(&self.gh, self.create_args(request))
            .await
            .map_err(|e| BookReleaseError::Publish(e.to_string()))?;
        info!("release created");
        Ok(())
    }

    fn requirement(&self) -> Option<Requirement> {
        Some(Requirement::Program(self.gh.clone()))
    }
}

/// Map a delete attempt onto the three outcomes the pipeline distinguishes.
pub(crate) fn classify(result: Result<ProcessOutput>) -> DeleteOutcome {
    match result {
        Ok(out) if out.success() => DeleteOutcome::Deleted,
        Ok(out) if is_not_found(&out.stderr) => DeleteOutcome::NotFound,
        Ok(out) => DeleteOutcome::Failed(out.stderr.trim().to_string()),
        Err(e) => DeleteOutcome::Failed(e.to_string()),
    }
}

/// `gh release delete` says "release not found"; the refs API answers
/// "Reference does not exist" (HTTP 422) or a plain 404.
fn is_not_found(stderr: &str) -> bool {
    let lower = stderr.to_ascii_lowercase();
    lower.contains("release not found")
        || lower.contains("reference does not exist")
        || lower.contains("http 404")
}

/// Logs what would be published without touching the remote.
#[derive(Debug, Clone, Default)]
pub struct DryRunPublisher;

impl ReleasePublisher for DryRunPublisher {
    async fn delete_release(&self, tag: &str) -> DeleteOutcome {
        info!(tag, "dry run: would delete release");
        DeleteOutcome::NotFound
    }

    async fn delete_tag(&self, tag: &str) -> DeleteOutcome {
        info!(tag, "dry run: would delete tag");
        DeleteOutcome::NotFound
    }

    async fn create_release(&self, request: &ReleaseRequest) -> Result<()> {
        info!(
            tag = %request.tag,
            title = %request.title,
            assets = request.assets.len(),
            "dry run: would create release"
        );
        Ok(())
    }

    fn requirement(&self) -> Option<Requirement> {
        None
    }
}
