//! End-to-end `release` pipeline: preflight → trade → previews → split → publish → cleanup.

use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{info, instrument};

use bookrelease_shared::{BookReleaseError, Result};
use bookrelease_tools::{ReleasePublisher, ReleaseRequest, Toolchain};

use crate::chapters::{list_chapter_files, split_chapters};
use crate::cleanup::{CleanupReport, cleanup};
use crate::manifest::ReleaseManifest;
use crate::notes::{NotesContext, render_notes};
use crate::plan::ReleasePlan;
use crate::preflight::run_preflight;
use crate::preview::compress_preview;
use crate::publish::{PublishReport, publish};
use crate::trade::{TradeOutcome, derive_trade};

/// Switches for one `release` run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReleaseOptions {
    /// Leave the main copy, previews and chapter directory on disk.
    pub keep_artifacts: bool,
}

/// Result of the `release` pipeline.
#[derive(Debug)]
pub struct ReleaseResult {
    pub bps_trade: TradeOutcome,
    pub us_trade: TradeOutcome,
    /// Number of files attached to the release.
    pub asset_count: usize,
    pub publish: PublishReport,
    /// `None` when artifacts were kept.
    pub cleanup: Option<CleanupReport>,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the pipeline completes.
    fn done(&self, result: &ReleaseResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _result: &ReleaseResult) {}
}

/// Derive both trade PDFs, reusing fresh ones.
pub async fn derive_all_trade<T: Toolchain>(
    plan: &ReleasePlan,
    tools: &T,
) -> Result<(TradeOutcome, TradeOutcome)> {
    let bps = derive_trade(tools, &plan.bps_executive, &plan.bps_trade).await?;
    let us = derive_trade(tools, &plan.us_executive, &plan.us_trade).await?;
    Ok((bps, us))
}

/// Manifest and notes for whatever is currently in the chapter directory.
pub fn build_notes(plan: &ReleasePlan) -> Result<(ReleaseManifest, String)> {
    let chapters = if plan.chapters_dir.is_dir() {
        list_chapter_files(&plan.chapters_dir)?
    } else {
        Vec::new()
    };
    let manifest = ReleaseManifest::assemble(plan, &chapters)?;
    let notes = render_notes(&manifest, &notes_context(plan))?;
    Ok((manifest, notes))
}

fn notes_context(plan: &ReleasePlan) -> NotesContext {
    NotesContext {
        repository: plan.repository.clone(),
        tag: plan.tag.clone(),
        generated_at: Utc::now(),
    }
}

/// Run the full `release` pipeline.
///
/// 1. Preflight: inputs, release tool, PDF tools
/// 2. Trade PDFs for both editions (cached)
/// 3. Main copy of the BPS executive PDF
/// 4. Previews: BPS trade and US executive
/// 5. Split the US trade PDF into chapters
/// 6. Manifest and notes
/// 7. Replace the release
/// 8. Remove ephemeral files
#[instrument(skip_all, fields(repository = %plan.repository, tag = %plan.tag))]
pub async fn run_release<T, P>(
    plan: &ReleasePlan,
    tools: &T,
    publisher: &P,
    options: ReleaseOptions,
    progress: &dyn ProgressReporter,
) -> Result<ReleaseResult>
where
    T: Toolchain,
    P: ReleasePublisher,
{
    let start = Instant::now();
    info!(root = %plan.root.display(), "starting release pipeline");

    // --- Phase 1: Preflight ---
    progress.phase("Checking inputs and tools");
    run_preflight(plan, tools, publisher)?;

    // --- Phase 2: Trade PDFs ---
    progress.phase("Deriving trade-size PDFs");
    let (bps_trade, us_trade) = derive_all_trade(plan, tools).await?;
    info!(bps = %bps_trade, us = %us_trade, "trade PDFs ready");

    // --- Phase 3: Main copy ---
    progress.phase("Copying main PDF");
    std::fs::copy(&plan.bps_executive, &plan.main_copy)
        .map_err(|e| BookReleaseError::io(&plan.main_copy, e))?;

    // --- Phase 4: Previews ---
    progress.phase("Compressing previews");
    compress_preview(tools, &plan.bps_trade, &plan.bps_preview).await?;
    compress_preview(tools, &plan.us_executive, &plan.us_preview).await?;

    // --- Phase 5: Chapters ---
    progress.phase("Splitting chapters");
    let chapters = split_chapters(tools, &plan.us_trade, &plan.chapters_dir, &plan.layout).await?;

    // --- Phase 6: Manifest and notes ---
    progress.phase("Preparing release notes");
    let manifest = ReleaseManifest::assemble(plan, &chapters)?;
    if let Some(missing) = manifest.missing_files().first() {
        return Err(BookReleaseError::output_missing("release packaging", *missing));
    }
    let notes = render_notes(&manifest, &notes_context(plan))?;

    // --- Phase 7: Publish ---
    progress.phase("Publishing release");
    let request = ReleaseRequest {
        tag: plan.tag.clone(),
        title: plan.title.clone(),
        notes,
        assets: manifest.paths(),
    };
    let publish_report = publish(publisher, &request).await?;

    // --- Phase 8: Cleanup ---
    let cleanup_report = if options.keep_artifacts {
        info!("keeping release artifacts");
        None
    } else {
        progress.phase("Cleaning up");
        Some(cleanup(plan)?)
    };

    let result = ReleaseResult {
        bps_trade,
        us_trade,
        asset_count: manifest.len(),
        publish: publish_report,
        cleanup: cleanup_report,
        elapsed: start.elapsed(),
    };
    info!(
        assets = result.asset_count,
        elapsed_ms = result.elapsed.as_millis() as u64,
        "release pipeline complete"
    );
    progress.done(&result);
    Ok(result)
}
