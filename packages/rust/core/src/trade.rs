//! Trade-size derivation with a modification-time cache.

use std::fmt;
use std::path::Path;
use std::time::SystemTime;

use tracing::{info, instrument};

use bookrelease_shared::{BookReleaseError, Result};
use bookrelease_tools::Toolchain;

/// What [`derive_trade`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeOutcome {
    /// The existing derived file was at least as new as the source.
    Reused,
    /// The rescaler ran.
    Regenerated,
}

impl fmt::Display for TradeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reused => f.write_str("reused"),
            Self::Regenerated => f.write_str("regenerated"),
        }
    }
}

fn modified(path: &Path) -> Result<SystemTime> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| BookReleaseError::io(path, e))
}

/// True when `derived` exists and `source` is not strictly newer.
pub fn is_fresh(source: &Path, derived: &Path) -> Result<bool> {
    if !derived.is_file() {
        return Ok(false);
    }
    Ok(modified(source)? <= modified(derived)?)
}

/// Rescale `source` to trade size at `derived` unless the cached copy is fresh.
#[instrument(skip_all, fields(source = %source.display(), derived = %derived.display()))]
pub async fn derive_trade<T: Toolchain>(
    tools: &T,
    source: &Path,
    derived: &Path,
) -> Result<TradeOutcome> {
    if is_fresh(source, derived)? {
        info!("trade PDF up to date, reusing");
        return Ok(TradeOutcome::Reused);
    }

    info!("rescaling to trade size");
    tools.rescale(source, derived).await?;
    if !derived.is_file() {
        return Err(BookReleaseError::output_missing("trade-size rescale", derived));
    }
    Ok(TradeOutcome::Regenerated)
}
