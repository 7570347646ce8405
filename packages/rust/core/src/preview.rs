//! Compressed preview copies. Never cached.

use std::path::Path;

use tracing::{info, instrument};

use bookrelease_shared::{BookReleaseError, Result};
use bookrelease_tools::Toolchain;

/// Compress `source` into `preview`, replacing any earlier preview.
#[instrument(skip_all, fields(source = %source.display(), preview = %preview.display()))]
pub async fn compress_preview<T: Toolchain>(tools: &T, source: &Path, preview: &Path) -> Result<()> {
    // A stale preview would mask a compressor that wrote nothing.
    if preview.exists() {
        std::fs::remove_file(preview).map_err(|e| BookReleaseError::io(preview, e))?;
    }

    tools.compress(source, preview).await?;
    if !preview.is_file() {
        return Err(BookReleaseError::output_missing("preview compression", preview));
    }
    info!("preview written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, CallLog, MockToolchain, temp_dir, touch};

    #[tokio::test]
    async fn always_recompresses() {
        let dir = temp_dir("br-preview");
        let (src, dst) = (dir.join("main_bps_trade.pdf"), dir.join("preview.pdf"));
        touch(&src);
        let log = CallLog::default();
        let tools = MockToolchain::new(&log);

        compress_preview(&tools, &src, &dst).await.unwrap();
        compress_preview(&tools, &src, &dst).await.unwrap();

        assert_eq!(log.count(|c| matches!(c, Call::Compress(..))), 2);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn stale_preview_does_not_hide_a_silent_failure() {
        let dir = temp_dir("br-preview-stale");
        let (src, dst) = (dir.join("main_us.pdf"), dir.join("preview.pdf"));
        touch(&src);
        touch(&dst);
        let log = CallLog::default();
        let tools = MockToolchain {
            produce_outputs: false,
            ..MockToolchain::new(&log)
        };

        let err = compress_preview(&tools, &src, &dst).await.unwrap_err();
        assert!(err.to_string().contains("preview compression"));
        std::fs::remove_dir_all(&dir).ok();
    }
}
