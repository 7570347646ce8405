//! Chapter split stage.

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use bookrelease_shared::{BookReleaseError, ChapterLayout, Result};
use bookrelease_tools::Toolchain;

/// Split `source` into `out_dir` and return the chapter PDFs sorted by name.
///
/// Any previous directory is removed first so leftovers from an earlier
/// layout are never uploaded. A file count that differs from the layout is
/// logged, not rejected: the external splitter decides its own boundaries.
#[instrument(skip_all, fields(source = %source.display(), out_dir = %out_dir.display()))]
pub async fn split_chapters<T: Toolchain>(
    tools: &T,
    source: &Path,
    out_dir: &Path,
    layout: &ChapterLayout,
) -> Result<Vec<PathBuf>> {
    if out_dir.exists() {
        std::fs::remove_dir_all(out_dir).map_err(|e| BookReleaseError::io(out_dir, e))?;
    }

    tools.split(source, out_dir).await?;
    if !out_dir.is_dir() {
        return Err(BookReleaseError::output_missing("chapter split", out_dir));
    }

    let files = list_chapter_files(out_dir)?;
    if files.len() != layout.unit_count() {
        warn!(
            expected = layout.unit_count(),
            found = files.len(),
            "chapter count differs from layout"
        );
    }
    info!(files = files.len(), "chapters split");
    Ok(files)
}

/// PDF files directly inside `dir`, sorted by file name.
pub fn list_chapter_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| BookReleaseError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| BookReleaseError::io(dir, e))?.path();
        let is_pdf = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CallLog, MockToolchain, temp_dir, touch};

    #[tokio::test]
    async fn lists_52_sorted_files() {
        let dir = temp_dir("br-chapters");
        let src = dir.join("main_us_trade.pdf");
        touch(&src);
        let out = dir.join("chapters_release");
        let log = CallLog::default();

        let files = split_chapters(&MockToolchain::new(&log), &src, &out, &ChapterLayout::default())
            .await
            .unwrap();

        assert_eq!(files.len(), 52);
        assert!(files[0].ends_with("00_front_matter.pdf"));
        assert!(files[51].ends_with("51_back_matter.pdf"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn leftovers_are_cleared_before_splitting() {
        let dir = temp_dir("br-chapters-stale");
        let src = dir.join("main_us_trade.pdf");
        touch(&src);
        let out = dir.join("chapters_release");
        std::fs::create_dir_all(&out).unwrap();
        touch(&out.join("99_old.pdf"));
        let log = CallLog::default();

        let files = split_chapters(&MockToolchain::new(&log), &src, &out, &ChapterLayout::default())
            .await
            .unwrap();

        assert!(!files.iter().any(|f| f.ends_with("99_old.pdf")));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn count_mismatch_is_tolerated() {
        let dir = temp_dir("br-chapters-mismatch");
        let src = dir.join("main_us_trade.pdf");
        touch(&src);
        let out = dir.join("chapters_release");
        let log = CallLog::default();
        // The splitter only knows three chapters; the configured layout expects fifty.
        let tools = MockToolchain {
            layout: ChapterLayout {
                chapter_count: 3,
                ..ChapterLayout::default()
            },
            ..MockToolchain::new(&log)
        };

        let files = split_chapters(&tools, &src, &out, &ChapterLayout::default())
            .await
            .unwrap();

        assert_eq!(files.len(), 5);
        assert_ne!(files.len(), ChapterLayout::default().unit_count());
        assert!(files[0].ends_with("00_front_matter.pdf"));
        assert!(files[4].ends_with("04_back_matter.pdf"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn missing_directory_is_fatal() {
        let dir = temp_dir("br-chapters-missing");
        let src = dir.join("main_us_trade.pdf");
        touch(&src);
        let log = CallLog::default();
        let tools = MockToolchain {
            produce_outputs: false,
            ..MockToolchain::new(&log)
        };

        let err = split_chapters(&tools, &src, &dir.join("out"), &ChapterLayout::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BookReleaseError::OutputMissing { .. }));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn non_pdf_files_are_ignored() {
        let dir = temp_dir("br-chapters-list");
        touch(&dir.join("02_chapter_02.pdf"));
        touch(&dir.join("01_chapter_01.PDF"));
        std::fs::write(dir.join("notes.txt"), "x").unwrap();

        let files = list_chapter_files(&dir).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("01_chapter_01.PDF"));
        std::fs::remove_dir_all(&dir).ok();
    }
}
