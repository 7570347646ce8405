//! Fixed-layout chapter slicing.

use std::path::{Path, PathBuf};

use bookrelease_shared::{BookReleaseError, ChapterLayout, ChapterUnit, Result};
use lopdf::Document;
use tracing::{debug, info, instrument};

/// Split `input` into one file per [`ChapterUnit`] of `layout` inside `out_dir`.
///
/// The directory is created if needed. Returns the written paths in unit
/// order. An invalid layout or a document too short for it (no back matter
/// left) is rejected before anything is written.
#[instrument(skip_all, fields(input = %input.display(), out_dir = %out_dir.display()))]
pub fn split_chapters(input: &Path, layout: &ChapterLayout, out_dir: &Path) -> Result<Vec<PathBuf>> {
    layout.check()?;
    let source = crate::load(input)?;
    let total = source.get_pages().len() as u32;

    if total < layout.min_pages() {
        return Err(BookReleaseError::validation(format!(
            "{} has {total} pages but the chapter layout needs at least {} \
             ({} front matter + {} chapters x {} pages + back matter)",
            input.display(),
            layout.min_pages(),
            layout.front_matter_pages,
            layout.chapter_count,
            layout.pages_per_chapter,
        )));
    }

    std::fs::create_dir_all(out_dir).map_err(|e| BookReleaseError::io(out_dir, e))?;

    let units = layout.units();
    let mut written = Vec::with_capacity(units.len());
    for unit in &units {
        let path = out_dir.join(unit.file_name());
        let mut doc = extract_unit(&source, unit, total);
        crate::save(&mut doc, &path)?;
        debug!(file = %path.display(), first = unit.first_page, "wrote chapter unit");
        written.push(path);
    }

    info!(files = written.len(), pages = total, "split complete");
    Ok(written)
}

/// Copy of `source` holding only the pages of `unit`.
fn extract_unit(source: &Document, unit: &ChapterUnit, total: u32) -> Document {
    let last = unit.last_page.unwrap_or(total);
    let drop: Vec<u32> = (1..=total)
        .filter(|p| *p < unit.first_page || *p > last)
        .collect();

    let mut doc = source.clone();
    doc.delete_pages(&drop);
    doc.prune_objects();
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{first_page_text, page_count, temp_dir, write_dummy_pdf};

    #[test]
    fn splits_520_pages_into_52_files() {
        let dir = temp_dir("br-split");
        let input = dir.join("main_us_trade.pdf");
        write_dummy_pdf(&input, 520);
        let out = dir.join("chapters_release");

        let files = split_chapters(&input, &ChapterLayout::default(), &out).unwrap();

        assert_eq!(files.len(), 52);
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 52);
        assert_eq!(page_count(&files[0]), 20);
        assert_eq!(page_count(&files[1]), 9);
        assert_eq!(page_count(&files[50]), 9);
        assert_eq!(page_count(&files[51]), 50);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn chapters_hold_the_right_pages() {
        let dir = temp_dir("br-split-pages");
        let input = dir.join("book.pdf");
        write_dummy_pdf(&input, 16);
        let layout = ChapterLayout {
            front_matter_pages: 2,
            chapter_count: 3,
            pages_per_chapter: 4,
        };

        let files = split_chapters(&input, &layout, &dir.join("out")).unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            [
                "00_front_matter.pdf",
                "01_chapter_01.pdf",
                "02_chapter_02.pdf",
                "03_chapter_03.pdf",
                "04_back_matter.pdf",
            ]
        );
        assert!(first_page_text(&files[1]).contains("Page 3"));
        assert!(first_page_text(&files[3]).contains("Page 11"));
        assert!(first_page_text(&files[4]).contains("Page 15"));
        assert_eq!(page_count(&files[4]), 2);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn empty_front_matter_layout_writes_nothing() {
        let dir = temp_dir("br-split-nofront");
        let input = dir.join("book.pdf");
        write_dummy_pdf(&input, 16);
        let layout = ChapterLayout {
            front_matter_pages: 0,
            chapter_count: 3,
            pages_per_chapter: 4,
        };
        let out = dir.join("out");

        let err = split_chapters(&input, &layout, &out).unwrap_err();
        assert!(err.to_string().contains("front_matter_pages"));
        assert!(!out.exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn short_document_is_rejected_before_writing() {
        let dir = temp_dir("br-split-short");
        let input = dir.join("book.pdf");
        write_dummy_pdf(&input, 14);
        let layout = ChapterLayout {
            front_matter_pages: 2,
            chapter_count: 3,
            pages_per_chapter: 4,
        };
        let out = dir.join("out");

        let err = split_chapters(&input, &layout, &out).unwrap_err();
        assert!(err.to_string().contains("14 pages"));
        assert!(!out.exists());

        std::fs::remove_dir_all(&dir).ok();
    }
}
