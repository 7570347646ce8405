//! Concatenate chapter LaTeX sources into one text file.
//!
//! Chapter directories are named `NN_subject`. Each becomes a block:
//!
//! ```text
//! === CHAPTER_START: 03 | quantum_fields ===
//! --- FILE: main.tex ---
//! ...contents...
//! === CHAPTER_END ===
//! ```

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, instrument, warn};

use bookrelease_shared::{BookReleaseError, Result};

/// Default output file name.
pub const DEFAULT_OUTPUT: &str = "temp_chapters_content.txt";

static CHAPTER_DIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{2})_(.*)$").expect("static regex"));

/// A chapter source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterSource {
    pub number: String,
    pub subject: String,
    pub dir: PathBuf,
}

/// Summary of one collection run.
#[derive(Debug, Clone, Default)]
pub struct CollectReport {
    pub chapters: usize,
    pub files: usize,
    /// Files that could not be read and were replaced by an error line.
    pub unreadable: usize,
}

/// `NN_subject` directories directly under `root`, sorted by name.
pub fn find_chapter_dirs(root: &Path) -> Result<Vec<ChapterSource>> {
    let entries = std::fs::read_dir(root).map_err(|e| BookReleaseError::io(root, e))?;
    let mut found = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| BookReleaseError::io(root, e))?.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(caps) = CHAPTER_DIR.captures(name) {
            found.push(ChapterSource {
                number: caps[1].to_string(),
                subject: caps[2].to_string(),
                dir: path.clone(),
            });
        }
    }
    found.sort_by(|a, b| a.dir.file_name().cmp(&b.dir.file_name()));
    Ok(found)
}

fn tex_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| BookReleaseError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| BookReleaseError::io(dir, e))?.path();
        if path.extension().is_some_and(|ext| ext == "tex") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Render every chapter under `root` into one string.
pub fn render_chapters(root: &Path) -> Result<(String, CollectReport)> {
    let mut out = String::new();
    let mut report = CollectReport::default();

    for chapter in find_chapter_dirs(root)? {
        report.chapters += 1;
        let _ = writeln!(
            out,
            "=== CHAPTER_START: {} | {} ===",
            chapter.number, chapter.subject
        );
        for file in tex_files(&chapter.dir)? {
            report.files += 1;
            match std::fs::read_to_string(&file) {
                Ok(contents) => {
                    let name = file.file_name().unwrap_or_default().to_string_lossy();
                    let _ = writeln!(out, "--- FILE: {name} ---");
                    out.push_str(&contents);
                    out.push('\n');
                }
                Err(e) => {
                    warn!(path = %file.display(), error = %e, "unreadable chapter source");
                    report.unreadable += 1;
                    let _ = writeln!(out, "Error reading {}: {e}", file.display());
                }
            }
        }
        out.push_str("=== CHAPTER_END ===\n\n");
    }
    Ok((out, report))
}

/// Collect chapter sources under `root` into `output`.
#[instrument(skip_all, fields(root = %root.display(), output = %output.display()))]
pub fn collect_chapters(root: &Path, output: &Path) -> Result<CollectReport> {
    let (content, report) = render_chapters(root)?;
    std::fs::write(output, content).map_err(|e| BookReleaseError::io(output, e))?;
    info!(chapters = report.chapters, files = report.files, "chapter sources collected");
    Ok(report)
}
