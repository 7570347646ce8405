//! Core domain types for book releases.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{BookReleaseError, Result};

/// PostScript points per inch.
pub const POINTS_PER_INCH: f64 = 72.0;

// ---------------------------------------------------------------------------
// PageSize
// ---------------------------------------------------------------------------

/// Physical page dimensions in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width_in: f64,
    pub height_in: f64,
}

impl PageSize {
    /// 7x10in, the size the book is compiled at.
    pub const EXECUTIVE: Self = Self {
        width_in: 7.0,
        height_in: 10.0,
    };

    /// 6.14x9.21in, the print-on-demand trade format.
    pub const TRADE: Self = Self {
        width_in: 6.14,
        height_in: 9.21,
    };

    /// Width in PDF points.
    pub fn width_pt(&self) -> f64 {
        self.width_in * POINTS_PER_INCH
    }

    /// Height in PDF points.
    pub fn height_pt(&self) -> f64 {
        self.height_in * POINTS_PER_INCH
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}in", self.width_in, self.height_in)
    }
}

// ---------------------------------------------------------------------------
// Edition
// ---------------------------------------------------------------------------

/// The two editions compiled from the same sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edition {
    /// *Beyond Popular Science*, the public edition.
    Bps,
    /// *Unpopular Science*, the edition chapters are cut from.
    Us,
}

impl Edition {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Bps => "Beyond Popular Science",
            Self::Us => "Unpopular Science",
        }
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

// ---------------------------------------------------------------------------
// Chapter layout
// ---------------------------------------------------------------------------

/// Fixed page-count structure of the book used to cut chapter PDFs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterLayout {
    /// Pages before chapter 1.
    #[serde(default = "default_front_matter_pages")]
    pub front_matter_pages: u32,
    /// Number of numbered chapters.
    #[serde(default = "default_chapter_count")]
    pub chapter_count: u32,
    /// Pages in every chapter.
    #[serde(default = "default_pages_per_chapter")]
    pub pages_per_chapter: u32,
}

impl Default for ChapterLayout {
    fn default() -> Self {
        Self {
            front_matter_pages: default_front_matter_pages(),
            chapter_count: default_chapter_count(),
            pages_per_chapter: default_pages_per_chapter(),
        }
    }
}

fn default_front_matter_pages() -> u32 {
    20
}
fn default_chapter_count() -> u32 {
    50
}
fn default_pages_per_chapter() -> u32 {
    9
}

/// Kind of unit a chapter file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    FrontMatter,
    Chapter(u32),
    BackMatter,
}

/// One output file of the chapter split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterUnit {
    pub kind: UnitKind,
    /// Position in the output sequence (the two-digit prefix).
    pub index: u32,
    /// First page, 1-based inclusive.
    pub first_page: u32,
    /// Last page, 1-based inclusive. `None` means "to the end".
    pub last_page: Option<u32>,
}

impl ChapterUnit {
    /// File name under the fixed two-digit-prefixed scheme.
    pub fn file_name(&self) -> String {
        match self.kind {
            UnitKind::FrontMatter => format!("{:02}_front_matter.pdf", self.index),
            UnitKind::Chapter(n) => format!("{:02}_chapter_{n:02}.pdf", self.index),
            UnitKind::BackMatter => format!("{:02}_back_matter.pdf", self.index),
        }
    }
}

impl ChapterLayout {
    /// Largest numbered chapter the two-digit prefix leaves room for.
    pub const MAX_CHAPTERS: u32 = 98;

    /// Reject layouts whose units would be empty or whose page
    /// arithmetic does not fit in `u32`.
    pub fn check(&self) -> Result<()> {
        if self.front_matter_pages == 0 {
            return Err(BookReleaseError::validation(
                "chapters.front_matter_pages must be positive",
            ));
        }
        if self.chapter_count == 0 || self.pages_per_chapter == 0 {
            return Err(BookReleaseError::validation(
                "chapters.chapter_count and chapters.pages_per_chapter must be positive",
            ));
        }
        if self.chapter_count > Self::MAX_CHAPTERS {
            return Err(BookReleaseError::validation(format!(
                "chapters.chapter_count must fit the two-digit file prefix (max {})",
                Self::MAX_CHAPTERS
            )));
        }
        let min_pages = self
            .chapter_count
            .checked_mul(self.pages_per_chapter)
            .and_then(|body| body.checked_add(self.front_matter_pages))
            .and_then(|last| last.checked_add(1));
        if min_pages.is_none() {
            return Err(BookReleaseError::validation(format!(
                "chapter layout of {} + {} x {} pages is too large",
                self.front_matter_pages, self.chapter_count, self.pages_per_chapter
            )));
        }
        Ok(())
    }

    /// Total number of output files: front matter, chapters, back matter.
    pub fn unit_count(&self) -> usize {
        self.chapter_count as usize + 2
    }

    /// Last page covered by the numbered chapters.
    pub fn last_chapter_page(&self) -> u32 {
        self.front_matter_pages + self.chapter_count * self.pages_per_chapter
    }

    /// Smallest document that yields a non-empty back matter.
    pub fn min_pages(&self) -> u32 {
        self.last_chapter_page() + 1
    }

    /// Ordered output units.
    pub fn units(&self) -> Vec<ChapterUnit> {
        let mut units = Vec::with_capacity(self.unit_count());
        units.push(ChapterUnit {
            kind: UnitKind::FrontMatter,
            index: 0,
            first_page: 1,
            last_page: Some(self.front_matter_pages),
        });
        for n in 1..=self.chapter_count {
            let first = self.front_matter_pages + (n - 1) * self.pages_per_chapter + 1;
            units.push(ChapterUnit {
                kind: UnitKind::Chapter(n),
                index: n,
                first_page: first,
                last_page: Some(first + self.pages_per_chapter - 1),
            });
        }
        units.push(ChapterUnit {
            kind: UnitKind::BackMatter,
            index: self.chapter_count + 1,
            first_page: self.last_chapter_page() + 1,
            last_page: None,
        });
        units
    }
}

// ---------------------------------------------------------------------------
// Release assets
// ---------------------------------------------------------------------------

/// Role an uploaded file plays in the release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Main,
    Trade,
    Preview,
    Executive,
    Cover,
    Chapter,
}

impl AssetKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Trade => "trade",
            Self::Preview => "preview",
            Self::Executive => "executive",
            Self::Cover => "cover",
            Self::Chapter => "chapter",
        }
    }
}

/// A file uploaded to the release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseAsset {
    /// Download name (the file name).
    pub name: String,
    /// Local path to upload from.
    pub path: PathBuf,
    pub kind: AssetKind,
    /// Which edition it belongs to, if any.
    pub edition: Option<Edition>,
}

/// Result of deleting a prior release or tag.
///
/// Only creation failures are fatal; every variant here lets the pipeline
/// continue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    Failed(String),
}

impl DeleteOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}
