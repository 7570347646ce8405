//! Subject index regeneration.
//!
//! Rebuilds the book's subject index from two JSON files kept in the index
//! directory:
//!
//! - `pass2_raw_results.json`: per-chapter `{subject, subtopic}` entries
//! - `candidates.json`: the reviewed subject list, each with an `include` flag
//!
//! and writes `final_index.json` plus the two-column LaTeX index
//! `subject_index_new.tex` next to them. Chapter references become
//! `\pageref{label}` when `main.tex` names the chapter's label.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{Local, NaiveDateTime};
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use bookrelease_shared::{BookReleaseError, MissingInput, Result};

pub const RESULTS_FILE: &str = "pass2_raw_results.json";
pub const CANDIDATES_FILE: &str = "candidates.json";
pub const FINAL_INDEX_FILE: &str = "final_index.json";
pub const LATEX_FILE: &str = "subject_index_new.tex";

/// Subtopics that read as one term and are never split on " and ".
const KEEP_COMBINED: [&str; 3] = ["fields and forces", "formalism & notation", "error and bias"];

static CHAPTER_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\chapterwithsummaryfromfile\[([^\]]+)\]\{([^}]+)\}").expect("static regex")
});

/// Classification of one chapter.
#[derive(Debug, Clone, Deserialize)]
pub struct ChapterResult {
    pub chapter_num: u32,
    #[serde(default)]
    pub chapter_dir: String,
    #[serde(default)]
    pub entries: Vec<IndexEntry>,
    /// Set when classifying this chapter failed; `entries` is then empty.
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexEntry {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub subtopic: Option<String>,
}

/// A reviewed subject. Only included candidates appear in the index.
#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub subject: String,
    #[serde(default = "default_true")]
    pub include: bool,
}

fn default_true() -> bool {
    true
}

/// Subject, then subtopic (`None` for the bare subject), then chapter numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectIndex {
    subjects: BTreeMap<String, BTreeMap<Option<String>, BTreeSet<u32>>>,
}

impl SubjectIndex {
    pub fn insert(&mut self, subject: &str, subtopic: Option<String>, chapter: u32) {
        self.subjects
            .entry(subject.to_string())
            .or_default()
            .entry(subtopic)
            .or_default()
            .insert(chapter);
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    /// Pretty JSON with sorted keys; the bare-subject bucket is keyed `"None"`.
    pub fn to_json(&self) -> Result<String> {
        let serializable: BTreeMap<&str, BTreeMap<&str, &BTreeSet<u32>>> = self
            .subjects
            .iter()
            .map(|(subject, subtopics)| {
                let subtopics: BTreeMap<&str, &BTreeSet<u32>> = subtopics
                    .iter()
                    .map(|(key, chapters)| (key.as_deref().unwrap_or("None"), chapters))
                    .collect();
                (subject.as_str(), subtopics)
            })
            .collect();
        serde_json::to_string_pretty(&serializable).map_err(|e| {
            BookReleaseError::validation(format!("JSON serialization failed: {e}"))
        })
    }
}

/// The approved subject `subject` files under: an exact case-insensitive
/// match first, then the first approved subject containing it or contained
/// in it.
pub fn match_subject<'a>(subject: &str, approved: &'a [&Candidate]) -> Option<&'a str> {
    let wanted = subject.to_lowercase();
    approved
        .iter()
        .find(|c| c.subject.to_lowercase() == wanted)
        .or_else(|| {
            approved.iter().find(|c| {
                let name = c.subject.to_lowercase();
                name.contains(&wanted) || wanted.contains(&name)
            })
        })
        .map(|c| c.subject.as_str())
}

/// Normalized subtopic keys for one raw subtopic: lowercased, trimmed, and
/// split on " and " unless the pair reads as one term.
fn subtopic_keys(raw: Option<&str>) -> Vec<Option<String>> {
    let key = match raw.map(|s| s.trim().to_lowercase()) {
        Some(key) if !key.is_empty() => key,
        _ => return vec![None],
    };
    if KEEP_COMBINED.contains(&key.as_str()) || !key.contains(" and ") {
        return vec![Some(key)];
    }
    key.split(" and ")
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| Some(part.to_string()))
        .collect()
}

/// Fold chapter classifications into an index of approved subjects.
///
/// Entries with an empty subject, or one matching no included candidate,
/// are dropped.
pub fn build_index(results: &[ChapterResult], candidates: &[Candidate]) -> SubjectIndex {
    let approved: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| c.include && !c.subject.trim().is_empty())
        .collect();

    let mut index = SubjectIndex::default();
    for result in results {
        for entry in &result.entries {
            let subject = entry.subject.trim();
            if subject.is_empty() {
                continue;
            }
            let Some(matched) = match_subject(subject, &approved) else {
                debug!(subject, chapter = result.chapter_num, "subject not approved");
                continue;
            };
            for key in subtopic_keys(entry.subtopic.as_deref()) {
                index.insert(matched, key, result.chapter_num);
            }
        }
    }
    index
}

/// Chapter number to `\label` name, read from the chapter commands in `main_tex`.
pub fn chapter_labels(main_tex: &str, results: &[ChapterResult]) -> BTreeMap<u32, String> {
    let mut labels = BTreeMap::new();
    for caps in CHAPTER_LABEL.captures_iter(main_tex) {
        if let Some(result) = results.iter().find(|r| r.chapter_dir == caps[2]) {
            labels.insert(result.chapter_num, caps[1].to_string());
        }
    }
    labels
}

fn escape(text: &str) -> String {
    text.replace('&', "\\&")
}

fn refs(chapters: &BTreeSet<u32>, labels: &BTreeMap<u32, String>) -> String {
    chapters
        .iter()
        .map(|ch| match labels.get(ch) {
            Some(label) => format!("\\pageref{{{label}}}"),
            None => ch.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render the LaTeX subject index.
///
/// Subjects are grouped under their initial letter. A subject whose named
/// subtopics all cite the same chapters gets one line listing them in
/// parentheses; otherwise each subtopic gets its own indented line. A
/// subject with no named subtopic cites every chapter it appears in.
pub fn render_latex(
    index: &SubjectIndex,
    labels: &BTreeMap<u32, String>,
    generated_at: NaiveDateTime,
) -> String {
    let mut lines = vec![
        "% Subject Index - Beyond Popular Science".to_string(),
        format!(
            "% Auto-generated by bookrelease on {}",
            generated_at.format("%Y-%m-%d %H:%M")
        ),
        format!("% Regenerated from {RESULTS_FILE} and {CANDIDATES_FILE}"),
        String::new(),
        "\\chapter*{Subject Index}".to_string(),
        "\\markboth{SUBJECT INDEX}{SUBJECT INDEX}".to_string(),
        "\\addcontentsline{toc}{chapter}{Subject Index}".to_string(),
        String::new(),
        "\\begin{multicols}{2}".to_string(),
        "\\small".to_string(),
        "\\setlength{\\parskip}{0.3em}".to_string(),
        String::new(),
    ];

    let mut subjects: Vec<_> = index.subjects.iter().collect();
    subjects.sort_by(|(a, _), (b, _)| a.to_lowercase().cmp(&b.to_lowercase()).then(a.cmp(b)));

    let mut current_letter: Option<String> = None;
    for (subject, subtopics) in subjects {
        let letter = subject
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect::<String>())
            .unwrap_or_else(|| "?".to_string());
        if current_letter.as_deref() != Some(letter.as_str()) {
            if current_letter.is_some() {
                lines.push(String::new());
            }
            lines.push(format!("\\noindent\\textbf{{{letter}}}\\\\[0.3em]"));
            current_letter = Some(letter);
        }

        let name = escape(subject);
        let named: Vec<(&String, &BTreeSet<u32>)> = subtopics
            .iter()
            .filter_map(|(key, chapters)| key.as_ref().map(|k| (k, chapters)))
            .collect();

        if named.is_empty() {
            let all: BTreeSet<u32> = subtopics.values().flatten().copied().collect();
            lines.push(format!("\\textbf{{{name}}}, {}\\\\", refs(&all, labels)));
            continue;
        }

        let distinct: BTreeSet<&BTreeSet<u32>> = named.iter().map(|(_, ch)| *ch).collect();
        match distinct.first() {
            Some(shared) if distinct.len() == 1 => {
                let subs = named
                    .iter()
                    .map(|(sub, _)| escape(sub))
                    .collect::<Vec<_>>()
                    .join(", ");
                lines.push(format!(
                    "\\textbf{{{name}}} ({subs}), {}\\\\",
                    refs(shared, labels)
                ));
            }
            _ => {
                lines.push(format!("\\textbf{{{name}}}\\\\"));
                for (sub, chapters) in &named {
                    lines.push(format!(
                        "\\hspace*{{1.5em}}{}, {}\\\\",
                        escape(sub),
                        refs(chapters, labels)
                    ));
                }
            }
        }
    }

    lines.extend(["".to_string(), "\\end{multicols}".to_string(), String::new()]);
    lines.join("\n")
}

/// Where the index inputs and outputs live.
#[derive(Debug, Clone)]
pub struct IndexPaths {
    /// Directory holding the JSON inputs; outputs are written here too.
    pub dir: PathBuf,
    /// Book source naming each chapter's label.
    pub main_tex: PathBuf,
}

impl IndexPaths {
    pub fn results(&self) -> PathBuf {
        self.dir.join(RESULTS_FILE)
    }

    pub fn candidates(&self) -> PathBuf {
        self.dir.join(CANDIDATES_FILE)
    }

    pub fn final_index(&self) -> PathBuf {
        self.dir.join(FINAL_INDEX_FILE)
    }

    pub fn latex(&self) -> PathBuf {
        self.dir.join(LATEX_FILE)
    }
}

/// Outcome of one regeneration.
#[derive(Debug, Clone)]
pub struct IndexReport {
    pub subjects: usize,
    /// Chapters cited by label rather than by number.
    pub labelled_chapters: usize,
    /// Chapters whose classification had failed and contributed nothing.
    pub failed_chapters: usize,
    pub final_index: PathBuf,
    pub latex: PathBuf,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| BookReleaseError::io(path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| BookReleaseError::validation(format!("invalid {}: {e}", path.display())))
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).map_err(|e| BookReleaseError::io(path, e))?;
    debug!(path = %path.display(), "wrote index file");
    Ok(())
}

/// Regenerate the index files stamped with the local time.
pub fn regenerate_index(paths: &IndexPaths) -> Result<IndexReport> {
    regenerate_index_at(paths, Local::now().naive_local())
}

/// Regenerate `final_index.json` and `subject_index_new.tex` from the
/// classification results and the reviewed candidates.
#[instrument(skip_all, fields(dir = %paths.dir.display()))]
pub fn regenerate_index_at(paths: &IndexPaths, generated_at: NaiveDateTime) -> Result<IndexReport> {
    let missing: Vec<MissingInput> = [
        (paths.results(), "python index/extract_subjects.py pass2"),
        (paths.candidates(), "python index/extract_subjects.py pass1"),
    ]
    .into_iter()
    .filter(|(path, _)| !path.is_file())
    .map(|(path, remedy)| MissingInput {
        path,
        remedy: remedy.to_string(),
    })
    .collect();
    if !missing.is_empty() {
        return Err(BookReleaseError::MissingInputs(missing));
    }

    let results: Vec<ChapterResult> = read_json(&paths.results())?;
    let candidates: Vec<Candidate> = read_json(&paths.candidates())?;
    let failed_chapters = results.iter().filter(|r| r.error.is_some()).count();
    if failed_chapters > 0 {
        warn!(failed_chapters, "some chapters have no classification");
    }

    let labels = if paths.main_tex.is_file() {
        let source = std::fs::read_to_string(&paths.main_tex)
            .map_err(|e| BookReleaseError::io(&paths.main_tex, e))?;
        chapter_labels(&source, &results)
    } else {
        warn!(path = %paths.main_tex.display(), "main source not found, citing chapter numbers");
        BTreeMap::new()
    };

    let index = build_index(&results, &candidates);
    if index.is_empty() {
        warn!("no approved subjects matched any chapter");
    }

    let report = IndexReport {
        subjects: index.len(),
        labelled_chapters: labels.len(),
        failed_chapters,
        final_index: paths.final_index(),
        latex: paths.latex(),
    };
    write_file(&report.final_index, &index.to_json()?)?;
    write_file(&report.latex, &render_latex(&index, &labels, generated_at))?;

    info!(subjects = report.subjects, "subject index regenerated");
    Ok(report)
}
