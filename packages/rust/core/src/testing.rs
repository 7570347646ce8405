//! Scratch directories and recording mocks shared by the unit tests.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use bookrelease_shared::{AppConfig, ChapterLayout, DeleteOutcome, Result};
use bookrelease_tools::{ReleasePublisher, ReleaseRequest, Requirement, Toolchain};

use crate::plan::ReleasePlan;

pub fn temp_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("{prefix}-{}", uuid::Uuid::now_v7()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// A plan with default names rooted in a fresh scratch directory.
pub fn scratch_plan() -> (PathBuf, ReleasePlan) {
    let dir = temp_dir("br-core-test");
    let plan = ReleasePlan::from_config(&AppConfig::default(), &dir);
    (dir, plan)
}

pub fn touch(path: &Path) {
    std::fs::write(path, b"%PDF-1.4\n").unwrap();
}

/// Set a file's modification time to `secs` seconds after an arbitrary epoch.
pub fn set_mtime(path: &Path, secs: u64) {
    let when = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000 + secs);
    std::fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(when)
        .unwrap();
}

/// One recorded adapter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Rescale(PathBuf, PathBuf),
    Compress(PathBuf, PathBuf),
    Split(PathBuf, PathBuf),
    DeleteRelease(String),
    DeleteTag(String),
    Create(ReleaseRequest),
}

/// Shared call log so toolchain and publisher calls interleave in order.
#[derive(Debug, Default)]
pub struct CallLog(Mutex<Vec<Call>>);

impl CallLog {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }
}

/// Toolchain that writes placeholder outputs and records every call.
pub struct MockToolchain<'a> {
    pub log: &'a CallLog,
    pub layout: ChapterLayout,
    /// When false, calls succeed but write nothing.
    pub produce_outputs: bool,
}

impl<'a> MockToolchain<'a> {
    pub fn new(log: &'a CallLog) -> Self {
        Self {
            log,
            layout: ChapterLayout::default(),
            produce_outputs: true,
        }
    }
}

impl Toolchain for MockToolchain<'_> {
    async fn rescale(&self, src: &Path, dst: &Path) -> Result<()> {
        self.log.push(Call::Rescale(src.into(), dst.into()));
        if self.produce_outputs {
            touch(dst);
        }
        Ok(())
    }

    async fn compress(&self, src: &Path, dst: &Path) -> Result<()> {
        self.log.push(Call::Compress(src.into(), dst.into()));
        if self.produce_outputs {
            touch(dst);
        }
        Ok(())
    }

    async fn split(&self, src: &Path, out_dir: &Path) -> Result<()> {
        self.log.push(Call::Split(src.into(), out_dir.into()));
        if self.produce_outputs {
            std::fs::create_dir_all(out_dir).unwrap();
            for unit in self.layout.units() {
                touch(&out_dir.join(unit.file_name()));
            }
        }
        Ok(())
    }

    fn requirements(&self) -> Vec<Requirement> {
        Vec::new()
    }
}

/// Publisher that records calls and answers deletes with fixed outcomes.
pub struct MockPublisher<'a> {
    pub log: &'a CallLog,
    pub release_outcome: DeleteOutcome,
    pub tag_outcome: DeleteOutcome,
}

impl<'a> MockPublisher<'a> {
    pub fn new(log: &'a CallLog) -> Self {
        Self {
            log,
            release_outcome: DeleteOutcome::Deleted,
            tag_outcome: DeleteOutcome::Deleted,
        }
    }
}

impl ReleasePublisher for MockPublisher<'_> {
    async fn delete_release(&self, tag: &str) -> DeleteOutcome {
        self.log.push(Call::DeleteRelease(tag.into()));
        self.release_outcome.clone()
    }

    async fn delete_tag(&self, tag: &str) -> DeleteOutcome {
        self.log.push(Call::DeleteTag(tag.into()));
        self.tag_outcome.clone()
    }

    async fn create_release(&self, request: &ReleaseRequest) -> Result<()> {
        self.log.push(Call::Create(request.clone()));
        Ok(())
    }

    fn requirement(&self) -> Option<Requirement> {
        None
    }
}
