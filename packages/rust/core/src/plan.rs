//! Resolved file locations for one release run.

use std::path::{Path, PathBuf};

use bookrelease_shared::{AppConfig, ChapterLayout, MissingInput};

/// Every path the pipeline reads or writes, resolved against the book root.
#[derive(Debug, Clone)]
pub struct ReleasePlan {
    pub root: PathBuf,

    pub bps_executive: PathBuf,
    pub us_executive: PathBuf,
    pub cover: PathBuf,
    /// `(path, remedy)` for each required input, in preflight order.
    pub inputs: Vec<(PathBuf, String)>,

    pub bps_trade: PathBuf,
    pub us_trade: PathBuf,
    pub main_copy: PathBuf,
    pub bps_preview: PathBuf,
    pub us_preview: PathBuf,
    pub chapters_dir: PathBuf,

    pub layout: ChapterLayout,

    pub repository: String,
    pub tag: String,
    pub title: String,
}

impl ReleasePlan {
    pub fn from_config(config: &AppConfig, root: &Path) -> Self {
        let at = |name: &str| root.join(name);
        let inputs = config
            .inputs
            .all()
            .iter()
            .map(|input| (at(&input.path), input.remedy.clone()))
            .collect();

        Self {
            root: root.to_path_buf(),
            bps_executive: at(&config.inputs.bps_executive.path),
            us_executive: at(&config.inputs.us_executive.path),
            cover: at(&config.inputs.cover.path),
            inputs,
            bps_trade: at(&config.outputs.bps_trade),
            us_trade: at(&config.outputs.us_trade),
            main_copy: at(&config.outputs.main_copy),
            bps_preview: at(&config.outputs.bps_preview),
            us_preview: at(&config.outputs.us_preview),
            chapters_dir: at(&config.outputs.chapters_dir),
            layout: config.chapters,
            repository: config.release.repository.clone(),
            tag: config.release.tag.clone(),
            title: config.release.title.clone(),
        }
    }

    /// Inputs that do not exist on disk, with their remedies.
    pub fn missing_inputs(&self) -> Vec<MissingInput> {
        self.inputs
            .iter()
            .filter(|(path, _)| !path.is_file())
            .map(|(path, remedy)| MissingInput {
                path: path.clone(),
                remedy: remedy.clone(),
            })
            .collect()
    }

    /// Files removed after a successful upload.
    pub fn ephemeral_files(&self) -> [&Path; 3] {
        [&self.main_copy, &self.bps_preview, &self.us_preview]
    }
}
