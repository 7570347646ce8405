//! The fixed set of files a release uploads.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use bookrelease_shared::{AssetKind, BookReleaseError, Edition, ReleaseAsset, Result};

use crate::plan::ReleasePlan;

/// Ordered release assets: named files first, then chapters by name.
#[derive(Debug, Clone, Default)]
pub struct ReleaseManifest {
    assets: Vec<ReleaseAsset>,
}

fn asset(path: &Path, kind: AssetKind, edition: Option<Edition>) -> Result<ReleaseAsset> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            BookReleaseError::validation(format!("asset path {} has no file name", path.display()))
        })?;
    Ok(ReleaseAsset {
        name,
        path: path.to_path_buf(),
        kind,
        edition,
    })
}

impl ReleaseManifest {
    /// Build the manifest for `plan` plus the split chapter files.
    ///
    /// Download names must be unique since they share one release.
    pub fn assemble(plan: &ReleasePlan, chapters: &[PathBuf]) -> Result<Self> {
        let named = [
            (&plan.main_copy, AssetKind::Main, Some(Edition::Bps)),
            (&plan.bps_trade, AssetKind::Trade, Some(Edition::Bps)),
            (&plan.bps_preview, AssetKind::Preview, Some(Edition::Bps)),
            (&plan.us_executive, AssetKind::Executive, Some(Edition::Us)),
            (&plan.us_preview, AssetKind::Preview, Some(Edition::Us)),
            (&plan.cover, AssetKind::Cover, None),
        ];

        let mut assets = Vec::with_capacity(named.len() + chapters.len());
        for (path, kind, edition) in named {
            assets.push(asset(path, kind, edition)?);
        }
        for chapter in chapters {
            assets.push(asset(chapter, AssetKind::Chapter, Some(Edition::Us))?);
        }

        let mut seen = HashSet::new();
        for a in &assets {
            if !seen.insert(a.name.as_str()) {
                return Err(BookReleaseError::validation(format!(
                    "two release assets share the download name `{}`",
                    a.name
                )));
            }
        }

        Ok(Self { assets })
    }

    pub fn assets(&self) -> &[ReleaseAsset] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Every asset except chapters, in manifest order.
    pub fn named(&self) -> impl Iterator<Item = &ReleaseAsset> {
        self.assets.iter().filter(|a| a.kind != AssetKind::Chapter)
    }

    pub fn chapters(&self) -> impl Iterator<Item = &ReleaseAsset> {
        self.assets.iter().filter(|a| a.kind == AssetKind::Chapter)
    }

    /// Upload paths in manifest order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.assets.iter().map(|a| a.path.clone()).collect()
    }

    /// Any asset whose file is not on disk.
    pub fn missing_files(&self) -> Vec<&Path> {
        self.assets
            .iter()
            .filter(|a| !a.path.is_file())
            .map(|a| a.path.as_path())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookrelease_shared::{AppConfig, ChapterLayout};

    fn chapter_paths(plan: &ReleasePlan) -> Vec<PathBuf> {
        ChapterLayout::default()
            .units()
            .iter()
            .map(|u| plan.chapters_dir.join(u.file_name()))
            .collect()
    }

    #[test]
    fn manifest_has_58_assets() {
        let plan = ReleasePlan::from_config(&AppConfig::default(), Path::new("/book"));
        let manifest = ReleaseManifest::assemble(&plan, &chapter_paths(&plan)).unwrap();

        assert_eq!(manifest.len(), 58);
        assert_eq!(manifest.named().count(), 6);
        assert_eq!(manifest.chapters().count(), 52);

        let kinds: Vec<_> = manifest.named().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            [
                AssetKind::Main,
                AssetKind::Trade,
                AssetKind::Preview,
                AssetKind::Executive,
                AssetKind::Preview,
                AssetKind::Cover,
            ]
        );
        assert_eq!(manifest.assets()[0].name, "Beyond_Popular_Science.pdf");
        assert_eq!(manifest.assets()[3].name, "main_us.pdf");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut config = AppConfig::default();
        config.outputs.us_preview = config.outputs.bps_preview.clone();
        let plan = ReleasePlan::from_config(&config, Path::new("/book"));

        let err = ReleaseManifest::assemble(&plan, &[]).unwrap_err();
        assert!(err.to_string().contains("Beyond_Popular_Science_preview.pdf"));
    }

    #[test]
    fn missing_files_are_listed() {
        let plan = ReleasePlan::from_config(&AppConfig::default(), Path::new("/nonexistent-book"));
        let manifest = ReleaseManifest::assemble(&plan, &[]).unwrap();
        assert_eq!(manifest.missing_files().len(), 6);
    }
}
