//! Release notes: download snippets, sizes, checksums, timestamp.

use std::fmt::Write as _;
use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use url::Url;

use bookrelease_shared::{AssetKind, BookReleaseError, ReleaseAsset, Result};

use crate::manifest::ReleaseManifest;

const GITHUB: &str = "https://github.com/";

/// Where the release lives and when the notes were generated.
#[derive(Debug, Clone)]
pub struct NotesContext {
    pub repository: String,
    pub tag: String,
    pub generated_at: DateTime<Utc>,
}

/// Direct download URL of `name` in the release.
pub fn download_url(repository: &str, tag: &str, name: &str) -> Result<Url> {
    let invalid = |e: url::ParseError| {
        BookReleaseError::validation(format!("cannot build download URL for {name}: {e}"))
    };
    Url::parse(GITHUB)
        .and_then(|base| base.join(&format!("{repository}/releases/download/{tag}/")))
        .and_then(|base| base.join(name))
        .map_err(invalid)
}

/// Lowercase hex SHA-256 of the file at `path`.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| BookReleaseError::io(path, e))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(|e| BookReleaseError::io(path, e))?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Human-readable file size, e.g. `12.3 MB`.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

fn describe(asset: &ReleaseAsset) -> String {
    match (asset.kind, asset.edition) {
        (AssetKind::Cover, _) => "Cover".to_string(),
        (kind, Some(edition)) => {
            let label = kind.label();
            let mut chars = label.chars();
            let label = match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            };
            format!("{edition}: {label}")
        }
        (kind, None) => kind.label().to_string(),
    }
}

/// Render the Markdown release notes for `manifest`.
///
/// Sizes and checksums are read from disk; files that do not exist yet are
/// listed without them.
pub fn render_notes(manifest: &ReleaseManifest, ctx: &NotesContext) -> Result<String> {
    let mut out = String::new();
    let mut checksums = Vec::new();

    out.push_str("## Downloads\n\n");
    for asset in manifest.named() {
        let url = download_url(&ctx.repository, &ctx.tag, &asset.name)?;
        let size = std::fs::metadata(&asset.path).ok().map(|m| human_size(m.len()));
        match size {
            Some(size) => {
                let _ = writeln!(out, "**{}** (`{}`, {size})", describe(asset), asset.name);
            }
            None => {
                let _ = writeln!(out, "**{}** (`{}`)", describe(asset), asset.name);
            }
        }
        let _ = writeln!(out, "```sh\ncurl -LO {url}\n```\n");

        if asset.path.is_file() {
            checksums.push((sha256_file(&asset.path)?, asset.name.clone()));
        }
    }

    let chapters: Vec<_> = manifest.chapters().collect();
    if let (Some(first), Some(last)) = (chapters.first(), chapters.last()) {
        let _ = writeln!(
            out,
            "### Chapters\n\n{} chapter PDFs (`{}` to `{}`):\n",
            chapters.len(),
            first.name,
            last.name
        );
        let _ = writeln!(
            out,
            "```sh\ngh release download {} --repo {} --pattern '[0-9][0-9]_*.pdf'\n```\n",
            ctx.tag, ctx.repository
        );
    }

    if !checksums.is_empty() {
        out.push_str("### SHA-256\n\n```\n");
        for (digest, name) in &checksums {
            let _ = writeln!(out, "{digest}  {name}");
        }
        out.push_str("```\n\n");
    }

    let _ = writeln!(
        out,
        "_Generated {}_",
        ctx.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::ReleasePlan;
    use crate::testing::{scratch_plan, touch};
    use bookrelease_shared::ChapterLayout;
    use chrono::TimeZone;

    fn ctx() -> NotesContext {
        NotesContext {
            repository: "owner/book".into(),
            tag: "latest".into(),
            generated_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
        }
    }

    fn chapters(plan: &ReleasePlan) -> Vec<std::path::PathBuf> {
        ChapterLayout::default()
            .units()
            .iter()
            .map(|u| plan.chapters_dir.join(u.file_name()))
            .collect()
    }

    #[test]
    fn download_urls_are_templated_and_escaped() {
        let url = download_url("owner/book", "latest", "Beyond_Popular_Science.pdf").unwrap();
        assert_eq!(
            url.as_str(),
            "https://github.com/owner/book/releases/download/latest/Beyond_Popular_Science.pdf"
        );

        let url = download_url("owner/book", "latest", "with space.pdf").unwrap();
        assert!(url.as_str().ends_with("/latest/with%20space.pdf"));
    }

    #[test]
    fn sha256_of_known_content() {
        let (dir, _) = scratch_plan();
        let path = dir.join("abc.txt");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn sha256_of_file_larger_than_one_buffer() {
        let (dir, _) = scratch_plan();
        let path = dir.join("big.bin");
        let body = vec![b'a'; 1_000_000];
        std::fs::write(&path, &body).unwrap();
        assert_eq!(
            sha256_file(&path).unwrap(),
            "cdc76e5c9914fb9281a1c7e284d73e67f1809a48a497200e046d39ccc7112cd0"
        );
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn sha256_of_missing_file_names_the_path() {
        let err = sha256_file(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.pdf"));
    }

    #[test]
    fn human_sizes() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(1_500), "1.5 KB");
        assert_eq!(human_size(12_345_678), "12.3 MB");
    }

    #[test]
    fn notes_cover_every_named_asset() {
        let (dir, plan) = scratch_plan();
        for path in [&plan.main_copy, &plan.bps_trade, &plan.cover] {
            touch(path);
        }
        let manifest = ReleaseManifest::assemble(&plan, &chapters(&plan)).unwrap();

        let notes = render_notes(&manifest, &ctx()).unwrap();

        for asset in manifest.named() {
            let url = download_url("owner/book", "latest", &asset.name).unwrap();
            assert!(notes.contains(&format!("curl -LO {url}")), "missing {}", asset.name);
        }
        assert!(notes.contains("**Beyond Popular Science: Main**"));
        assert!(notes.contains("**Unpopular Science: Executive**"));
        assert!(notes.contains("52 chapter PDFs (`00_front_matter.pdf` to `51_back_matter.pdf`)"));
        assert!(notes.contains("gh release download latest --repo owner/book"));
        assert!(notes.contains("_Generated 2026-01-02 03:04:05 UTC_"));
        // Only the three files on disk get a checksum line.
        let sums = notes.split("### SHA-256").nth(1).unwrap();
        let digests = sums
            .lines()
            .filter(|l| l.split("  ").next().is_some_and(|d| d.len() == 64))
            .count();
        assert_eq!(digests, 3);
        assert!(sums.contains("  main_bps_trade.pdf"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn notes_without_chapters_skip_the_section() {
        let (dir, plan) = scratch_plan();
        let manifest = ReleaseManifest::assemble(&plan, &[]).unwrap();

        let notes = render_notes(&manifest, &ctx()).unwrap();
        assert!(!notes.contains("### Chapters"));
        assert!(!notes.contains("### SHA-256"));
        std::fs::remove_dir_all(&dir).ok();
    }
}
