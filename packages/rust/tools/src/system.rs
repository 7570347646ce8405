//! The toolchain backed by real programs and the built-in PDF operations.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use bookrelease_shared::{BookReleaseError, ChapterLayout, PageSize, Result, ToolMode, ToolsConfig};

use crate::adapter::{Requirement, Toolchain};
use crate::{ghostscript, process};

/// Dispatches each stage to an external program or to `bookrelease-pdf`
/// according to `[tools]`.
#[derive(Debug, Clone)]
pub struct SystemToolchain {
    tools: ToolsConfig,
    layout: ChapterLayout,
}

impl SystemToolchain {
    pub fn new(tools: &ToolsConfig, layout: ChapterLayout) -> Self {
        Self {
            tools: tools.clone(),
            layout,
        }
    }

    async fn run_script(&self, script: &str, args: Vec<OsString>) -> Result<()> {
        let mut argv = vec![OsString::from(script)];
        argv.extend(args);
        process::run(&self.tools.python, argv).await?;
        Ok(())
    }
}

/// Run CPU-bound PDF work off the async runtime.
async fn blocking<F>(work: F) -> Result<()>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| BookReleaseError::Pdf(format!("built-in PDF worker failed: {e}")))?
}

impl Toolchain for SystemToolchain {
    #[instrument(skip(self), fields(mode = ?self.tools.rescaler))]
    async fn rescale(&self, src: &Path, dst: &Path) -> Result<()> {
        match self.tools.rescaler {
            ToolMode::External => {
                self.run_script(&self.tools.rescale_script, vec![src.into(), dst.into()])
                    .await
            }
            ToolMode::Builtin => {
                let (src, dst) = (src.to_path_buf(), dst.to_path_buf());
                blocking(move || bookrelease_pdf::rescale_pdf(&src, &dst, PageSize::TRADE)).await
            }
        }
    }

    #[instrument(skip(self))]
    async fn compress(&self, src: &Path, dst: &Path) -> Result<()> {
        process::run(&self.tools.ghostscript, ghostscript::preview_args(src, dst)).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(mode = ?self.tools.splitter))]
    async fn split(&self, src: &Path, out_dir: &Path) -> Result<()> {
        match self.tools.splitter {
            ToolMode::External => {
                self.run_script(
                    &self.tools.split_script,
                    vec![src.into(), "--output-dir".into(), out_dir.into()],
                )
                .await
            }
            ToolMode::Builtin => {
                let (src, out_dir) = (src.to_path_buf(), out_dir.to_path_buf());
                let layout = self.layout;
                blocking(move || {
                    let files = bookrelease_pdf::split_chapters(&src, &layout, &out_dir)?;
                    info!(files = files.len(), "built-in split finished");
                    Ok(())
                })
                .await
            }
        }
    }

    fn requirements(&self) -> Vec<Requirement> {
        let mut reqs = vec![Requirement::Program(self.tools.ghostscript.clone())];
        reqs.extend(self.script_requirements(&[
            (self.tools.rescaler, self.tools.rescale_script.as_str()),
            (self.tools.splitter, self.tools.split_script.as_str()),
        ]));
        reqs
    }
}

impl SystemToolchain {
    /// What [`Toolchain::rescale`] needs on its own.
    pub fn rescale_requirements(&self) -> Vec<Requirement> {
        self.script_requirements(&[(self.tools.rescaler, self.tools.rescale_script.as_str())])
    }

    /// What [`Toolchain::split`] needs on its own.
    pub fn split_requirements(&self) -> Vec<Requirement> {
        self.script_requirements(&[(self.tools.splitter, self.tools.split_script.as_str())])
    }

    /// The interpreter plus each script whose stage runs externally.
    fn script_requirements(&self, stages: &[(ToolMode, &str)]) -> Vec<Requirement> {
        let scripts: Vec<Requirement> = stages
            .iter()
            .filter(|(mode, _)| *mode == ToolMode::External)
            .map(|(_, script)| Requirement::Script(PathBuf::from(script)))
            .collect();
        if scripts.is_empty() {
            return scripts;
        }
        let mut reqs = vec![Requirement::Program(self.tools.python.clone())];
        reqs.extend(scripts);
        reqs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toolchain(rescaler: ToolMode, splitter: ToolMode) -> SystemToolchain {
        let tools = ToolsConfig {
            rescaler,
            splitter,
            ..ToolsConfig::default()
        };
        SystemToolchain::new(&tools, ChapterLayout::default())
    }

    #[test]
    fn external_requirements_include_python_and_scripts() {
        let reqs = toolchain(ToolMode::External, ToolMode::External).requirements();
        assert_eq!(
            reqs,
            vec![
                Requirement::Program("gs".into()),
                Requirement::Program("python3".into()),
                Requirement::Script("scale_pdf_to_trade.py".into()),
                Requirement::Script("split_chapters.py".into()),
            ]
        );
    }

    #[test]
    fn builtin_requirements_only_need_ghostscript() {
        let reqs = toolchain(ToolMode::Builtin, ToolMode::Builtin).requirements();
        assert_eq!(reqs, vec![Requirement::Program("gs".into())]);
    }

    #[test]
    fn mixed_requirements_list_only_the_external_script() {
        let reqs = toolchain(ToolMode::Builtin, ToolMode::External).requirements();
        assert!(reqs.contains(&Requirement::Script("split_chapters.py".into())));
        assert!(!reqs.contains(&Requirement::Script("scale_pdf_to_trade.py".into())));
    }

    #[test]
    fn stage_requirements_leave_out_ghostscript() {
        let tools = toolchain(ToolMode::External, ToolMode::Builtin);
        assert_eq!(
            tools.rescale_requirements(),
            vec![
                Requirement::Program("python3".into()),
                Requirement::Script("scale_pdf_to_trade.py".into()),
            ]
        );
        assert!(tools.split_requirements().is_empty());

        let tools = toolchain(ToolMode::Builtin, ToolMode::External);
        assert!(tools.rescale_requirements().is_empty());
        assert_eq!(
            tools.split_requirements(),
            vec![
                Requirement::Program("python3".into()),
                Requirement::Script("split_chapters.py".into()),
            ]
        );
    }

    /// A toolchain whose "python" is a shell script recording its argv,
    /// one argument per line, to `argv.txt` in `dir`.
    #[cfg(unix)]
    fn recording_toolchain(dir: &Path) -> SystemToolchain {
        use std::os::unix::fs::PermissionsExt;

        let stub = dir.join("python-stub.sh");
        let record = dir.join("argv.txt");
        std::fs::write(
            &stub,
            format!("#!/bin/sh\nprintf '%s\\n' \"$@\" > '{}'\n", record.display()),
        )
        .unwrap();
        std::fs::set_permissions(&stub, std::fs::Permissions::from_mode(0o755)).unwrap();

        let tools = ToolsConfig {
            rescaler: ToolMode::External,
            splitter: ToolMode::External,
            python: stub.to_string_lossy().into_owned(),
            ..ToolsConfig::default()
        };
        SystemToolchain::new(&tools, ChapterLayout::default())
    }

    #[cfg(unix)]
    fn recorded_argv(dir: &Path) -> Vec<String> {
        std::fs::read_to_string(dir.join("argv.txt"))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn external_rescale_passes_source_then_destination() {
        let dir = std::env::temp_dir().join(format!("br-system-argv-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let src = dir.join("main_bps.pdf");
        let dst = dir.join("main_bps_trade.pdf");

        recording_toolchain(&dir).rescale(&src, &dst).await.unwrap();

        assert_eq!(
            recorded_argv(&dir),
            vec![
                "scale_pdf_to_trade.py".to_string(),
                src.display().to_string(),
                dst.display().to_string(),
            ]
        );
        std::fs::remove_dir_all(&dir).ok();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn external_split_passes_output_dir_flag() {
        let dir = std::env::temp_dir().join(format!("br-system-argv-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let src = dir.join("main_us_trade.pdf");
        let out = dir.join("chapters_release");

        recording_toolchain(&dir).split(&src, &out).await.unwrap();

        assert_eq!(
            recorded_argv(&dir),
            vec![
                "split_chapters.py".to_string(),
                src.display().to_string(),
                "--output-dir".to_string(),
                out.display().to_string(),
            ]
        );
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn builtin_split_reports_unreadable_input() {
        let dir = std::env::temp_dir().join(format!("br-system-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let missing = dir.join("absent.pdf");

        let err = toolchain(ToolMode::Builtin, ToolMode::Builtin)
            .split(&missing, &dir.join("out"))
            .await
            .unwrap_err();
        assert!(matches!(err, BookReleaseError::Pdf(_)));

        std::fs::remove_dir_all(&dir).ok();
    }
}
