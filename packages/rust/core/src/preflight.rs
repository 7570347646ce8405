//! Checks that run before any derived file is written.

use std::path::Path;

use tracing::{debug, info, instrument};

use bookrelease_shared::{BookReleaseError, Result};
use bookrelease_tools::{ReleasePublisher, Requirement, Toolchain, locate};

use crate::plan::ReleasePlan;

/// Fail with every missing input listed, or succeed.
pub fn check_inputs(plan: &ReleasePlan) -> Result<()> {
    let missing = plan.missing_inputs();
    if missing.is_empty() {
        return Ok(());
    }
    Err(BookReleaseError::MissingInputs(missing))
}

/// Verify programs are on `PATH` and scripts exist under `root`.
pub fn check_requirements(requirements: &[Requirement], root: &Path) -> Result<()> {
    for req in requirements {
        match req {
            Requirement::Program(program) => {
                let path = locate(program)?;
                debug!(program, path = %path.display(), "found tool");
            }
            Requirement::Script(script) => {
                let path = root.join(script);
                if !path.is_file() {
                    return Err(BookReleaseError::ScriptNotFound { path });
                }
            }
        }
    }
    Ok(())
}

/// All preflight checks: inputs, then the release tool, then the PDF tools.
#[instrument(skip_all)]
pub fn run_preflight<T, P>(plan: &ReleasePlan, tools: &T, publisher: &P) -> Result<()>
where
    T: Toolchain,
    P: ReleasePublisher,
{
    check_inputs(plan)?;
    if let Some(req) = publisher.requirement() {
        check_requirements(&[req], &plan.root)?;
    }
    check_requirements(&tools.requirements(), &plan.root)?;
    info!("preflight passed");
    Ok(())
}
