//! Build orchestration
//!
//! One linear sequence: dependencies, fetch/extract, stub build, icons,
//! repack, then install. Each step returns an explicit Result; the first
//! failure aborts the run carrying the step's identity and cause. No
//! rollback is attempted, partially populated scratch state is left behind.

use crate::download::Fetcher;
use crate::paths::{self, InstallTargets};
use crate::platform::Platform;
use crate::report;
use crate::{deps, fetch, icons, installer, repack, stub};
use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Identity of a pipeline step, carried on failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Dependencies,
    Fetch,
    StubModule,
    Icons,
    Repack,
    Install,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Dependencies => "dependency check",
            Step::Fetch => "installer download/extraction",
            Step::StubModule => "stub native-module build",
            Step::Icons => "icon processing",
            Step::Repack => "resource repackaging",
            Step::Install => "installation",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("another build is already in progress")]
    Locked,

    #[error("failed to prepare workspace: {0}")]
    Workspace(#[from] std::io::Error),

    #[error("{step} failed: {source}")]
    Step {
        step: Step,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

fn step<T, E>(step: Step, f: impl FnOnce() -> Result<T, E>) -> Result<T, PipelineError>
where
    E: std::error::Error + Send + Sync + 'static,
{
    f().map_err(|e| PipelineError::Step {
        step,
        source: Box::new(e),
    })
}

/// Advisory exclusive lock on the build workspace. A second invocation
/// racing the same workspace gets a clean "already in progress" error
/// instead of a corrupted scratch directory.
pub struct WorkspaceLock {
    _flock: Flock<File>,
}

impl WorkspaceLock {
    pub fn acquire(workspace: &Path) -> Result<Self, PipelineError> {
        let lock_path = paths::lock_path(workspace);
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&lock_path)?;
        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(flock) => Ok(Self { _flock: flock }),
            Err((_, errno)) if errno == Errno::EWOULDBLOCK => Err(PipelineError::Locked),
            Err((_, errno)) => Err(PipelineError::Workspace(std::io::Error::from(errno))),
        }
    }
}

/// A completed build: the staged output tree, with the workspace lock held
/// until the value is dropped
pub struct Build {
    pub workspace: PathBuf,
    pub output_dir: PathBuf,
    _lock: WorkspaceLock,
}

/// Run the build half of the pipeline: dependencies through repack.
/// The workspace is wiped and recreated; the staged output tree is the
/// result.
pub fn run_build(
    platform: &Platform,
    fetcher: &dyn Fetcher,
    workspace: &Path,
) -> Result<Build, PipelineError> {
    let lock = WorkspaceLock::acquire(workspace)?;

    // Fresh scratch space. The downloaded installer is parked next to the
    // workspace across the wipe so an unchanged upstream payload is not
    // fetched twice.
    let exe = paths::installer_exe_path(workspace);
    let parked = workspace.with_extension("download");
    if exe.exists() {
        fs::rename(&exe, &parked)?;
    }
    if workspace.exists() {
        fs::remove_dir_all(workspace)?;
    }
    fs::create_dir_all(workspace)?;
    if parked.exists() {
        fs::rename(&parked, &exe)?;
    }

    let output_dir = paths::output_dir(workspace);
    fs::create_dir_all(&output_dir)?;

    report::info(format!("building for platform: {}", platform.id));

    step(Step::Dependencies, || deps::ensure(platform))?;

    build_payload(fetcher, workspace, &output_dir)?;

    Ok(Build {
        workspace: workspace.to_path_buf(),
        output_dir,
        _lock: lock,
    })
}

/// Everything between the dependency check and install: fetch/extract,
/// stub build, icons, repack. A failure here means no Build value exists,
/// so nothing can reach the user directories.
fn build_payload(
    fetcher: &dyn Fetcher,
    workspace: &Path,
    output_dir: &Path,
) -> Result<(), PipelineError> {
    step(Step::Fetch, || -> Result<(), fetch::FetchError> {
        let exe = fetch::fetch_installer(fetcher, workspace)?;
        let installer_dir = paths::installer_extract_dir(workspace);
        report::info("extracting installer...");
        fetch::extract_installer(&exe, &installer_dir)?;
        let nupkg = fetch::find_nupkg(&installer_dir)?;
        report::info(format!(
            "extracting {}...",
            nupkg.file_name().unwrap_or_default().to_string_lossy()
        ));
        fetch::extract_nupkg(&nupkg, &paths::nupkg_dir(workspace))?;
        Ok(())
    })?;

    let stub_artifact = step(Step::StubModule, || -> Result<PathBuf, stub::StubError> {
        let stub_dir = paths::stub_dir(workspace);
        report::info("building stub claude-native module...");
        stub::materialize(&stub_dir)?;
        stub::build(&stub_dir)
    })?;

    step(Step::Icons, || -> Result<usize, icons::IconError> {
        report::info("extracting icons...");
        let work = paths::icon_work_dir(workspace);
        let ico = icons::extract_ico(&paths::claude_exe_path(workspace), &work)?;
        let frames = work.join("frames");
        icons::decompose_ico(&ico, &frames)?;
        icons::stage_sizes(&frames, &paths::output_icons_dir(output_dir))
    })?;

    step(Step::Repack, || -> Result<(), repack::RepackError> {
        let resources = paths::nupkg_resources_dir(workspace);
        let output_lib = paths::output_lib_dir(output_dir);
        repack::stage_resources(&resources, &output_lib)?;
        repack::repack(&output_lib, &resources, &stub_artifact)
    })?;

    Ok(())
}

/// Run the install half: resolve Electron, copy the output tree into the
/// user directories and wire up desktop integration
pub fn run_install(
    platform: &Platform,
    targets: &InstallTargets,
    build: &Build,
) -> Result<(), PipelineError> {
    step(Step::Install, || -> Result<(), installer::InstallError> {
        let electron = installer::resolve_electron(platform)?;
        installer::install(targets, &build.output_dir, &electron)
    })
}
