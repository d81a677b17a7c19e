//! Build strategies for producing tool binaries
//!
//! A [`Builder`] takes one manifest entry, resolves it into a [`Job`], and
//! runs the selected strategy inside a scratch directory: either a shallow
//! repository clone followed by build steps ([`clone`]), or a module fetch
//! into a throwaway Go workspace ([`fetch`]). All subprocess work goes
//! through the [`CommandRunner`] seam.

mod clone;
mod command;
mod fetch;

pub use command::{CommandError, CommandRunner, OUTDIR_VAR, RunOutput, SystemRunner, expand_args, tokenize};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::ToolSpec;
use crate::job::{Job, JobError, Strategy};
use crate::workspace::{Workspace, WorkspaceError};

const GO: &str = "go";

/// Why a single tool failed to build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("step {step:?}: {source}")]
    BadStep {
        step: String,
        source: CommandError,
    },

    #[error("cloning {module} failed")]
    CloneFailed { module: String, output: RunOutput },

    #[error("build step {step:?} failed")]
    StepFailed { step: String, output: RunOutput },

    #[error("writing build manifest: {0}")]
    Manifest(std::io::Error),

    #[error("fetching {module} failed")]
    FetchFailed { module: String, output: RunOutput },

    #[error("compiling {module} failed")]
    CompileFailed { module: String, output: RunOutput },
}

impl BuildError {
    /// Captured subprocess streams, when the failure produced any.
    pub fn diagnostics(&self) -> Option<&RunOutput> {
        match self {
            Self::CloneFailed { output, .. }
            | Self::StepFailed { output, .. }
            | Self::FetchFailed { output, .. }
            | Self::CompileFailed { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// Everything a strategy needs to run its steps.
struct StepContext<'a> {
    runner: &'a dyn CommandRunner,
    scratch: &'a Path,
    artifact: &'a Path,
    output_dir: &'a Path,
}

/// Executes one tool build inside its own scratch directory.
pub struct Builder {
    output_dir: PathBuf,
    workspace: Arc<Workspace>,
    runner: Arc<dyn CommandRunner>,
}

impl Builder {
    pub fn new(output_dir: impl Into<PathBuf>, workspace: Arc<Workspace>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            output_dir: output_dir.into(),
            workspace,
            runner,
        }
    }

    /// Build one tool. The artifact lands at `output_dir/<name>`; there is
    /// no atomic rename, so a failed late step may leave a partial or stale
    /// artifact behind.
    pub async fn build(&self, module: &str, spec: &ToolSpec) -> Result<(), BuildError> {
        let job = Job::resolve(module, spec)?;
        let scratch = self.workspace.scratch(&job.artifact)?;
        let artifact = self.output_dir.join(&job.artifact);

        debug!(
            module,
            artifact = %artifact.display(),
            scratch = %scratch.display(),
            "starting build"
        );

        let ctx = StepContext {
            runner: self.runner.as_ref(),
            scratch: &scratch,
            artifact: &artifact,
            output_dir: &self.output_dir,
        };

        match job.strategy {
            Strategy::Clone => clone::build(&ctx, &job).await,
            Strategy::Fetch => fetch::build(&ctx, &job).await,
        }
    }
}

/// Compile `module` in the scratch directory, writing straight to the
/// artifact path.
async fn go_build(ctx: &StepContext<'_>, module: &str) -> Result<(), BuildError> {
    let argv = vec![
        GO.to_string(),
        "build".to_string(),
        "-o".to_string(),
        ctx.artifact.to_string_lossy().into_owned(),
        module.to_string(),
    ];

    let out = ctx.runner.run(&argv, ctx.scratch).await?;
    if !out.success {
        return Err(BuildError::CompileFailed {
            module: module.to_string(),
            output: out,
        });
    }

    Ok(())
}
