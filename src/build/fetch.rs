//! Module-fetch build strategy

use super::{BuildError, GO, StepContext, go_build};
use crate::job::Job;

/// Manifest declaring the throwaway module identity the fetch runs under.
const SCRATCH_MANIFEST: &str = "module tmp\n";

/// Fetch the module into a throwaway workspace in the scratch directory and
/// compile it from there.
pub(super) async fn build(ctx: &StepContext<'_>, job: &Job) -> Result<(), BuildError> {
    tokio::fs::write(ctx.scratch.join("go.mod"), SCRATCH_MANIFEST)
        .await
        .map_err(BuildError::Manifest)?;

    let argv = vec![GO.to_string(), "get".to_string(), job.module.clone()];

    let out = ctx.runner.run(&argv, ctx.scratch).await?;
    if !out.success {
        return Err(BuildError::FetchFailed {
            module: job.module.clone(),
            output: out,
        });
    }

    go_build(ctx, &job.module).await
}
