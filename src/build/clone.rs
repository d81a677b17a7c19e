//! Shallow-clone build strategy

use tracing::debug;

use super::{BuildError, StepContext, expand_args, go_build, tokenize};
use crate::job::Job;

/// Clone the module's repository into the scratch directory and run its
/// build steps in order. An empty step list falls back to plain `go build`.
pub(super) async fn build(ctx: &StepContext<'_>, job: &Job) -> Result<(), BuildError> {
    let url = format!("https://{}", job.module);
    let argv = vec![
        "git".to_string(),
        "clone".to_string(),
        "--depth".to_string(),
        "1".to_string(),
        url,
        ".".to_string(),
    ];

    let out = ctx.runner.run(&argv, ctx.scratch).await?;
    if !out.success {
        return Err(BuildError::CloneFailed {
            module: job.module.clone(),
            output: out,
        });
    }

    if job.steps.is_empty() {
        return go_build(ctx, &job.module).await;
    }

    for step in &job.steps {
        let mut argv = tokenize(step).map_err(|source| BuildError::BadStep {
            step: step.clone(),
            source,
        })?;
        expand_args(&mut argv, ctx.output_dir);

        let out = ctx.runner.run(&argv, ctx.scratch).await?;
        if !out.success {
            return Err(BuildError::StepFailed {
                step: step.clone(),
                output: out,
            });
        }

        debug!(module = %job.module, %step, "build step finished");
    }

    Ok(())
}
