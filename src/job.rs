//! Job planning: artifact naming and pre-flight validation

use std::collections::BTreeMap;

use eyre::{Result, bail};

use crate::config::ToolSpec;

/// Errors resolving a single tool into a runnable job.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("invalid cmd {0:?}: must not contain a path separator")]
    ArtifactIsPath(String),
}

/// How a tool's source is materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Shallow repository checkout.
    Clone,
    /// Module fetch into a throwaway workspace.
    Fetch,
}

/// A resolved build request for one tool.
#[derive(Debug, Clone)]
pub struct Job {
    /// Module or repository path.
    pub module: String,

    /// Output executable name.
    pub artifact: String,

    /// Selected build strategy.
    pub strategy: Strategy,

    /// Build steps run inside the checkout (clone strategy only).
    pub steps: Vec<String>,
}

impl Job {
    /// Resolve a manifest entry into a job, deriving the artifact name and
    /// rejecting names that would escape the output directory.
    pub fn resolve(module: &str, spec: &ToolSpec) -> Result<Self, JobError> {
        let artifact = match spec.cmd.as_deref() {
            Some(cmd) if !cmd.is_empty() => {
                if cmd.contains(['/', '\\']) {
                    return Err(JobError::ArtifactIsPath(cmd.to_string()));
                }
                cmd.to_string()
            }
            _ => default_artifact(module).to_string(),
        };

        let strategy = if spec.clone { Strategy::Clone } else { Strategy::Fetch };

        Ok(Self {
            module: module.to_string(),
            artifact,
            strategy,
            steps: spec.build.clone(),
        })
    }
}

/// Last path segment of a module path, skipping a trailing major-version
/// segment such as `v2`: `example.org/cmd/v2` names the executable `cmd`.
pub fn default_artifact(module: &str) -> &str {
    let mut segments = module.rsplit('/');
    let last = segments.next().unwrap_or(module);

    if is_version_segment(last) {
        segments.next().unwrap_or(last)
    } else {
        last
    }
}

fn is_version_segment(segment: &str) -> bool {
    match segment.strip_prefix('v') {
        Some(rest) => !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// Reject tool sets where two entries resolve to the same artifact name.
/// The output directory is shared, so such a set would end in a silent
/// last-writer-wins race.
pub fn reject_duplicate_artifacts(tools: &BTreeMap<String, ToolSpec>) -> Result<()> {
    let mut seen: BTreeMap<String, String> = BTreeMap::new();

    for (module, spec) in tools {
        // Unresolvable entries fail per-tool at build time instead.
        let Ok(job) = Job::resolve(module, spec) else {
            continue;
        };

        if let Some(previous) = seen.insert(job.artifact.clone(), module.clone()) {
            bail!(
                "tools {} and {} both produce artifact {:?}",
                previous,
                module,
                job.artifact
            );
        }
    }

    Ok(())
}
