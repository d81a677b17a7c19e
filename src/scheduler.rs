//! Concurrent build dispatch and join-all

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use eyre::{Context, Result};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::admission::AdmissionGate;
use crate::build::{BuildError, Builder};
use crate::config::ToolSpec;
use crate::progress::Progress;

/// Limits applied while dispatching builds.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Hard cap on simultaneously running builds.
    pub max_concurrent: usize,

    /// Multiple of the logical CPU count the 1-minute load average may reach
    /// before dispatch pauses.
    pub max_load_per_cpu: f64,

    /// Delay between load samples while the gate is closed.
    pub poll_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            max_load_per_cpu: 2.0,
            poll_interval: Duration::from_millis(50),
        }
    }
}

/// Outcome of one tool's build.
#[derive(Debug)]
pub struct JobOutcome {
    /// Module or repository path of the tool.
    pub module: String,

    /// Success, or why the build failed.
    pub result: Result<(), BuildError>,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Dispatches builds as independent tasks, bounded by a semaphore and the
/// admission gate, and joins them all before returning.
pub struct Scheduler {
    admission: AdmissionGate,
    max_concurrent: usize,
    builder: Arc<Builder>,
    progress: Arc<dyn Progress>,
}

impl Scheduler {
    pub fn new(
        admission: AdmissionGate,
        max_concurrent: usize,
        builder: Arc<Builder>,
        progress: Arc<dyn Progress>,
    ) -> Self {
        Self {
            admission,
            max_concurrent,
            builder,
            progress,
        }
    }

    /// Run every tool in `work`. Per-tool failures are collected into the
    /// outcomes, not propagated; the only fatal errors are a lost load
    /// sample and a panicked build task. Dispatched builds always run to
    /// completion.
    pub async fn run(&self, work: BTreeMap<String, ToolSpec>) -> Result<Vec<JobOutcome>> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut handles = Vec::with_capacity(work.len());

        for (module, spec) in work {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .context("acquiring build slot")?;

            if let Err(e) = self.admission.admit().await {
                // The batch cannot continue without a load signal; let the
                // in-flight builds finish before giving up.
                for handle in handles {
                    let _ = handle.await;
                }
                return Err(e).context("sampling system load");
            }

            debug!(%module, "dispatching build");

            let builder = Arc::clone(&self.builder);
            let progress = Arc::clone(&self.progress);

            handles.push(tokio::spawn(async move {
                let result = builder.build(&module, &spec).await;

                if let Err(err) = &result {
                    warn!(tool = %module, "build failed: {err}");
                    if let Some(out) = err.diagnostics() {
                        if !out.stdout.is_empty() {
                            warn!(tool = %module, "stdout:\n{}", out.stdout.trim_end());
                        }
                        if !out.stderr.is_empty() {
                            warn!(tool = %module, "stderr:\n{}", out.stderr.trim_end());
                        }
                    }
                }

                progress.tick();
                drop(permit);

                JobOutcome { module, result }
            }));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            outcomes.push(handle.await.context("joining build task")?);
        }

        self.progress.finish();

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        info!(total = outcomes.len(), failed, "batch finished");

        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let config = SchedulerConfig::default();
        assert_eq!(config.max_concurrent, 4);
        assert_eq!(config.max_load_per_cpu, 2.0);
        assert_eq!(config.poll_interval, Duration::from_millis(50));
    }

    #[test]
    fn test_outcome_success() {
        let outcome = JobOutcome {
            module: "example.org/a".to_string(),
            result: Ok(()),
        };
        assert!(outcome.is_success());
    }
}
