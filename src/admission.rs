//! Load-aware admission gate for build dispatch

use std::time::Duration;

use tracing::debug;

/// Errors sampling the system load.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("load average is not available on this platform")]
    Unsupported,
}

/// Source of the 1-minute load average.
pub trait LoadSampler: Send + Sync {
    fn one_minute(&self) -> Result<f64, LoadError>;
}

/// Samples the host via sysinfo.
pub struct SystemLoad;

impl LoadSampler for SystemLoad {
    fn one_minute(&self) -> Result<f64, LoadError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(LoadError::Unsupported);
        }

        Ok(sysinfo::System::load_average().one)
    }
}

/// Gate that delays dispatch while the host looks busy.
///
/// A job may start only once the 1-minute load average is at or below
/// `max_load`; the gate re-samples on a fixed interval. It is a dispatch-time
/// check only and never preempts jobs that already started.
pub struct AdmissionGate {
    sampler: Box<dyn LoadSampler>,
    max_load: f64,
    poll_interval: Duration,
}

impl AdmissionGate {
    pub fn new(sampler: Box<dyn LoadSampler>, max_load: f64, poll_interval: Duration) -> Self {
        Self {
            sampler,
            max_load,
            poll_interval,
        }
    }

    /// Block until the load average permits another dispatch. A failed
    /// sample is fatal: without the signal there is no safe way to admit.
    pub async fn admit(&self) -> Result<(), LoadError> {
        loop {
            let load = self.sampler.one_minute()?;

            if load <= self.max_load {
                return Ok(());
            }

            debug!(load, max_load = self.max_load, "host busy, delaying dispatch");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Replays a fixed sequence of samples, then repeats the last one.
    #[derive(Clone)]
    struct ScriptedLoad {
        inner: Arc<ScriptedInner>,
    }

    struct ScriptedInner {
        samples: Mutex<Vec<f64>>,
        calls: AtomicUsize,
    }

    impl ScriptedLoad {
        fn new(mut samples: Vec<f64>) -> Self {
            samples.reverse();
            Self {
                inner: Arc::new(ScriptedInner {
                    samples: Mutex::new(samples),
                    calls: AtomicUsize::new(0),
                }),
            }
        }

        fn calls(&self) -> usize {
            self.inner.calls.load(Ordering::SeqCst)
        }
    }

    impl LoadSampler for ScriptedLoad {
        fn one_minute(&self) -> Result<f64, LoadError> {
            self.inner.calls.fetch_add(1, Ordering::SeqCst);
            let mut samples = self.inner.samples.lock().unwrap();
            if samples.len() > 1 {
                Ok(samples.pop().unwrap())
            } else {
                Ok(*samples.last().unwrap())
            }
        }
    }

    struct FailingLoad;

    impl LoadSampler for FailingLoad {
        fn one_minute(&self) -> Result<f64, LoadError> {
            Err(LoadError::Unsupported)
        }
    }

    #[tokio::test]
    async fn test_admit_immediate_when_idle() {
        let gate = AdmissionGate::new(
            Box::new(ScriptedLoad::new(vec![0.5])),
            8.0,
            Duration::from_millis(1),
        );

        gate.admit().await.unwrap();
    }

    #[tokio::test]
    async fn test_admit_waits_for_load_to_drop() {
        let sampler = ScriptedLoad::new(vec![20.0, 20.0, 20.0, 1.0]);
        let gate = AdmissionGate::new(Box::new(sampler.clone()), 8.0, Duration::from_millis(1));

        gate.admit().await.unwrap();

        // Three busy samples plus the one that cleared the gate.
        assert_eq!(sampler.calls(), 4);
    }

    #[tokio::test]
    async fn test_admit_boundary_is_inclusive() {
        let gate = AdmissionGate::new(
            Box::new(ScriptedLoad::new(vec![8.0])),
            8.0,
            Duration::from_millis(1),
        );

        gate.admit().await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_sample_is_fatal() {
        let gate = AdmissionGate::new(Box::new(FailingLoad), 8.0, Duration::from_millis(1));

        let result = gate.admit().await;
        assert!(matches!(result, Err(LoadError::Unsupported)));
    }

    #[test]
    fn test_system_load_samples_on_supported_hosts() {
        if sysinfo::IS_SUPPORTED_SYSTEM {
            let load = SystemLoad.one_minute().unwrap();
            assert!(load >= 0.0);
        }
    }
}
