//! toolforge - concurrent builder for Go command-line tools
//!
//! Reads a YAML manifest of tools, builds each one from source in its own
//! disposable scratch directory, and drops the resulting binaries into a
//! single output directory. Builds run in parallel, bounded by a concurrency
//! cap and a system-load gate so a large batch does not starve the machine.
//!
//! # Modules
//!
//! - [`config`] - Manifest types, loading, and selection
//! - [`job`] - Artifact naming and pre-flight validation
//! - [`workspace`] - Disposable build-tree lifecycle
//! - [`admission`] - Load-aware dispatch gate
//! - [`scheduler`] - Concurrent dispatch and join-all
//! - [`build`] - Clone/fetch build strategies and subprocess plumbing
//! - [`progress`] - Batch progress reporting
//! - [`cli`] - Command-line interface

pub mod admission;
pub mod build;
pub mod cli;
pub mod config;
pub mod job;
pub mod progress;
pub mod scheduler;
pub mod workspace;

// Re-export commonly used types
pub use admission::{AdmissionGate, LoadError, LoadSampler, SystemLoad};
pub use build::{BuildError, Builder, CommandError, CommandRunner, RunOutput, SystemRunner};
pub use config::{Config, ToolSpec};
pub use job::{Job, JobError, Strategy};
pub use progress::{ConsoleProgress, Progress, SilentProgress};
pub use scheduler::{JobOutcome, Scheduler, SchedulerConfig};
pub use workspace::{Workspace, WorkspaceError};
