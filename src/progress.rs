//! Batch progress reporting

use indicatif::{ProgressBar, ProgressStyle};

/// Observer ticked once per finished job, success or not.
pub trait Progress: Send + Sync {
    fn tick(&self);

    fn finish(&self) {}
}

/// Terminal progress bar. Hidden automatically when stderr is not a TTY.
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    pub fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len}") {
            bar.set_style(style);
        }
        Self { bar }
    }
}

impl Progress for ConsoleProgress {
    fn tick(&self) {
        self.bar.inc(1);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// No-op observer for quiet runs.
pub struct SilentProgress;

impl Progress for SilentProgress {
    fn tick(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_progress_counts_ticks() {
        let progress = ConsoleProgress::new(3);
        progress.tick();
        progress.tick();
        assert_eq!(progress.bar.position(), 2);

        progress.finish();
        assert!(progress.bar.is_finished());
    }

    #[test]
    fn test_silent_progress_is_inert() {
        let progress = SilentProgress;
        progress.tick();
        progress.finish();
    }
}
