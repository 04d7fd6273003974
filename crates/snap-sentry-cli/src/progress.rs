use indicatif::{ProgressBar, ProgressStyle};
use snap_sentry_core::{ProgressReporter, Stage};
use std::sync::Mutex;
use std::time::Duration;

/// CLI progress reporter: one spinner per pipeline stage.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap();
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_stage_start(&self, stage: Stage) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.set_message(format!("Running {}...", stage));
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_stage_complete(&self, stage: Stage, duration: Duration) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m {} complete in {:.2}s",
            stage,
            duration.as_secs_f64()
        );
    }
}
