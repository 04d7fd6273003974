use crate::classify::{partition_removals, CopyProbe, PartitionOptions, RemovalPartition};
use crate::config::AppConfig;
use crate::decision::{decide, Verdict};
use crate::error::Error;
use crate::progress::{ProgressReporter, Stage, StageTimer};
use crate::render::{self, Section};
use crate::report::diff::parse_lines;
use crate::report::{DiffSummary, DuplicateGraph, DuplicateReport};
use crate::runner::SyncTool;
use crate::script::{self, ContinuationScript};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

/// Exit statuses of `snapraid diff` and `snapraid dup` that are not
/// failures: 2 means differences were found.
const REPORT_ALLOWED_STATUS: [i32; 1] = [2];

pub struct GuardEngine {
    config: AppConfig,
    script_path: PathBuf,
    ignore_delete_threshold: bool,
}

/// Everything derived from one pair of diff/dup reports.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub summary: DiffSummary,
    pub dup_trailer: Option<String>,
    pub duplicates: DuplicateGraph,
    pub partition: RemovalPartition,
    pub verdict: Verdict,
}

impl Classification {
    /// Summary sections in script order.
    pub fn sections(&self) -> Vec<Section> {
        let mut sections = vec![render::diff_results(&self.summary)];
        if self.summary.remove > 0 {
            sections.push(render::dup_results(self.dup_trailer.as_deref()));
            sections.extend(render::removal_sections(
                &self.partition,
                &self.duplicates,
                &self.verdict,
            ));
        } else {
            sections.push(render::verdict_line(&self.verdict));
        }
        sections
    }
}

#[derive(Debug)]
pub struct RunResult {
    pub classification: Classification,
    pub script_path: PathBuf,
    pub timings: Vec<(Stage, Duration)>,
}

impl RunResult {
    pub fn proceed(&self) -> bool {
        self.classification.verdict.proceed
    }
}

impl GuardEngine {
    pub fn new(config: AppConfig) -> Self {
        let script_path = PathBuf::from(&config.script_path);
        Self {
            config,
            script_path,
            ignore_delete_threshold: false,
        }
    }

    pub fn with_script_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.script_path = path.into();
        self
    }

    pub fn ignore_delete_threshold(mut self, ignore: bool) -> Self {
        self.ignore_delete_threshold = ignore;
        self
    }

    fn ceiling(&self) -> i64 {
        if self.ignore_delete_threshold {
            -1
        } else {
            self.config.delete_threshold
        }
    }

    /// Run the full guard pipeline:
    /// 1. `snapraid diff`
    /// 2. `snapraid dup`, only when something is removed
    /// 3. Partition removals and decide
    /// 4. Write the continuation script
    pub fn run(
        &self,
        tool: &dyn SyncTool,
        probe: &dyn CopyProbe,
        reporter: &dyn ProgressReporter,
    ) -> Result<RunResult, Error> {
        let mut timer = StageTimer::new(
            reporter,
            Duration::from_millis(self.config.slow_stage_warn_ms),
        );

        info!("Running diff...");
        let diff_lines = timer.run(Stage::Diff, || {
            tool.run("diff", &[], &REPORT_ALLOWED_STATUS)
        })?;

        let classification = self.classify(
            &diff_lines,
            |timer| {
                info!("Running dup...");
                timer.run(Stage::Dup, || tool.run("dup", &[], &REPORT_ALLOWED_STATUS))
            },
            probe,
            &mut timer,
        )?;

        let sections = classification.sections();
        log_sections(&sections, &classification.verdict);

        let mut script = ContinuationScript::new(
            &self.config.snapraid_binary,
            &self.config.snapraid_config,
        );
        for section in &sections {
            script.push_section(section);
        }
        let contents = if classification.verdict.proceed {
            script.finish_with_gate()
        } else {
            script.finish_aborted()
        };
        timer.run(Stage::WriteScript, || {
            script::write_script(&self.script_path, &contents)
        })?;
        info!("Continuation script written to {}", self.script_path.display());

        Ok(RunResult {
            classification,
            script_path: self.script_path.clone(),
            timings: timer.into_timings(),
        })
    }

    /// Classify a diff report. `fetch_dup` is only called when the diff
    /// removes something.
    pub fn classify<F>(
        &self,
        diff_lines: &[String],
        fetch_dup: F,
        probe: &dyn CopyProbe,
        timer: &mut StageTimer<'_>,
    ) -> Result<Classification, Error>
    where
        F: FnOnce(&mut StageTimer<'_>) -> Result<Vec<String>, Error>,
    {
        let records = parse_lines(diff_lines);
        let summary = DiffSummary::from_records(&records);
        info!("{}", summary);

        if summary.remove == 0 {
            let verdict = timer.run(Stage::Decide, || decide(0, 0, 0, self.ceiling()));
            return Ok(Classification {
                summary,
                dup_trailer: None,
                duplicates: DuplicateGraph::default(),
                partition: RemovalPartition::default(),
                verdict,
            });
        }

        let dup_lines = fetch_dup(&mut *timer)?;
        let report = DuplicateReport::parse(&dup_lines);

        let options = PartitionOptions::new(self.config.not_important.clone());
        let grouping = self.config.grouping;
        let (duplicates, partition) = timer.run(Stage::Classify, || {
            let graph = DuplicateGraph::build(&report.pairs, grouping);
            let partition = partition_removals(&records, &graph, &options, probe);
            (graph, partition)
        });

        let verdict = timer.run(Stage::Decide, || {
            decide(
                summary.remove,
                partition.not_important_len(),
                partition.duplicate_covered_len(),
                self.ceiling(),
            )
        });

        Ok(Classification {
            summary,
            dup_trailer: report.trailer,
            duplicates,
            partition,
            verdict,
        })
    }
}

/// The verdict is the last section; an abort is logged as an error so it
/// stands out in the log file.
fn log_sections(sections: &[Section], verdict: &Verdict) {
    let Some((last, rest)) = sections.split_last() else {
        return;
    };
    for section in rest {
        info!("{}", section);
    }
    if verdict.proceed {
        info!("{}", last);
    } else {
        error!("{}", last);
    }
}
