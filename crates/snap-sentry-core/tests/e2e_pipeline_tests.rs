use std::fs;
use std::sync::Mutex;

use snap_sentry_core::classify::{GlobProbe, NoCopyProbe};
use snap_sentry_core::runner::SyncTool;
use snap_sentry_core::{AppConfig, Error, GuardEngine, SilentReporter, Stage};

/// Replays canned reports and records which commands were invoked.
struct ScriptedTool {
    diff: Vec<String>,
    dup: Vec<String>,
    fail_dup: bool,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTool {
    fn new(diff: &[&str], dup: &[&str]) -> Self {
        Self {
            diff: diff.iter().map(|l| l.to_string()).collect(),
            dup: dup.iter().map(|l| l.to_string()).collect(),
            fail_dup: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl SyncTool for ScriptedTool {
    fn run(
        &self,
        command: &str,
        _args: &[(&str, &str)],
        allowed_status: &[i32],
    ) -> Result<Vec<String>, Error> {
        self.calls.lock().unwrap().push(command.to_string());
        assert_eq!(allowed_status, &[2]);
        match command {
            "diff" => Ok(self.diff.clone()),
            "dup" if self.fail_dup => Err(Error::ToolFailed {
                command: "dup".to_string(),
                status: 1,
            }),
            "dup" => Ok(self.dup.clone()),
            other => panic!("unexpected command {}", other),
        }
    }
}

fn test_config(threshold: i64) -> AppConfig {
    AppConfig {
        delete_threshold: threshold,
        snapraid_binary: "snapraid".to_string(),
        not_important: vec!["RAID/AppData/photoprism".to_string()],
        ..AppConfig::default()
    }
}

#[test]
fn test_no_removals_skips_dup_and_writes_gate() {
    let tmp = tempfile::tempdir().unwrap();
    let script_path = tmp.path().join("snap.sh");
    let tool = ScriptedTool::new(&["add RAID/new.txt", "update RAID/old.txt"], &[]);

    let result = GuardEngine::new(test_config(0))
        .with_script_path(&script_path)
        .run(&tool, &NoCopyProbe, &SilentReporter)
        .unwrap();

    assert!(result.proceed());
    assert_eq!(tool.calls(), vec!["diff"]);

    let script = fs::read_to_string(&script_path).unwrap();
    assert!(script.contains("Diff results: 1 added, 0 removed, 0 moved, 1 modified"));
    assert!(script.contains("scrub -p new"));
}

#[test]
fn test_unexplained_removals_abort_without_gate() {
    let tmp = tempfile::tempdir().unwrap();
    let script_path = tmp.path().join("snap.sh");
    let tool = ScriptedTool::new(
        &[
            "remove RAID/a.txt",
            "remove RAID/b.txt",
            "remove RAID/AppData/photoprism/x.db",
        ],
        &["No duplicates"],
    );

    let result = GuardEngine::new(test_config(1))
        .with_script_path(&script_path)
        .run(&tool, &NoCopyProbe, &SilentReporter)
        .unwrap();

    assert!(!result.proceed());
    assert_eq!(tool.calls(), vec!["diff", "dup"]);
    assert_eq!(result.classification.verdict.important_non_duplicate, 2);

    let script = fs::read_to_string(&script_path).unwrap();
    assert!(script.contains("Dup results: No duplicates"));
    assert!(script.contains("Deleted 2 important files are:"));
    assert!(script.contains("Deleted 1 files are not important:"));
    assert!(!script.contains("read CONT"));
    assert!(!script.contains("touch"));
}

#[test]
fn test_ignore_threshold_proceeds() {
    let tmp = tempfile::tempdir().unwrap();
    let script_path = tmp.path().join("snap.sh");
    let tool = ScriptedTool::new(&["remove RAID/a.txt", "remove RAID/b.txt"], &[]);

    let result = GuardEngine::new(test_config(0))
        .with_script_path(&script_path)
        .ignore_delete_threshold(true)
        .run(&tool, &NoCopyProbe, &SilentReporter)
        .unwrap();

    assert!(result.proceed());
    assert!(fs::read_to_string(&script_path).unwrap().contains("read CONT"));
}

#[test]
fn test_explained_removals_proceed_with_listing() {
    let tmp = tempfile::tempdir().unwrap();
    let script_path = tmp.path().join("snap.sh");
    let tool = ScriptedTool::new(
        &[
            "remove RAID/Docs/a.txt",
            "remove RAID/Docs/b.txt",
            "remove RAID/AppData/photoprism/x.db",
            "remove RAID/lonely.txt",
        ],
        &[
            "     12 RAID/Docs/a.txt = RAID/Keep/a.txt",
            "     12 RAID/Docs/b.txt = RAID/Keep/b.txt",
            "2 duplicates, for 24 B",
        ],
    );

    let result = GuardEngine::new(test_config(1))
        .with_script_path(&script_path)
        .run(&tool, &NoCopyProbe, &SilentReporter)
        .unwrap();

    assert!(result.proceed());
    assert_eq!(result.classification.verdict.important_non_duplicate, 1);

    let script = fs::read_to_string(&script_path).unwrap();
    assert!(script.contains("Deleted duplicates 2"));
    assert!(script.contains("Deleted 2 files are duplicates:"));
    assert!(script.contains("- RAID/Docs 2"));
    assert!(script.contains("- RAID/lonely.txt"));
    assert!(script.contains("read CONT"));

    let stages: Vec<Stage> = result.timings.iter().map(|(s, _)| *s).collect();
    assert_eq!(
        stages,
        vec![
            Stage::Diff,
            Stage::Dup,
            Stage::Classify,
            Stage::Decide,
            Stage::WriteScript
        ]
    );
}

#[test]
fn test_tool_failure_aborts_run_without_script() {
    let tmp = tempfile::tempdir().unwrap();
    let script_path = tmp.path().join("snap.sh");
    let mut tool = ScriptedTool::new(&["remove RAID/a.txt"], &[]);
    tool.fail_dup = true;

    let result = GuardEngine::new(test_config(10))
        .with_script_path(&script_path)
        .run(&tool, &NoCopyProbe, &SilentReporter);

    assert!(matches!(result, Err(Error::ToolFailed { status: 1, .. })));
    assert!(!script_path.exists());
}

#[test]
fn test_copy_on_disk_is_not_important() {
    let storage = tempfile::tempdir().unwrap();
    let elsewhere = storage.path().join("RAID/Photos/archive");
    fs::create_dir_all(&elsewhere).unwrap();
    fs::write(elsewhere.join("img.jpg"), "pixels").unwrap();

    let out = tempfile::tempdir().unwrap();
    let tool = ScriptedTool::new(&["remove RAID/Photos/2021/img.jpg"], &[]);
    let probe = GlobProbe::new(storage.path());

    let result = GuardEngine::new(test_config(0))
        .with_script_path(out.path().join("snap.sh"))
        .run(&tool, &probe, &SilentReporter)
        .unwrap();

    let partition = &result.classification.partition;
    assert!(partition.important.is_empty());
    assert_eq!(partition.hidden_or_copy.len(), 1);
    // the raw count still exceeds the ceiling, and nothing explains it away
    assert!(!result.proceed());
}
