use snap_sentry_core::classify::{
    partition_removals, CopyProbe, HiddenReason, NoCopyProbe, PartitionOptions,
};
use snap_sentry_core::config::GroupingMode;
use snap_sentry_core::decision::decide;
use snap_sentry_core::report::diff::parse_lines;
use snap_sentry_core::report::{DuplicateGraph, DuplicateReport};
use std::collections::BTreeSet;

struct FixedProbe(Vec<&'static str>);

impl CopyProbe for FixedProbe {
    fn has_copy_in_folder(&self, removed: &str) -> bool {
        self.0.iter().any(|path| *path == removed)
    }
}

fn graph_from(lines: &[&str]) -> DuplicateGraph {
    let report = DuplicateReport::parse(lines);
    DuplicateGraph::build(&report.pairs, GroupingMode::Pairwise)
}

fn options() -> PartitionOptions {
    PartitionOptions::new(vec![
        "RAID/AppData/photoprism".to_string(),
        "RAID/AppData/jellyfin".to_string(),
    ])
}

#[test]
fn test_not_important_and_important_abort() {
    let records = parse_lines(&["remove RAID/a.txt", "remove RAID/AppData/photoprism/x.db"]);
    let partition = partition_removals(&records, &graph_from(&[]), &options(), &NoCopyProbe);

    assert_eq!(partition.not_important.len(), 1);
    assert_eq!(
        partition.not_important["RAID/AppData/photoprism"],
        vec!["RAID/AppData/photoprism/x.db".to_string()]
    );
    assert_eq!(partition.important, vec!["RAID/a.txt".to_string()]);

    let verdict = decide(
        2,
        partition.not_important_len(),
        partition.duplicate_covered_len(),
        0,
    );
    assert_eq!(verdict.important_non_duplicate, 1);
    assert!(!verdict.proceed);
}

#[test]
fn test_duplicates_removed_together_are_not_covered() {
    let records = parse_lines(&["remove RAID/a.txt", "remove RAID/b.txt"]);
    let graph = graph_from(&["2 RAID/a.txt = RAID/b.txt"]);
    let partition = partition_removals(&records, &graph, &options(), &NoCopyProbe);

    assert!(partition.duplicate_covered.is_empty());
    assert_eq!(
        partition.important,
        vec!["RAID/a.txt".to_string(), "RAID/b.txt".to_string()]
    );
}

#[test]
fn test_surviving_duplicate_covers_removal() {
    let records = parse_lines(&["remove RAID/Docs/a.txt", "remove RAID/Docs/c.txt"]);
    let graph = graph_from(&[
        "   120 RAID/Docs/a.txt = RAID/Backup/a.txt",
        "   120 RAID/Docs/a.txt = RAID/Docs/c.txt",
        "2 duplicates, for 240 B",
    ]);
    let partition = partition_removals(&records, &graph, &options(), &NoCopyProbe);

    assert_eq!(partition.duplicate_covered.len(), 2);
    assert_eq!(
        partition.duplicate_covered["RAID/Docs/a.txt"],
        vec!["RAID/Backup/a.txt".to_string()]
    );
    // c.txt survives through its sibling's sibling
    assert_eq!(
        partition.duplicate_covered["RAID/Docs/c.txt"],
        vec!["RAID/Backup/a.txt".to_string()]
    );
    assert!(partition.important.is_empty());
}

#[test]
fn test_copy_target_is_hidden_or_copy() {
    let records = parse_lines(&["remove RAID/a.txt", "copy RAID/a.txt"]);
    let partition = partition_removals(&records, &graph_from(&[]), &options(), &NoCopyProbe);

    assert!(partition.important.is_empty());
    assert_eq!(partition.hidden_or_copy.len(), 1);
    assert_eq!(partition.hidden_or_copy[0].path, "RAID/a.txt");
    assert_eq!(partition.hidden_or_copy[0].reason, HiddenReason::CopyTarget);
}

#[test]
fn test_independent_pairs_stay_disjoint() {
    let graph = graph_from(&["10 RAID/a = RAID/b", "20 RAID/x = RAID/y"]);

    let a: Vec<_> = graph.siblings("RAID/a").unwrap().iter().cloned().collect();
    let b: Vec<_> = graph.siblings("RAID/b").unwrap().iter().cloned().collect();
    let x: Vec<_> = graph.siblings("RAID/x").unwrap().iter().cloned().collect();
    let y: Vec<_> = graph.siblings("RAID/y").unwrap().iter().cloned().collect();
    assert_eq!(a, vec!["RAID/b"]);
    assert_eq!(b, vec!["RAID/a"]);
    assert_eq!(x, vec!["RAID/y"]);
    assert_eq!(y, vec!["RAID/x"]);
}

#[test]
fn test_probe_and_hidden_reasons() {
    let records = parse_lines(&[
        "remove RAID/Photos/2020/.thumbs",
        "remove RAID/Photos/2020/img.jpg",
        "remove RAID/Photos/2020/gone.jpg",
    ]);
    let probe = FixedProbe(vec!["RAID/Photos/2020/img.jpg"]);
    let partition = partition_removals(&records, &graph_from(&[]), &options(), &probe);

    let reasons: Vec<(&str, HiddenReason)> = partition
        .hidden_or_copy
        .iter()
        .map(|entry| (entry.path.as_str(), entry.reason))
        .collect();
    assert_eq!(
        reasons,
        vec![
            ("RAID/Photos/2020/.thumbs", HiddenReason::Hidden),
            ("RAID/Photos/2020/img.jpg", HiddenReason::CopyInFolder),
        ]
    );
    assert_eq!(partition.important, vec!["RAID/Photos/2020/gone.jpg".to_string()]);
}

#[test]
fn test_not_important_short_circuits_duplicate_check() {
    let records = parse_lines(&["remove RAID/AppData/jellyfin/cache.db"]);
    let graph = graph_from(&["1 RAID/AppData/jellyfin/cache.db = RAID/Other/cache.db"]);
    let partition = partition_removals(&records, &graph, &options(), &NoCopyProbe);

    assert_eq!(partition.not_important_len(), 1);
    assert!(partition.duplicate_covered.is_empty());
}

#[test]
fn test_buckets_partition_removed_set_exactly() {
    let universe = [
        "remove RAID/a.txt",
        "remove RAID/b.txt",
        "remove RAID/.hidden",
        "remove RAID/AppData/photoprism/p.db",
        "remove RAID/AppData/jellyfin/j.db",
        "remove RAID/Docs/copied.txt",
        "remove RAID/Docs/probed.txt",
        "remove RAID/Docs/dup.txt",
        "copy RAID/Docs/copied.txt",
        "add RAID/new.txt",
        "update RAID/changed.txt",
    ];
    let dup_lines = [
        "1 RAID/a.txt = RAID/b.txt",
        "1 RAID/Docs/dup.txt = RAID/Keep/dup.txt",
        "1 RAID/b.txt = RAID/Keep/b.txt",
    ];
    let probe = FixedProbe(vec!["RAID/Docs/probed.txt"]);

    for mode in [GroupingMode::Pairwise, GroupingMode::Transitive] {
        let report = DuplicateReport::parse(&dup_lines);
        let graph = DuplicateGraph::build(&report.pairs, mode);

        for mask in 0u32..(1 << universe.len()) {
            let lines: Vec<&str> = universe
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, line)| *line)
                .collect();
            let records = parse_lines(&lines);
            let partition = partition_removals(&records, &graph, &options(), &probe);

            let mut seen: BTreeSet<String> = BTreeSet::new();
            let all = partition
                .not_important
                .values()
                .flatten()
                .chain(partition.duplicate_covered.keys())
                .chain(partition.hidden_or_copy.iter().map(|e| &e.path))
                .chain(partition.important.iter());
            for path in all {
                assert!(seen.insert(path.clone()), "{} bucketed twice", path);
            }
            assert_eq!(seen, partition.removed);
            assert_eq!(partition.bucketed_len(), partition.removed.len());
        }
    }
}
