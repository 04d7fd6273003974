use super::probe::CopyProbe;
use crate::report::{ChangeKind, ChangeRecord, DuplicateGraph};
use ahash::AHashSet;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct PartitionOptions {
    /// Path substrings marking low-value folders. First match wins.
    pub not_important: Vec<String>,
}

impl PartitionOptions {
    pub fn new(not_important: Vec<String>) -> Self {
        Self { not_important }
    }

    fn not_important_folder(&self, path: &str) -> Option<&str> {
        self.not_important
            .iter()
            .find(|folder| !folder.is_empty() && path.contains(folder.as_str()))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HiddenReason {
    /// The diff also copies a file onto this path.
    CopyTarget,
    /// File name starts with a dot.
    Hidden,
    /// A same-named file exists elsewhere in the top-level folder.
    CopyInFolder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HiddenOrCopy {
    pub path: String,
    pub reason: HiddenReason,
}

/// Removed paths split into four disjoint buckets.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RemovalPartition {
    pub removed: BTreeSet<String>,
    /// Configured folder → removed paths under it.
    pub not_important: BTreeMap<String, Vec<String>>,
    /// Removed path → siblings that survive the sync.
    pub duplicate_covered: BTreeMap<String, Vec<String>>,
    pub hidden_or_copy: Vec<HiddenOrCopy>,
    pub important: Vec<String>,
}

impl RemovalPartition {
    pub fn not_important_len(&self) -> usize {
        self.not_important.values().map(Vec::len).sum()
    }

    pub fn duplicate_covered_len(&self) -> usize {
        self.duplicate_covered.len()
    }

    /// Removed paths the duplicate report knows nothing about.
    pub fn not_duplicates<'a>(&'a self, graph: &'a DuplicateGraph) -> impl Iterator<Item = &'a String> {
        self.removed.iter().filter(move |path| !graph.contains(path))
    }

    /// Total of all four buckets. Equals `removed.len()`.
    pub fn bucketed_len(&self) -> usize {
        self.not_important_len()
            + self.duplicate_covered_len()
            + self.hidden_or_copy.len()
            + self.important.len()
    }
}

/// Partition every removed path of the diff.
///
/// Rules, first match wins:
/// 1. path contains a not-important folder
/// 2. a duplicate sibling is not itself removed
/// 3. copy target, dotfile, or same-named file elsewhere in the folder
/// 4. important
pub fn partition_removals(
    records: &[ChangeRecord],
    graph: &DuplicateGraph,
    options: &PartitionOptions,
    probe: &dyn CopyProbe,
) -> RemovalPartition {
    let removed: BTreeSet<String> = records
        .iter()
        .filter(|record| record.is_remove() && !record.path.is_empty())
        .map(|record| record.path.clone())
        .collect();

    let copy_targets: AHashSet<&str> = records
        .iter()
        .filter(|record| record.kind == ChangeKind::Copy)
        .map(|record| record.path.as_str())
        .collect();

    let mut partition = RemovalPartition::default();
    let mut candidates: Vec<&str> = Vec::new();

    for path in &removed {
        if let Some(folder) = options.not_important_folder(path) {
            partition
                .not_important
                .entry(folder.to_string())
                .or_default()
                .push(path.clone());
            continue;
        }

        if let Some(siblings) = graph.siblings(path) {
            let surviving: Vec<String> = siblings
                .iter()
                .filter(|sibling| !removed.contains(*sibling))
                .cloned()
                .collect();
            if !surviving.is_empty() {
                partition.duplicate_covered.insert(path.clone(), surviving);
                continue;
            }
        }

        candidates.push(path);
    }

    // Cheap checks first; the filesystem probe only runs for what is left.
    let classified: Vec<(&str, Option<HiddenReason>)> = candidates
        .par_iter()
        .map(|path| {
            let reason = if copy_targets.contains(path) {
                Some(HiddenReason::CopyTarget)
            } else if is_hidden(path) {
                Some(HiddenReason::Hidden)
            } else if probe.has_copy_in_folder(path) {
                Some(HiddenReason::CopyInFolder)
            } else {
                None
            };
            (*path, reason)
        })
        .collect();

    for (path, reason) in classified {
        match reason {
            Some(reason) => partition.hidden_or_copy.push(HiddenOrCopy {
                path: path.to_string(),
                reason,
            }),
            None => partition.important.push(path.to_string()),
        }
    }

    partition.removed = removed;
    debug!(
        "Partitioned {} removals: {} not important, {} duplicates, {} hidden or copies, {} important",
        partition.removed.len(),
        partition.not_important_len(),
        partition.duplicate_covered_len(),
        partition.hidden_or_copy.len(),
        partition.important.len(),
    );
    partition
}

fn is_hidden(path: &str) -> bool {
    path.rsplit('/')
        .next()
        .is_some_and(|name| name.starts_with('.'))
}

/// Group paths by parent directory, sorted by directory.
pub fn paths_by_folder<'a, I>(paths: I) -> BTreeMap<String, Vec<String>>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut by_folder: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for path in paths {
        let folder = path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
        by_folder
            .entry(folder.to_string())
            .or_default()
            .push(path.clone());
    }
    by_folder
}
