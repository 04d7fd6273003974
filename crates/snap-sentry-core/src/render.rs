use crate::classify::partition::paths_by_folder;
use crate::classify::{HiddenReason, RemovalPartition};
use crate::decision::Verdict;
use crate::report::{DiffSummary, DuplicateGraph};
use std::fmt;

/// A block of operator-facing summary text. The first line is the headline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub lines: Vec<String>,
}

impl Section {
    fn headline(text: impl Into<String>) -> Self {
        Self {
            lines: vec![text.into()],
        }
    }

    fn with_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: fmt::Display,
    {
        self.lines
            .extend(items.into_iter().map(|item| format!("- {}", item)));
        self
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines.join("\n"))
    }
}

pub fn diff_results(summary: &DiffSummary) -> Section {
    Section::headline(summary.to_string())
}

pub fn dup_results(trailer: Option<&str>) -> Section {
    Section::headline(format!("Dup results: {}", trailer.unwrap_or("no output")))
}

pub fn hidden_or_copies(partition: &RemovalPartition) -> Section {
    Section::headline(format!(
        "Deleted {} hidden or copies:",
        partition.hidden_or_copy.len()
    ))
    .with_items(partition.hidden_or_copy.iter().map(|entry| {
        let reason = match entry.reason {
            HiddenReason::CopyTarget => "copied",
            HiddenReason::Hidden => "hidden",
            HiddenReason::CopyInFolder => "copy in folder",
        };
        format!("{} ({})", entry.path, reason)
    }))
}

pub fn duplicates_count(partition: &RemovalPartition) -> Section {
    Section::headline(format!(
        "Deleted duplicates {}",
        partition.duplicate_covered_len()
    ))
}

pub fn important(partition: &RemovalPartition) -> Section {
    Section::headline(format!(
        "Deleted {} important files are:",
        partition.important.len()
    ))
    .with_items(&partition.important)
}

pub fn duplicates_by_folder(partition: &RemovalPartition) -> Section {
    let by_folder = paths_by_folder(partition.duplicate_covered.keys());
    Section::headline(format!(
        "Deleted {} files are duplicates:",
        partition.duplicate_covered_len()
    ))
    .with_items(
        by_folder
            .iter()
            .map(|(folder, paths)| format!("{} {}", folder, paths.len())),
    )
}

pub fn not_important(partition: &RemovalPartition) -> Option<Section> {
    if partition.not_important.is_empty() {
        return None;
    }
    Some(
        Section::headline(format!(
            "Deleted {} files are not important:",
            partition.not_important_len()
        ))
        .with_items(
            partition
                .not_important
                .iter()
                .map(|(folder, paths)| format!("{} {}", folder, paths.len())),
        ),
    )
}

pub fn not_duplicates(partition: &RemovalPartition, graph: &DuplicateGraph) -> Section {
    let paths: Vec<&String> = partition.not_duplicates(graph).collect();
    Section::headline(format!("Deleted {} files aren't duplicates:", paths.len()))
        .with_items(paths)
}

pub fn verdict_line(verdict: &Verdict) -> Section {
    if verdict.proceed {
        Section::headline(format!("Continue: {}", verdict))
    } else {
        Section::headline(format!("Aborting: {}", verdict))
            .with_items(["Run again with --ignore-delete-threshold to sync anyways"])
    }
}

/// Sections describing the classified removals, in the order they are
/// written to the continuation script.
pub fn removal_sections(
    partition: &RemovalPartition,
    graph: &DuplicateGraph,
    verdict: &Verdict,
) -> Vec<Section> {
    let mut sections = vec![hidden_or_copies(partition), duplicates_count(partition)];

    if verdict.over_raw_ceiling() {
        sections.push(important(partition));
        if verdict.proceed {
            sections.push(duplicates_by_folder(partition));
            sections.extend(not_important(partition));
        } else {
            sections.extend(not_important(partition));
            sections.push(not_duplicates(partition, graph));
        }
    }

    sections.push(verdict_line(verdict));
    sections
}
