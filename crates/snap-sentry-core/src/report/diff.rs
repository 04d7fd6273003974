use serde::Serialize;
use std::fmt;

/// Change kind as printed in the first column of `snapraid diff`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Add,
    Remove,
    Move,
    Update,
    Copy,
    Restore,
    Other(String),
}

impl ChangeKind {
    fn from_token(token: &str) -> Self {
        match token {
            "add" => ChangeKind::Add,
            "remove" => ChangeKind::Remove,
            "move" => ChangeKind::Move,
            "update" => ChangeKind::Update,
            "copy" => ChangeKind::Copy,
            "restore" => ChangeKind::Restore,
            other => ChangeKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Add => f.write_str("add"),
            ChangeKind::Remove => f.write_str("remove"),
            ChangeKind::Move => f.write_str("move"),
            ChangeKind::Update => f.write_str("update"),
            ChangeKind::Copy => f.write_str("copy"),
            ChangeKind::Restore => f.write_str("restore"),
            ChangeKind::Other(kind) => f.write_str(kind),
        }
    }
}

/// One parsed diff line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    pub kind: ChangeKind,
    pub path: String,
    /// Second path of `move a -> b` and `copy a -> b` lines.
    pub extra: Option<String>,
}

const PATH_ARROW: &str = " -> ";

impl ChangeRecord {
    /// Split a diff line into kind and path. Returns `None` only for blank
    /// lines; unknown kinds are kept as `ChangeKind::Other`.
    pub fn parse(line: &str) -> Option<ChangeRecord> {
        let line = line.trim_end_matches(['\r', '\n']);
        let trimmed = line.trim_start();
        let token = trimmed.split_whitespace().next()?;
        let rest = trimmed[token.len()..].trim();
        let kind = ChangeKind::from_token(token);

        let (path, extra) = match kind {
            ChangeKind::Move | ChangeKind::Copy => match rest.split_once(PATH_ARROW) {
                Some((path, extra)) => (path.trim().to_string(), Some(extra.trim().to_string())),
                None => (rest.to_string(), None),
            },
            _ => (rest.to_string(), None),
        };

        Some(ChangeRecord { kind, path, extra })
    }

    pub fn is_remove(&self) -> bool {
        self.kind == ChangeKind::Remove
    }
}

/// Parse every line of a diff report, dropping blank lines.
pub fn parse_lines<S: AsRef<str>>(lines: &[S]) -> Vec<ChangeRecord> {
    lines
        .iter()
        .filter_map(|line| ChangeRecord::parse(line.as_ref()))
        .collect()
}

/// Per-kind line counts of a diff report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub add: usize,
    pub remove: usize,
    pub moved: usize,
    pub update: usize,
    pub copy: usize,
    pub restore: usize,
    pub other: usize,
}

impl DiffSummary {
    pub fn from_records(records: &[ChangeRecord]) -> Self {
        let mut summary = DiffSummary::default();
        for record in records {
            match record.kind {
                ChangeKind::Add => summary.add += 1,
                ChangeKind::Remove => summary.remove += 1,
                ChangeKind::Move => summary.moved += 1,
                ChangeKind::Update => summary.update += 1,
                ChangeKind::Copy => summary.copy += 1,
                ChangeKind::Restore => summary.restore += 1,
                ChangeKind::Other(_) => summary.other += 1,
            }
        }
        summary
    }
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Diff results: {} added, {} removed, {} moved, {} modified",
            self.add, self.remove, self.moved, self.update
        )
    }
}
