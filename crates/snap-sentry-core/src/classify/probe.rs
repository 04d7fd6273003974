use glob::{glob_with, MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Looks for a same-named file elsewhere in the removed file's top-level
/// folder. Implementations must be read-only; probes run in parallel.
pub trait CopyProbe: Send + Sync {
    fn has_copy_in_folder(&self, removed: &str) -> bool;
}

/// Probe that never finds a copy. Used for offline classification.
pub struct NoCopyProbe;

impl CopyProbe for NoCopyProbe {
    fn has_copy_in_folder(&self, _removed: &str) -> bool {
        false
    }
}

/// Recursive glob under `<storage_root>/<array dir>/<top-level folder>`.
///
/// Report paths look like `RAID/Photos/2020/img.jpg`; the search for that
/// file is `<storage_root>/RAID/Photos/**/img.jpg`. Paths without a
/// top-level folder (`RAID/img.jpg`) are never probed.
pub struct GlobProbe {
    storage_root: PathBuf,
}

impl GlobProbe {
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
        }
    }

    fn search_pattern(&self, removed: &str) -> Option<String> {
        let parts: Vec<&str> = removed.split('/').collect();
        if parts.len() < 3 {
            return None;
        }
        // snapraid escapes special characters in names with a backslash
        let name = parts[parts.len() - 1].replace('\\', "");
        if name.is_empty() {
            return None;
        }

        let folder = self.storage_root.join(parts[0]).join(parts[1]);
        Some(format!(
            "{}/**/{}",
            Pattern::escape(&folder.to_string_lossy()),
            Pattern::escape(&name)
        ))
    }
}

impl CopyProbe for GlobProbe {
    fn has_copy_in_folder(&self, removed: &str) -> bool {
        let Some(pattern) = self.search_pattern(removed) else {
            return false;
        };
        let own_path = self.storage_root.join(removed.replace('\\', ""));

        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };
        let entries = match glob_with(&pattern, options) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("Invalid glob pattern '{}': {}", pattern, err);
                return false;
            }
        };

        let found = entries
            .filter_map(Result::ok)
            .any(|path| !same_path(&path, &own_path) && path.is_file());
        debug!("Copy probe {} -> {}", pattern, found);
        found
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    a.components().eq(b.components())
}
