pub mod diff;
pub mod dup;

pub use diff::{ChangeKind, ChangeRecord, DiffSummary};
pub use dup::{DuplicateGraph, DuplicateReport};
