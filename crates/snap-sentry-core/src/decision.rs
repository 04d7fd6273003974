use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictReason {
    /// Negative ceiling, or the operator asked to ignore it.
    CeilingDisabled,
    /// Raw removal count is within the ceiling.
    WithinCeiling,
    /// Raw count exceeds the ceiling, but what remains after discounting
    /// not-important and duplicate-covered removals does not.
    ExplainedRemovals,
    /// Unexplained removals exceed the ceiling.
    ExceedsCeiling,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub proceed: bool,
    pub important_non_duplicate: usize,
    pub ceiling: i64,
    pub reason: VerdictReason,
}

impl Verdict {
    /// Whether the raw count went over the ceiling, so the important
    /// removals deserve a listing even if the run proceeds.
    pub fn over_raw_ceiling(&self) -> bool {
        matches!(
            self.reason,
            VerdictReason::ExplainedRemovals | VerdictReason::ExceedsCeiling
        )
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            VerdictReason::CeilingDisabled => write!(f, "delete threshold disabled"),
            VerdictReason::WithinCeiling => {
                write!(f, "removals within delete threshold of {}", self.ceiling)
            }
            VerdictReason::ExplainedRemovals => write!(
                f,
                "{} unexplained removals within delete threshold of {}",
                self.important_non_duplicate, self.ceiling
            ),
            VerdictReason::ExceedsCeiling => write!(
                f,
                "{} unexplained removals exceed delete threshold of {}",
                self.important_non_duplicate, self.ceiling
            ),
        }
    }
}

/// Decide whether the sync may go ahead.
///
/// `important_non_duplicate = total_removed - not_important - duplicate_covered`
/// is held against `ceiling`. A negative ceiling disables the check.
pub fn decide(
    total_removed: usize,
    not_important: usize,
    duplicate_covered: usize,
    ceiling: i64,
) -> Verdict {
    let important_non_duplicate = total_removed
        .saturating_sub(not_important)
        .saturating_sub(duplicate_covered);

    let reason = match u64::try_from(ceiling) {
        Err(_) => VerdictReason::CeilingDisabled,
        Ok(limit) if total_removed as u64 <= limit => VerdictReason::WithinCeiling,
        Ok(limit) if important_non_duplicate as u64 <= limit => VerdictReason::ExplainedRemovals,
        Ok(_) => VerdictReason::ExceedsCeiling,
    };

    Verdict {
        proceed: reason != VerdictReason::ExceedsCeiling,
        important_non_duplicate,
        ceiling,
        reason,
    }
}
