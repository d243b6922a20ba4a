//! Mentoring-seed continuity across journal days.

use chrono::NaiveDate;

use crate::types::Student;

/// Find the seed the instructor most recently selected before
/// `current_date`.
///
/// This is the continuity-of-coaching loop: whatever discussion topic was
/// chosen on a prior day is surfaced as context for the next analysis, so a
/// coaching thread survives the gap between sessions. The current date's
/// own entry is never considered. Returns an empty string when no prior
/// journal carries a seed.
pub fn latest_selected_seed(student: &Student, current_date: NaiveDate) -> String {
    student
        .journals
        .iter()
        .filter(|j| j.date < current_date)
        .filter(|j| j.selected_seed.as_deref().is_some_and(|s| !s.is_empty()))
        .max_by_key(|j| j.date)
        .and_then(|j| j.selected_seed.clone())
        .unwrap_or_default()
}
