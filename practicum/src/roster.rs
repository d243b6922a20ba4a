//! The in-memory journal store: the student roster and its upsert
//! operations.
//!
//! The roster is the root of the persisted state. All mutation goes through
//! keyed upserts so the one-journal-per-date invariant holds no matter how
//! often an operation is retried.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::identity::stable_id;
use crate::types::{
    DailyEntry, GrowthTrigger, Insight, Journal, PracticumSettings, Student, StudentId, WeekNumber,
};
use crate::week::week_number;

/// Root document: every registered student and their nested records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default)]
    pub students: Vec<Student>,
}

impl Roster {
    pub fn student(&self, id: StudentId) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn student_mut(&mut self, id: StudentId) -> Option<&mut Student> {
        self.students.iter_mut().find(|s| s.id == id)
    }

    pub fn student_by_name(&self, name: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.name == name)
    }

    /// Register a student, or update the settings of an existing one.
    ///
    /// Students are keyed by name: registering the same name twice updates
    /// the existing record's settings rather than adding a second student.
    /// Returns the student's stable id.
    pub fn register(&mut self, name: &str, settings: PracticumSettings) -> StudentId {
        if let Some(existing) = self.students.iter_mut().find(|s| s.name == name) {
            existing.settings = settings;
            return existing.id;
        }

        let id = stable_id(name);
        debug!(name, id, "registering new student");
        self.students.push(Student {
            id,
            name: name.to_string(),
            settings,
            journals: Vec::new(),
            growth_triggers: Vec::new(),
            insights: Vec::new(),
            weekly_reviews: Default::default(),
        });
        id
    }
}

impl Student {
    /// The journal for a calendar date, if one exists.
    pub fn journal_for(&self, date: NaiveDate) -> Option<&Journal> {
        self.journals.iter().find(|j| j.date == date)
    }

    pub fn journal_for_mut(&mut self, date: NaiveDate) -> Option<&mut Journal> {
        self.journals.iter_mut().find(|j| j.date == date)
    }

    /// Create or update the journal for `date`.
    ///
    /// Keyed strictly by date: an existing journal has its text fields
    /// replaced and keeps its id, week number, seed, analysis, and
    /// judgments. A new journal gets a timestamp id and a week number
    /// computed from the student's current start date. The week number is
    /// never recomputed afterwards.
    pub fn upsert_journal(&mut self, date: NaiveDate, entry: DailyEntry) -> &mut Journal {
        let start = self.settings.start_date;
        let idx = match self.journals.iter().position(|j| j.date == date) {
            Some(idx) => idx,
            None => {
                self.journals.push(Journal {
                    id: Utc::now().timestamp_millis(),
                    date,
                    week_number: week_number(date, start),
                    practical_content: String::new(),
                    unachieved_point: String::new(),
                    instructor_notes: String::new(),
                    feedback: String::new(),
                    selected_seed: None,
                    ai_analysis: None,
                    step0_judgments: None,
                });
                self.journals.len() - 1
            }
        };

        let journal = &mut self.journals[idx];
        journal.practical_content = entry.practical_content;
        journal.unachieved_point = entry.unachieved_point;
        journal.instructor_notes = entry.instructor_notes;
        journal
    }

    /// The chronologically latest journal (max by date).
    pub fn latest_journal(&self) -> Option<&Journal> {
        self.journals.iter().max_by_key(|j| j.date)
    }

    pub fn journals_for_week(&self, week: WeekNumber) -> Vec<&Journal> {
        self.journals.iter().filter(|j| j.week_number == week).collect()
    }

    /// Insights for a week, resolved transitively through each insight's
    /// journal.
    pub fn insights_for_week(&self, week: WeekNumber) -> Vec<&Insight> {
        self.insights
            .iter()
            .filter(|insight| {
                self.journals
                    .iter()
                    .any(|j| j.id == insight.journal_id && j.week_number == week)
            })
            .collect()
    }

    pub fn triggers_for_week(&self, week: WeekNumber) -> Vec<&GrowthTrigger> {
        self.growth_triggers
            .iter()
            .filter(|t| t.week_number == week)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn settings(start: &str, end: &str) -> PracticumSettings {
        PracticumSettings {
            start_date: Some(date(start)),
            end_date: Some(date(end)),
            goal: String::new(),
            interests: String::new(),
        }
    }

    fn entry(practical: &str) -> DailyEntry {
        DailyEntry {
            practical_content: practical.to_string(),
            unachieved_point: String::new(),
            instructor_notes: String::new(),
        }
    }

    #[test]
    fn register_is_keyed_by_name() {
        let mut roster = Roster::default();
        let a = roster.register("Nakasaki", settings("2025-05-19", "2025-08-01"));
        let b = roster.register("Nakasaki", settings("2025-05-26", "2025-08-08"));

        assert_eq!(a, b);
        assert_eq!(roster.students.len(), 1);
        assert_eq!(
            roster.students[0].settings.start_date,
            Some(date("2025-05-26"))
        );
    }

    #[test]
    fn upsert_never_duplicates_a_date() {
        let mut roster = Roster::default();
        let id = roster.register("Nakasaki", settings("2025-05-19", "2025-08-01"));
        let student = roster.student_mut(id).unwrap();

        student.upsert_journal(date("2025-05-20"), entry("first draft"));
        student.upsert_journal(date("2025-05-20"), entry("second draft"));

        assert_eq!(student.journals.len(), 1);
        assert_eq!(student.journals[0].practical_content, "second draft");
    }

    #[test]
    fn upsert_preserves_id_and_analysis_fields() {
        let mut roster = Roster::default();
        let id = roster.register("Nakasaki", settings("2025-05-19", "2025-08-01"));
        let student = roster.student_mut(id).unwrap();

        let d = date("2025-05-20");
        student.upsert_journal(d, entry("first"));
        student.journal_for_mut(d).unwrap().selected_seed = Some("seed".to_string());
        let original_id = student.journal_for(d).unwrap().id;

        student.upsert_journal(d, entry("second"));
        let journal = student.journal_for(d).unwrap();
        assert_eq!(journal.id, original_id);
        assert_eq!(journal.selected_seed.as_deref(), Some("seed"));
    }

    #[test]
    fn week_number_is_computed_at_creation() {
        let mut roster = Roster::default();
        let id = roster.register("Nakasaki", settings("2025-05-19", "2025-08-01"));
        let student = roster.student_mut(id).unwrap();

        let journal = student.upsert_journal(date("2025-05-27"), entry("x"));
        assert_eq!(journal.week_number, 2);
    }

    #[test]
    fn week_number_goes_stale_on_start_date_edit() {
        // Observed behavior of the system, preserved deliberately: editing
        // the start date does not recompute existing week numbers.
        let mut roster = Roster::default();
        let id = roster.register("Nakasaki", settings("2025-05-19", "2025-08-01"));

        roster
            .student_mut(id)
            .unwrap()
            .upsert_journal(date("2025-05-27"), entry("x"));
        roster.register("Nakasaki", settings("2025-05-26", "2025-08-08"));

        let student = roster.student(id).unwrap();
        assert_eq!(student.journals[0].week_number, 2);
    }

    #[test]
    fn latest_journal_is_max_by_date() {
        let mut roster = Roster::default();
        let id = roster.register("Nakasaki", settings("2025-05-19", "2025-08-01"));
        let student = roster.student_mut(id).unwrap();

        student.upsert_journal(date("2025-05-28"), entry("later"));
        student.upsert_journal(date("2025-05-20"), entry("earlier"));

        assert_eq!(student.latest_journal().unwrap().date, date("2025-05-28"));
    }

    #[test]
    fn insights_resolve_weeks_through_journals() {
        let mut roster = Roster::default();
        let id = roster.register("Nakasaki", settings("2025-05-19", "2025-08-01"));
        let student = roster.student_mut(id).unwrap();

        let journal_id = student.upsert_journal(date("2025-05-27"), entry("x")).id;
        student.insights.push(Insight {
            journal_id,
            kind: "empathy".to_string(),
            snippet: "noticed the patient's hesitation".to_string(),
            reason: "non-verbal cue".to_string(),
        });

        assert_eq!(student.insights_for_week(2).len(), 1);
        assert!(student.insights_for_week(1).is_empty());
    }
}
