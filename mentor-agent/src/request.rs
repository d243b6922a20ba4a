//! Wire contracts for the two analysis operations.

use serde::{Deserialize, Serialize};

use practicum::types::{Journal, WeekNumber};

/// Request for one day's journal analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub week: WeekNumber,
    /// What was done and achieved.
    pub log_achieved: String,
    /// What was not achieved; reflections.
    pub log_unachieved: String,
    /// The seed carried over from the previous analysis, empty if none.
    #[serde(default)]
    pub previous_triggers: String,
    #[serde(default)]
    pub instructor_notes: String,
    /// Provider name; empty selects the service default.
    #[serde(default)]
    pub provider: String,
}

impl AnalysisRequest {
    pub fn new(week: WeekNumber, achieved: impl Into<String>, unachieved: impl Into<String>) -> Self {
        Self {
            week,
            log_achieved: achieved.into(),
            log_unachieved: unachieved.into(),
            ..Default::default()
        }
    }

    pub fn with_previous_triggers(mut self, seed: impl Into<String>) -> Self {
        self.previous_triggers = seed.into();
        self
    }

    pub fn with_instructor_notes(mut self, notes: impl Into<String>) -> Self {
        self.instructor_notes = notes.into();
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }
}

/// Request for a weekly rollup over one week's journals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyRequest {
    pub week_number: WeekNumber,
    pub journals: Vec<Journal>,
    #[serde(default)]
    pub provider: String,
}
