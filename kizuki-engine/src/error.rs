//! Error types for the engine.
//!
//! Three families, matching how failures are handled: validation errors
//! (nothing mutated), external-call errors (prior state preserved), and
//! persistence errors (in-memory state keeps the attempted change). None
//! of them are fatal; every operation can be retried.

use chrono::NaiveDate;

use practicum::types::StudentId;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A required input was missing
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Operation addressed an unknown student
    #[error("student {0} is not registered")]
    StudentNotFound(StudentId),

    /// Operation requires a saved journal for the date
    #[error("no journal saved for {0}; save the journal first")]
    JournalMissing(NaiveDate),

    /// Operation requires a completed analysis for the date
    #[error("no completed analysis for {0}")]
    AnalysisMissing(NaiveDate),

    /// The seed being confirmed was not offered by the analysis
    #[error("the selected seed was not offered by the analysis")]
    SeedNotOffered,

    /// Weekly rollup requested for a student with no journals
    #[error("the student has no journals yet")]
    NoJournals,

    /// The external collaborator returned an error payload
    #[error("external call failed: {message}")]
    External {
        message: String,
        suggestion: Option<String>,
    },

    /// The store collaborator failed; in-memory state may be ahead of
    /// durable state
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
