//! Kizuki Engine - journal capture and mentoring continuity.
//!
//! Ties the domain model (`practicum`) and the AI collaborator
//! (`mentor-agent`) together into one stateful engine:
//! - Student registration and journal upserts (one journal per date)
//! - The daily analysis pipeline: save, carry the previous seed, call the
//!   collaborator, merge the briefing back into the journal
//! - Instructor confirmations: mentoring seed, Step0 judgments, feedback
//! - Weekly rollups stored per practicum week
//! - Pluggable persistence behind the `StateStore` trait
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │                Engine                   │
//! │  (run_analysis / confirm_* / weekly)    │
//! └───────┬───────────────┬─────────────────┘
//!         │               │
//!         ▼               ▼
//! ┌─────────────┐   ┌───────────────┐
//! │ StateStore  │   │ MentorService │
//! │ (JSON file/ │   │ (AI backends) │
//! │  memory)    │   └───────────────┘
//! └─────────────┘
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod store;

// Re-export main types for convenience
pub use config::EngineConfig;
pub use engine::{AnalysisRun, Engine, WeeklyRun};
pub use error::EngineError;
pub use store::{JsonFileStore, MemoryStore, StateStore, StoreError};
