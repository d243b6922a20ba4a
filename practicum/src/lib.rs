//! Practicum domain model for the Kizuki mentoring engine.
//!
//! This crate is the pure domain layer: the student/journal record graph,
//! stable identity derivation, week computation, the mentoring-seed
//! continuity resolver, and prompt assembly for the AI collaborator.
//! Everything here is synchronous and side-effect free; orchestration and
//! I/O live in `kizuki-engine` and `mentor-agent`.

pub mod continuity;
pub mod identity;
pub mod prompt;
pub mod roster;
pub mod types;
pub mod week;

// Re-export main types for convenience
pub use continuity::latest_selected_seed;
pub use identity::stable_id;
pub use prompt::PromptAssembler;
pub use roster::Roster;
pub use types::*;
pub use week::week_number;
