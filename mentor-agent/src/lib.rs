//! Mentor Agent - AI collaborator for the Kizuki practicum engine.
//!
//! Provides the infrastructure for turning journal text into structured
//! mentoring artifacts:
//! - Trait-based chat backends (OpenAI/Groq, Anthropic, Gemini)
//! - Prompt-driven daily analysis and weekly review calls
//! - Shape-tagged result parsing (error / SOS alert / briefing report)
//! - Rate-limit fallback to a secondary provider
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            MentorService                │
//! │   (analyze / review_week / ping)        │
//! └────────────────┬────────────────────────┘
//!                  │
//!      ┌───────────┴───────────┐
//!      ▼                       ▼
//! ┌─────────────┐       ┌─────────────┐
//! │ ChatBackend │       │ practicum   │
//! │ (OpenAI/    │       │ Prompt      │
//! │  Gemini/…)  │       │ Assembler   │
//! └─────────────┘       └─────────────┘
//! ```

pub mod backend;
pub mod request;
pub mod service;

// Re-export main types for convenience
pub use backend::traits::{BackendError, ChatBackend, ChatRequest, ChatResponse};
pub use backend::{AnthropicBackend, GeminiBackend, MockBackend, OpenAiBackend};
pub use request::{AnalysisRequest, WeeklyRequest};
pub use service::MentorService;
