//! Chat backends for the supported AI providers.

pub mod anthropic;
pub mod gemini;
pub mod mock;
pub mod openai;
pub mod traits;

pub use anthropic::AnthropicBackend;
pub use gemini::GeminiBackend;
pub use mock::MockBackend;
pub use openai::OpenAiBackend;
pub use traits::{
    strip_json_fences, BackendError, ChatBackend, ChatRequest, ChatResponse, Message, MessageRole,
    Usage,
};
