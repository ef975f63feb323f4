pub mod llm_service;
pub mod notes_service;
pub mod retry;

pub use llm_service::{ChatBackend, ChatReply, ChatRequest, LlmService};
pub use notes_service::{build_system_prompt, chunk_text, parse_headings, NotesService};
pub use retry::RetryPolicy;
