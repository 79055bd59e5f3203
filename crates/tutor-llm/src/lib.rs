//! Language-model glue: the provider client, the prompts the tutor sends, and
//! the extractor that turns free-form model text back into typed records.

pub mod client;
pub mod extract;
pub mod prompts;

pub use client::{Completion, CompletionRequest, LlmClient, LlmError, MistralClient, PromptMessage, PromptRole};
pub use extract::{ExtractError, ReplySchema, extract};
