//! AI 层：补全客户端抽象与实现（OpenAI 兼容 / Mock）、分级提示词、提示编排

pub mod mock;
pub mod openai;
pub mod orchestrator;
pub mod prompt;
pub mod traits;

pub use mock::MockCompletionClient;
pub use openai::OpenAiCompatClient;
pub use orchestrator::{
    mock_client_factory, openai_client_factory, ClientFactory, HintOrchestrator, HintRequest,
};
pub use prompt::{compose_user_turn, system_prompt};
pub use traits::{CompletionClient, CompletionError, PromptMessage, PromptRole};
