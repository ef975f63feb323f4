//! LLM 服务 - 业务能力层
//!
//! 只负责"发一次聊天请求"，重试由 [`crate::services::RetryPolicy`] 负责。
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 兼容 OpenAI API 的服务都可以使用（OpenAI、本地 Ollama 等）

use std::future::Future;
use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::RemoteCallError;

/// 一次聊天请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
}

/// 聊天响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub content: String,
    pub total_tokens: Option<u32>,
}

/// 聊天后端
///
/// 每次调用只发送一次请求，错误需要区分为连接失败、超时和其他错误，
/// 以便重试策略判断。
pub trait ChatBackend: Send + Sync {
    fn complete(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<ChatReply, RemoteCallError>> + Send;
}

/// 基于 `async-openai` 的 LLM 服务
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
    temperature: f32,
    request_timeout: Duration,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            temperature: config.llm_temperature,
            request_timeout: config.llm_timeout(),
        }
    }

    fn classify(&self, err: OpenAIError) -> RemoteCallError {
        match err {
            OpenAIError::Reqwest(e) if e.is_connect() => RemoteCallError::Connection(e.to_string()),
            OpenAIError::Reqwest(e) if e.is_timeout() => RemoteCallError::TimedOut {
                timeout: self.request_timeout,
            },
            other => RemoteCallError::Rejected(other.to_string()),
        }
    }
}

impl ChatBackend for LlmService {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, RemoteCallError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", request.user.len());

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(request.system.as_str())
            .build()
            .map_err(|e| self.classify(e))?;
        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(request.user.as_str())
            .build()
            .map_err(|e| self.classify(e))?;

        let messages = vec![
            ChatCompletionRequestMessage::System(system_msg),
            ChatCompletionRequestMessage::User(user_msg),
        ];

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| self.classify(e))?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| self.classify(e))?;

        debug!("LLM API 调用成功");

        let total_tokens = response.usage.as_ref().map(|usage| usage.total_tokens);
        if let Some(tokens) = total_tokens {
            info!("📈 本次调用共使用 {} tokens", tokens);
        }

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| RemoteCallError::Rejected("LLM 返回内容为空".to_string()))?;

        Ok(ChatReply {
            content: content.trim().to_string(),
            total_tokens,
        })
    }
}
