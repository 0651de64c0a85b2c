//! 채팅 완성 모듈 - OpenAI 호환 Chat Completions API
//!
//! 메시지 목록을 보내고 어시스턴트 응답 하나를 받습니다.
//!
//! ref: https://platform.openai.com/docs/api-reference/chat

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::openai::{post_json, RetryPolicy};

// ============================================================================
// Messages
// ============================================================================

/// 채팅 메시지
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "content", rename_all = "lowercase")]
pub enum ChatMessage {
    /// 시스템 프롬프트
    System(String),
    /// 사용자 메시지
    User(String),
    /// 어시스턴트 응답
    Assistant(String),
}

impl ChatMessage {
    /// 메시지 본문
    pub fn content(&self) -> &str {
        match self {
            Self::System(s) | Self::User(s) | Self::Assistant(s) => s,
        }
    }
}

/// 토큰 사용량
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

// ============================================================================
// ChatModel Trait
// ============================================================================

/// 채팅 모델 트레이트
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// 메시지 목록에 대한 어시스턴트 응답 생성
    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String>;

    /// 모델 이름
    fn name(&self) -> &str;
}

// ============================================================================
// OpenAI Chat
// ============================================================================

/// HTTP 요청 타임아웃
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// OpenAI 호환 채팅 모델
#[derive(Debug)]
pub struct OpenAIChat {
    api_key: String,
    url: String,
    model: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl OpenAIChat {
    /// 새 채팅 모델 생성
    ///
    /// # Arguments
    /// * `api_key` - API 키
    /// * `url` - `/chat/completions` 엔드포인트 전체 URL
    /// * `model` - 모델 이름
    pub fn new(api_key: String, url: String, model: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_key,
            url,
            model,
            client,
            retry: RetryPolicy::default(),
        })
    }

    /// 재시도 정책 지정 (429 / 5xx / 전송 실패)
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// 설정에서 생성
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        let chat = Self::new(
            api_key,
            config.endpoint("chat/completions"),
            config.chat_model.clone(),
        )?;
        tracing::info!("Using chat model {}", chat.model);
        Ok(chat)
    }
}

/// 요청 본문
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

/// 응답
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<TokenUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// 응답 본문에서 첫 번째 답변 추출
fn parse_completion_response(body: &str) -> Result<(String, Option<TokenUsage>)> {
    let response: CompletionResponse =
        serde_json::from_str(body).context("Failed to parse completion response")?;

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| anyhow::anyhow!("Completion response contained no message content"))?;

    Ok((content, response.usage))
}

#[async_trait]
impl ChatModel for OpenAIChat {
    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
            temperature,
        };

        tracing::debug!(
            model = %self.model,
            message_count = messages.len(),
            "Sending chat completion request"
        );

        let body = post_json(
            &self.client,
            &self.url,
            &self.api_key,
            &request,
            self.retry,
            "Chat",
        )
        .await?;

        let (content, usage) = parse_completion_response(&body)?;

        if let Some(usage) = usage {
            tracing::info!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Token usage recorded"
            );
        }

        Ok(content)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Tests
// ============================================================================
