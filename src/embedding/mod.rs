//! 임베딩 모듈 - OpenAI 호환 API를 통한 텍스트 벡터화
//!
//! 텍스트를 벡터로 변환하는 임베딩 프로바이더입니다.
//! 청크 인덱싱과 질문 검색에 모두 사용됩니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let embedder = OpenAIEmbedding::from_config(&config)?;
//! let embedding = embedder.embed("Hello, world!").await?;
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::openai::{post_json, RetryPolicy};

// ============================================================================
// EmbeddingProvider Trait
// ============================================================================

/// 임베딩 프로바이더 트레이트
///
/// 텍스트를 벡터로 변환하는 인터페이스입니다.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// 단일 텍스트 임베딩
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// 배치 임베딩 (기본 구현: 순차 호출)
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// 임베딩 차원 수
    fn dimension(&self) -> usize;

    /// 프로바이더 이름
    fn name(&self) -> &str;
}

// ============================================================================
// OpenAI Embedding
// ============================================================================

/// 요청 하나에 담을 최대 입력 수
const MAX_BATCH_SIZE: usize = 100;
/// HTTP 요청 타임아웃
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// OpenAI 호환 임베딩 구현체
///
/// ref: https://platform.openai.com/docs/api-reference/embeddings
#[derive(Debug)]
pub struct OpenAIEmbedding {
    api_key: String,
    url: String,
    model: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl OpenAIEmbedding {
    /// 새 임베딩 인스턴스 생성
    ///
    /// # Arguments
    /// * `api_key` - API 키
    /// * `url` - `/embeddings` 엔드포인트 전체 URL
    /// * `model` - 임베딩 모델 이름
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

    /// 설정에서 생성
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        Self::new(
            api_key,
            config.endpoint("embeddings"),
            config.embedding_model.clone(),
        )
    }

    /// 재시도 횟수 지정
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_retries = max_retries;
        self
    }

    /// 재시도 정책 지정
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// 입력 배치 하나를 요청 (재시도 포함)
    async fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbedRequest {
            model: &self.model,
            input,
        };

        let body = post_json(
            &self.client,
            &self.url,
            &self.api_key,
            &request,
            self.retry,
            "Embedding",
        )
        .await?;

        parse_embed_response(&body, input.len())
    }
}

/// 임베딩 요청 본문
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// 임베딩 응답
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Debug, Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
    index: usize,
}

/// 응답을 파싱하고 `index` 순서로 정렬
fn parse_embed_response(body: &str, expected: usize) -> Result<Vec<Vec<f32>>> {
    let mut response: EmbedResponse =
        serde_json::from_str(body).context("Failed to parse embedding response")?;

    if response.data.len() != expected {
        anyhow::bail!(
            "Embedding response size mismatch: expected {}, got {}",
            expected,
            response.data.len()
        );
    }

    response.data.sort_by_key(|d| d.index);
    Ok(response.data.into_iter().map(|d| d.embedding).collect())
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            anyhow::bail!("Cannot embed empty text");
        }

        self.request(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Embedding response contained no data"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        let batches = texts.len().div_ceil(MAX_BATCH_SIZE);

        for (i, batch) in texts.chunks(MAX_BATCH_SIZE).enumerate() {
            tracing::debug!("Embedding batch {}/{} ({} texts)", i + 1, batches, batch.len());
            results.extend(self.request(batch).await?);
        }

        Ok(results)
    }

    fn dimension(&self) -> usize {
        model_dimension(&self.model)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// 알려진 모델의 기본 차원 (모르는 모델은 1536)
pub fn model_dimension(model: &str) -> usize {
    match model {
        "text-embedding-3-large" => 3072,
        "text-embedding-3-small" | "text-embedding-ada-002" => 1536,
        _ => 1536,
    }
}

// ============================================================================
// Factory Function
// ============================================================================

/// 임베딩 프로바이더 생성
pub fn create_embedder(config: &AppConfig) -> Result<OpenAIEmbedding> {
    let embedder = OpenAIEmbedding::from_config(config)?;
    tracing::info!(
        "Using embedding model {} (dimension: {})",
        embedder.name(),
        embedder.dimension()
    );
    Ok(embedder)
}

// ============================================================================
// Tests
// ============================================================================
