//! 대화형 검색 체인
//!
//! 질문과 이전 대화를 받아:
//! 1. (대화가 있으면) 후속 질문을 독립 질문으로 재작성
//! 2. 질문 임베딩
//! 3. 벡터 인덱스에서 상위 k개 청크 검색
//! 4. 청크를 컨텍스트로 프롬프트 구성
//! 5. 채팅 모델 호출 후 답변과 출처 반환

mod prompt;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::completion::ChatModel;
use crate::embedding::EmbeddingProvider;
use crate::knowledge::{SearchResult, VectorStore, DEFAULT_TOP_K};

pub use prompt::{condense_question_messages, format_chat_history, qa_messages};

/// 기본 샘플링 온도
pub const DEFAULT_TEMPERATURE: f32 = 0.6;

// ============================================================================
// Types
// ============================================================================

/// 대화 한 턴 (질문, 답변)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
}

impl ChatTurn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// 체인 실행 결과
#[derive(Debug, Clone)]
pub struct ChainResponse {
    /// 생성된 답변
    pub answer: String,
    /// 답변에 사용된 청크 (유사도순)
    pub source_chunks: Vec<SearchResult>,
    /// 검색에 실제로 사용된 질문
    pub generated_question: String,
}

// ============================================================================
// ConversationalRetrievalChain
// ============================================================================

/// 대화형 검색 체인
///
/// 시작 시 한 번 만들어지고 이후 읽기 전용으로 공유됩니다.
pub struct ConversationalRetrievalChain {
    llm: Arc<dyn ChatModel>,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    temperature: f32,
    top_k: usize,
    verbose: bool,
}

impl ConversationalRetrievalChain {
    /// 새 체인 생성 (온도 0.6, k=4)
    pub fn new(
        llm: Arc<dyn ChatModel>,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            llm,
            embedder,
            store,
            temperature: DEFAULT_TEMPERATURE,
            top_k: DEFAULT_TOP_K,
            verbose: false,
        }
    }

    /// 샘플링 온도 지정
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// 검색 청크 수 지정
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// 상세 로그 여부
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// 체인 실행
    ///
    /// # Arguments
    /// * `question` - 사용자 질문
    /// * `chat_history` - 이전 대화 (삽입 순서)
    pub async fn call(&self, question: &str, chat_history: &[ChatTurn]) -> Result<ChainResponse> {
        let question = question.trim();
        if question.is_empty() {
            bail!("Question must not be empty");
        }

        // 1. 독립 질문 생성
        let generated_question = if chat_history.is_empty() {
            question.to_string()
        } else {
            let messages = condense_question_messages(question, chat_history)?;
            let rewritten = self
                .llm
                .complete(&messages, self.temperature)
                .await
                .context("Failed to condense follow-up question")?;
            let rewritten = rewritten.trim();
            if rewritten.is_empty() {
                question.to_string()
            } else {
                rewritten.to_string()
            }
        };

        if self.verbose {
            tracing::info!(
                history_len = chat_history.len(),
                "Standalone question: {}",
                generated_question
            );
        }

        // 2-3. 임베딩 및 검색
        let query_embedding = self
            .embedder
            .embed(&generated_question)
            .await
            .context("Failed to embed question")?;
        let source_chunks = self
            .store
            .search(&query_embedding, self.top_k)
            .await
            .context("Failed to search vector index")?;

        if self.verbose {
            for (i, result) in source_chunks.iter().enumerate() {
                tracing::info!(
                    "Source {}: {} #{} (similarity {:.4})",
                    i + 1,
                    result.chunk.display_name(),
                    result.chunk.chunk_index,
                    result.similarity
                );
            }
        }

        // 4-5. 프롬프트 구성 및 답변 생성
        let messages = qa_messages(&generated_question, &source_chunks)?;
        let answer = self
            .llm
            .complete(&messages, self.temperature)
            .await
            .context("Failed to generate answer")?;

        Ok(ChainResponse {
            answer,
            source_chunks,
            generated_question,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
