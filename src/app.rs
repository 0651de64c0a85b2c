//! 애플리케이션 컨텍스트
//!
//! 시작 시 한 번: 문서 로드 → 청크 분할 → 임베딩/인덱스 구축 → 체인 생성.
//! 이후 컨텍스트는 읽기 전용으로 서버와 CLI에서 공유됩니다.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::chain::ConversationalRetrievalChain;
use crate::collector::CollectorConfig;
use crate::completion::{ChatModel, OpenAIChat};
use crate::config::AppConfig;
use crate::embedding::{create_embedder, EmbeddingProvider};
use crate::knowledge::{build_index, CharacterChunker, Chunk, ChunkConfig, Chunker, Document};
use crate::loader::{load_documents, LoadOptions};

// ============================================================================
// Corpus
// ============================================================================

/// 로드된 문서와 분할된 청크
#[derive(Debug, Clone)]
pub struct Corpus {
    pub documents: Vec<Document>,
    pub chunks: Vec<Chunk>,
}

impl Corpus {
    /// 문서 목록을 설정된 크기로 분할
    pub fn from_documents(documents: Vec<Document>, config: &AppConfig) -> Result<Self> {
        let chunk_config = ChunkConfig::new(config.chunk_size, config.chunk_overlap)
            .context("Invalid chunk configuration")?;
        let chunker = CharacterChunker::new(chunk_config);
        let chunks = chunker.split_documents(&documents);

        Ok(Self { documents, chunks })
    }

    /// 전체 문자 수
    pub fn total_chars(&self) -> usize {
        self.documents.iter().map(|d| d.char_len()).sum()
    }
}

/// 설정의 디렉토리/패턴으로 문서를 로드하고 분할
pub async fn load_corpus(config: &AppConfig) -> Result<Corpus> {
    let options = LoadOptions {
        skip_unreadable: config.skip_unreadable,
        collector: CollectorConfig::default(),
    };

    let documents = load_documents(&config.data_dir, &config.glob, &options)
        .await
        .with_context(|| format!("Failed to load documents from {:?}", config.data_dir))?;

    Corpus::from_documents(documents, config)
}

// ============================================================================
// AppContext
// ============================================================================

/// 인덱스 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub documents: usize,
    pub chunks: usize,
}

/// 공유 애플리케이션 컨텍스트
pub struct AppContext {
    pub config: AppConfig,
    pub chain: ConversationalRetrievalChain,
    pub stats: IndexStats,
}

impl AppContext {
    /// 코퍼스와 클라이언트로 컨텍스트 구성
    ///
    /// 청크가 없으면 임베딩 호출 전에 실패합니다.
    pub async fn build(
        config: AppConfig,
        corpus: Corpus,
        llm: Arc<dyn ChatModel>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let stats = IndexStats {
            documents: corpus.documents.len(),
            chunks: corpus.chunks.len(),
        };

        let store = build_index(corpus.chunks, embedder.as_ref()).await?;

        let chain = ConversationalRetrievalChain::new(llm, embedder, Arc::new(store))
            .with_temperature(config.temperature)
            .with_top_k(config.top_k)
            .with_verbose(config.verbose);

        Ok(Self {
            config,
            chain,
            stats,
        })
    }

    /// OpenAI 클라이언트로 컨텍스트 구성
    pub async fn from_config(config: AppConfig, corpus: Corpus) -> Result<Self> {
        let llm = Arc::new(OpenAIChat::from_config(&config)?);
        let embedder = Arc::new(create_embedder(&config)?);
        Self::build(config, corpus, llm, embedder).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::tests::{KeywordEmbedder, ScriptedChat};
    use crate::extractor::pdf::tests::minimal_pdf;
    use tempfile::TempDir;

    fn text_config(dir: &TempDir) -> AppConfig {
        AppConfig {
            data_dir: dir.path().to_path_buf(),
            glob: "*.txt".to_string(),
            chunk_size: 10,
            chunk_overlap: 2,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_load_corpus_splits_documents() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a".repeat(26)).unwrap();
        std::fs::write(dir.path().join("b.txt"), "short").unwrap();

        let corpus = load_corpus(&text_config(&dir)).await.unwrap();

        assert_eq!(corpus.documents.len(), 2);
        // 26자: 0..10, 8..18, 16..26 → 3개, 5자 → 1개
        assert_eq!(corpus.chunks.len(), 4);
        assert_eq!(corpus.total_chars(), 31);
    }

    #[tokio::test]
    async fn test_load_corpus_splits_long_pdf() {
        let dir = TempDir::new().unwrap();
        let text: String = "career change ".repeat(200).chars().take(2500).collect();
        std::fs::write(dir.path().join("long.pdf"), minimal_pdf(&text)).unwrap();

        // 기본값: *.pdf, 1000자 / 100자 겹침
        let config = AppConfig {
            data_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let corpus = load_corpus(&config).await.unwrap();

        assert_eq!(corpus.documents.len(), 1);
        let chars = corpus.total_chars();
        assert!((2400..=2600).contains(&chars), "unexpected length {chars}");
        // 0..1000, 900..1900, 1800..끝
        assert_eq!(corpus.chunks.len(), 3);
        assert!(corpus.chunks.iter().all(|c| c.char_len() <= 1000));
    }

    #[tokio::test]
    async fn test_load_corpus_missing_directory() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig {
            data_dir: dir.path().join("missing"),
            ..Default::default()
        };
        assert!(load_corpus(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_build_fails_without_chunks() {
        let corpus = Corpus {
            documents: Vec::new(),
            chunks: Vec::new(),
        };
        let embedder = Arc::new(KeywordEmbedder::new(vec!["future"]));
        let llm = Arc::new(ScriptedChat::new(vec![]));

        let result =
            AppContext::build(AppConfig::default(), corpus, llm, embedder.clone()).await;

        assert!(result.is_err());
        assert!(embedder.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_build_context_answers_questions() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("about.txt"),
            "Future Collars is a school for career changers.",
        )
        .unwrap();
        let config = AppConfig {
            chunk_size: 1000,
            chunk_overlap: 100,
            ..text_config(&dir)
        };

        let corpus = load_corpus(&config).await.unwrap();
        let embedder = Arc::new(KeywordEmbedder::new(vec!["future collars", "school"]));
        let llm = Arc::new(ScriptedChat::new(vec![Ok("A school.".to_string())]));

        let ctx = AppContext::build(config, corpus, llm, embedder).await.unwrap();
        assert_eq!(
            ctx.stats,
            IndexStats {
                documents: 1,
                chunks: 1
            }
        );

        let response = ctx.chain.call("What is Future Collars?", &[]).await.unwrap();
        assert_eq!(response.answer, "A school.");
        assert_eq!(response.source_chunks.len(), 1);
    }
}
