//! Vector Store - 벡터 검색 트레이트 및 인메모리 구현
//!
//! 시작 시 한 번 구축되고 이후에는 읽기 전용으로 사용됩니다.
//! 영속화하지 않습니다.

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::document::Chunk;

/// 기본 검색 결과 수
pub const DEFAULT_TOP_K: usize = 4;

// ============================================================================
// Types
// ============================================================================

/// 벡터 엔트리 (저장용)
#[derive(Debug, Clone)]
pub struct VectorEntry {
    /// 원본 청크
    pub chunk: Chunk,
    /// 임베딩 벡터
    pub embedding: Vec<f32>,
}

/// 검색 결과
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// 매칭된 청크
    pub chunk: Chunk,
    /// 코사인 유사도 (-1.0 ~ 1.0)
    pub similarity: f32,
}

// ============================================================================
// VectorStore Trait
// ============================================================================

/// VectorStore 트레이트 (async)
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// 벡터 배치 삽입
    async fn insert_batch(&self, entries: Vec<VectorEntry>) -> Result<usize>;

    /// 유사도 상위 `limit`개 검색 (내림차순)
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>>;

    /// 벡터 개수 조회
    async fn count(&self) -> Result<usize>;
}

// ============================================================================
// InMemoryVectorStore
// ============================================================================

/// 인메모리 벡터 저장소
///
/// 전체 엔트리를 선형 탐색합니다. 한 번에 로드하는 문서 규모에서는 충분합니다.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    entries: RwLock<Vec<VectorEntry>>,
    dimension: RwLock<Option<usize>>,
}

impl InMemoryVectorStore {
    /// 빈 저장소 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 벡터 차원 (비어있으면 None)
    pub async fn dimension(&self) -> Option<usize> {
        *self.dimension.read().await
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn insert_batch(&self, entries: Vec<VectorEntry>) -> Result<usize> {
        let mut dimension = self.dimension.write().await;
        let mut expected = *dimension;

        for entry in &entries {
            let dim = entry.embedding.len();
            if dim == 0 {
                bail!(
                    "Empty embedding for chunk {} of {:?}",
                    entry.chunk.chunk_index,
                    entry.chunk.source
                );
            }
            match expected {
                Some(e) if e != dim => bail!(
                    "Embedding dimension mismatch: expected {}, got {}",
                    e,
                    dim
                ),
                Some(_) => {}
                None => expected = Some(dim),
            }
        }

        *dimension = expected;
        let inserted = entries.len();
        self.entries.write().await.extend(entries);

        tracing::debug!("Inserted {} vectors", inserted);
        Ok(inserted)
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let entries = self.entries.read().await;

        let mut results: Vec<SearchResult> = entries
            .iter()
            .map(|entry| SearchResult {
                chunk: entry.chunk.clone(),
                similarity: cosine_similarity(query_embedding, &entry.embedding),
            })
            .collect();

        // 안정 정렬: 동점이면 삽입 순서 유지
        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(limit);

        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().await.len())
    }
}

// ============================================================================
// Utility Functions
// ============================================================================

/// 코사인 유사도 계산
///
/// 결과는 -1.0 ~ 1.0 범위입니다. 길이가 다르거나 영벡터면 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

// ============================================================================
// Tests
// ============================================================================
