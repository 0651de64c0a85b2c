//! 벡터 인덱스 구축
//!
//! 청크를 임베딩하고 인메모리 벡터 저장소에 넣습니다.
//! 프로세스 시작 시 한 번만 호출됩니다.

use anyhow::{bail, Context, Result};

use crate::embedding::EmbeddingProvider;

use super::document::Chunk;
use super::vector::{InMemoryVectorStore, VectorEntry, VectorStore};

/// 청크 목록으로 벡터 인덱스 구축
///
/// 청크가 하나도 없으면 임베딩 API를 호출하기 전에 실패합니다.
pub async fn build_index(
    chunks: Vec<Chunk>,
    embedder: &dyn EmbeddingProvider,
) -> Result<InMemoryVectorStore> {
    if chunks.is_empty() {
        bail!(
            "No chunks to index. Check that the document directory contains readable files \
             matching the glob pattern."
        );
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let embeddings = embedder
        .embed_batch(&texts)
        .await
        .context("Failed to embed chunks")?;

    if embeddings.len() != chunks.len() {
        bail!(
            "Embedding count mismatch: {} chunks, {} embeddings",
            chunks.len(),
            embeddings.len()
        );
    }

    let entries: Vec<VectorEntry> = chunks
        .into_iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| VectorEntry { chunk, embedding })
        .collect();

    let store = InMemoryVectorStore::new();
    let inserted = store
        .insert_batch(entries)
        .await
        .context("Failed to insert vectors")?;

    tracing::info!(
        "Built vector index with {} chunks (embedder: {})",
        inserted,
        embedder.name()
    );

    Ok(store)
}

// ============================================================================
// Tests
// ============================================================================
