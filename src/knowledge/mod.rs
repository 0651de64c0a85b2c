//! Knowledge 모듈 - 문서 청킹과 벡터 인덱스
//!
//! - Document / Chunk: 로더와 청커 사이의 데이터 타입
//! - Chunker: 고정 길이 오버랩 텍스트 분할
//! - VectorStore: 인메모리 코사인 유사도 검색
//! - Index: 청크 임베딩 후 벡터 저장소 구축

mod chunker;
mod document;
mod index;
mod vector;

// Re-exports
pub use chunker::{default_chunker, CharacterChunker, ChunkConfig, ChunkConfigError, Chunker};
pub use document::{Chunk, Document, DocumentMetadata};
pub use index::build_index;
pub use vector::{
    cosine_similarity, InMemoryVectorStore, SearchResult, VectorEntry, VectorStore, DEFAULT_TOP_K,
};
