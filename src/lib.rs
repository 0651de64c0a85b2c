//! docchat - PDF 문서 기반 대화형 질의응답 챗봇
//!
//! 디렉토리의 문서를 청크로 나누어 임베딩하고,
//! 대화 기록을 반영한 검색 체인으로 질문에 답합니다.

pub mod app;
pub mod chain;
pub mod chat;
pub mod cli;
pub mod collector;
pub mod completion;
pub mod config;
pub mod embedding;
pub mod extractor;
pub mod knowledge;
pub mod loader;
pub mod openai;
pub mod server;

// Re-exports
pub use app::{load_corpus, AppContext, Corpus, IndexStats};
pub use chain::{ChainResponse, ChatTurn, ConversationalRetrievalChain};
pub use chat::{ChatSession, Transcript};
pub use completion::{ChatMessage, ChatModel, OpenAIChat};
pub use config::AppConfig;
pub use embedding::{EmbeddingProvider, OpenAIEmbedding};
pub use knowledge::{
    build_index, CharacterChunker, Chunk, ChunkConfig, Chunker, Document, InMemoryVectorStore,
    SearchResult, VectorStore,
};
pub use loader::{load_documents, LoadError, LoadOptions};
