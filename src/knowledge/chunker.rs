//! Text Chunking Module
//!
//! 문서를 고정 길이의 겹치는 청크로 나눕니다.
//! 길이는 바이트가 아닌 문자(Unicode scalar) 단위입니다.

use thiserror::Error;

use super::document::{Chunk, Document};

// ============================================================================
// Chunk Configuration
// ============================================================================

/// 청킹 설정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    /// 최대 청크 크기 (문자 수)
    pub chunk_size: usize,
    /// 오버랩 크기 (문자 수)
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
        }
    }
}

/// 청킹 설정 오류
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkConfigError {
    #[error("chunk_size must be greater than 0")]
    ZeroSize,
    #[error("chunk_overlap ({overlap}) must be smaller than chunk_size ({size})")]
    OverlapTooLarge { size: usize, overlap: usize },
}

impl ChunkConfig {
    /// 검증된 설정 생성
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkConfigError> {
        if chunk_size == 0 {
            return Err(ChunkConfigError::ZeroSize);
        }
        if chunk_overlap >= chunk_size {
            return Err(ChunkConfigError::OverlapTooLarge {
                size: chunk_size,
                overlap: chunk_overlap,
            });
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// 청크 간 이동 폭
    fn stride(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }
}

// ============================================================================
// Chunker Trait
// ============================================================================

/// 텍스트 청킹 전략 트레이트
pub trait Chunker: Send + Sync {
    /// 텍스트를 청크 구간 `[start, end)` 목록으로 분할 (문자 오프셋)
    fn spans(&self, text: &str) -> Vec<(usize, usize)>;

    /// 청커 이름
    fn name(&self) -> &'static str;

    /// 텍스트를 청크 문자열로 분할
    fn chunk(&self, text: &str) -> Vec<String> {
        let offsets = byte_offsets(text);
        self.spans(text)
            .into_iter()
            .map(|(start, end)| text[offsets[start]..offsets[end]].to_string())
            .collect()
    }

    /// 문서 목록을 청크 목록으로 분할 (문서 순서 유지)
    fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for doc in documents {
            let offsets = byte_offsets(&doc.text);
            for (i, (start, end)) in self.spans(&doc.text).into_iter().enumerate() {
                chunks.push(Chunk {
                    source: doc.source.clone(),
                    chunk_index: i,
                    start,
                    end,
                    text: doc.text[offsets[start]..offsets[end]].to_string(),
                });
            }
        }

        chunks
    }
}

// ============================================================================
// CharacterChunker
// ============================================================================

/// 고정 길이 문자 청커
///
/// 각 청크는 최대 `chunk_size` 문자이고, 이웃 청크와 정확히
/// `chunk_overlap` 문자를 공유합니다. 마지막 청크만 더 짧을 수 있습니다.
#[derive(Debug, Clone)]
pub struct CharacterChunker {
    config: ChunkConfig,
}

impl CharacterChunker {
    /// 설정으로 생성
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    /// 크기/오버랩으로 생성
    pub fn with_size(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ChunkConfigError> {
        Ok(Self::new(ChunkConfig::new(chunk_size, chunk_overlap)?))
    }

    /// 기본 설정으로 생성 (1000 / 100)
    pub fn with_defaults() -> Self {
        Self::new(ChunkConfig::default())
    }

    /// 현재 설정
    pub fn config(&self) -> ChunkConfig {
        self.config
    }

    /// 길이 `len` 텍스트의 예상 청크 수
    pub fn expected_count(&self, len: usize) -> usize {
        let ChunkConfig {
            chunk_size,
            chunk_overlap,
        } = self.config;
        match len {
            0 => 0,
            l if l <= chunk_size => 1,
            l => (l - chunk_overlap).div_ceil(self.config.stride()),
        }
    }
}

impl Chunker for CharacterChunker {
    fn spans(&self, text: &str) -> Vec<(usize, usize)> {
        let len = text.chars().count();
        if len == 0 {
            return vec![];
        }

        let mut spans = Vec::with_capacity(self.expected_count(len));
        let mut start = 0;

        loop {
            let end = (start + self.config.chunk_size).min(len);
            spans.push((start, end));

            if end == len {
                break;
            }

            start = end - self.config.chunk_overlap;
        }

        spans
    }

    fn name(&self) -> &'static str {
        "CharacterChunker"
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 문자 인덱스 -> 바이트 오프셋 표 (마지막 원소는 text.len())
fn byte_offsets(text: &str) -> Vec<usize> {
    text.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect()
}

// ============================================================================
// Factory Functions
// ============================================================================

/// 기본 청커 생성
pub fn default_chunker() -> Box<dyn Chunker> {
    Box::new(CharacterChunker::with_defaults())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_text(len: usize) -> String {
        (0..len)
            .map(|i| char::from(b'a' + (i % 26) as u8))
            .collect()
    }

    #[test]
    fn test_chunker_empty() {
        let chunker = CharacterChunker::with_defaults();
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.spans("").is_empty());
    }

    #[test]
    fn test_chunker_small_text() {
        let chunker = CharacterChunker::with_defaults();
        let chunks = chunker.chunk("Short paragraph.");
        assert_eq!(chunks, vec!["Short paragraph.".to_string()]);
    }

    #[test]
    fn test_chunker_exact_size_is_single_chunk() {
        let chunker = CharacterChunker::with_size(10, 3).unwrap();
        let text = numbered_text(10);
        assert_eq!(chunker.spans(&text), vec![(0, 10)]);
    }

    #[test]
    fn test_chunker_2500_chars() {
        let chunker = CharacterChunker::with_size(1000, 100).unwrap();
        let text = numbered_text(2500);

        let spans = chunker.spans(&text);
        assert_eq!(spans, vec![(0, 1000), (900, 1900), (1800, 2500)]);

        let chunks = chunker.chunk(&text);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], text[0..1000]);
        assert_eq!(chunks[1], text[900..1900]);
        assert_eq!(chunks[2], text[1800..2500]);
    }

    #[test]
    fn test_chunk_count_formula() {
        let chunker = CharacterChunker::with_size(7, 2).unwrap();

        for len in 8..60 {
            let text = numbered_text(len);
            let spans = chunker.spans(&text);
            // ceil((L - O) / (M - O))
            let expected = (len - 2).div_ceil(5);
            assert_eq!(spans.len(), expected, "len={}", len);
            assert_eq!(chunker.expected_count(len), expected);
        }
    }

    #[test]
    fn test_consecutive_chunks_share_overlap() {
        let chunker = CharacterChunker::with_size(50, 12).unwrap();
        let text = numbered_text(437);
        let chunks = chunker.chunk(&text);

        for chunk in &chunks {
            assert!(chunk.chars().count() <= 50);
        }

        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].chars().collect();
            let next: Vec<char> = pair[1].chars().collect();
            assert_eq!(&prev[prev.len() - 12..], &next[..12]);
        }

        // 마지막 청크는 텍스트 끝에서 끝남
        assert!(text.ends_with(chunks.last().unwrap().as_str()));
    }

    #[test]
    fn test_chunker_is_idempotent() {
        let chunker = CharacterChunker::with_size(100, 10).unwrap();
        let text = numbered_text(555);

        let first = chunker.chunk(&text);
        assert_eq!(first, chunker.chunk(&text));

        for chunk in &first {
            assert_eq!(chunker.chunk(chunk), vec![chunk.clone()]);
        }
    }

    #[test]
    fn test_chunker_multibyte_text() {
        let chunker = CharacterChunker::with_size(4, 1).unwrap();
        let chunks = chunker.chunk("가나다라마바사");
        assert_eq!(chunks, vec!["가나다라", "라마바사"]);
    }

    #[test]
    fn test_split_documents_keeps_source_and_order() {
        let chunker = CharacterChunker::with_size(4, 1).unwrap();
        let docs = vec![
            Document::new("a.pdf", "abcdefg"),
            Document::new("b.pdf", "xyz"),
        ];

        let chunks = chunker.split_documents(&docs);
        assert_eq!(chunks.len(), 3);

        assert_eq!(chunks[0].source, std::path::PathBuf::from("a.pdf"));
        assert_eq!((chunks[0].start, chunks[0].end), (0, 4));
        assert_eq!(chunks[0].text, "abcd");
        assert_eq!(chunks[1].chunk_index, 1);
        assert_eq!(chunks[1].text, "defg");

        assert_eq!(chunks[2].source, std::path::PathBuf::from("b.pdf"));
        assert_eq!(chunks[2].chunk_index, 0);
        assert_eq!(chunks[2].char_len(), 3);
    }

    #[test]
    fn test_split_no_documents() {
        let chunker = CharacterChunker::with_defaults();
        assert!(chunker.split_documents(&[]).is_empty());
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(ChunkConfig::new(0, 0), Err(ChunkConfigError::ZeroSize));
        assert_eq!(
            ChunkConfig::new(100, 100),
            Err(ChunkConfigError::OverlapTooLarge {
                size: 100,
                overlap: 100
            })
        );
        assert!(ChunkConfig::new(100, 99).is_ok());
        assert!(ChunkConfig::new(100, 0).is_ok());
    }

    #[test]
    fn test_default_chunker_name() {
        assert_eq!(default_chunker().name(), "CharacterChunker");
    }
}
