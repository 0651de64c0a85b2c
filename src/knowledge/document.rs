//! 문서 / 청크 타입
//!
//! 로더가 만든 `Document`를 청커가 `Chunk`로 나눕니다.
//! 둘 다 생성 후 변경되지 않습니다.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::collector::FileType;

// ============================================================================
// Document
// ============================================================================

/// 로드된 원본 문서
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// 원본 파일 경로
    pub source: PathBuf,
    /// 추출된 전체 텍스트
    pub text: String,
    /// 메타데이터
    pub metadata: DocumentMetadata,
}

/// 문서 메타데이터
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentMetadata {
    /// 원본 파일 타입
    pub file_type: Option<FileType>,
    /// PDF 페이지 수 (폼피드 기준 추정)
    pub page_count: Option<usize>,
}

impl Document {
    /// 텍스트만으로 문서 생성
    pub fn new(source: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
            metadata: DocumentMetadata::default(),
        }
    }

    /// 문자 수 (바이트 아님)
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// 화면 표시용 파일 이름
    pub fn display_name(&self) -> String {
        display_name(&self.source)
    }
}

// ============================================================================
// Chunk
// ============================================================================

/// 문서에서 잘라낸 텍스트 조각 (검색 단위)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chunk {
    /// 원본 파일 경로
    pub source: PathBuf,
    /// 문서 내 청크 순번 (0-based)
    pub chunk_index: usize,
    /// 시작 문자 오프셋 (포함)
    pub start: usize,
    /// 끝 문자 오프셋 (미포함)
    pub end: usize,
    /// 청크 텍스트
    pub text: String,
}

impl Chunk {
    /// 문자 수
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }

    /// 화면 표시용 파일 이름
    pub fn display_name(&self) -> String {
        display_name(&self.source)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// Tests
// ============================================================================
