//! 콘텐츠 추출 모듈
//!
//! 수집된 파일에서 텍스트를 추출해 `Document`로 만듭니다.
//! - 텍스트 파일: 직접 읽기
//! - PDF 파일: pdf-extract로 텍스트 추출

pub mod pdf;

use crate::collector::{CollectedFile, FileType};
use crate::knowledge::{Document, DocumentMetadata};
use crate::loader::LoadError;

// ============================================================================
// Content Extractor
// ============================================================================

/// 콘텐츠 추출기
#[derive(Debug, Default)]
pub struct ContentExtractor;

impl ContentExtractor {
    /// 추출기 생성
    pub fn new() -> Self {
        Self
    }

    /// 파일에서 문서 추출
    pub async fn extract(&self, file: &CollectedFile) -> Result<Document, LoadError> {
        match file.file_type {
            FileType::Text => self.extract_text(file).await,
            FileType::Pdf => self.extract_pdf(file).await,
        }
    }

    /// 텍스트 파일에서 추출
    async fn extract_text(&self, file: &CollectedFile) -> Result<Document, LoadError> {
        let text = tokio::fs::read_to_string(&file.path)
            .await
            .map_err(|e| LoadError::Parse {
                path: file.path.clone(),
                reason: e.to_string(),
            })?;

        Ok(Document {
            source: file.path.clone(),
            text,
            metadata: DocumentMetadata {
                file_type: Some(FileType::Text),
                page_count: None,
            },
        })
    }

    /// PDF 파일에서 추출
    async fn extract_pdf(&self, file: &CollectedFile) -> Result<Document, LoadError> {
        // PDF 추출은 CPU 바운드이므로 spawn_blocking 사용
        let path = file.path.clone();
        let extracted = tokio::task::spawn_blocking(move || pdf::extract_text_from_pdf(&path))
            .await
            .map_err(|e| LoadError::Parse {
                path: file.path.clone(),
                reason: format!("PDF extraction task failed: {}", e),
            })?
            .map_err(|e| LoadError::Parse {
                path: file.path.clone(),
                reason: format!("{:#}", e),
            })?;

        Ok(Document {
            source: file.path.clone(),
            text: extracted.text,
            metadata: DocumentMetadata {
                file_type: Some(FileType::Pdf),
                page_count: Some(extracted.page_count),
            },
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
