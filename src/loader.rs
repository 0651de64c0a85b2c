//! 문서 로더
//!
//! 디렉토리 + glob 패턴으로 파일을 수집하고, 파일마다 하나의 `Document`를 만듭니다.
//! 파싱 실패는 기본적으로 전체 로드를 실패시킵니다.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::collector::{CollectionStats, CollectorConfig, FileCollector};
use crate::extractor::ContentExtractor;
use crate::knowledge::Document;

// ============================================================================
// Errors
// ============================================================================

/// 문서 로드 오류
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Document directory not found: {0:?}")]
    DirectoryNotFound(PathBuf),
    #[error("Not a directory: {0:?}")]
    NotADirectory(PathBuf),
    #[error("Invalid glob pattern {pattern:?}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
    #[error("Failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {path:?}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

// ============================================================================
// Load Options
// ============================================================================

/// 로드 옵션
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// 파싱 실패 파일을 경고 후 건너뛰기 (기본: 실패)
    pub skip_unreadable: bool,
    /// 파일 수집 설정
    pub collector: CollectorConfig,
}

// ============================================================================
// Loader
// ============================================================================

/// 디렉토리에서 패턴에 맞는 문서 로드
///
/// 반환 순서는 파일 경로순입니다.
pub async fn load_documents(
    dir: &Path,
    pattern: &str,
    options: &LoadOptions,
) -> Result<Vec<Document>, LoadError> {
    let collector = FileCollector::new(options.collector.clone());
    let files = collector.collect(dir, pattern)?;

    let stats = CollectionStats::from_files(&files);
    tracing::debug!(
        "Loading {} files ({} pdf, {} text, {} bytes)",
        stats.total_files,
        stats.pdf_files,
        stats.text_files,
        stats.total_size
    );

    let extractor = ContentExtractor::new();
    let mut documents = Vec::with_capacity(files.len());

    for file in &files {
        match extractor.extract(file).await {
            Ok(doc) => {
                tracing::debug!("Loaded {:?} ({} chars)", doc.source, doc.char_len());
                documents.push(doc);
            }
            Err(e) if options.skip_unreadable => {
                tracing::warn!("Skipping unreadable file: {}", e);
            }
            Err(e) => return Err(e),
        }
    }

    if documents.is_empty() {
        tracing::warn!("No documents loaded from {:?} (pattern {:?})", dir, pattern);
    }

    Ok(documents)
}

// ============================================================================
// Tests
// ============================================================================
