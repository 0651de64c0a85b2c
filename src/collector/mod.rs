//! 파일 수집 모듈
//!
//! 문서 디렉토리에서 glob 패턴에 맞는 파일을 찾습니다.
//! 패턴은 디렉토리 기준 상대 경로에 적용되고 `*`는 경로 구분자를 넘지 않습니다.
//! (`*.pdf`는 최상위 파일만, `**/*.pdf`는 하위 폴더까지)

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use ignore::WalkBuilder;

use crate::loader::LoadError;

// ============================================================================
// File Types
// ============================================================================

/// 지원하는 파일 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// 텍스트 파일 (마크다운, 일반 텍스트 등)
    Text,
    /// PDF 파일
    Pdf,
}

impl FileType {
    /// 확장자로 파일 타입 결정
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_lowercase();
        match ext.as_str() {
            "md" | "txt" | "text" | "markdown" | "rst" | "csv" | "json" | "html" | "htm"
            | "xml" | "yaml" | "yml" => Some(FileType::Text),

            "pdf" => Some(FileType::Pdf),

            _ => None,
        }
    }

    /// 파일 경로에서 타입 결정
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

// ============================================================================
// Collected File
// ============================================================================

/// 수집된 파일 정보
#[derive(Debug, Clone)]
pub struct CollectedFile {
    /// 파일 경로
    pub path: PathBuf,
    /// 파일 타입
    pub file_type: FileType,
    /// 파일 크기 (바이트)
    pub size: u64,
}

// ============================================================================
// File Collector
// ============================================================================

/// 파일 수집기 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// .gitignore 패턴 존중 여부
    pub respect_gitignore: bool,
    /// 숨김 파일 포함 여부
    pub include_hidden: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            // 문서 폴더는 흔히 .gitignore에 들어있음
            respect_gitignore: false,
            include_hidden: false,
        }
    }
}

/// 파일 수집기
pub struct FileCollector {
    config: CollectorConfig,
}

impl FileCollector {
    /// 새 수집기 생성
    pub fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    /// 기본 설정으로 수집기 생성
    pub fn with_defaults() -> Self {
        Self::new(CollectorConfig::default())
    }

    /// 디렉토리에서 패턴에 맞는 파일 수집 (경로순 정렬)
    pub fn collect(&self, dir: &Path, pattern: &str) -> Result<Vec<CollectedFile>, LoadError> {
        if !dir.exists() {
            return Err(LoadError::DirectoryNotFound(dir.to_path_buf()));
        }

        if !dir.is_dir() {
            return Err(LoadError::NotADirectory(dir.to_path_buf()));
        }

        let pattern = Pattern::new(pattern).map_err(|source| LoadError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };

        let walker = WalkBuilder::new(dir)
            .max_depth(walk_depth(pattern.as_str()))
            .hidden(!self.config.include_hidden)
            .git_ignore(self.config.respect_gitignore)
            .git_global(self.config.respect_gitignore)
            .git_exclude(self.config.respect_gitignore)
            .ignore(self.config.respect_gitignore)
            .parents(self.config.respect_gitignore)
            .build();

        let mut files = Vec::new();

        for entry in walker {
            let entry = entry.map_err(|e| walk_error(dir, e))?;

            // 파일만 처리
            if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(dir).unwrap_or(path);
            if !pattern.matches_path_with(relative, options) {
                continue;
            }

            let Some(file_type) = FileType::from_path(path) else {
                tracing::warn!("Skipping unsupported file type: {:?}", path);
                continue;
            };

            let metadata = std::fs::metadata(path).map_err(|source| LoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;

            files.push(CollectedFile {
                path: path.to_path_buf(),
                file_type,
                size: metadata.len(),
            });
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));

        tracing::info!(
            "Collected {} files matching {:?} from {:?}",
            files.len(),
            pattern.as_str(),
            dir
        );
        Ok(files)
    }
}

/// 패턴이 하위 폴더를 가리킬 수 없으면 최상위만 탐색
fn walk_depth(pattern: &str) -> Option<usize> {
    if pattern.contains('/') || pattern.contains("**") {
        None
    } else {
        Some(1)
    }
}

/// 탐색 오류를 실패한 경로와 io::ErrorKind를 유지한 `LoadError`로 변환
fn walk_error(root: &Path, err: ignore::Error) -> LoadError {
    let path = error_path(&err)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    let kind = err
        .io_error()
        .map(|e| e.kind())
        .unwrap_or(std::io::ErrorKind::Other);

    LoadError::Io {
        path,
        source: std::io::Error::new(kind, err.to_string()),
    }
}

fn error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.as_path()),
        ignore::Error::Loop { child, .. } => Some(child.as_path()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        ignore::Error::Partial(errs) => errs.iter().find_map(error_path),
        _ => None,
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// 수집 통계
#[derive(Debug, Default)]
pub struct CollectionStats {
    pub total_files: usize,
    pub text_files: usize,
    pub pdf_files: usize,
    pub total_size: u64,
}

impl CollectionStats {
    /// 수집된 파일 목록에서 통계 계산
    pub fn from_files(files: &[CollectedFile]) -> Self {
        let mut stats = Self::default();

        for file in files {
            stats.total_files += 1;
            stats.total_size += file.size;

            match file.file_type {
                FileType::Text => stats.text_files += 1,
                FileType::Pdf => stats.pdf_files += 1,
            }
        }

        stats
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_file_type_from_extension() {
        assert_eq!(FileType::from_extension("md"), Some(FileType::Text));
        assert_eq!(FileType::from_extension("txt"), Some(FileType::Text));
        assert_eq!(FileType::from_extension("PDF"), Some(FileType::Pdf));
        assert_eq!(FileType::from_extension("exe"), None);
    }

    #[test]
    fn test_collector_config_default() {
        let config = CollectorConfig::default();
        assert!(!config.respect_gitignore);
        assert!(!config.include_hidden);
    }

    #[test]
    fn test_collect_matches_top_level_only() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "b.txt", "b");
        touch(dir.path(), "a.txt", "a");
        touch(dir.path(), "notes.md", "skip");
        touch(dir.path(), "sub/c.txt", "nested");

        let files = FileCollector::with_defaults()
            .collect(dir.path(), "*.txt")
            .unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_collect_recursive_pattern() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "sub/c.txt", "nested");
        touch(dir.path(), "sub/deeper/d.txt", "deeper");

        let files = FileCollector::with_defaults()
            .collect(dir.path(), "**/*.txt")
            .unwrap();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_walk_depth_follows_pattern() {
        assert_eq!(walk_depth("*.pdf"), Some(1));
        assert_eq!(walk_depth("report-?.pdf"), Some(1));
        assert_eq!(walk_depth("**/*.pdf"), None);
        assert_eq!(walk_depth("2024/*.pdf"), None);
    }

    #[test]
    fn test_walk_error_reports_failing_entry() {
        let err = ignore::Error::WithDepth {
            depth: 1,
            err: Box::new(ignore::Error::WithPath {
                path: PathBuf::from("/docs/private"),
                err: Box::new(ignore::Error::Io(std::io::Error::from(
                    std::io::ErrorKind::PermissionDenied,
                ))),
            }),
        };

        match walk_error(Path::new("/docs"), err) {
            LoadError::Io { path, source } => {
                assert_eq!(path, PathBuf::from("/docs/private"));
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_walk_error_without_path_uses_root() {
        let err = ignore::Error::Io(std::io::Error::from(std::io::ErrorKind::NotFound));

        match walk_error(Path::new("/docs"), err) {
            LoadError::Io { path, source } => {
                assert_eq!(path, PathBuf::from("/docs"));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_collect_missing_directory() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        let err = FileCollector::with_defaults()
            .collect(&missing, "*.pdf")
            .unwrap_err();
        assert!(matches!(err, LoadError::DirectoryNotFound(_)));
    }

    #[test]
    fn test_collect_file_instead_of_directory() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "file.txt", "x");

        let err = FileCollector::with_defaults()
            .collect(&dir.path().join("file.txt"), "*.txt")
            .unwrap_err();
        assert!(matches!(err, LoadError::NotADirectory(_)));
    }

    #[test]
    fn test_collect_invalid_pattern() {
        let dir = TempDir::new().unwrap();
        let err = FileCollector::with_defaults()
            .collect(dir.path(), "[*.pdf")
            .unwrap_err();
        assert!(matches!(err, LoadError::InvalidPattern { .. }));
    }

    #[test]
    fn test_collection_stats() {
        let files = vec![
            CollectedFile {
                path: "a.pdf".into(),
                file_type: FileType::Pdf,
                size: 10,
            },
            CollectedFile {
                path: "b.txt".into(),
                file_type: FileType::Text,
                size: 5,
            },
        ];

        let stats = CollectionStats::from_files(&files);
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.pdf_files, 1);
        assert_eq!(stats.text_files, 1);
        assert_eq!(stats.total_size, 15);
    }
}
