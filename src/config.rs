//! 애플리케이션 설정
//!
//! 시작 시 한 번 만들어져 각 클라이언트 생성자에 명시적으로 전달됩니다.
//! 프로세스 환경변수를 수정하지 않습니다.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// OpenAI 호환 API 기본 주소
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// API 키 환경변수
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

/// API 주소 환경변수 (선택)
pub const API_BASE_ENV_VAR: &str = "OPENAI_API_BASE";

// ============================================================================
// AppConfig
// ============================================================================

/// 챗봇 전체 설정
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 문서 디렉토리
    pub data_dir: PathBuf,
    /// 파일 glob 패턴 (data_dir 기준 상대 경로)
    pub glob: String,
    /// 청크 최대 길이 (문자 수)
    pub chunk_size: usize,
    /// 청크 간 오버랩 (문자 수)
    pub chunk_overlap: usize,
    /// 파싱 실패 파일 건너뛰기
    pub skip_unreadable: bool,

    /// 채팅 모델 이름
    pub chat_model: String,
    /// 샘플링 온도
    pub temperature: f32,
    /// 임베딩 모델 이름
    pub embedding_model: String,
    /// API 주소
    pub api_base: String,
    /// API 키
    pub api_key: Option<String>,
    /// 검색할 청크 수
    pub top_k: usize,
    /// 체인 상세 로그
    pub verbose: bool,

    /// 채팅 페이지 제목
    pub title: String,
    /// 채팅 페이지 설명
    pub description: String,
    /// true면 0.0.0.0에 바인딩 (외부 공개)
    pub share: bool,
    /// 서버 포트
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/pdf/"),
            glob: "*.pdf".to_string(),
            chunk_size: 1000,
            chunk_overlap: 100,
            skip_unreadable: false,
            chat_model: "gpt-3.5-turbo".to_string(),
            temperature: 0.6,
            embedding_model: "text-embedding-ada-002".to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            top_k: 4,
            verbose: true,
            title: "Future Collars AI".to_string(),
            description: "Ask a question about Future Collars".to_string(),
            share: false,
            port: 7860,
        }
    }
}

impl AppConfig {
    /// 설정 값 검증
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            bail!("chunk_size must be greater than 0");
        }
        if self.chunk_overlap >= self.chunk_size {
            bail!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap,
                self.chunk_size
            );
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            bail!("temperature must be between 0.0 and 2.0, got {}", self.temperature);
        }
        if self.top_k == 0 {
            bail!("top_k must be greater than 0");
        }
        url::Url::parse(&self.api_base)
            .with_context(|| format!("Invalid API base URL: {}", self.api_base))?;
        Ok(())
    }

    /// API 키 반환 (없으면 설정 방법 안내와 함께 실패)
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => bail!(
                "API key not found. Set {} in the environment or in a .env file.\n\
                 Get your API key at: https://platform.openai.com/api-keys",
                API_KEY_ENV_VAR
            ),
        }
    }

    /// 서버 바인딩 주소
    pub fn bind_addr(&self) -> String {
        let host = if self.share { "0.0.0.0" } else { "127.0.0.1" };
        format!("{}:{}", host, self.port)
    }

    /// `{api_base}/{path}` 형태의 엔드포인트 URL
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), path)
    }
}

// ============================================================================
// Environment
// ============================================================================

/// 환경변수에서 API 키 로드
pub fn get_api_key() -> Option<String> {
    std::env::var(API_KEY_ENV_VAR)
        .ok()
        .filter(|key| !key.is_empty())
}

/// 환경변수에서 API 주소 로드
pub fn get_api_base() -> Option<String> {
    std::env::var(API_BASE_ENV_VAR)
        .ok()
        .filter(|base| !base.is_empty())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 100);
        assert!((config.temperature - 0.6).abs() < f32::EPSILON);
        assert_eq!(config.chat_model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let config = AppConfig {
            chunk_size: 100,
            chunk_overlap: 100,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("chunk_overlap"));
    }

    #[test]
    fn test_invalid_temperature() {
        let config = AppConfig {
            temperature: 3.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_api_base() {
        let config = AppConfig {
            api_base: "not a url".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bind_addr_share_toggle() {
        let mut config = AppConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:7860");
        config.share = true;
        assert_eq!(config.bind_addr(), "0.0.0.0:7860");
    }

    #[test]
    fn test_endpoint_trims_slash() {
        let config = AppConfig {
            api_base: "http://localhost:8080/v1/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.endpoint("embeddings"),
            "http://localhost:8080/v1/embeddings"
        );
    }

    #[test]
    fn test_require_api_key() {
        let mut config = AppConfig::default();
        assert!(config.require_api_key().is_err());

        config.api_key = Some(String::new());
        assert!(config.require_api_key().is_err());

        config.api_key = Some("sk-test".to_string());
        assert_eq!(config.require_api_key().unwrap(), "sk-test");
    }
}
