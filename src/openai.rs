//! OpenAI 호환 API 공통 요청 처리
//!
//! 임베딩과 채팅 클라이언트가 같은 재시도 규칙을 씁니다.
//! 429 / 5xx / 전송 실패는 지수 백오프로 재시도하고, 다른 오류는 즉시 실패합니다.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// 기본 최대 재시도 횟수
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// 기본 초기 백오프
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(1000);

// ============================================================================
// Retry Policy
// ============================================================================

/// 재시도 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 최초 요청 이후 최대 재시도 횟수
    pub max_retries: u32,
    /// 첫 재시도 전 대기 시간 (이후 2배씩 증가)
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// 재시도 없음
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// `attempt`번째 재시도 전 대기 시간 (1부터)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

// ============================================================================
// Error Body
// ============================================================================

/// OpenAI 에러 응답
#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// 에러 본문에서 메시지 추출 (형식이 다르면 본문 그대로)
pub fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

// ============================================================================
// Request
// ============================================================================

/// JSON 본문을 POST하고 성공 응답 본문을 반환 (재시도 포함)
///
/// # Arguments
/// * `label` - 오류 메시지에 쓰는 API 이름 (예: "Embedding", "Chat")
pub(crate) async fn post_json<T: Serialize + ?Sized>(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    body: &T,
    retry: RetryPolicy,
    label: &str,
) -> Result<String> {
    let mut last_error: Option<anyhow::Error> = None;

    for attempt in 0..=retry.max_retries {
        if attempt > 0 {
            let backoff = retry.backoff(attempt);
            tracing::warn!(
                "{} request failed, retrying in {:?} (attempt {}/{})",
                label,
                backoff,
                attempt,
                retry.max_retries
            );
            tokio::time::sleep(backoff).await;
        }

        let response = match client
            .post(url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                last_error = Some(anyhow::anyhow!(
                    "Failed to send {} request: {}",
                    label.to_lowercase(),
                    e
                ));
                continue;
            }
        };

        let status = response.status();
        let text = response
            .text()
            .await
            .context("Failed to read response body")?;

        // 성공
        if status.is_success() {
            return Ok(text);
        }

        // 429 / 5xx - 재시도
        if status.as_u16() == 429 || status.is_server_error() {
            last_error = Some(anyhow::anyhow!(
                "{} API error ({}): {}",
                label,
                status,
                api_error_message(&text)
            ));
            continue;
        }

        // 다른 에러 - 즉시 실패
        let message = api_error_message(&text);
        tracing::error!(%status, error = %message, "{} API returned error response", label);
        anyhow::bail!("{} API error ({}): {}", label, status, message);
    }

    // 모든 재시도 실패
    Err(last_error.unwrap_or_else(|| {
        anyhow::anyhow!("{} request failed after {} retries", label, retry.max_retries)
    }))
}

// ============================================================================
// Tests
// ============================================================================
