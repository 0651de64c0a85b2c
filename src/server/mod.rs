//! 웹 채팅 서버
//!
//! - `GET /`          : 채팅 페이지
//! - `POST /api/chat` : 질문 + 대화 기록 → 답변 + 갱신된 기록
//! - `GET /health`    : 인덱스 상태
//!
//! 대화 기록은 브라우저가 들고 있다가 요청마다 함께 보냅니다.
//! 서버는 요청 사이에 상태를 두지 않습니다.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use minijinja::{context, Environment};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::app::AppContext;
use crate::chat::{ChatSession, ChatTurn, Transcript};
use crate::knowledge::SearchResult;

const INDEX_HTML: &str = include_str!("index.html");

// ============================================================================
// Request / Response
// ============================================================================

/// 채팅 요청
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// 이전 대화 `[[질문, 답변], ...]`
    #[serde(default)]
    pub history: Vec<(String, String)>,
}

/// 답변 출처
#[derive(Debug, Serialize)]
pub struct SourceInfo {
    pub source: String,
    pub chunk_index: usize,
    pub similarity: f32,
    pub text: String,
}

impl From<&SearchResult> for SourceInfo {
    fn from(result: &SearchResult) -> Self {
        Self {
            source: result.chunk.display_name(),
            chunk_index: result.chunk.chunk_index,
            similarity: result.similarity,
            text: result.chunk.text.clone(),
        }
    }
}

/// 채팅 응답
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    /// 이번 턴이 추가된 대화 기록
    pub history: Vec<(String, String)>,
    pub sources: Vec<SourceInfo>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    documents: usize,
    chunks: usize,
}

/// 오류 응답 래퍼
struct ApiErrorResponse {
    status: StatusCode,
    message: String,
}

impl ApiErrorResponse {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    fn upstream(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: format!("{:#}", err),
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

// ============================================================================
// Router
// ============================================================================

/// 라우터 구성
pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/chat", post(chat_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// 서버 실행 (Ctrl+C까지 블록)
pub async fn serve(ctx: Arc<AppContext>) -> Result<()> {
    let addr = ctx.config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Chat server listening on http://{}", addr);
    if ctx.config.share {
        tracing::warn!("Server is bound to all interfaces and reachable from the network");
    }

    axum::serve(listener, build_router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn index_handler(
    State(ctx): State<Arc<AppContext>>,
) -> Result<Html<String>, ApiErrorResponse> {
    render_index(&ctx.config.title, &ctx.config.description)
        .map(Html)
        .map_err(|e| {
            tracing::error!("Failed to render chat page: {}", e);
            ApiErrorResponse::internal("failed to render chat page")
        })
}

async fn health_handler(State(ctx): State<Arc<AppContext>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        documents: ctx.stats.documents,
        chunks: ctx.stats.chunks,
    })
}

async fn chat_handler(
    State(ctx): State<Arc<AppContext>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiErrorResponse> {
    if request.message.trim().is_empty() {
        return Err(ApiErrorResponse::bad_request("message must not be empty"));
    }

    let turns: Vec<ChatTurn> = request
        .history
        .into_iter()
        .map(|(question, answer)| ChatTurn::new(question, answer))
        .collect();
    let mut session = ChatSession::with_transcript(Transcript::from(turns));

    let response = session
        .submit(&ctx.chain, &request.message)
        .await
        .map_err(|e| {
            tracing::error!("Chat turn failed: {:#}", e);
            ApiErrorResponse::upstream(e)
        })?;

    let history = session
        .transcript()
        .turns()
        .iter()
        .map(|t| (t.question.clone(), t.answer.clone()))
        .collect();

    Ok(Json(ChatResponse {
        answer: response.answer,
        history,
        sources: response.source_chunks.iter().map(SourceInfo::from).collect(),
    }))
}

// ============================================================================
// Page Rendering
// ============================================================================

/// 제목/설명을 넣은 채팅 페이지
///
/// `.html` 이름으로 등록하므로 삽입 값은 HTML 이스케이프됩니다.
fn render_index(title: &str, description: &str) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("index.html", INDEX_HTML)?;
    let template = env.get_template("index.html")?;
    template.render(context! { title => title, description => description })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Corpus;
    use crate::chain::tests::{KeywordEmbedder, ScriptedChat};
    use crate::config::AppConfig;
    use crate::knowledge::Chunk;
    use axum::body::Body;
    use axum::http::{header, Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn test_context(llm: Arc<ScriptedChat>) -> Arc<AppContext> {
        let text = "Future Collars is a school for career changers.";
        let corpus = Corpus {
            documents: Vec::new(),
            chunks: vec![Chunk {
                source: "data/pdf/about.pdf".into(),
                chunk_index: 0,
                start: 0,
                end: text.chars().count(),
                text: text.to_string(),
            }],
        };
        let embedder = Arc::new(KeywordEmbedder::new(vec!["future collars", "school"]));
        let config = AppConfig {
            title: "Future <Collars> AI".to_string(),
            ..Default::default()
        };

        Arc::new(AppContext::build(config, corpus, llm, embedder).await.unwrap())
    }

    fn chat_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_index_page_escapes_title() {
        let ctx = test_context(Arc::new(ScriptedChat::new(vec![]))).await;
        let response = build_router(ctx)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Future &lt;Collars&gt; AI"));
        assert!(html.contains("Ask a question about Future Collars"));
    }

    #[tokio::test]
    async fn test_first_chat_turn() {
        let llm = Arc::new(ScriptedChat::new(vec![Ok("A school.".to_string())]));
        let ctx = test_context(llm.clone()).await;

        let response = build_router(ctx)
            .oneshot(chat_request(json!({ "message": "What is Future Collars?" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["answer"], "A school.");
        assert_eq!(body["history"], json!([["What is Future Collars?", "A school."]]));
        assert_eq!(body["sources"][0]["source"], "about.pdf");
        assert_eq!(llm.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_follow_up_turn_extends_history() {
        let llm = Arc::new(ScriptedChat::new(vec![
            Ok("Is Future Collars a school?".to_string()),
            Ok("Yes.".to_string()),
        ]));
        let ctx = test_context(llm.clone()).await;

        let response = build_router(ctx)
            .oneshot(chat_request(json!({
                "message": "Is it a school?",
                "history": [["What is Future Collars?", "A school."]]
            })))
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(
            body["history"],
            json!([
                ["What is Future Collars?", "A school."],
                ["Is it a school?", "Yes."]
            ])
        );
        assert_eq!(llm.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let llm = Arc::new(ScriptedChat::new(vec![]));
        let ctx = test_context(llm.clone()).await;

        let response = build_router(ctx)
            .oneshot(chat_request(json!({ "message": "  " })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(llm.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_model_failure_returns_bad_gateway() {
        let llm = Arc::new(ScriptedChat::new(vec![Err(anyhow::anyhow!("rate limited"))]));
        let ctx = test_context(llm).await;

        let response = build_router(ctx)
            .oneshot(chat_request(json!({ "message": "What is Future Collars?" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("rate limited"));
    }

    #[tokio::test]
    async fn test_health_reports_chunks() {
        let ctx = test_context(Arc::new(ScriptedChat::new(vec![]))).await;
        let response = build_router(ctx)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["chunks"], 1);
    }

    #[test]
    fn test_render_index_escapes_markup() {
        let html = render_index("<script>alert(1)</script>", "Q & A").unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;alert(1)"));
        assert!(html.contains("Q &amp; A"));
    }

    #[test]
    fn test_render_index_keeps_placeholder_text_in_title() {
        let html = render_index("Docs about {{description}}", "SECRET-DESC").unwrap();
        assert!(html.contains("<h1>Docs about {{description}}</h1>"));
        assert_eq!(html.matches("SECRET-DESC").count(), 1);
    }
}
