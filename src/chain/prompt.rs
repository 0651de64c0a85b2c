//! 체인 프롬프트 템플릿
//!
//! minijinja로 렌더링합니다. 삽입된 질문과 대화 내용은 다시 해석되지 않습니다.

use anyhow::{Context, Result};
use minijinja::{context, Environment};

use crate::completion::ChatMessage;
use crate::knowledge::SearchResult;

use super::ChatTurn;

const CONDENSE_QUESTION_TEMPLATE: &str = "Given the following conversation and a follow up question, \
rephrase the follow up question to be a standalone question, in its original language.

Chat History:
{{ chat_history }}
Follow Up Input: {{ question }}
Standalone question:";

const QA_SYSTEM_TEMPLATE: &str = "Use the following pieces of context to answer the user's question.
If you don't know the answer, just say that you don't know, don't try to make up an answer.
----------------
{{ context }}";

/// 대화 기록을 `Human:` / `Assistant:` 줄로 변환
pub fn format_chat_history(history: &[ChatTurn]) -> String {
    history
        .iter()
        .map(|turn| format!("\nHuman: {}\nAssistant: {}", turn.question, turn.answer))
        .collect()
}

/// 후속 질문 재작성 요청 메시지
pub fn condense_question_messages(
    question: &str,
    history: &[ChatTurn],
) -> Result<Vec<ChatMessage>> {
    let prompt = Environment::new()
        .render_str(
            CONDENSE_QUESTION_TEMPLATE,
            context! {
                chat_history => format_chat_history(history),
                question => question,
            },
        )
        .context("Failed to render condense-question prompt")?;

    Ok(vec![ChatMessage::User(prompt)])
}

/// 검색된 청크를 컨텍스트로 넣은 답변 요청 메시지
pub fn qa_messages(question: &str, sources: &[SearchResult]) -> Result<Vec<ChatMessage>> {
    let joined = sources
        .iter()
        .map(|s| s.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let system = Environment::new()
        .render_str(QA_SYSTEM_TEMPLATE, context! { context => joined })
        .context("Failed to render QA prompt")?;

    Ok(vec![
        ChatMessage::System(system),
        ChatMessage::User(question.to_string()),
    ])
}
