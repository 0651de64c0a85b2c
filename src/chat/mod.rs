//! 채팅 세션
//!
//! 세션 하나가 대화 기록(Transcript) 하나를 소유합니다.
//! 질문을 제출하면 현재 기록을 체인에 넘기고, 성공하면 새 턴을 끝에 추가합니다.
//! 실패하면 기록은 바뀌지 않습니다.

use anyhow::Result;

use crate::chain::{ChainResponse, ConversationalRetrievalChain};

pub use crate::chain::ChatTurn;

// ============================================================================
// Transcript
// ============================================================================

/// 대화 기록 (삽입 순서 유지)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<ChatTurn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// 턴 목록
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// 끝에 턴 추가
    pub fn push(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    /// 기록 초기화
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

impl From<Vec<ChatTurn>> for Transcript {
    fn from(turns: Vec<ChatTurn>) -> Self {
        Self { turns }
    }
}

// ============================================================================
// ChatSession
// ============================================================================

/// 세션 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// 입력 대기
    Idle,
    /// 체인 호출 중
    Processing,
}

/// 채팅 세션
#[derive(Debug)]
pub struct ChatSession {
    transcript: Transcript,
    state: SessionState,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    /// 빈 세션 생성
    pub fn new() -> Self {
        Self::with_transcript(Transcript::new())
    }

    /// 기존 기록으로 세션 생성
    pub fn with_transcript(transcript: Transcript) -> Self {
        Self {
            transcript,
            state: SessionState::Idle,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// 기록 초기화
    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    /// 질문 제출
    ///
    /// 체인은 지금까지의 기록을 history로 받습니다.
    /// 성공하면 (질문, 답변) 턴이 기록 끝에 추가됩니다.
    pub async fn submit(
        &mut self,
        chain: &ConversationalRetrievalChain,
        question: &str,
    ) -> Result<ChainResponse> {
        self.state = SessionState::Processing;
        let result = chain.call(question, self.transcript.turns()).await;
        self.state = SessionState::Idle;

        let response = result?;
        self.transcript
            .push(ChatTurn::new(question.trim(), response.answer.clone()));

        tracing::debug!("Transcript now has {} turns", self.transcript.len());
        Ok(response)
    }
}

// ============================================================================
// Tests
// ============================================================================
