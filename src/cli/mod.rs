//! CLI 모듈
//!
//! docchat CLI 명령어 정의 및 구현

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::app::{load_corpus, AppContext, Corpus};
use crate::collector::FileType;
use crate::config::{get_api_base, get_api_key, AppConfig, API_KEY_ENV_VAR};
use crate::server;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "docchat")]
#[command(version, about = "PDF 문서 기반 대화형 질의응답 챗봇", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 문서를 인덱싱하고 웹 채팅 서버 실행
    Serve {
        #[command(flatten)]
        pipeline: PipelineArgs,

        /// 서버 포트
        #[arg(short, long, default_value = "7860")]
        port: u16,

        /// 모든 인터페이스(0.0.0.0)에 바인딩
        #[arg(long)]
        share: bool,

        /// 채팅 페이지 제목
        #[arg(long, default_value = "Future Collars AI")]
        title: String,

        /// 채팅 페이지 설명
        #[arg(long, default_value = "Ask a question about Future Collars")]
        description: String,
    },

    /// 질문 하나에 답변 (대화 기록 없음)
    Ask {
        /// 질문
        question: String,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// 문서 로드와 청크 분할 결과만 확인 (API 호출 없음)
    Inspect {
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
}

/// 로드/분할/모델 공통 옵션
#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// 문서 디렉토리
    #[arg(short, long, default_value = "data/pdf/")]
    pub dir: PathBuf,

    /// 파일 glob 패턴
    #[arg(short, long, default_value = "*.pdf")]
    pub glob: String,

    /// 청크 최대 길이 (문자 수)
    #[arg(long, default_value = "1000")]
    pub chunk_size: usize,

    /// 청크 간 오버랩 (문자 수)
    #[arg(long, default_value = "100")]
    pub chunk_overlap: usize,

    /// 파싱 실패 파일을 경고 후 건너뛰기
    #[arg(long)]
    pub skip_unreadable: bool,

    /// 채팅 모델
    #[arg(short, long, default_value = "gpt-3.5-turbo")]
    pub model: String,

    /// 샘플링 온도
    #[arg(short, long, default_value = "0.6")]
    pub temperature: f32,

    /// 임베딩 모델
    #[arg(long, default_value = "text-embedding-ada-002")]
    pub embedding_model: String,

    /// 검색할 청크 수
    #[arg(short = 'k', long, default_value = "4")]
    pub top_k: usize,

    /// API 주소 (기본: OPENAI_API_BASE 또는 OpenAI)
    #[arg(long)]
    pub api_base: Option<String>,

    /// 체인 상세 로그 끄기
    #[arg(short, long)]
    pub quiet: bool,
}

impl PipelineArgs {
    /// 설정 구성 (.env와 환경변수 포함)
    fn into_config(self) -> Result<AppConfig> {
        dotenvy::dotenv().ok();

        let defaults = AppConfig::default();
        let config = AppConfig {
            data_dir: self.dir,
            glob: self.glob,
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
            skip_unreadable: self.skip_unreadable,
            chat_model: self.model,
            temperature: self.temperature,
            embedding_model: self.embedding_model,
            api_base: self
                .api_base
                .or_else(get_api_base)
                .unwrap_or(defaults.api_base),
            api_key: get_api_key(),
            top_k: self.top_k,
            verbose: !self.quiet,
            ..defaults
        };

        config.validate()?;
        Ok(config)
    }
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve {
            pipeline,
            port,
            share,
            title,
            description,
        } => {
            let config = AppConfig {
                port,
                share,
                title,
                description,
                ..pipeline.into_config()?
            };
            cmd_serve(config).await
        }
        Commands::Ask { question, pipeline } => cmd_ask(pipeline.into_config()?, &question).await,
        Commands::Inspect { pipeline } => cmd_inspect(pipeline.into_config()?).await,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 서버 명령어 (serve)
async fn cmd_serve(config: AppConfig) -> Result<()> {
    let ctx = prepare_context(config).await?;

    println!("[OK] Chat server ready: http://{}", ctx.config.bind_addr());
    println!("     Press Ctrl+C to stop");

    server::serve(Arc::new(ctx)).await
}

/// 질문 명령어 (ask)
async fn cmd_ask(config: AppConfig, question: &str) -> Result<()> {
    let ctx = prepare_context(config).await?;

    println!("[*] Question: \"{}\"", question);

    let response = ctx.chain.call(question, &[]).await.context("Chain call failed")?;

    println!();
    println!("{}", response.answer);
    println!();

    if !response.source_chunks.is_empty() {
        println!("[*] Sources ({}):", response.source_chunks.len());
        for (i, result) in response.source_chunks.iter().enumerate() {
            println!(
                "{}. [{:.4}] {} #{}",
                i + 1,
                result.similarity,
                result.chunk.display_name(),
                result.chunk.chunk_index
            );
            println!("   {}", truncate_text(&result.chunk.text, 200));
        }
    }

    Ok(())
}

/// 확인 명령어 (inspect)
///
/// 네트워크 호출 없이 로드와 분할 결과만 보여줍니다.
async fn cmd_inspect(config: AppConfig) -> Result<()> {
    println!("[*] Directory: {}", config.data_dir.display());
    println!("[*] Pattern: {}", config.glob);
    println!(
        "[*] Chunking: size {}, overlap {}",
        config.chunk_size, config.chunk_overlap
    );
    println!();

    let corpus = load_and_report(&config).await?;

    if corpus.documents.is_empty() {
        return Ok(());
    }

    println!();
    for doc in &corpus.documents {
        let type_str = match doc.metadata.file_type {
            Some(FileType::Pdf) => "PDF",
            Some(FileType::Text) => "TXT",
            None => "-",
        };
        let chunk_count = corpus
            .chunks
            .iter()
            .filter(|c| c.source == doc.source)
            .count();
        let pages = doc
            .metadata
            .page_count
            .map(|p| format!(", {} pages", p))
            .unwrap_or_default();

        println!("  [{}] {}", type_str, doc.display_name());
        println!(
            "        {} chars ({}){} | {} chunks",
            doc.char_len(),
            format_bytes(doc.text.len()),
            pages,
            chunk_count
        );
    }

    println!();
    println!(
        "[OK] Total: {} documents, {} chars, {} chunks",
        corpus.documents.len(),
        corpus.total_chars(),
        corpus.chunks.len()
    );

    Ok(())
}

// ============================================================================
// Pipeline
// ============================================================================

/// 로드/분할 후 진행 상황 출력
async fn load_and_report(config: &AppConfig) -> Result<Corpus> {
    let corpus = load_corpus(config).await?;

    if corpus.documents.is_empty() {
        println!("[!] Loaded 0 documents");
        println!(
            "    No files matching {:?} in {}",
            config.glob,
            config.data_dir.display()
        );
    } else {
        println!("[*] Loaded {} documents", corpus.documents.len());
    }
    println!("[*] Split into {} chunks", corpus.chunks.len());

    Ok(corpus)
}

/// 전체 파이프라인: 로드 → 분할 → 임베딩 → 체인
async fn prepare_context(config: AppConfig) -> Result<AppContext> {
    if config.require_api_key().is_err() {
        bail!(
            "API key not set.\n\n\
             Setup:\n  \
             export {}=your-api-key\n  \
             or add it to a .env file\n\n\
             Get an API key: https://platform.openai.com/api-keys",
            API_KEY_ENV_VAR
        );
    }

    let corpus = load_and_report(&config).await?;
    if corpus.chunks.is_empty() {
        bail!(
            "No chunks to index: no readable documents matching {:?} in {}",
            config.glob,
            config.data_dir.display()
        );
    }

    println!("[*] Embedding chunks with {}...", config.embedding_model);
    let ctx = AppContext::from_config(config, corpus)
        .await
        .context("Failed to build vector index")?;
    println!("[OK] Indexed {} chunks", ctx.stats.chunks);

    Ok(ctx)
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

/// 바이트 크기 포맷팅
fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

// ============================================================================
// Tests
// ============================================================================
