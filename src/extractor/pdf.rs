//! PDF 텍스트 추출 모듈
//!
//! pdf-extract 크레이트를 사용하여 PDF에서 텍스트를 추출합니다.

use std::path::Path;

use anyhow::{Context, Result};

/// 추출된 PDF 텍스트
#[derive(Debug, Clone, PartialEq)]
pub struct PdfText {
    /// 전체 텍스트
    pub text: String,
    /// 페이지 수 (폼피드 기준)
    pub page_count: usize,
}

/// PDF에서 전체 텍스트 추출
pub fn extract_text_from_pdf(path: &Path) -> Result<PdfText> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read PDF: {:?}", path))?;
    extract_text_from_bytes(&bytes)
        .with_context(|| format!("Failed to extract text from PDF: {:?}", path))
}

/// 메모리의 PDF 바이트에서 텍스트 추출
pub fn extract_text_from_bytes(bytes: &[u8]) -> Result<PdfText> {
    let text = pdf_extract::extract_text_from_mem(bytes)?;

    // 텍스트가 비어있으면 경고 (스캔 문서일 가능성)
    if text.trim().is_empty() {
        tracing::warn!("No text extracted from PDF. It might be a scanned document.");
        return Ok(PdfText {
            text: String::new(),
            page_count: 1,
        });
    }

    let page_count = split_pdf_pages(&text).len();
    Ok(PdfText { text, page_count })
}

/// PDF 텍스트를 페이지별로 분리
fn split_pdf_pages(text: &str) -> Vec<String> {
    // 폼피드 문자 (\x0c)로 페이지 분리 시도
    let pages: Vec<String> = text
        .split('\x0c')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if pages.len() > 1 {
        return pages;
    }

    // 페이지 구분자 패턴으로 시도 (예: "--- Page 1 ---")
    let page_pattern = regex::Regex::new(r"(?m)^[\s]*[-=]+[\s]*(?:Page[\s]*)?(\d+)[\s]*[-=]+[\s]*$")
        .expect("Invalid regex");

    if page_pattern.is_match(text) {
        let pages: Vec<String> = page_pattern
            .split(text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if pages.len() > 1 {
            return pages;
        }
    }

    // 분리 실패 - 전체를 하나의 페이지로
    vec![text.to_string()]
}

// ============================================================================
// Tests
// ============================================================================
