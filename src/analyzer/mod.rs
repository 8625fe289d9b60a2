//! Image Analysis 모듈
//!
//! 이미지 URL 하나를 Vision API에 보내 alt text를 생성합니다.
//! 재시도는 하지 않으며 모든 실패는 해당 호출에서 종결됩니다.

pub mod client;
pub mod types;

pub use client::{fit_alt_text, AnalysisClient, ALT_TEXT_MAX_CHARS, ALT_TEXT_PROMPT};

/// 분석 실패 분류
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("Invalid image URL format: {0}")]
    InvalidInput(String),

    #[error("Image not accessible: {0}")]
    Unreachable(String),

    #[error("Invalid content type: {0}")]
    UnsupportedType(String),

    #[error("API Error ({}): {body}", status_label(.status))]
    ApiError { status: Option<u16>, body: String },

    #[error("Invalid API response structure: {0}")]
    MalformedResponse(String),

    #[error("Empty alt text generated")]
    EmptyResult,
}

fn status_label(status: &Option<u16>) -> String {
    status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "transport".to_string())
}

impl AnalysisError {
    /// 호스트에 전달하는 안정적인 에러 코드
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::InvalidInput(_) => "INVALID_INPUT",
            AnalysisError::Unreachable(_) => "UNREACHABLE",
            AnalysisError::UnsupportedType(_) => "UNSUPPORTED_TYPE",
            AnalysisError::ApiError { .. } => "API_ERROR",
            AnalysisError::MalformedResponse(_) => "MALFORMED_RESPONSE",
            AnalysisError::EmptyResult => "EMPTY_RESULT",
        }
    }
}
