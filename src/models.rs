//! Alt Text Data Models
//!
//! 호스트(CMS)와 주고받는 Rust 데이터 모델

use serde::{Deserialize, Serialize};

use crate::analyzer::AnalysisError;

/// 이미지 분석 결과 (호스트 응답용 tagged result)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub success: bool,
    pub text: Option<String>,
    pub error: Option<String>,
    /// 실패 시 에러 분류 코드 (INVALID_INPUT, API_ERROR 등)
    pub error_code: Option<String>,
}

impl AnalysisResult {
    pub fn ok(text: String) -> Self {
        Self {
            success: true,
            text: Some(text),
            error: None,
            error_code: None,
        }
    }

    pub fn failed(error: &AnalysisError) -> Self {
        Self {
            success: false,
            text: None,
            error: Some(error.to_string()),
            error_code: Some(error.code().to_string()),
        }
    }
}

impl From<Result<String, AnalysisError>> for AnalysisResult {
    fn from(outcome: Result<String, AnalysisError>) -> Self {
        match outcome {
            Ok(text) => Self::ok(text),
            Err(e) => Self::failed(&e),
        }
    }
}

/// 플러그인 설정 (옵션 배열 대신 명시적 타입)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AltTextSettings {
    /// 암호화된 API 키 blob (평문 저장 금지)
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
    #[serde(default)]
    pub auto_generate: bool,
    #[serde(default)]
    pub update_title: bool,
    #[serde(default)]
    pub update_caption: bool,
    #[serde(default)]
    pub update_description: bool,
}

/// 설정 화면에서 제출된 입력값
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsInput {
    /// 평문 API 키. 비어 있으면 기존 키 유지
    pub api_key: Option<String>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub auto_generate: Option<bool>,
    pub update_title: Option<bool>,
    pub update_caption: Option<bool>,
    pub update_description: Option<bool>,
}

/// 설정 조회 응답 (암호화된 키 blob은 노출하지 않음)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub has_api_key: bool,
    pub prefix: String,
    pub suffix: String,
    pub auto_generate: bool,
    pub update_title: bool,
    pub update_caption: bool,
    pub update_description: bool,
}

impl SettingsView {
    pub fn new(settings: &AltTextSettings, has_api_key: bool) -> Self {
        Self {
            has_api_key,
            prefix: settings.prefix.clone(),
            suffix: settings.suffix.clone(),
            auto_generate: settings.auto_generate,
            update_title: settings.update_title,
            update_caption: settings.update_caption,
            update_description: settings.update_description,
        }
    }
}

/// 첨부 이미지 (호스트 메타데이터 저장소의 엔티티)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: i64,
    pub url: String,
    pub mime_type: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub description: String,
    pub alt_text: Option<String>,
    pub updated_at: i64,
}

impl Attachment {
    pub fn new(id: i64, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            mime_type: None,
            title: String::new(),
            caption: String::new(),
            description: String::new(),
            alt_text: None,
            updated_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// MIME 타입이 없으면 이미지로 간주 (확장자 정책에서 다시 걸러짐)
    pub fn is_image(&self) -> bool {
        self.mime_type
            .as_deref()
            .map(|m| m.to_ascii_lowercase().starts_with("image/"))
            .unwrap_or(true)
    }
}

/// 제목/캡션/설명 동시 갱신용 필드 묶음
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentFields {
    pub title: Option<String>,
    pub caption: Option<String>,
    pub description: Option<String>,
}

impl AttachmentFields {
    /// 설정 플래그에 따라 alt text를 복사할 필드 구성
    pub fn from_settings(settings: &AltTextSettings, alt_text: &str) -> Self {
        let copy = |enabled: bool| enabled.then(|| alt_text.to_string());
        Self {
            title: copy(settings.update_title),
            caption: copy(settings.update_caption),
            description: copy(settings.update_description),
        }
    }
}

/// alt text 적용 현황 통계
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageStats {
    pub total_images: usize,
    pub images_with_alt: usize,
    pub images_without_alt: usize,
    pub coverage_percentage: u32,
}

impl CoverageStats {
    pub fn from_counts(total_images: usize, images_with_alt: usize) -> Self {
        let coverage_percentage = if total_images > 0 {
            ((images_with_alt as f64 / total_images as f64) * 100.0).round() as u32
        } else {
            0
        };

        Self {
            total_images,
            images_with_alt,
            images_without_alt: total_images.saturating_sub(images_with_alt),
            coverage_percentage,
        }
    }
}

/// 명령 처리 후 저장된 alt text 응답
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAltText {
    pub image_id: i64,
    pub alt_text: String,
    pub message: String,
}
