//! Vision API 클라이언트
//!
//! 처리 순서:
//! 1. 이미지 URL 형식 검증 (네트워크 호출 없음)
//! 2. HEAD 요청으로 접근 가능 여부 + Content-Type 확인
//! 3. Chat Completions 요청 1회 (Bearer 인증)
//! 4. `choices[0].message.content` 추출 후 125자 이내로 정리
//!
//! 호출마다 구조화된 이벤트를 정확히 1개 남깁니다. API 키는 로그에 남기지 않습니다.

use std::time::Instant;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use url::Url;

use crate::analyzer::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ContentPart, ImageUrl,
};
use crate::analyzer::AnalysisError;
use crate::config::VisionConfig;
use crate::error::AltTextError;
use crate::models::AnalysisResult;

/// alt text 최대 길이 (문자 수)
pub const ALT_TEXT_MAX_CHARS: usize = 125;

/// 잘라낼 때 남기는 문자 수 (뒤에 "..." 추가)
const TRUNCATED_CHARS: usize = 122;

const ELLIPSIS: &str = "...";

/// 모델에 전달하는 고정 지시문
pub const ALT_TEXT_PROMPT: &str = "Generate a concise, descriptive alt text for this image. \
Focus on the main subject and important details. Keep it under 125 characters.";

/// Vision API 클라이언트
pub struct AnalysisClient {
    http: reqwest::Client,
    api_key: String,
    config: VisionConfig,
}

impl AnalysisClient {
    pub fn new(api_key: impl Into<String>, config: VisionConfig) -> Result<Self, AltTextError> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AltTextError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self::with_http_client(http, api_key, config))
    }

    /// 직접 구성한 HTTP 클라이언트 사용 (프록시/타임아웃을 호출자가 제어)
    pub fn with_http_client(
        http: reqwest::Client,
        api_key: impl Into<String>,
        config: VisionConfig,
    ) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            config,
        }
    }

    /// 이미지 분석 → alt text
    pub async fn analyze(&self, image_url: &str) -> Result<String, AnalysisError> {
        let started = Instant::now();
        let outcome = self.run(image_url).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &outcome {
            Ok(text) => tracing::info!(
                target: "alt_text::analysis",
                image_url = %image_url,
                model = %self.config.model,
                outcome = "success",
                text_chars = text.chars().count(),
                elapsed_ms,
                "image analysis finished"
            ),
            Err(e) => tracing::warn!(
                target: "alt_text::analysis",
                image_url = %image_url,
                model = %self.config.model,
                outcome = "failure",
                error_kind = e.code(),
                error = %e,
                elapsed_ms,
                "image analysis finished"
            ),
        }

        outcome
    }

    /// 이미지 분석 → 호스트 응답용 tagged result
    pub async fn analyze_to_result(&self, image_url: &str) -> AnalysisResult {
        AnalysisResult::from(self.analyze(image_url).await)
    }

    async fn run(&self, image_url: &str) -> Result<String, AnalysisError> {
        let url = validate_image_url(image_url)?;
        self.check_image(&url).await?;

        let request = build_request(&self.config, url.as_str());
        let body = self.send(&request).await?;
        let content = parse_content(&body)?;

        fit_alt_text(&content)
    }

    /// HEAD 요청으로 접근 가능 여부와 Content-Type 확인
    async fn check_image(&self, url: &Url) -> Result<String, AnalysisError> {
        let response = self
            .http
            .head(url.as_str())
            .send()
            .await
            .map_err(|e| {
                AnalysisError::Unreachable(format!("failed to fetch image headers: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Unreachable(format!("HTTP {}", status)));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string());

        match content_type {
            Some(ct) if ct.to_ascii_lowercase().starts_with("image/") => Ok(ct),
            Some(ct) => Err(AnalysisError::UnsupportedType(ct)),
            None => Err(AnalysisError::UnsupportedType("unknown".to_string())),
        }
    }

    /// Chat Completions 요청 전송 → 응답 본문
    async fn send(&self, request: &ChatCompletionRequest) -> Result<String, AnalysisError> {
        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| AnalysisError::ApiError {
                status: None,
                body: format!("Failed to send request: {}", e),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| AnalysisError::ApiError {
            status: Some(status.as_u16()),
            body: format!("Failed to read response: {}", e),
        })?;

        if !status.is_success() {
            return Err(AnalysisError::ApiError {
                status: Some(status.as_u16()),
                body,
            });
        }

        Ok(body)
    }
}

/// http(s) 절대 URL만 허용
pub fn validate_image_url(image_url: &str) -> Result<Url, AnalysisError> {
    let trimmed = image_url.trim();
    let url = Url::parse(trimmed)
        .map_err(|e| AnalysisError::InvalidInput(format!("{}: {}", trimmed, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AnalysisError::InvalidInput(format!(
            "unsupported scheme '{}'",
            url.scheme()
        )));
    }
    if url.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(AnalysisError::InvalidInput("URL has no host".to_string()));
    }

    Ok(url)
}

/// 사용자 메시지 1개짜리 요청 구성
pub fn build_request(config: &VisionConfig, image_url: &str) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: config.model.clone(),
        messages: vec![ChatMessage {
            role: "user".to_string(),
            content: vec![
                ContentPart::Text {
                    text: ALT_TEXT_PROMPT.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image_url.to_string(),
                    },
                },
            ],
        }],
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    }
}

/// 응답 본문에서 생성된 텍스트 추출
pub fn parse_content(body: &str) -> Result<String, AnalysisError> {
    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| {
            AnalysisError::MalformedResponse(format!("Failed to decode API response: {}", e))
        })?;

    response
        .first_content()
        .map(str::to_string)
        .ok_or_else(|| {
            AnalysisError::MalformedResponse("missing choices[0].message.content".to_string())
        })
}

/// 공백 정리 후 125자 제한 적용
///
/// 125자를 넘으면 앞 122자 + "..." (정확히 125자). 문자 단위로 자르므로
/// 멀티바이트 문자가 중간에 잘리지 않습니다.
pub fn fit_alt_text(raw: &str) -> Result<String, AnalysisError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AnalysisError::EmptyResult);
    }

    if trimmed.chars().count() > ALT_TEXT_MAX_CHARS {
        let mut cut: String = trimmed.chars().take(TRUNCATED_CHARS).collect();
        cut.push_str(ELLIPSIS);
        return Ok(cut);
    }

    Ok(trimmed.to_string())
}
