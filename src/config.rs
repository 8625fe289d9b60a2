//! Vision API 설정
//!
//! 기본값은 코드에 두고, 환경 변수(.env.local 포함)로 덮어씁니다.

use std::time::Duration;

use crate::error::AltTextError;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4-turbo";
pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_MAX_TOKENS: u32 = 150;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const MAX_TIMEOUT_SECS: u64 = 120;

/// Vision API 호출 설정
#[derive(Debug, Clone, PartialEq)]
pub struct VisionConfig {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, AltTextError> {
    match env_value(key) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| AltTextError::Config(format!("{} has an invalid value: {}", key, raw))),
        None => Ok(None),
    }
}

impl VisionConfig {
    /// 환경 변수에서 설정 로드
    ///
    /// - `ALT_TEXT_API_ENDPOINT`
    /// - `ALT_TEXT_MODEL`
    /// - `ALT_TEXT_TEMPERATURE`
    /// - `ALT_TEXT_MAX_TOKENS`
    /// - `ALT_TEXT_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self, AltTextError> {
        let mut config = Self::default();

        if let Some(endpoint) = env_value("ALT_TEXT_API_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Some(model) = env_value("ALT_TEXT_MODEL") {
            config.model = model;
        }
        if let Some(temperature) = parse_env::<f32>("ALT_TEXT_TEMPERATURE")? {
            config.temperature = temperature;
        }
        if let Some(max_tokens) = parse_env::<u32>("ALT_TEXT_MAX_TOKENS")? {
            config.max_tokens = max_tokens;
        }
        if let Some(secs) = parse_env::<u64>("ALT_TEXT_TIMEOUT_SECS")? {
            config.timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// 설정값 검증
    pub fn validate(&self) -> Result<(), AltTextError> {
        let endpoint = url::Url::parse(&self.endpoint)
            .map_err(|e| AltTextError::Config(format!("endpoint is not a valid URL: {}", e)))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(AltTextError::Config(format!(
                "endpoint must use http or https, got {}",
                endpoint.scheme()
            )));
        }

        if self.model.trim().is_empty() {
            return Err(AltTextError::Config("model must not be empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AltTextError::Config(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(AltTextError::Config("max_tokens must be positive".to_string()));
        }

        let secs = self.timeout.as_secs();
        if secs == 0 || secs > MAX_TIMEOUT_SECS {
            return Err(AltTextError::Config(format!(
                "timeout must be between 1 and {} seconds, got {}",
                MAX_TIMEOUT_SECS, secs
            )));
        }

        Ok(())
    }
}
