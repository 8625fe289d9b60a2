//! Host Commands Module
//!
//! CMS 호스트에서 호출 가능한 명령어 정의

pub mod analyze;
pub mod bulk;
pub mod settings;
pub mod stats;

use std::sync::MutexGuard;

use crate::analyzer::AnalysisClient;
use crate::config::VisionConfig;
use crate::db::{Database, DbState};
use crate::error::{AltTextError, CommandError, CommandResult};

/// 분석 명령 공용 상태 (설정 + 재사용되는 HTTP 클라이언트)
pub struct AnalyzerState {
    config: VisionConfig,
    http: reqwest::Client,
}

impl AnalyzerState {
    pub fn new(config: VisionConfig) -> Result<Self, AltTextError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AltTextError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { config, http })
    }

    pub fn with_http_client(config: VisionConfig, http: reqwest::Client) -> Self {
        Self { config, http }
    }

    /// 복호화된 API 키로 분석 클라이언트 생성
    pub fn client(&self, api_key: String) -> AnalysisClient {
        AnalysisClient::with_http_client(self.http.clone(), api_key, self.config.clone())
    }
}

pub fn lock_db(state: &DbState) -> CommandResult<MutexGuard<'_, Database>> {
    state.0.lock().map_err(|e| CommandError {
        code: "LOCK_ERROR".to_string(),
        message: format!("Failed to acquire database lock: {}", e),
        details: None,
    })
}
