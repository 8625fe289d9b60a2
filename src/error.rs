//! Alt Text Error Types
//!
//! 애플리케이션 전역 에러 타입 정의

use serde::Serialize;
use thiserror::Error;

use crate::analyzer::AnalysisError;
use crate::secrets::vault::VaultError;
use crate::store::StoreError;

/// Alt Text 애플리케이션 에러
#[derive(Error, Debug)]
pub enum AltTextError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No API key configured. Please save your API key in the plugin settings")]
    MissingApiKey,

    #[error("Attachment not found: {0}")]
    AttachmentNotFound(i64),

    #[error("This image type ({0}) is not supported. Please use JPEG or PNG images only.")]
    UnsupportedFileType(String),
}

/// 호스트 응답용 직렬화 가능한 에러
#[derive(Debug, Clone, Serialize)]
pub struct CommandError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl From<AltTextError> for CommandError {
    fn from(error: AltTextError) -> Self {
        let code = match &error {
            AltTextError::Analysis(e) => e.code(),
            AltTextError::Vault(VaultError::Encryption(_)) => "ENCRYPTION_ERROR",
            AltTextError::Vault(VaultError::Decryption(_)) => "DECRYPTION_ERROR",
            AltTextError::Store(_) => "STORE_ERROR",
            AltTextError::Serialization(_) => "SERIALIZATION_ERROR",
            AltTextError::Config(_) => "CONFIG_ERROR",
            AltTextError::MissingApiKey => "MISSING_API_KEY",
            AltTextError::AttachmentNotFound(_) => "ATTACHMENT_NOT_FOUND",
            AltTextError::UnsupportedFileType(_) => "UNSUPPORTED_FILE_TYPE",
        };

        // API 응답 본문은 진단용으로 details에 분리
        let details = match &error {
            AltTextError::Analysis(AnalysisError::ApiError { body, .. }) => Some(body.clone()),
            _ => None,
        };

        CommandError {
            code: code.to_string(),
            message: error.to_string(),
            details,
        }
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// 호스트 명령 결과 타입
pub type CommandResult<T> = Result<T, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_keeps_body_in_details() {
        let err = AltTextError::from(AnalysisError::ApiError {
            status: Some(500),
            body: "{\"error\":\"boom\"}".to_string(),
        });
        let cmd = CommandError::from(err);
        assert_eq!(cmd.code, "API_ERROR");
        assert_eq!(cmd.details.as_deref(), Some("{\"error\":\"boom\"}"));
        assert!(cmd.message.contains("500"));
    }

    #[test]
    fn test_vault_error_codes() {
        let cmd = CommandError::from(AltTextError::from(VaultError::Decryption(
            "tag mismatch".to_string(),
        )));
        assert_eq!(cmd.code, "DECRYPTION_ERROR");
        assert!(cmd.details.is_none());
    }
}
