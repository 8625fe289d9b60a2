//! Persistence boundary
//!
//! 코어는 전역 옵션 레지스트리 대신 주입된 저장소 트레이트를 통해서만 읽고 씁니다.
//! - `SettingsStore`: 문자열 key-value 설정 저장소 (암호화된 키, 설정 문서)
//! - `MetadataStore`: 첨부 이미지별 메타데이터 저장소 (alt text 등)

use crate::models::{Attachment, AttachmentFields};

/// 저장소 오류
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error("corrupt value for '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

/// key-value 설정 저장소
pub trait SettingsStore {
    fn get_option(&self, name: &str) -> Result<Option<String>, StoreError>;

    fn set_option(&self, name: &str, value: &str) -> Result<(), StoreError>;

    /// 존재하지 않는 키 삭제는 성공으로 취급
    fn delete_option(&self, name: &str) -> Result<(), StoreError>;
}

/// 첨부 이미지 메타데이터 저장소
pub trait MetadataStore {
    fn get_attachment(&self, id: i64) -> Result<Option<Attachment>, StoreError>;

    fn list_attachments(&self) -> Result<Vec<Attachment>, StoreError>;

    fn upsert_attachment(&self, attachment: &Attachment) -> Result<(), StoreError>;

    /// alt text와 제목/캡션/설명을 한 번에 기록 (`None`인 필드는 변경하지 않음)
    ///
    /// 둘 중 하나만 반영되는 부분 쓰기는 허용되지 않습니다.
    fn write_alt_text(
        &self,
        id: i64,
        alt_text: &str,
        fields: &AttachmentFields,
    ) -> Result<(), StoreError>;
}
