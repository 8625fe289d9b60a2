//! 플러그인 설정 문서 읽기/쓰기
//!
//! 설정은 `smart_alt_text_settings` 옵션 하나에 JSON 문서로 저장됩니다.

use crate::models::AltTextSettings;
use crate::store::{SettingsStore, StoreError};

/// 설정 문서 옵션 이름
pub const SETTINGS_OPTION: &str = "smart_alt_text_settings";

/// 설정 로드 (없으면 기본값)
pub fn load(store: &dyn SettingsStore) -> Result<AltTextSettings, StoreError> {
    match store.get_option(SETTINGS_OPTION)? {
        Some(raw) if !raw.trim().is_empty() => {
            serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
                key: SETTINGS_OPTION.to_string(),
                reason: e.to_string(),
            })
        }
        _ => Ok(AltTextSettings::default()),
    }
}

/// 설정 저장
pub fn store(store: &dyn SettingsStore, settings: &AltTextSettings) -> Result<(), StoreError> {
    let raw = serde_json::to_string(settings).map_err(|e| StoreError::Corrupt {
        key: SETTINGS_OPTION.to_string(),
        reason: e.to_string(),
    })?;
    store.set_option(SETTINGS_OPTION, &raw)
}

/// 한 줄 텍스트 필드 정리
///
/// 태그 제거, 줄바꿈/탭/연속 공백을 공백 하나로, 앞뒤 공백 제거
pub fn sanitize_text_field(input: &str) -> String {
    let mut stripped = String::with_capacity(input.len());
    let mut in_tag = false;

    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            _ => stripped.push(c),
        }
    }

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn test_sanitize_text_field() {
        assert_eq!(sanitize_text_field("  Photo:  "), "Photo:");
        assert_eq!(sanitize_text_field("<b>Brand</b>\n\tname"), "Brand name");
        assert_eq!(sanitize_text_field("<script>"), "");
        assert_eq!(sanitize_text_field("a > b"), "a > b");
    }

    #[test]
    fn test_load_defaults_then_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();

        assert_eq!(load(&db).unwrap(), AltTextSettings::default());

        let settings = AltTextSettings {
            prefix: "Image:".to_string(),
            auto_generate: true,
            ..Default::default()
        };
        store(&db, &settings).unwrap();
        assert_eq!(load(&db).unwrap(), settings);
    }

    #[test]
    fn test_corrupt_document_reported() {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db.set_option(SETTINGS_OPTION, "{not json").unwrap();

        assert!(matches!(load(&db), Err(StoreError::Corrupt { .. })));
    }
}
