//! Settings Commands
//!
//! 설정 저장/조회 및 언인스톨 정리

use crate::commands::lock_db;
use crate::db::DbState;
use crate::error::{AltTextError, CommandError, CommandResult};
use crate::models::{AltTextSettings, SettingsInput, SettingsView};
use crate::secrets::ApiKeyManager;
use crate::settings::{self, sanitize_text_field};
use crate::store::SettingsStore;

/// 제출된 입력을 정리하여 새 설정 구성
///
/// API 키가 비어 있으면 기존 암호화 blob을 유지합니다.
pub fn sanitize_settings(
    store: &dyn SettingsStore,
    input: &SettingsInput,
) -> Result<AltTextSettings, AltTextError> {
    let existing = settings::load(store)?;

    let mut sanitized = AltTextSettings {
        api_key: existing.api_key,
        prefix: input.prefix.as_deref().map(sanitize_text_field).unwrap_or_default(),
        suffix: input.suffix.as_deref().map(sanitize_text_field).unwrap_or_default(),
        auto_generate: input.auto_generate.unwrap_or(false),
        update_title: input.update_title.unwrap_or(false),
        update_caption: input.update_caption.unwrap_or(false),
        update_description: input.update_description.unwrap_or(false),
    };

    ApiKeyManager::apply(store, &mut sanitized, input.api_key.as_deref())?;

    Ok(sanitized)
}

/// 설정 저장
pub fn save_settings(state: &DbState, input: SettingsInput) -> CommandResult<SettingsView> {
    let db = lock_db(state)?;

    let sanitized = sanitize_settings(&*db, &input).map_err(CommandError::from)?;
    settings::store(&*db, &sanitized).map_err(|e| CommandError::from(AltTextError::from(e)))?;

    let has_api_key = ApiKeyManager::has_key(&*db);
    tracing::info!(
        has_api_key,
        auto_generate = sanitized.auto_generate,
        "settings saved"
    );

    Ok(SettingsView::new(&sanitized, has_api_key))
}

/// 설정 조회
pub fn load_settings(state: &DbState) -> CommandResult<SettingsView> {
    let db = lock_db(state)?;
    let current = settings::load(&*db).map_err(|e| CommandError::from(AltTextError::from(e)))?;
    Ok(SettingsView::new(&current, ApiKeyManager::has_key(&*db)))
}

/// 사용 가능한 API 키가 저장되어 있는지 (복호화 가능 여부까지 확인)
pub fn api_key_status(state: &DbState) -> CommandResult<bool> {
    let db = lock_db(state)?;
    Ok(ApiKeyManager::has_key(&*db))
}

/// 언인스톨: 설정 문서와 암호화 키 삭제
pub fn uninstall(state: &DbState) -> CommandResult<()> {
    let db = lock_db(state)?;
    ApiKeyManager::clear(&*db).map_err(CommandError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn state() -> DbState {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        DbState::new(db)
    }

    #[test]
    fn test_save_settings_sanitizes_and_encrypts() {
        let state = state();
        let view = save_settings(
            &state,
            SettingsInput {
                api_key: Some(" sk-abc ".to_string()),
                prefix: Some("  <em>Photo:</em> ".to_string()),
                suffix: Some("| Example\nShop".to_string()),
                auto_generate: Some(true),
                update_title: Some(true),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(view.has_api_key);
        assert_eq!(view.prefix, "Photo:");
        assert_eq!(view.suffix, "| Example Shop");
        assert!(view.auto_generate);
        assert!(view.update_title);
        assert!(!view.update_caption);

        let db = state.0.lock().unwrap();
        assert_eq!(ApiKeyManager::load(&*db).as_deref(), Some("sk-abc"));
    }

    #[test]
    fn test_resave_without_key_keeps_key() {
        let state = state();
        save_settings(
            &state,
            SettingsInput {
                api_key: Some("sk-abc".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        let view = save_settings(
            &state,
            SettingsInput {
                api_key: Some(String::new()),
                prefix: Some("New".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(view.has_api_key);
        assert_eq!(view.prefix, "New");
        assert_eq!(load_settings(&state).unwrap().prefix, "New");
    }

    #[test]
    fn test_uninstall_clears_settings() {
        let state = state();
        save_settings(
            &state,
            SettingsInput {
                api_key: Some("sk-abc".to_string()),
                prefix: Some("Pre".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(api_key_status(&state).unwrap());
        uninstall(&state).unwrap();
        assert!(!api_key_status(&state).unwrap());
        let view = load_settings(&state).unwrap();
        assert!(!view.has_api_key);
        assert_eq!(view.prefix, "");
    }
}
