//! API Key Manager - 설정 저장소 기반 API 키 수명주기
//!
//! - 설정 저장 시 암호화하여 저장 (빈 입력이면 기존 키 유지)
//! - 분석 호출마다 복호화하여 사용
//! - 복호화 실패는 "키 미설정"으로 취급 (호스트를 중단시키지 않음)
//! - 언인스톨 시 설정 문서와 암호화 키 모두 삭제

use crate::error::AltTextError;
use crate::models::AltTextSettings;
use crate::secrets::vault::{CredentialVault, ENCRYPTION_KEY_OPTION};
use crate::settings;
use crate::store::SettingsStore;

/// API 키 관리자
pub struct ApiKeyManager;

impl ApiKeyManager {
    /// 새 API 키를 암호화하여 설정에 반영
    ///
    /// 입력이 비어 있으면 기존 blob을 그대로 유지합니다.
    /// 설정 문서 자체를 저장하지는 않으므로 호출자가 `settings::store`를 호출해야 합니다.
    pub fn apply(
        store: &dyn SettingsStore,
        settings: &mut AltTextSettings,
        plaintext: Option<&str>,
    ) -> Result<bool, AltTextError> {
        let trimmed = plaintext.map(str::trim).unwrap_or_default();
        if trimmed.is_empty() {
            tracing::debug!(has_existing = settings.api_key.is_some(), "keeping existing api key");
            return Ok(false);
        }

        let vault = CredentialVault::load_or_create(store)?;
        settings.api_key = Some(vault.encrypt(trimmed)?);
        tracing::debug!("api key encrypted");

        Ok(true)
    }

    /// 새 API 키를 암호화하여 저장
    pub fn save(store: &dyn SettingsStore, plaintext: &str) -> Result<(), AltTextError> {
        let mut current = settings::load(store)?;
        if Self::apply(store, &mut current, Some(plaintext))? {
            settings::store(store, &current)?;
        }
        Ok(())
    }

    /// 복호화된 API 키 로드
    ///
    /// 키가 없거나 복호화에 실패하면 `None`을 반환합니다.
    pub fn load(store: &dyn SettingsStore) -> Option<String> {
        let blob = match settings::load(store) {
            Ok(settings) => settings.api_key?,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read settings, treating api key as missing");
                return None;
            }
        };

        if blob.trim().is_empty() {
            return None;
        }

        let decrypted = CredentialVault::load(store).and_then(|vault| vault.decrypt(&blob));
        match decrypted {
            Ok(key) if !key.is_empty() => Some(key),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "stored api key could not be decrypted");
                None
            }
        }
    }

    /// 사용 가능한 API 키 존재 여부
    pub fn has_key(store: &dyn SettingsStore) -> bool {
        Self::load(store).is_some()
    }

    /// 설정 문서와 암호화 키 삭제 (언인스톨)
    pub fn clear(store: &dyn SettingsStore) -> Result<(), AltTextError> {
        store.delete_option(settings::SETTINGS_OPTION)?;
        store.delete_option(ENCRYPTION_KEY_OPTION)?;
        tracing::info!("api key and settings removed");
        Ok(())
    }
}
