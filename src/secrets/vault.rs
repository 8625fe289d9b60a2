//! API 키 암호화/복호화
//!
//! Blob 포맷:
//! - iv: 16 bytes (호출마다 새로 생성, 재사용 금지)
//! - ciphertext: AES-256-GCM 결과 (= 암호문 + 태그)
//! - 전체를 base64(standard)로 인코딩하여 설정 저장소에 보관
//!
//! 시크릿은 UTF-8 바이트 그대로 암호화합니다 (내부 base64 레이어 없음).
//! 암호화 키는 설치당 1개이며 모든 시크릿에 공유됩니다.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{AesGcm, Nonce};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::Rng;
use zeroize::Zeroize;

use crate::store::SettingsStore;

/// 암호화 키 옵션 이름
pub const ENCRYPTION_KEY_OPTION: &str = "smart_alt_text_encryption_key";

/// 암호화 키 길이 (256-bit)
pub const KEY_LEN: usize = 32;

/// IV 길이 (16 bytes)
pub const IV_LEN: usize = 16;

/// 16-byte nonce를 쓰는 AES-256-GCM
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Vault 오류
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Decryption failed: {0}")]
    Decryption(String),
}

/// Zeroize가 적용된 암호화 키 래퍼
pub struct EncryptionKey {
    bytes: [u8; KEY_LEN],
}

impl EncryptionKey {
    /// CSPRNG로 새 키 생성
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill(&mut bytes);
        Self { bytes }
    }

    /// 저장된 base64 문자열에서 키 복원
    pub fn from_base64(encoded: &str) -> Option<Self> {
        let mut decoded = BASE64.decode(encoded.trim()).ok()?;
        if decoded.len() != KEY_LEN {
            decoded.zeroize();
            return None;
        }

        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();
        Some(Self { bytes })
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.bytes)
    }
}

impl Drop for EncryptionKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey(**redacted**)")
    }
}

/// 단일 시크릿용 Credential Vault
#[derive(Debug)]
pub struct CredentialVault {
    key: EncryptionKey,
}

impl CredentialVault {
    pub fn new(key: EncryptionKey) -> Self {
        Self { key }
    }

    /// 저장된 키를 로드하고, 없으면 생성하여 저장 (암호화 경로 전용)
    pub fn load_or_create(store: &dyn SettingsStore) -> Result<Self, VaultError> {
        let stored = store
            .get_option(ENCRYPTION_KEY_OPTION)
            .map_err(|e| VaultError::Encryption(format!("key store unavailable: {}", e)))?;

        if let Some(encoded) = stored.filter(|s| !s.trim().is_empty()) {
            let key = EncryptionKey::from_base64(&encoded)
                .ok_or_else(|| VaultError::Encryption("stored key is invalid".to_string()))?;
            return Ok(Self::new(key));
        }

        let key = EncryptionKey::generate();
        store
            .set_option(ENCRYPTION_KEY_OPTION, &key.to_base64())
            .map_err(|e| VaultError::Encryption(format!("failed to persist key: {}", e)))?;
        tracing::debug!("generated new encryption key");

        Ok(Self::new(key))
    }

    /// 저장된 키 로드 (복호화 경로 전용, 키를 새로 만들지 않음)
    pub fn load(store: &dyn SettingsStore) -> Result<Self, VaultError> {
        let encoded = store
            .get_option(ENCRYPTION_KEY_OPTION)
            .map_err(|e| VaultError::Decryption(format!("key store unavailable: {}", e)))?
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| VaultError::Decryption("encryption key is missing".to_string()))?;

        let key = EncryptionKey::from_base64(&encoded)
            .ok_or_else(|| VaultError::Decryption("stored key is invalid".to_string()))?;

        Ok(Self::new(key))
    }

    fn cipher(&self) -> Result<Aes256Gcm16, String> {
        Aes256Gcm16::new_from_slice(&self.key.bytes).map_err(|e| e.to_string())
    }

    /// 시크릿 암호화 → base64(iv || ciphertext)
    pub fn encrypt(&self, secret: &str) -> Result<String, VaultError> {
        if secret.is_empty() {
            return Err(VaultError::Encryption("secret must not be empty".to_string()));
        }

        let cipher = self.cipher().map_err(VaultError::Encryption)?;

        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill(&mut iv);

        let ciphertext = cipher
            .encrypt(Nonce::<U16>::from_slice(&iv), secret.as_bytes())
            .map_err(|e| VaultError::Encryption(e.to_string()))?;

        let mut combined = Vec::with_capacity(IV_LEN + ciphertext.len());
        combined.extend_from_slice(&iv);
        combined.extend_from_slice(&ciphertext);

        Ok(BASE64.encode(combined))
    }

    /// base64(iv || ciphertext) 복호화 → 시크릿
    pub fn decrypt(&self, blob: &str) -> Result<String, VaultError> {
        let decoded = BASE64
            .decode(blob.trim())
            .map_err(|e| VaultError::Decryption(format!("invalid encoding: {}", e)))?;

        if decoded.len() < IV_LEN {
            return Err(VaultError::Decryption(format!(
                "blob too short ({} bytes)",
                decoded.len()
            )));
        }

        let (iv, ciphertext) = decoded.split_at(IV_LEN);
        let cipher = self.cipher().map_err(VaultError::Decryption)?;

        let mut plaintext = cipher
            .decrypt(Nonce::<U16>::from_slice(iv), ciphertext)
            .map_err(|e| VaultError::Decryption(e.to_string()))?;

        let secret = String::from_utf8(plaintext.clone())
            .map_err(|_| VaultError::Decryption("plaintext is not valid UTF-8".to_string()));

        // 평문 메모리 지우기
        plaintext.zeroize();

        secret
    }
}
