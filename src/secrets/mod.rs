//! API 키 보관 모듈
//!
//! 설치 시 로컬에서 생성한 대칭키 + 암호화된 blob 구조로 API 키를 보관합니다.
//!
//! - 암호화 키(32 bytes)는 최초 사용 시 1회 생성되어 설정 저장소에 base64로 저장
//! - API 키는 `base64(iv || ciphertext)` 형태로만 저장 (평문 저장 금지)
//! - 저장된 키가 노출되면 모든 blob이 노출됨 (시크릿별 키 분리 없음)

pub mod manager;
pub mod vault;

pub use manager::ApiKeyManager;
pub use vault::{CredentialVault, EncryptionKey, VaultError};
