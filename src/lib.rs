//! Smart Alt Text - Backend Library
//!
//! Vision API로 이미지 alt text를 생성하는 Rust 백엔드 라이브러리입니다.
//! API 키 암호화 보관, 이미지 분석 요청/응답 처리, 호스트 저장소 연동을 담당합니다.

pub mod analyzer;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod secrets;
pub mod settings;
pub mod store;

pub use analyzer::{AnalysisClient, AnalysisError};
pub use config::VisionConfig;
pub use error::{AltTextError, CommandError, CommandResult};
pub use models::AnalysisResult;
pub use secrets::{ApiKeyManager, CredentialVault};

use std::path::{Path, PathBuf};

/// 로컬 개발용 환경 파일 이름
const LOCAL_ENV_FILE: &str = ".env.local";

/// `start`부터 상위 디렉터리로 올라가며 `.env.local` 탐색
fn find_local_env(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(LOCAL_ENV_FILE))
        .find(|candidate| candidate.is_file())
}

/// `.env.local` / `.env` 로드
///
/// 이미 설정된 환경 변수는 덮어쓰지 않으며, 파일이 없으면 아무 것도 하지 않습니다.
/// `.env.local` 파싱 실패만 에러로 돌려줍니다 (로깅 초기화 전에 호출되므로).
pub fn load_env() -> Result<(), dotenvy::Error> {
    let local = std::env::current_dir()
        .ok()
        .and_then(|cwd| find_local_env(&cwd));
    let parsed = match local {
        Some(path) => dotenvy::from_path(&path),
        None => Ok(()),
    };

    let _ = dotenvy::dotenv();
    parsed
}
