//! Analyze Commands
//!
//! 단일 이미지 alt text 생성/저장. 호출 정책(JPEG/PNG 전용), API 키 복호화,
//! prefix/suffix 적용, 메타데이터 저장을 담당합니다.

use crate::commands::{lock_db, AnalyzerState};
use crate::db::DbState;
use crate::error::{AltTextError, CommandError, CommandResult};
use crate::models::{AltTextSettings, Attachment, AttachmentFields, SavedAltText};
use crate::secrets::ApiKeyManager;
use crate::settings::{self, sanitize_text_field};
use crate::store::MetadataStore;

/// 분석 허용 확장자
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// URL 경로의 확장자 (소문자)
fn file_extension(image_url: &str) -> Option<String> {
    let path = url::Url::parse(image_url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| image_url.split(['?', '#']).next().unwrap_or_default().to_string());

    let file_name = path.rsplit('/').next()?;
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// JPEG/PNG 확장자만 허용
pub fn check_file_type(image_url: &str) -> Result<(), AltTextError> {
    match file_extension(image_url) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        Some(ext) => Err(AltTextError::UnsupportedFileType(ext.to_ascii_uppercase())),
        None => Err(AltTextError::UnsupportedFileType("UNKNOWN".to_string())),
    }
}

/// prefix/suffix 적용 (비어 있지 않을 때만 공백 하나로 연결)
pub fn compose_alt_text(settings: &AltTextSettings, text: &str) -> String {
    let mut alt_text = text.to_string();

    let prefix = settings.prefix.trim();
    if !prefix.is_empty() {
        alt_text = format!("{} {}", prefix, alt_text);
    }

    let suffix = settings.suffix.trim();
    if !suffix.is_empty() {
        alt_text = format!("{} {}", alt_text, suffix);
    }

    alt_text
}

/// alt text 저장 + 설정에 따라 제목/캡션/설명 동기화
fn persist_alt_text(
    store: &dyn MetadataStore,
    image_id: i64,
    alt_text: &str,
    settings: &AltTextSettings,
) -> Result<(), AltTextError> {
    store.write_alt_text(
        image_id,
        alt_text,
        &AttachmentFields::from_settings(settings, alt_text),
    )?;
    Ok(())
}

/// 분석 준비물 (DB 락을 네트워크 호출 전에 해제하기 위해 분리)
struct Prepared {
    attachment: Attachment,
    settings: AltTextSettings,
    api_key: String,
}

fn prepare(state: &DbState, image_id: i64) -> CommandResult<Prepared> {
    let db = lock_db(state)?;

    let attachment = db
        .get_attachment(image_id)
        .map_err(|e| CommandError::from(AltTextError::from(e)))?
        .ok_or_else(|| CommandError::from(AltTextError::AttachmentNotFound(image_id)))?;

    check_file_type(&attachment.url).map_err(CommandError::from)?;

    let api_key = ApiKeyManager::load(&*db)
        .ok_or_else(|| CommandError::from(AltTextError::MissingApiKey))?;
    let settings = settings::load(&*db).map_err(|e| CommandError::from(AltTextError::from(e)))?;

    Ok(Prepared {
        attachment,
        settings,
        api_key,
    })
}

/// 이미지 분석 후 alt text 생성 및 저장
pub async fn analyze_image(
    state: &DbState,
    analyzer: &AnalyzerState,
    image_id: i64,
) -> CommandResult<SavedAltText> {
    let prepared = prepare(state, image_id)?;

    let client = analyzer.client(prepared.api_key);
    let text = client
        .analyze(&prepared.attachment.url)
        .await
        .map_err(|e| CommandError::from(AltTextError::from(e)))?;

    let alt_text = compose_alt_text(&prepared.settings, &text);

    {
        let db = lock_db(state)?;
        persist_alt_text(&*db, image_id, &alt_text, &prepared.settings)
            .map_err(CommandError::from)?;
    }

    tracing::info!(
        image_id,
        alt_chars = alt_text.chars().count(),
        "alt text generated and saved"
    );

    Ok(SavedAltText {
        image_id,
        alt_text,
        message: "Alt text generated and saved successfully".to_string(),
    })
}

/// 업로드된 첨부 이미지 등록 (같은 ID면 덮어씀)
pub fn register_attachment(state: &DbState, attachment: &Attachment) -> CommandResult<()> {
    let db = lock_db(state)?;
    db.upsert_attachment(attachment)
        .map_err(|e| CommandError::from(AltTextError::from(e)))?;
    tracing::debug!(image_id = attachment.id, "attachment registered");
    Ok(())
}

/// 업로드 시 자동 생성 설정이 켜져 있는지
///
/// 분석기 구성(환경 설정 검증 포함)은 이 값이 참일 때만 필요합니다.
pub fn auto_generate_enabled(state: &DbState) -> CommandResult<bool> {
    let db = lock_db(state)?;
    let current =
        settings::load(&*db).map_err(|e| CommandError::from(AltTextError::from(e)))?;
    Ok(current.auto_generate)
}

/// 새 이미지 업로드 시 자동 생성 훅
///
/// 자동 생성이 꺼져 있거나, 이미지가 아니거나, 지원하지 않는 형식이거나,
/// API 키가 없으면 아무 것도 하지 않고 `None`을 반환합니다.
pub async fn handle_new_image(
    state: &DbState,
    analyzer: &AnalyzerState,
    image_id: i64,
) -> CommandResult<Option<SavedAltText>> {
    {
        let db = lock_db(state)?;

        let current =
            settings::load(&*db).map_err(|e| CommandError::from(AltTextError::from(e)))?;
        if !current.auto_generate {
            tracing::debug!(image_id, "auto-generation is disabled");
            return Ok(None);
        }

        let attachment = db
            .get_attachment(image_id)
            .map_err(|e| CommandError::from(AltTextError::from(e)))?
            .ok_or_else(|| CommandError::from(AltTextError::AttachmentNotFound(image_id)))?;

        if !attachment.is_image() {
            tracing::debug!(image_id, "not an image attachment");
            return Ok(None);
        }

        if let Err(e) = check_file_type(&attachment.url) {
            tracing::debug!(image_id, error = %e, "skipping unsupported file type");
            return Ok(None);
        }

        if !ApiKeyManager::has_key(&*db) {
            tracing::warn!(image_id, "no API key configured, skipping auto-generation");
            return Ok(None);
        }
    }

    analyze_image(state, analyzer, image_id).await.map(Some)
}

/// 수동 편집한 alt text 저장
pub fn save_alt_text(
    state: &DbState,
    image_id: i64,
    alt_text: &str,
) -> CommandResult<SavedAltText> {
    let db = lock_db(state)?;

    if db
        .get_attachment(image_id)
        .map_err(|e| CommandError::from(AltTextError::from(e)))?
        .is_none()
    {
        return Err(AltTextError::AttachmentNotFound(image_id).into());
    }

    let alt_text = sanitize_text_field(alt_text);
    let current =
        settings::load(&*db).map_err(|e| CommandError::from(AltTextError::from(e)))?;
    persist_alt_text(&*db, image_id, &alt_text, &current).map_err(CommandError::from)?;

    tracing::info!(image_id, "alt text saved manually");

    Ok(SavedAltText {
        image_id,
        alt_text,
        message: "Alt text saved successfully".to_string(),
    })
}
