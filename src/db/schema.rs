//! Database Schema
//!
//! SQLite 테이블 스키마 정의

/// 데이터베이스 스키마 생성 SQL
pub const CREATE_SCHEMA: &str = r#"
-- 설정 옵션 테이블 (key-value)
CREATE TABLE IF NOT EXISTS options (
    name TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);

-- 첨부 이미지 테이블
CREATE TABLE IF NOT EXISTS attachments (
    id INTEGER PRIMARY KEY,
    url TEXT NOT NULL,
    mime_type TEXT,
    title TEXT NOT NULL DEFAULT '',
    caption TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    alt_text TEXT,
    updated_at INTEGER NOT NULL
);

-- alt text 누락 이미지 조회용 인덱스
CREATE INDEX IF NOT EXISTS idx_attachments_alt ON attachments(alt_text);
"#;
