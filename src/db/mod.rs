//! Database Module
//!
//! SQLite 기반 설정 저장소 + 첨부 이미지 메타데이터 저장소

mod schema;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension, Row};

use crate::models::{Attachment, AttachmentFields, CoverageStats};
use crate::store::{MetadataStore, SettingsStore, StoreError};

/// 데이터베이스 상태 (호스트가 관리하는 공유 핸들)
pub struct DbState(pub Mutex<Database>);

impl DbState {
    pub fn new(db: Database) -> Self {
        Self(Mutex::new(db))
    }
}

/// 데이터베이스 래퍼
pub struct Database {
    conn: Connection,
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn attachment_from_row(row: &Row<'_>) -> rusqlite::Result<Attachment> {
    Ok(Attachment {
        id: row.get(0)?,
        url: row.get(1)?,
        mime_type: row.get(2)?,
        title: row.get(3)?,
        caption: row.get(4)?,
        description: row.get(5)?,
        alt_text: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

const ATTACHMENT_COLUMNS: &str =
    "id, url, mime_type, title, caption, description, alt_text, updated_at";

impl Database {
    /// 새 데이터베이스 연결 생성
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// 메모리 DB (테스트 및 임시 호스트용)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// 데이터베이스 스키마 초기화
    pub fn initialize(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(schema::CREATE_SCHEMA)?;
        Ok(())
    }

    /// alt text가 비어 있는 이미지 ID 목록
    pub fn list_missing_alt_ids(&self) -> Result<Vec<i64>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM attachments
             WHERE (alt_text IS NULL OR TRIM(alt_text) = '')
               AND (mime_type IS NULL OR LOWER(mime_type) LIKE 'image/%')
             ORDER BY id",
        )?;
        let iter = stmt.query_map([], |row| row.get::<_, i64>(0))?;
        let mut ids = Vec::new();
        for id in iter {
            ids.push(id?);
        }
        Ok(ids)
    }

    /// alt text 적용 현황 집계
    pub fn coverage_stats(&self) -> Result<CoverageStats, StoreError> {
        let (total, with_alt): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(
                        CASE WHEN alt_text IS NOT NULL AND TRIM(alt_text) != '' THEN 1 ELSE 0 END
                    ), 0)
             FROM attachments
             WHERE mime_type IS NULL OR LOWER(mime_type) LIKE 'image/%'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(CoverageStats::from_counts(total as usize, with_alt as usize))
    }
}

impl SettingsStore for Database {
    fn get_option(&self, name: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row("SELECT value FROM options WHERE name = ?1", [name], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set_option(&self, name: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO options (name, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE
             SET value = excluded.value, updated_at = excluded.updated_at",
            (name, value, now_millis()),
        )?;
        Ok(())
    }

    fn delete_option(&self, name: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM options WHERE name = ?1", [name])?;
        Ok(())
    }
}

impl MetadataStore for Database {
    fn get_attachment(&self, id: i64) -> Result<Option<Attachment>, StoreError> {
        let sql = format!("SELECT {} FROM attachments WHERE id = ?1", ATTACHMENT_COLUMNS);
        let attachment = self
            .conn
            .query_row(&sql, [id], attachment_from_row)
            .optional()?;
        Ok(attachment)
    }

    fn list_attachments(&self) -> Result<Vec<Attachment>, StoreError> {
        let sql = format!("SELECT {} FROM attachments ORDER BY id", ATTACHMENT_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let iter = stmt.query_map([], attachment_from_row)?;
        let mut out = Vec::new();
        for attachment in iter {
            out.push(attachment?);
        }
        Ok(out)
    }

    fn upsert_attachment(&self, attachment: &Attachment) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO attachments
                 (id, url, mime_type, title, caption, description, alt_text, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            (
                attachment.id,
                &attachment.url,
                &attachment.mime_type,
                &attachment.title,
                &attachment.caption,
                &attachment.description,
                &attachment.alt_text,
                now_millis(),
            ),
        )?;
        Ok(())
    }

    fn write_alt_text(
        &self,
        id: i64,
        alt_text: &str,
        fields: &AttachmentFields,
    ) -> Result<(), StoreError> {
        // 단일 UPDATE 문이므로 alt text와 필드 복사는 함께 반영되거나 함께 실패함
        let updated = self.conn.execute(
            "UPDATE attachments
             SET alt_text = ?1,
                 title = COALESCE(?2, title),
                 caption = COALESCE(?3, caption),
                 description = COALESCE(?4, description),
                 updated_at = ?5
             WHERE id = ?6",
            (
                alt_text,
                &fields.title,
                &fields.caption,
                &fields.description,
                now_millis(),
                id,
            ),
        )?;
        if updated == 0 {
            return Err(StoreError::Backend(format!("attachment {} does not exist", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn memory_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        db
    }

    #[test]
    fn test_options_crud() {
        let db = memory_db();
        assert_eq!(db.get_option("k").unwrap(), None);

        db.set_option("k", "v1").unwrap();
        db.set_option("k", "v2").unwrap();
        assert_eq!(db.get_option("k").unwrap().as_deref(), Some("v2"));

        db.delete_option("k").unwrap();
        db.delete_option("k").unwrap();
        assert_eq!(db.get_option("k").unwrap(), None);
    }

    #[test]
    fn test_options_persist_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("alt-text.db");

        {
            let db = Database::new(&path).unwrap();
            db.initialize().unwrap();
            db.set_option("smart_alt_text_encryption_key", "abc").unwrap();
        }

        let db = Database::new(&path).unwrap();
        db.initialize().unwrap();
        assert_eq!(
            db.get_option("smart_alt_text_encryption_key").unwrap().as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn test_attachment_alt_text_and_fields() {
        let db = memory_db();
        let mut attachment = Attachment::new(7, "https://cdn.example.com/cat.png");
        attachment.mime_type = Some("image/png".to_string());
        attachment.title = "cat".to_string();
        db.upsert_attachment(&attachment).unwrap();

        db.write_alt_text(
            7,
            "A cat on a sofa",
            &AttachmentFields {
                caption: Some("A cat on a sofa".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        let loaded = db.get_attachment(7).unwrap().unwrap();
        assert_eq!(loaded.alt_text.as_deref(), Some("A cat on a sofa"));
        assert_eq!(loaded.caption, "A cat on a sofa");
        assert_eq!(loaded.title, "cat");

        assert!(db
            .write_alt_text(99, "missing", &AttachmentFields::default())
            .is_err());
        assert!(db.get_attachment(99).unwrap().is_none());
    }

    #[test]
    fn test_write_alt_text_is_all_or_nothing() {
        let db = memory_db();
        let mut attachment = Attachment::new(8, "https://cdn.example.com/owl.png");
        attachment.caption = "original caption".to_string();
        db.upsert_attachment(&attachment).unwrap();

        // 캡션 변경을 거부하는 트리거로 필드 복사 실패를 재현
        db.conn
            .execute_batch(
                "CREATE TRIGGER lock_caption BEFORE UPDATE OF caption ON attachments
                 WHEN NEW.caption IS NOT OLD.caption
                 BEGIN SELECT RAISE(ABORT, 'caption is locked'); END;",
            )
            .unwrap();

        let result = db.write_alt_text(
            8,
            "An owl on a branch",
            &AttachmentFields {
                caption: Some("An owl on a branch".to_string()),
                ..Default::default()
            },
        );
        assert!(result.is_err());

        let loaded = db.get_attachment(8).unwrap().unwrap();
        assert!(loaded.alt_text.is_none());
        assert_eq!(loaded.caption, "original caption");
    }

    #[test]
    fn test_coverage_and_missing_ids() {
        let db = memory_db();
        for (id, alt, mime) in [
            (1, Some("A dog"), Some("image/jpeg")),
            (2, None, Some("image/png")),
            (3, Some("  "), None),
            (4, None, Some("application/pdf")),
        ] {
            let mut a = Attachment::new(id, format!("https://cdn.example.com/{}.png", id));
            a.alt_text = alt.map(str::to_string);
            a.mime_type = mime.map(str::to_string);
            db.upsert_attachment(&a).unwrap();
        }

        let stats = db.coverage_stats().unwrap();
        assert_eq!(stats.total_images, 3);
        assert_eq!(stats.images_with_alt, 1);
        assert_eq!(stats.images_without_alt, 2);
        assert_eq!(stats.coverage_percentage, 33);

        assert_eq!(db.list_missing_alt_ids().unwrap(), vec![2, 3]);
        assert_eq!(db.list_attachments().unwrap().len(), 4);
    }
}
