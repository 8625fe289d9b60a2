//! Bulk Commands
//!
//! 여러 이미지를 한 번에 하나씩 순서대로 분석합니다. 동시성 없음.
//! 한 항목의 실패가 나머지 처리를 멈추지 않습니다.

use serde::Serialize;

use crate::commands::analyze::analyze_image;
use crate::commands::{lock_db, AnalyzerState};
use crate::db::DbState;
use crate::error::{AltTextError, CommandError, CommandResult};

/// 항목별 처리 결과
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkItemResult {
    pub image_id: i64,
    pub success: bool,
    pub alt_text: Option<String>,
    pub error: Option<CommandError>,
}

/// 전체 처리 결과
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkReport {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub items: Vec<BulkItemResult>,
}

/// 순차 일괄 분석
///
/// `image_ids`가 비어 있으면 alt text가 없는 모든 이미지를 대상으로 합니다.
pub async fn bulk_analyze(
    state: &DbState,
    analyzer: &AnalyzerState,
    image_ids: Vec<i64>,
) -> CommandResult<BulkReport> {
    let targets = if image_ids.is_empty() {
        let db = lock_db(state)?;
        db.list_missing_alt_ids()
            .map_err(|e| CommandError::from(AltTextError::from(e)))?
    } else {
        image_ids
    };

    tracing::info!(total = targets.len(), "bulk analysis started");

    let mut items = Vec::with_capacity(targets.len());
    for image_id in targets {
        let item = match analyze_image(state, analyzer, image_id).await {
            Ok(saved) => BulkItemResult {
                image_id,
                success: true,
                alt_text: Some(saved.alt_text),
                error: None,
            },
            Err(e) => {
                tracing::warn!(image_id, code = %e.code, "bulk item failed");
                BulkItemResult {
                    image_id,
                    success: false,
                    alt_text: None,
                    error: Some(e),
                }
            }
        };
        items.push(item);
    }

    let succeeded = items.iter().filter(|i| i.success).count();
    let report = BulkReport {
        processed: items.len(),
        succeeded,
        failed: items.len() - succeeded,
        items,
    };

    tracing::info!(
        processed = report.processed,
        succeeded = report.succeeded,
        failed = report.failed,
        "bulk analysis finished"
    );

    Ok(report)
}
