//! Stats Commands

use crate::commands::lock_db;
use crate::db::DbState;
use crate::error::{AltTextError, CommandError, CommandResult};
use crate::models::CoverageStats;

/// alt text 적용 현황
pub fn coverage_stats(state: &DbState) -> CommandResult<CoverageStats> {
    let db = lock_db(state)?;
    db.coverage_stats()
        .map_err(|e| CommandError::from(AltTextError::from(e)))
}
