// src/services/batch.rs
//
// Upload batch lifecycle. Deletion is all-or-nothing for the database side:
// detail rows, unmatched rows, the affected monthly summaries, and the
// batch record itself go in one transaction. The stored artifact is removed
// afterwards best-effort and reported separately.

use crate::{
    errors::{AppError, AppResult},
    models::DeletionReport,
};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::{info, warn};

pub async fn delete_batch(
    pool: &SqlitePool,
    upload_id: i64,
    upload_dir: &str,
) -> AppResult<DeletionReport> {
    let upload: Option<(String, String, i64, i64)> = sqlx::query_as(
        "SELECT batch_id, filename, month, year FROM salary_uploads WHERE id = ?",
    )
    .bind(upload_id)
    .fetch_optional(pool)
    .await?;

    let Some((batch_id, filename, month, year)) = upload else {
        return Err(AppError::NotFound(format!("Upload {upload_id} not found")));
    };

    let mut tx = pool.begin().await?;

    // Touched employees must be collected before their detail rows go.
    let employee_ids: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT employee_id FROM employee_salary_records WHERE upload_batch_id = ?",
    )
    .bind(&batch_id)
    .fetch_all(&mut *tx)
    .await?;

    let deleted_records = sqlx::query(
        "DELETE FROM employee_salary_records WHERE upload_batch_id = ?",
    )
    .bind(&batch_id)
    .execute(&mut *tx)
    .await?
    .rows_affected() as i64;

    let deleted_unmatched = sqlx::query(
        "DELETE FROM unmatched_salary_records WHERE upload_batch_id = ?",
    )
    .bind(&batch_id)
    .execute(&mut *tx)
    .await?
    .rows_affected() as i64;

    // Summaries are keyed by (employee, month, year), not by batch; only the
    // batch's own month is cleared for the touched employees.
    let mut deleted_monthly = 0i64;
    for employee_id in &employee_ids {
        deleted_monthly += sqlx::query(
            "DELETE FROM monthly_salary_data WHERE employee_id = ? AND month = ? AND year = ?",
        )
        .bind(employee_id)
        .bind(month)
        .bind(year)
        .execute(&mut *tx)
        .await?
        .rows_affected() as i64;
    }

    sqlx::query("DELETE FROM salary_uploads WHERE id = ?")
        .bind(upload_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    let artifact = Path::new(upload_dir).join(&filename);
    let file_deleted = match std::fs::remove_file(&artifact) {
        Ok(()) => true,
        Err(e) => {
            warn!("Could not remove artifact {}: {e}", artifact.display());
            false
        }
    };

    info!(
        "Deleted batch {batch_id}: {deleted_records} records, {deleted_unmatched} unmatched, \
         {deleted_monthly} summaries, artifact removed: {file_deleted}"
    );

    Ok(DeletionReport {
        upload_id,
        batch_id,
        filename,
        deleted_records,
        deleted_unmatched,
        deleted_monthly_records: deleted_monthly,
        file_deleted,
    })
}
