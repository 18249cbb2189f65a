// src/handlers/batches.rs

use crate::{
    errors::AppResult,
    models::{BatchListQuery, DeletionReport, UploadBatchSummary},
    services::batch,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};

/// List upload batches with counts derived from their detail rows.
#[utoipa::path(
    get,
    path = "/api/v1/salary/uploads",
    params(
        ("month" = Option<i64>, Query, description = "Filter by work month (1-12)"),
        ("year" = Option<i64>, Query, description = "Filter by work year"),
    ),
    responses((status = 200, description = "Upload batches", body = Vec<UploadBatchSummary>)),
    tag = "Batches"
)]
pub async fn list_batches(
    State(state): State<AppState>,
    Query(params): Query<BatchListQuery>,
) -> AppResult<Json<Vec<UploadBatchSummary>>> {
    let mut sql = String::from(
        "SELECT s.id, s.original_name, s.month, s.year, s.batch_id, s.uploaded_by,
                s.status, s.employee_linked, s.rate_linked, s.created_at,
                (SELECT COUNT(*) FROM employee_salary_records r
                   WHERE r.upload_batch_id = s.batch_id) AS total_records,
                (SELECT COUNT(DISTINCT r.employee_id) FROM employee_salary_records r
                   WHERE r.upload_batch_id = s.batch_id) AS total_employees
         FROM salary_uploads s
         WHERE 1=1",
    );
    if params.month.is_some() {
        sql.push_str(" AND s.month = ?");
    }
    if params.year.is_some() {
        sql.push_str(" AND s.year = ?");
    }
    sql.push_str(" ORDER BY s.created_at DESC");

    let mut query = sqlx::query_as::<_, UploadBatchSummary>(&sql);
    if let Some(month) = params.month {
        query = query.bind(month);
    }
    if let Some(year) = params.year {
        query = query.bind(year);
    }
    let batches = query.fetch_all(&state.db).await?;
    Ok(Json(batches))
}

/// Delete an upload batch and everything derived from it: detail rows, the
/// unmatched ledger entries, the affected month's summaries, and the stored
/// artifact (best-effort).
#[utoipa::path(
    delete,
    path = "/api/v1/salary/uploads/{upload_id}",
    params(("upload_id" = i64, Path, description = "Upload batch ID")),
    responses(
        (status = 200, description = "Deletion report", body = DeletionReport),
        (status = 404, description = "Upload not found"),
    ),
    tag = "Batches"
)]
pub async fn delete_batch(
    State(state): State<AppState>,
    Path(upload_id): Path<i64>,
) -> AppResult<Json<DeletionReport>> {
    let report = batch::delete_batch(&state.db, upload_id, &state.config.upload_dir).await?;
    Ok(Json(report))
}
