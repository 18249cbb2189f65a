// src/handlers/salary.rs

use crate::{
    errors::{AppError, AppResult},
    models::{
        EmployeeMonthlyView, MonthlyQuery, MonthlySummary, MonthlySummaryResponse, MonthlyTotals,
        TierDrilldown, TierView, UnmatchedLedger, UnmatchedQuery, UnmatchedRecord, UploadReport,
    },
    services::{calculator, rates, weight},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use sqlx::FromRow;
use tracing::warn;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadQuery {
    /// Fallback when no date in the file parses
    pub month: Option<u32>,
    /// Fallback when no date in the file parses
    pub year: Option<i32>,
    pub uploaded_by: Option<String>,
    pub filename: Option<String>,
}

/// Ingest a scan-export CSV. The body is the raw CSV text; month/year are
/// inferred from the file's timestamp column and fall back to the query
/// parameters (then to the current month).
#[utoipa::path(
    post,
    path = "/api/v1/salary/upload",
    request_body = String,
    params(
        ("month" = Option<u32>, Query, description = "Fallback work month (1-12)"),
        ("year" = Option<i32>, Query, description = "Fallback work year"),
        ("uploaded_by" = Option<String>, Query, description = "Operator name"),
        ("filename" = Option<String>, Query, description = "Original file name"),
    ),
    responses(
        (status = 201, description = "Batch processed", body = UploadReport),
        (status = 400, description = "Required columns missing"),
        (status = 422, description = "Work month already payment-confirmed"),
    ),
    tag = "Salary"
)]
pub async fn upload_salary(
    State(state): State<AppState>,
    Query(params): Query<UploadQuery>,
    body: String,
) -> AppResult<(StatusCode, Json<UploadReport>)> {
    if body.trim().is_empty() {
        return Err(AppError::BadRequest("Upload body is empty".to_string()));
    }
    if let Some(month) = params.month {
        if !(1..=12).contains(&month) {
            return Err(AppError::Validation(format!("Invalid month: {month}")));
        }
    }

    let now = Utc::now();
    let default_month = params.month.unwrap_or(now.month());
    let default_year = params.year.unwrap_or(now.year());
    let uploaded_by = params.uploaded_by.unwrap_or_else(|| "system".to_string());
    let filename = params
        .filename
        .unwrap_or_else(|| format!("salary-{}.csv", now.format("%Y%m%d-%H%M%S")));

    let report = crate::services::ingest::ingest_batch(
        &state.db,
        &body,
        &filename,
        default_month,
        default_year,
        &uploaded_by,
    )
    .await?;

    // Keep the raw artifact so the batch can be re-inspected; not fatal if
    // the directory is unavailable.
    let dir = std::path::Path::new(&state.config.upload_dir);
    if let Err(e) =
        std::fs::create_dir_all(dir).and_then(|_| std::fs::write(dir.join(&filename), &body))
    {
        warn!("Could not store upload artifact {filename}: {e}");
    }

    Ok((StatusCode::CREATED, Json(report)))
}

#[derive(Debug, FromRow)]
struct SummaryJoinRow {
    #[sqlx(flatten)]
    summary: MonthlySummary,
    emp_name: Option<String>,
    emp_rate_type: Option<String>,
}

/// Monthly salary summary: persisted aggregates joined with the employee
/// directory, totals recomputed through the unified calculator.
#[utoipa::path(
    get,
    path = "/api/v1/salary/monthly",
    params(
        ("month" = i64, Query, description = "Work month (1-12)"),
        ("year" = i64, Query, description = "Work year"),
        ("branch" = Option<String>, Query, description = "Filter by employee branch"),
        ("employee_id" = Option<String>, Query, description = "Substring filter on employee id"),
    ),
    responses((status = 200, description = "Per-employee monthly summary", body = MonthlySummaryResponse)),
    tag = "Salary"
)]
pub async fn monthly_summary(
    State(state): State<AppState>,
    Query(params): Query<MonthlyQuery>,
) -> AppResult<Json<MonthlySummaryResponse>> {
    let mut sql = String::from(
        "SELECT msd.*, e.name AS emp_name, e.rate_type AS emp_rate_type
         FROM monthly_salary_data msd
         LEFT JOIN employees e ON e.employee_id = msd.employee_id
         WHERE msd.month = ? AND msd.year = ?",
    );
    if params.branch.is_some() {
        sql.push_str(" AND e.branch_code = ?");
    }
    if params.employee_id.is_some() {
        sql.push_str(" AND msd.employee_id LIKE ?");
    }
    sql.push_str(" ORDER BY e.name");

    let mut query = sqlx::query_as::<_, SummaryJoinRow>(&sql)
        .bind(params.month)
        .bind(params.year);
    if let Some(branch) = &params.branch {
        query = query.bind(branch);
    }
    if let Some(employee_id) = &params.employee_id {
        query = query.bind(format!("%{employee_id}%"));
    }
    let rows = query.fetch_all(&state.db).await?;

    let mut conn = state.db.acquire().await?;
    let mut employees = Vec::with_capacity(rows.len());
    let mut with_rates = 0i64;
    let mut without_rates = 0i64;

    for row in rows {
        let s = &row.summary;
        let position = s.position.clone().unwrap_or_default();
        let zone = s.zone.clone().unwrap_or_default();
        let branch_code = s.branch_code.clone().unwrap_or_default();
        let salary_type = row
            .emp_rate_type
            .clone()
            .unwrap_or_else(|| "DEFAULT".to_string());

        let rate =
            rates::resolve_rate(&mut conn, &position, &salary_type, &zone, &branch_code).await?;
        if rate.is_some() {
            with_rates += 1;
        } else {
            without_rates += 1;
        }

        let breakdown = calculator::calculate(rate.as_ref(), &salary_type, s.package_count);
        let tier_rates = rate.map(|r| r.tier_rates()).unwrap_or_default();
        let tiers = tier_views(s, &tier_rates);

        employees.push(EmployeeMonthlyView {
            employee_id: s.employee_id.clone(),
            name: row.emp_name.unwrap_or_else(|| "unknown".to_string()),
            position,
            branch_code,
            zone,
            salary_type,
            base_salary: breakdown.base_salary,
            piece_rate_bonus: breakdown.piece_rate_bonus,
            allowance: breakdown.allowance,
            total_pieces: s.package_count,
            total_amount: breakdown.total_amount,
            tiers,
        });
    }

    let summary = MonthlyTotals {
        total_employees: employees.len() as i64,
        total_pieces: employees.iter().map(|e| e.total_pieces).sum(),
        total_salary: employees.iter().map(|e| e.total_amount).sum(),
        total_allowance: employees.iter().map(|e| e.allowance).sum(),
        employees_with_rates: with_rates,
        employees_without_rates: without_rates,
    };

    Ok(Json(MonthlySummaryResponse {
        month: params.month,
        year: params.year,
        employees,
        summary,
    }))
}

fn tier_views(summary: &MonthlySummary, tier_rates: &[f64; 10]) -> Vec<TierView> {
    summary
        .tier_pieces()
        .iter()
        .zip(weight::TIER_LABELS)
        .zip(tier_rates)
        .map(|((pieces, label), rate)| TierView {
            label: label.to_string(),
            pieces: *pieces,
            rate: *rate,
            amount: *pieces as f64 * rate,
        })
        .collect()
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DrilldownQuery {
    pub month: i64,
    pub year: i64,
}

/// Per-employee tier drill-down for one work month.
#[utoipa::path(
    get,
    path = "/api/v1/salary/employees/{employee_id}/tiers",
    params(
        ("employee_id" = String, Path, description = "Employee ID"),
        ("month" = i64, Query, description = "Work month (1-12)"),
        ("year" = i64, Query, description = "Work year"),
    ),
    responses(
        (status = 200, description = "Tier counts, rates and amounts", body = TierDrilldown),
        (status = 404, description = "No summary for this employee/month"),
    ),
    tag = "Salary"
)]
pub async fn employee_tiers(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
    Query(params): Query<DrilldownQuery>,
) -> AppResult<Json<TierDrilldown>> {
    let summary = sqlx::query_as::<_, MonthlySummary>(
        "SELECT * FROM monthly_salary_data WHERE employee_id = ? AND month = ? AND year = ?",
    )
    .bind(&employee_id)
    .bind(params.month)
    .bind(params.year)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| {
        AppError::NotFound(format!(
            "No summary for employee {employee_id} in {:04}-{:02}",
            params.year, params.month
        ))
    })?;

    let name: Option<String> =
        sqlx::query_scalar("SELECT name FROM employees WHERE employee_id = ?")
            .bind(&employee_id)
            .fetch_optional(&state.db)
            .await?;

    let position = summary.position.clone().unwrap_or_default();
    let zone = summary.zone.clone().unwrap_or_default();
    let branch_code = summary.branch_code.clone().unwrap_or_default();
    let salary_type = summary
        .employment_type
        .clone()
        .unwrap_or_else(|| "DEFAULT".to_string());

    let mut conn = state.db.acquire().await?;
    let rate =
        rates::resolve_rate(&mut conn, &position, &salary_type, &zone, &branch_code).await?;
    let breakdown = calculator::calculate(rate.as_ref(), &salary_type, summary.package_count);
    let tier_rates = rate.map(|r| r.tier_rates()).unwrap_or_default();

    Ok(Json(TierDrilldown {
        employee_id,
        name: name.unwrap_or_else(|| "unknown".to_string()),
        month: params.month,
        year: params.year,
        total_pieces: summary.package_count,
        tiers: tier_views(&summary, &tier_rates),
        base_salary: breakdown.base_salary,
        piece_rate_bonus: breakdown.piece_rate_bonus,
        allowance: breakdown.allowance,
        total_salary: breakdown.total_amount,
    }))
}

/// The unmatched ledger: scan rows that could not be attributed to a known
/// employee, with their tier subtotal.
#[utoipa::path(
    get,
    path = "/api/v1/salary/unmatched",
    params(
        ("batch_id" = Option<String>, Query, description = "Filter by upload batch"),
        ("work_month" = Option<String>, Query, description = "Filter by work month (YYYY-MM)"),
    ),
    responses((status = 200, description = "Unmatched records", body = UnmatchedLedger)),
    tag = "Salary"
)]
pub async fn list_unmatched(
    State(state): State<AppState>,
    Query(params): Query<UnmatchedQuery>,
) -> AppResult<Json<UnmatchedLedger>> {
    let mut sql = String::from(
        "SELECT u.* FROM unmatched_salary_records u
         JOIN salary_uploads s ON s.batch_id = u.upload_batch_id
         WHERE 1=1",
    );
    if params.batch_id.is_some() {
        sql.push_str(" AND u.upload_batch_id = ?");
    }
    if params.work_month.is_some() {
        sql.push_str(" AND printf('%04d-%02d', s.year, s.month) = ?");
    }
    sql.push_str(" ORDER BY u.id");

    let mut query = sqlx::query_as::<_, UnmatchedRecord>(&sql);
    if let Some(batch_id) = &params.batch_id {
        query = query.bind(batch_id);
    }
    if let Some(work_month) = &params.work_month {
        query = query.bind(work_month);
    }
    let records = query.fetch_all(&state.db).await?;

    let mut pieces_by_tier = vec![0i64; weight::TIER_COUNT];
    for record in &records {
        let idx = record.weight_tier_index as usize;
        if idx < pieces_by_tier.len() {
            pieces_by_tier[idx] += 1;
        }
    }

    Ok(Json(UnmatchedLedger {
        total_pieces: records.len() as i64,
        records,
        pieces_by_tier,
    }))
}
