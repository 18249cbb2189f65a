// src/handlers/rates.rs

use crate::{
    errors::{AppError, AppResult},
    models::{AllowanceTier, RateCard, RateFilter, SaveRateRequest},
    services::rates::ALL_BRANCHES,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;

fn validate(body: &SaveRateRequest) -> AppResult<()> {
    for (field, value) in [
        ("position", &body.position),
        ("zone", &body.zone),
        ("branch_code", &body.branch_code),
        ("salary_type", &body.salary_type),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{field} must not be empty")));
        }
    }
    if body.tier_rates.len() != 10 {
        return Err(AppError::Validation(format!(
            "Expected 10 tier rates, got {}",
            body.tier_rates.len()
        )));
    }
    if let Some(tiers) = body.allowance_tiers.as_deref() {
        if !tiers.trim().is_empty() {
            serde_json::from_str::<Vec<AllowanceTier>>(tiers).map_err(|e| {
                AppError::Validation(format!("allowance_tiers is not a valid schedule: {e}"))
            })?;
        }
    }
    Ok(())
}

/// Create a rate card, or update one when `id` is present.
#[utoipa::path(
    post,
    path = "/api/v1/rates",
    request_body = SaveRateRequest,
    responses(
        (status = 200, description = "Rate card saved", body = RateCard),
        (status = 400, description = "Invalid rate card"),
        (status = 404, description = "Rate id not found (update)"),
    ),
    tag = "Rates"
)]
pub async fn save_rate(
    State(state): State<AppState>,
    Json(body): Json<SaveRateRequest>,
) -> AppResult<Json<RateCard>> {
    validate(&body)?;

    let rate_id = match body.id {
        Some(id) => {
            let mut query = sqlx::query(
                "UPDATE piece_rates SET
                     position = ?, zone = ?, branch_code = ?, salary_type = ?,
                     base_salary = ?, piece_rate_bonus = ?, allowance = ?, allowance_tiers = ?,
                     tier_rate_1 = ?, tier_rate_2 = ?, tier_rate_3 = ?, tier_rate_4 = ?,
                     tier_rate_5 = ?, tier_rate_6 = ?, tier_rate_7 = ?, tier_rate_8 = ?,
                     tier_rate_9 = ?, tier_rate_10 = ?
                 WHERE id = ?",
            )
            .bind(&body.position)
            .bind(&body.zone)
            .bind(&body.branch_code)
            .bind(&body.salary_type)
            .bind(body.base_salary)
            .bind(body.piece_rate_bonus)
            .bind(body.allowance)
            .bind(&body.allowance_tiers);
            for rate in &body.tier_rates {
                query = query.bind(rate);
            }
            let result = query.bind(id).execute(&state.db).await?;
            if result.rows_affected() == 0 {
                return Err(AppError::NotFound(format!("Rate {id} not found")));
            }
            id
        }
        None => {
            let mut query = sqlx::query(
                "INSERT INTO piece_rates
                 (position, zone, branch_code, salary_type, base_salary, piece_rate_bonus,
                  allowance, allowance_tiers,
                  tier_rate_1, tier_rate_2, tier_rate_3, tier_rate_4, tier_rate_5,
                  tier_rate_6, tier_rate_7, tier_rate_8, tier_rate_9, tier_rate_10, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&body.position)
            .bind(&body.zone)
            .bind(&body.branch_code)
            .bind(&body.salary_type)
            .bind(body.base_salary)
            .bind(body.piece_rate_bonus)
            .bind(body.allowance)
            .bind(&body.allowance_tiers);
            for rate in &body.tier_rates {
                query = query.bind(rate);
            }
            query
                .bind(Utc::now())
                .execute(&state.db)
                .await?
                .last_insert_rowid()
        }
    };

    let rate = sqlx::query_as::<_, RateCard>("SELECT * FROM piece_rates WHERE id = ?")
        .bind(rate_id)
        .fetch_one(&state.db)
        .await?;
    Ok(Json(rate))
}

/// Get one rate card by id
#[utoipa::path(
    get,
    path = "/api/v1/rates/{rate_id}",
    params(("rate_id" = i64, Path, description = "Rate card ID")),
    responses(
        (status = 200, description = "Rate card", body = RateCard),
        (status = 404, description = "Rate not found"),
    ),
    tag = "Rates"
)]
pub async fn get_rate(
    State(state): State<AppState>,
    Path(rate_id): Path<i64>,
) -> AppResult<Json<RateCard>> {
    let rate = sqlx::query_as::<_, RateCard>("SELECT * FROM piece_rates WHERE id = ?")
        .bind(rate_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Rate {rate_id} not found")))?;
    Ok(Json(rate))
}

/// Delete a rate card
#[utoipa::path(
    delete,
    path = "/api/v1/rates/{rate_id}",
    params(("rate_id" = i64, Path, description = "Rate card ID")),
    responses(
        (status = 204, description = "Rate deleted"),
        (status = 404, description = "Rate not found"),
    ),
    tag = "Rates"
)]
pub async fn delete_rate(
    State(state): State<AppState>,
    Path(rate_id): Path<i64>,
) -> AppResult<StatusCode> {
    let result = sqlx::query("DELETE FROM piece_rates WHERE id = ?")
        .bind(rate_id)
        .execute(&state.db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Rate {rate_id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// List rate cards, optionally narrowed to a zone and branch. All-branches
/// rows are always included so the caller sees every rate that could apply.
#[utoipa::path(
    get,
    path = "/api/v1/rates",
    params(
        ("zone" = Option<String>, Query, description = "Filter by zone"),
        ("branch" = Option<String>, Query, description = "Filter by branch code"),
    ),
    responses((status = 200, description = "Matching rate cards", body = Vec<RateCard>)),
    tag = "Rates"
)]
pub async fn list_rates(
    State(state): State<AppState>,
    Query(params): Query<RateFilter>,
) -> AppResult<Json<Vec<RateCard>>> {
    let mut sql = String::from("SELECT * FROM piece_rates WHERE 1=1");
    if params.zone.is_some() {
        sql.push_str(" AND zone = ?");
    }
    if params.branch.is_some() {
        sql.push_str(" AND (branch_code = ? OR branch_code = ?)");
    }
    sql.push_str(" ORDER BY position, zone, branch_code");

    let mut query = sqlx::query_as::<_, RateCard>(&sql);
    if let Some(zone) = &params.zone {
        query = query.bind(zone);
    }
    if let Some(branch) = &params.branch {
        query = query.bind(branch).bind(ALL_BRANCHES);
    }
    let rates = query.fetch_all(&state.db).await?;
    Ok(Json(rates))
}
