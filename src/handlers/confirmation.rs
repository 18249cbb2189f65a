// src/handlers/confirmation.rs

use crate::{
    errors::{AppError, AppResult},
    models::{ConfirmPaymentRequest, PaymentStatus},
    services::confirm,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
};

/// Confirm payment for a work month, freezing it against re-uploads.
#[utoipa::path(
    post,
    path = "/api/v1/salary/confirm-payment",
    request_body = ConfirmPaymentRequest,
    responses(
        (status = 200, description = "Month confirmed", body = PaymentStatus),
        (status = 422, description = "Nothing to confirm, or already confirmed"),
    ),
    tag = "Confirmation"
)]
pub async fn confirm_payment(
    State(state): State<AppState>,
    Json(body): Json<ConfirmPaymentRequest>,
) -> AppResult<Json<PaymentStatus>> {
    if body.work_month.trim().is_empty() {
        return Err(AppError::Validation("work_month is required".to_string()));
    }
    let status = confirm::confirm(&state.db, &body.work_month, &body.confirmed_by).await?;
    Ok(Json(status))
}

/// Confirmation state for a work month.
#[utoipa::path(
    get,
    path = "/api/v1/salary/payment-status/{work_month}",
    params(("work_month" = String, Path, description = "Work month (YYYY-MM)")),
    responses((status = 200, description = "Confirmation state", body = PaymentStatus)),
    tag = "Confirmation"
)]
pub async fn payment_status(
    State(state): State<AppState>,
    Path(work_month): Path<String>,
) -> AppResult<Json<PaymentStatus>> {
    let status = confirm::status(&state.db, &work_month).await?;
    Ok(Json(status))
}
