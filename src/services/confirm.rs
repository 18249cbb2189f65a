// src/services/confirm.rs
//
// Payment confirmation per work month: unconfirmed → confirmed, terminal.
// Confirming freezes the month — the ingestor refuses further uploads for
// it (see ingest.rs).

use crate::{
    errors::{AppError, AppResult},
    models::{PaymentConfirmation, PaymentStatus},
};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

/// Confirm payment for a work month ("YYYY-MM").
///
/// Fails when the month has no salary records (nothing to confirm) and when
/// it is already confirmed — the second confirm must surface as a typed
/// conflict, never silently overwrite the first confirmer.
pub async fn confirm(
    pool: &SqlitePool,
    work_month: &str,
    confirmed_by: &str,
) -> AppResult<PaymentStatus> {
    let record_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM employee_salary_records WHERE work_month = ?",
    )
    .bind(work_month)
    .fetch_one(pool)
    .await?;

    if record_count == 0 {
        return Err(AppError::NothingToConfirm(work_month.to_string()));
    }

    let existing = sqlx::query_as::<_, PaymentConfirmation>(
        "SELECT * FROM payment_confirmations WHERE work_month = ?",
    )
    .bind(work_month)
    .fetch_optional(pool)
    .await?;

    if existing.is_some_and(|c| c.is_confirmed) {
        return Err(AppError::AlreadyConfirmed(work_month.to_string()));
    }

    let confirmed_at = Utc::now();
    sqlx::query(
        "INSERT OR REPLACE INTO payment_confirmations
         (work_month, is_confirmed, confirmed_by, confirmed_at)
         VALUES (?, 1, ?, ?)",
    )
    .bind(work_month)
    .bind(confirmed_by)
    .bind(confirmed_at)
    .execute(pool)
    .await?;

    info!("Payment for {work_month} confirmed by {confirmed_by} ({record_count} records)");

    Ok(PaymentStatus {
        work_month: work_month.to_string(),
        is_confirmed: true,
        confirmed_by: Some(confirmed_by.to_string()),
        confirmed_at: Some(confirmed_at),
    })
}

/// Pure read of a month's confirmation state.
pub async fn status(pool: &SqlitePool, work_month: &str) -> AppResult<PaymentStatus> {
    let confirmation = sqlx::query_as::<_, PaymentConfirmation>(
        "SELECT * FROM payment_confirmations WHERE work_month = ?",
    )
    .bind(work_month)
    .fetch_optional(pool)
    .await?;

    Ok(match confirmation {
        Some(c) if c.is_confirmed => PaymentStatus {
            work_month: c.work_month,
            is_confirmed: true,
            confirmed_by: c.confirmed_by,
            confirmed_at: c.confirmed_at,
        },
        _ => PaymentStatus {
            work_month: work_month.to_string(),
            is_confirmed: false,
            confirmed_by: None,
            confirmed_at: None,
        },
    })
}
