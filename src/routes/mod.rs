// src/routes/mod.rs

use crate::{
    handlers::{
        batches::{delete_batch, list_batches},
        confirmation::{confirm_payment, payment_status},
        employee::{create_employee, get_employee, list_employees},
        rates::{delete_rate, get_rate, list_rates, save_rate},
        salary::{employee_tiers, list_unmatched, monthly_summary, upload_salary},
    },
    state::AppState,
};
use axum::{
    Router,
    routing::{get, post},
};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // ─── Salary ───────────────────────────────────────────
        .route("/salary/upload", post(upload_salary))
        .route("/salary/monthly", get(monthly_summary))
        .route("/salary/employees/{employee_id}/tiers", get(employee_tiers))
        .route("/salary/unmatched", get(list_unmatched))
        // ─── Batches ──────────────────────────────────────────
        .route("/salary/uploads", get(list_batches))
        .route("/salary/uploads/{upload_id}", axum::routing::delete(delete_batch))
        // ─── Confirmation ─────────────────────────────────────
        .route("/salary/confirm-payment", post(confirm_payment))
        .route("/salary/payment-status/{work_month}", get(payment_status))
        // ─── Rates ────────────────────────────────────────────
        .route("/rates", post(save_rate).get(list_rates))
        .route("/rates/{rate_id}", get(get_rate).delete(delete_rate))
        // ─── Employees ────────────────────────────────────────
        .route("/employees", post(create_employee).get(list_employees))
        .route("/employees/{employee_id}", get(get_employee))
}
