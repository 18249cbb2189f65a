// src/openapi.rs

use crate::models::{
    AllowanceTier, BatchListQuery, ConfirmPaymentRequest, CreateEmployeeRequest, DeletionReport,
    Employee, EmployeeMonthlyView, MonthlyQuery, MonthlySummary, MonthlySummaryResponse,
    MonthlyTotals, PaymentStatus, RateCard, RateFilter, SalaryDetail, SaveRateRequest,
    TierDrilldown, TierView, UnmatchedLedger, UnmatchedQuery, UnmatchedRecord, UploadBatch,
    UploadBatchSummary, UploadReport,
};
use crate::services::calculator::SalaryBreakdown;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Courier Payroll API",
        version = "0.1.0",
        description = "Piece-rate payroll reconciliation engine for delivery-scan uploads. \
            Ingests per-package scan exports, buckets packages into weight tiers, matches \
            couriers to compensation rates, aggregates monthly salary summaries, and tracks \
            the unmatched-record ledger and per-month payment confirmation.",
        license(name = "MIT")
    ),
    paths(
        // Salary
        crate::handlers::salary::upload_salary,
        crate::handlers::salary::monthly_summary,
        crate::handlers::salary::employee_tiers,
        crate::handlers::salary::list_unmatched,
        // Batches
        crate::handlers::batches::list_batches,
        crate::handlers::batches::delete_batch,
        // Confirmation
        crate::handlers::confirmation::confirm_payment,
        crate::handlers::confirmation::payment_status,
        // Rates
        crate::handlers::rates::save_rate,
        crate::handlers::rates::get_rate,
        crate::handlers::rates::delete_rate,
        crate::handlers::rates::list_rates,
        // Employees
        crate::handlers::employee::create_employee,
        crate::handlers::employee::list_employees,
        crate::handlers::employee::get_employee,
    ),
    components(
        schemas(
            Employee, CreateEmployeeRequest,
            RateCard, AllowanceTier, SaveRateRequest, RateFilter,
            UploadBatch, UploadBatchSummary, UploadReport, SalaryDetail,
            UnmatchedRecord, UnmatchedLedger, UnmatchedQuery,
            MonthlySummary, MonthlyQuery, MonthlySummaryResponse, MonthlyTotals,
            EmployeeMonthlyView, TierView, TierDrilldown, SalaryBreakdown,
            BatchListQuery, DeletionReport, ConfirmPaymentRequest, PaymentStatus,
        )
    ),
    tags(
        (name = "Salary", description = "Batch ingestion and monthly summaries"),
        (name = "Batches", description = "Upload batch administration"),
        (name = "Confirmation", description = "Per-month payment confirmation"),
        (name = "Rates", description = "Compensation rate table maintenance"),
        (name = "Employees", description = "Employee directory used by the matcher"),
    )
)]
pub struct ApiDoc;
