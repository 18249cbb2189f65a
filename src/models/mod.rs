// src/models/mod.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// ─── Employee directory ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Employee {
    pub employee_id: String,
    pub name: String,
    pub position: String,
    pub branch_code: String,
    pub zone: String,
    /// "piece_rate" or "base_salary"
    pub rate_type: String,
    pub base_salary: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEmployeeRequest {
    pub employee_id: String,
    pub name: String,
    pub position: String,
    pub branch_code: String,
    pub zone: String,
    #[serde(default = "default_rate_type")]
    pub rate_type: String,
    #[serde(default)]
    pub base_salary: f64,
}

fn default_rate_type() -> String {
    "piece_rate".to_string()
}

// ─── Rate table ───────────────────────────────────────────────────────────────

/// One compensation rule, keyed by (position, salary_type, zone, branch_code).
/// `branch_code` is either a real branch code or the 'ALL' sentinel; domain
/// code goes through [`crate::services::rates::BranchScope`] instead of
/// matching on the sentinel.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RateCard {
    pub id: i64,
    pub position: String,
    pub zone: String,
    pub branch_code: String,
    pub salary_type: String,
    pub base_salary: f64,
    pub piece_rate_bonus: f64,
    pub allowance: f64,
    /// JSON list of `{pieces, amount}` thresholds, nullable
    pub allowance_tiers: Option<String>,
    pub tier_rate_1: f64,
    pub tier_rate_2: f64,
    pub tier_rate_3: f64,
    pub tier_rate_4: f64,
    pub tier_rate_5: f64,
    pub tier_rate_6: f64,
    pub tier_rate_7: f64,
    pub tier_rate_8: f64,
    pub tier_rate_9: f64,
    pub tier_rate_10: f64,
    pub created_at: DateTime<Utc>,
}

impl RateCard {
    /// Per-piece rates in weight-tier order.
    pub fn tier_rates(&self) -> [f64; 10] {
        [
            self.tier_rate_1,
            self.tier_rate_2,
            self.tier_rate_3,
            self.tier_rate_4,
            self.tier_rate_5,
            self.tier_rate_6,
            self.tier_rate_7,
            self.tier_rate_8,
            self.tier_rate_9,
            self.tier_rate_10,
        ]
    }
}

/// One step of a piecework allowance schedule. The legacy data uses two key
/// spellings interchangeably, so both are accepted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AllowanceTier {
    #[serde(alias = "min_pieces")]
    pub pieces: i64,
    #[serde(alias = "allowance")]
    pub amount: f64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SaveRateRequest {
    /// Present for updates, absent for creates
    pub id: Option<i64>,
    pub position: String,
    pub zone: String,
    pub branch_code: String,
    pub salary_type: String,
    #[serde(default)]
    pub base_salary: f64,
    #[serde(default)]
    pub piece_rate_bonus: f64,
    #[serde(default)]
    pub allowance: f64,
    pub allowance_tiers: Option<String>,
    /// Exactly 10 per-piece rates, one per weight tier
    pub tier_rates: Vec<f64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RateFilter {
    pub zone: Option<String>,
    pub branch: Option<String>,
}

// ─── Upload batches & detail rows ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UploadBatch {
    pub id: i64,
    pub filename: String,
    pub original_name: String,
    pub month: i64,
    pub year: i64,
    pub batch_id: String,
    pub uploaded_by: String,
    pub status: String,
    pub employee_linked: bool,
    pub rate_linked: bool,
    pub created_at: DateTime<Utc>,
}

/// Batch listing entry with counts derived from the detail table.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct UploadBatchSummary {
    pub id: i64,
    pub original_name: String,
    pub month: i64,
    pub year: i64,
    pub batch_id: String,
    pub uploaded_by: String,
    pub status: String,
    pub employee_linked: bool,
    pub rate_linked: bool,
    pub created_at: DateTime<Utc>,
    pub total_records: i64,
    pub total_employees: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SalaryDetail {
    pub id: i64,
    pub upload_batch_id: String,
    pub employee_id: String,
    pub awb_number: String,
    pub branch_code: String,
    pub weight: f64,
    pub receive_time: String,
    pub close_date: String,
    /// "YYYY-MM"
    pub work_month: String,
    pub total_pieces: i64,
    pub total_amount: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UnmatchedRecord {
    pub id: i64,
    pub upload_batch_id: String,
    pub employee_id: String,
    pub employee_name: String,
    pub awb_number: String,
    pub branch_code: String,
    pub weight: f64,
    pub receive_time: String,
    pub weight_tier_index: i64,
    pub tier_label: String,
    pub created_at: DateTime<Utc>,
}

/// Counters returned to the operator after every upload so the totals can be
/// reconciled against the source file's row count.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UploadReport {
    pub upload_id: i64,
    pub batch_id: String,
    pub month: u32,
    pub year: i32,
    pub work_month: String,
    pub success_count: i64,
    pub error_count: i64,
    pub unmatched_count: i64,
    /// Rows dropped because no rate card resolved (not persisted anywhere,
    /// unlike unmatched employees — kept observable through this counter)
    pub rate_miss_count: i64,
    pub employees_touched: i64,
}

// ─── Monthly summaries ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MonthlySummary {
    pub id: i64,
    pub employee_id: String,
    pub month: i64,
    pub year: i64,
    pub package_count: i64,
    pub total_weight: f64,
    pub base_salary: f64,
    pub piece_rate_bonus: f64,
    pub allowance: f64,
    pub total_salary: f64,
    pub tier_1_pieces: i64,
    pub tier_2_pieces: i64,
    pub tier_3_pieces: i64,
    pub tier_4_pieces: i64,
    pub tier_5_pieces: i64,
    pub tier_6_pieces: i64,
    pub tier_7_pieces: i64,
    pub tier_8_pieces: i64,
    pub tier_9_pieces: i64,
    pub tier_10_pieces: i64,
    pub tier_1_amount: f64,
    pub tier_2_amount: f64,
    pub tier_3_amount: f64,
    pub tier_4_amount: f64,
    pub tier_5_amount: f64,
    pub tier_6_amount: f64,
    pub tier_7_amount: f64,
    pub tier_8_amount: f64,
    pub tier_9_amount: f64,
    pub tier_10_amount: f64,
    pub position: Option<String>,
    pub branch_code: Option<String>,
    pub zone: Option<String>,
    pub employment_type: Option<String>,
    pub upload_date: DateTime<Utc>,
}

impl MonthlySummary {
    pub fn tier_pieces(&self) -> [i64; 10] {
        [
            self.tier_1_pieces,
            self.tier_2_pieces,
            self.tier_3_pieces,
            self.tier_4_pieces,
            self.tier_5_pieces,
            self.tier_6_pieces,
            self.tier_7_pieces,
            self.tier_8_pieces,
            self.tier_9_pieces,
            self.tier_10_pieces,
        ]
    }

    pub fn tier_amounts(&self) -> [f64; 10] {
        [
            self.tier_1_amount,
            self.tier_2_amount,
            self.tier_3_amount,
            self.tier_4_amount,
            self.tier_5_amount,
            self.tier_6_amount,
            self.tier_7_amount,
            self.tier_8_amount,
            self.tier_9_amount,
            self.tier_10_amount,
        ]
    }
}

// ─── Read-side views ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct MonthlyQuery {
    pub month: i64,
    pub year: i64,
    pub branch: Option<String>,
    /// Substring match on the employee id
    pub employee_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TierView {
    pub label: String,
    pub pieces: i64,
    pub rate: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EmployeeMonthlyView {
    pub employee_id: String,
    pub name: String,
    pub position: String,
    pub branch_code: String,
    pub zone: String,
    pub salary_type: String,
    pub base_salary: f64,
    pub piece_rate_bonus: f64,
    pub allowance: f64,
    pub total_pieces: i64,
    pub total_amount: f64,
    pub tiers: Vec<TierView>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MonthlyTotals {
    pub total_employees: i64,
    pub total_pieces: i64,
    pub total_salary: f64,
    pub total_allowance: f64,
    pub employees_with_rates: i64,
    pub employees_without_rates: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MonthlySummaryResponse {
    pub month: i64,
    pub year: i64,
    pub employees: Vec<EmployeeMonthlyView>,
    pub summary: MonthlyTotals,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TierDrilldown {
    pub employee_id: String,
    pub name: String,
    pub month: i64,
    pub year: i64,
    pub total_pieces: i64,
    pub tiers: Vec<TierView>,
    pub base_salary: f64,
    pub piece_rate_bonus: f64,
    pub allowance: f64,
    pub total_salary: f64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UnmatchedQuery {
    pub batch_id: Option<String>,
    /// "YYYY-MM"; resolved through the owning batch when set
    pub work_month: Option<String>,
}

/// Unmatched ledger plus its tier subtotal, for reconciliation against the
/// matched totals of the same batch.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UnmatchedLedger {
    pub records: Vec<UnmatchedRecord>,
    pub total_pieces: i64,
    pub pieces_by_tier: Vec<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BatchListQuery {
    pub month: Option<i64>,
    pub year: Option<i64>,
}

// ─── Batch lifecycle & confirmation ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeletionReport {
    pub upload_id: i64,
    pub batch_id: String,
    pub filename: String,
    pub deleted_records: i64,
    pub deleted_unmatched: i64,
    pub deleted_monthly_records: i64,
    /// Artifact removal is best-effort and reported separately
    pub file_deleted: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ConfirmPaymentRequest {
    /// "YYYY-MM"
    pub work_month: String,
    pub confirmed_by: String,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct PaymentConfirmation {
    pub work_month: String,
    pub is_confirmed: bool,
    pub confirmed_by: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentStatus {
    pub work_month: String,
    pub is_confirmed: bool,
    pub confirmed_by: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
}
