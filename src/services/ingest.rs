// src/services/ingest.rs
//
// Turns an uploaded scan export (one row per delivered package) into
// per-batch detail rows, the unmatched ledger, and the replaced monthly
// summaries. The whole batch runs inside one transaction: a structural
// failure leaves nothing behind, while row-level failures are counted and
// never abort the batch.

use crate::{
    errors::{AppError, AppResult},
    models::{Employee, UploadReport},
    services::{aggregate, rates, weight},
};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};
use csv::StringRecord;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

/// Logical upload fields and the header spellings accepted for each.
/// Resolved once per file into a [`ColumnMap`]; a file missing any field is
/// rejected before a single row is processed.
const FIELD_ALIASES: [(&str, &[&str]); 6] = [
    (
        "awb",
        &[
            "AWB",
            "awb",
            "AWB Number",
            "Tracking Number",
            "Package ID",
            "Parcel No",
        ],
    ),
    (
        "branch",
        &[
            "Branch",
            "branch",
            "Branch Code",
            "branch_code",
            "Settlement Branch",
        ],
    ),
    (
        "weight",
        &[
            "Weight",
            "weight",
            "Billable Weight",
            "Chargeable Weight",
            "Total Weight",
        ],
    ),
    (
        "time",
        &[
            "Receive Time",
            "Time",
            "time",
            "Date",
            "Signed At",
            "Delivery Date",
        ],
    ),
    (
        "employee_name",
        &[
            "Employee",
            "employee",
            "Employee Name",
            "Courier",
            "Courier Name",
        ],
    ),
    (
        "employee_id",
        &["Employee ID", "employee_id", "ID", "id", "Courier ID", "Staff ID"],
    ),
];

#[derive(Debug, Clone, Copy)]
pub struct ColumnMap {
    awb: usize,
    branch: usize,
    weight: usize,
    time: usize,
    employee_name: usize,
    employee_id: usize,
}

/// Match the header row against the alias table. Returns the per-field
/// column indices, or the found-vs-missing report when any field has no
/// acceptable header anywhere in the file.
pub fn resolve_columns(headers: &StringRecord) -> AppResult<ColumnMap> {
    let mut indices: HashMap<&str, usize> = HashMap::new();
    let mut missing: Vec<String> = Vec::new();

    for (field, aliases) in FIELD_ALIASES {
        let hit = headers
            .iter()
            .position(|h| aliases.contains(&h.trim()));
        match hit {
            Some(idx) => {
                indices.insert(field, idx);
            }
            None => missing.push(field.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(AppError::MissingColumns {
            missing,
            found: indices.keys().map(|k| k.to_string()).collect(),
        });
    }

    Ok(ColumnMap {
        awb: indices["awb"],
        branch: indices["branch"],
        weight: indices["weight"],
        time: indices["time"],
        employee_name: indices["employee_name"],
        employee_id: indices["employee_id"],
    })
}

fn parse_any_date(value: &str) -> Option<NaiveDate> {
    const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%d/%m/%Y %H:%M:%S"];
    const DATE_FORMATS: [&str; 6] = [
        "%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d", "%d/%m/%y", "%d-%m-%y",
    ];

    let value = value.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return Some(d);
        }
    }
    None
}

/// Infer the work month from the timestamp column, checking the first 10
/// non-empty values. Falls back to the caller-supplied defaults when no
/// value parses.
pub fn extract_month_year(rows: &[StringRecord], columns: &ColumnMap) -> Option<(u32, i32)> {
    rows.iter()
        .filter_map(|row| row.get(columns.time))
        .filter(|v| !v.trim().is_empty())
        .take(10)
        .find_map(|v| parse_any_date(v).map(|d| (d.month(), d.year())))
}

/// Running per-employee totals for one batch, built while rows stream past
/// and flushed into `monthly_salary_data` at the end. Owned by the ingestion
/// pass; never shared across batches.
#[derive(Debug, Clone)]
pub struct EmployeeAccumulator {
    pub position: String,
    pub branch_code: String,
    pub zone: String,
    pub employment_type: String,
    pub base_salary: f64,
    pub allowance: f64,
    pub total_pieces: i64,
    pub total_piece_amount: f64,
    pub total_weight: f64,
    pub tier_pieces: [i64; weight::TIER_COUNT],
    pub tier_amounts: [f64; weight::TIER_COUNT],
    pub tier_rates: [f64; weight::TIER_COUNT],
}

#[derive(Debug, Default)]
struct BatchAccumulator {
    employees: HashMap<String, EmployeeAccumulator>,
    success_count: i64,
    error_count: i64,
    unmatched_count: i64,
    rate_miss_count: i64,
    unmatched_by_tier: [i64; weight::TIER_COUNT],
}

async fn insert_unmatched(
    conn: &mut SqliteConnection,
    batch_id: &str,
    employee_id: &str,
    employee_name: &str,
    awb: &str,
    branch_code: &str,
    weight_kg: f64,
    receive_time: &str,
    tier: weight::WeightTier,
) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO unmatched_salary_records
         (upload_batch_id, employee_id, employee_name, awb_number, branch_code,
          weight, receive_time, weight_tier_index, tier_label, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(batch_id)
    .bind(employee_id)
    .bind(employee_name)
    .bind(awb)
    .bind(branch_code)
    .bind(weight_kg)
    .bind(receive_time)
    .bind(tier.index as i64)
    .bind(tier.label())
    .bind(Utc::now())
    .execute(conn)
    .await?;
    Ok(())
}

/// Process one uploaded scan export end to end: header resolution, the
/// per-row pipeline (classify → employee lookup → rate match → detail row),
/// and the monthly summary replacement for every touched employee.
pub async fn ingest_batch(
    pool: &SqlitePool,
    raw_csv: &str,
    original_name: &str,
    default_month: u32,
    default_year: i32,
    uploaded_by: &str,
) -> AppResult<UploadReport> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(raw_csv.as_bytes());
    let headers = reader.headers()?.clone();
    let columns = resolve_columns(&headers)?;
    let rows: Vec<StringRecord> = reader.records().collect::<Result<_, _>>()?;

    let (month, year) =
        extract_month_year(&rows, &columns).unwrap_or((default_month, default_year));
    let work_month = format!("{year:04}-{month:02}");
    let close_date = format!("{year:04}-{month:02}-31");

    // A confirmed month is frozen; re-uploads must be rejected up front.
    let confirmed: Option<bool> = sqlx::query_scalar(
        "SELECT is_confirmed FROM payment_confirmations WHERE work_month = ?",
    )
    .bind(&work_month)
    .fetch_optional(pool)
    .await?;
    if confirmed == Some(true) {
        return Err(AppError::AlreadyConfirmed(work_month));
    }

    info!(
        "Ingesting {} ({} rows) for work month {}",
        original_name,
        rows.len(),
        work_month
    );

    let batch_id = Uuid::new_v4().to_string();
    let mut tx = pool.begin().await?;

    let upload_id = sqlx::query(
        "INSERT INTO salary_uploads
         (filename, original_name, month, year, batch_id, uploaded_by, status, created_at)
         VALUES (?, ?, ?, ?, ?, ?, 'pending', ?)",
    )
    .bind(original_name)
    .bind(original_name)
    .bind(month as i64)
    .bind(year as i64)
    .bind(&batch_id)
    .bind(uploaded_by)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    let mut acc = BatchAccumulator::default();

    for (row_no, row) in rows.iter().enumerate() {
        let field = |idx: usize| row.get(idx).unwrap_or("").trim().to_string();
        let awb = field(columns.awb);
        let branch_code = field(columns.branch);
        let receive_time = field(columns.time);
        let employee_name = field(columns.employee_name);
        let employee_id = field(columns.employee_id);
        let weight_kg: f64 = field(columns.weight).parse().unwrap_or(0.0);

        // Placeholder ids coming out of spreadsheet exports
        if employee_id.is_empty() || employee_id == "nan" {
            warn!("Row {row_no}: blank employee id, skipping");
            acc.error_count += 1;
            continue;
        }

        let tier = match weight::classify(weight_kg) {
            Ok(tier) => tier,
            Err(e) => {
                warn!("Row {row_no}: {e}");
                acc.error_count += 1;
                continue;
            }
        };

        // Id "0" marks scans credited to nobody (shared scanner accounts);
        // they go straight to the unmatched ledger.
        if employee_id == "0" {
            insert_unmatched(
                &mut *tx,
                &batch_id,
                &employee_id,
                &employee_name,
                &awb,
                &branch_code,
                weight_kg,
                &receive_time,
                tier,
            )
            .await?;
            acc.unmatched_count += 1;
            acc.unmatched_by_tier[tier.index] += 1;
            continue;
        }

        let employee = sqlx::query_as::<_, Employee>(
            "SELECT * FROM employees WHERE employee_id = ?",
        )
        .bind(&employee_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(employee) = employee else {
            warn!("Row {row_no}: employee {employee_id} not in directory");
            insert_unmatched(
                &mut *tx,
                &batch_id,
                &employee_id,
                &employee_name,
                &awb,
                &branch_code,
                weight_kg,
                &receive_time,
                tier,
            )
            .await?;
            acc.unmatched_count += 1;
            acc.unmatched_by_tier[tier.index] += 1;
            continue;
        };

        let rate = rates::resolve_rate(
            &mut *tx,
            &employee.position,
            &employee.rate_type,
            &employee.zone,
            &employee.branch_code,
        )
        .await?;

        let Some(rate) = rate else {
            // Unlike employee misses these rows are not persisted; the
            // counter and log are the audit trail.
            warn!(
                "Row {row_no}: no rate for position={} zone={} branch={}",
                employee.position, employee.zone, employee.branch_code
            );
            acc.rate_miss_count += 1;
            acc.error_count += 1;
            continue;
        };

        let tier_rates = rate.tier_rates();
        let per_piece = tier_rates[tier.index];

        sqlx::query(
            "INSERT INTO employee_salary_records
             (upload_batch_id, employee_id, awb_number, branch_code, weight,
              receive_time, close_date, work_month, total_pieces, total_amount, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(&batch_id)
        .bind(&employee_id)
        .bind(&awb)
        .bind(&branch_code)
        .bind(weight_kg)
        .bind(&receive_time)
        .bind(&close_date)
        .bind(&work_month)
        .bind(per_piece)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        let entry = acc
            .employees
            .entry(employee_id.clone())
            .or_insert_with(|| EmployeeAccumulator {
                position: employee.position.clone(),
                branch_code: employee.branch_code.clone(),
                zone: employee.zone.clone(),
                employment_type: employee.rate_type.clone(),
                base_salary: rate.base_salary,
                allowance: rate.allowance,
                total_pieces: 0,
                total_piece_amount: 0.0,
                total_weight: 0.0,
                tier_pieces: [0; weight::TIER_COUNT],
                tier_amounts: [0.0; weight::TIER_COUNT],
                tier_rates,
            });
        entry.total_pieces += 1;
        entry.total_piece_amount += per_piece;
        entry.total_weight += weight_kg;
        entry.tier_pieces[tier.index] += 1;
        entry.tier_amounts[tier.index] += per_piece;

        acc.success_count += 1;
    }

    for (employee_id, summary) in &acc.employees {
        aggregate::replace_summary(&mut *tx, employee_id, month, year, summary).await?;
    }

    sqlx::query(
        "UPDATE salary_uploads
         SET status = 'completed', employee_linked = 1, rate_linked = 1
         WHERE id = ?",
    )
    .bind(upload_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(
        "Batch {} done: {} ok, {} errors, {} unmatched ({} rate misses), {} employees",
        batch_id,
        acc.success_count,
        acc.error_count,
        acc.unmatched_count,
        acc.rate_miss_count,
        acc.employees.len()
    );
    if acc.unmatched_count > 0 {
        info!(
            "Unmatched pieces per tier for batch {}: {:?}",
            batch_id, acc.unmatched_by_tier
        );
    }

    Ok(UploadReport {
        upload_id,
        batch_id,
        month,
        year,
        work_month,
        success_count: acc.success_count,
        error_count: acc.error_count,
        unmatched_count: acc.unmatched_count,
        rate_miss_count: acc.rate_miss_count,
        employees_touched: acc.employees.len() as i64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    #[test]
    fn header_aliases_resolve_in_any_column_order() {
        let headers = record(&[
            "Courier ID",
            "Billable Weight",
            "AWB",
            "Branch Code",
            "Receive Time",
            "Courier Name",
        ]);
        let map = resolve_columns(&headers).unwrap();
        assert_eq!(map.employee_id, 0);
        assert_eq!(map.weight, 1);
        assert_eq!(map.awb, 2);
        assert_eq!(map.branch, 3);
        assert_eq!(map.time, 4);
        assert_eq!(map.employee_name, 5);
    }

    #[test]
    fn missing_required_column_reports_found_and_missing() {
        let headers = record(&["AWB", "Branch", "Weight", "Receive Time", "Employee"]);
        let err = resolve_columns(&headers).unwrap_err();
        match err {
            crate::errors::AppError::MissingColumns { missing, found } => {
                assert_eq!(missing, vec!["employee_id".to_string()]);
                assert_eq!(found.len(), 5);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn month_is_inferred_from_the_first_parseable_timestamp() {
        let headers = record(&["AWB", "Branch", "Weight", "Time", "Employee", "ID"]);
        let columns = resolve_columns(&headers).unwrap();
        let rows = vec![
            record(&["A1", "B1", "0.4", "", "Alice", "10001"]),
            record(&["A2", "B1", "0.4", "garbage", "Alice", "10001"]),
            record(&["A3", "B1", "0.4", "2025-07-15 08:30:00", "Alice", "10001"]),
        ];
        assert_eq!(extract_month_year(&rows, &columns), Some((7, 2025)));
    }

    #[test]
    fn all_documented_date_formats_parse() {
        for value in [
            "2025-07-15",
            "15/07/2025",
            "15-07-2025",
            "2025/07/15",
            "15/07/25",
            "15-07-25",
            "2025-07-15 10:30:00",
            "15/07/2025 10:30:00",
        ] {
            let d = parse_any_date(value).unwrap_or_else(|| panic!("failed: {value}"));
            assert_eq!((d.month(), d.year()), (7, 2025), "value {value}");
        }
        assert!(parse_any_date("July 15th").is_none());
    }
}
