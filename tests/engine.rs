// End-to-end tests for the reconciliation engine against an in-memory
// SQLite database with the real migrations applied.

use courier_payroll::{
    errors::AppError,
    models::{MonthlySummary, RateCard, SalaryDetail, UnmatchedRecord},
    services::{batch, calculator, confirm, ingest, rates},
};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

async fn test_pool() -> SqlitePool {
    // single connection: every pooled connection to :memory: would otherwise
    // see its own empty database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory sqlite");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("apply migrations");
    pool
}

async fn seed_employee(pool: &SqlitePool, employee_id: &str, rate_type: &str) {
    sqlx::query(
        "INSERT INTO employees
         (employee_id, name, position, branch_code, zone, rate_type, base_salary, status, created_at)
         VALUES (?, ?, 'Courier', 'BKK-01', 'North', ?, 0, 'active', ?)",
    )
    .bind(employee_id)
    .bind(format!("Employee {employee_id}"))
    .bind(rate_type)
    .bind(chrono::Utc::now())
    .execute(pool)
    .await
    .expect("seed employee");
}

async fn seed_rate(
    pool: &SqlitePool,
    branch_code: &str,
    base_salary: f64,
    allowance: f64,
    tier_rates: [f64; 10],
    allowance_tiers: Option<&str>,
) -> i64 {
    let mut query = sqlx::query(
        "INSERT INTO piece_rates
         (position, zone, branch_code, salary_type, base_salary, piece_rate_bonus,
          allowance, allowance_tiers,
          tier_rate_1, tier_rate_2, tier_rate_3, tier_rate_4, tier_rate_5,
          tier_rate_6, tier_rate_7, tier_rate_8, tier_rate_9, tier_rate_10, created_at)
         VALUES ('Courier', 'North', ?, 'piece_rate', ?, 0, ?, ?,
                 ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(branch_code)
    .bind(base_salary)
    .bind(allowance)
    .bind(allowance_tiers);
    for rate in tier_rates {
        query = query.bind(rate);
    }
    query
        .bind(chrono::Utc::now())
        .execute(pool)
        .await
        .expect("seed rate")
        .last_insert_rowid()
}

const TIER_RATES: [f64; 10] = [5.0, 6.0, 8.0, 9.0, 10.0, 11.0, 13.0, 16.0, 20.0, 25.0];

const THREE_ROW_CSV: &str = "\
AWB,Branch,Weight,Time,Employee,Employee ID
AWB001,BKK-01,0.3,2025-07-15 08:30:00,Employee 10001,10001
AWB002,BKK-01,1.2,2025-07-15 09:10:00,Employee 10001,10001
AWB003,BKK-01,2.2,2025-07-15 09:40:00,Shared Scanner,0
";

async fn summary_for(pool: &SqlitePool, employee_id: &str, month: i64, year: i64) -> MonthlySummary {
    sqlx::query_as::<_, MonthlySummary>(
        "SELECT * FROM monthly_salary_data WHERE employee_id = ? AND month = ? AND year = ?",
    )
    .bind(employee_id)
    .bind(month)
    .bind(year)
    .fetch_one(pool)
    .await
    .expect("summary row")
}

#[tokio::test]
async fn end_to_end_three_row_scenario() {
    let pool = test_pool().await;
    seed_employee(&pool, "10001", "piece_rate").await;
    seed_rate(&pool, "BKK-01", 1000.0, 20.0, TIER_RATES, None).await;

    let report = ingest::ingest_batch(&pool, THREE_ROW_CSV, "july.csv", 1, 2000, "tester")
        .await
        .expect("ingest");

    // month inferred from the file's timestamp column, not the defaults
    assert_eq!(report.work_month, "2025-07");
    assert_eq!(report.success_count, 2);
    assert_eq!(report.error_count, 0);
    assert_eq!(report.unmatched_count, 1);
    assert_eq!(report.rate_miss_count, 0);
    assert_eq!(report.employees_touched, 1);

    let summary = summary_for(&pool, "10001", 7, 2025).await;
    assert_eq!(summary.package_count, 2);
    assert_eq!(summary.tier_1_pieces, 1); // 0.3 kg
    assert_eq!(summary.tier_3_pieces, 1); // 1.2 kg
    assert_eq!(summary.base_salary, 1000.0);
    assert_eq!(summary.allowance, 20.0);
    // ingestion-time amounts use the per-tier rates: 5 + 8
    assert_eq!(summary.piece_rate_bonus, 13.0);
    assert_eq!(summary.total_salary, 1033.0);

    // the authoritative render-time formula applies the first tier's rate
    let rate = sqlx::query_as::<_, RateCard>("SELECT * FROM piece_rates LIMIT 1")
        .fetch_one(&pool)
        .await
        .unwrap();
    let breakdown = calculator::calculate(Some(&rate), "piece_rate", summary.package_count);
    assert_eq!(breakdown.piece_rate_bonus, 10.0); // 2 pieces x tier-1 rate
    assert_eq!(breakdown.total_amount, 1030.0);

    // the "0" row landed in the unmatched ledger with its tier recorded
    let unmatched = sqlx::query_as::<_, UnmatchedRecord>(
        "SELECT * FROM unmatched_salary_records WHERE upload_batch_id = ?",
    )
    .bind(&report.batch_id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(unmatched.len(), 1);
    assert_eq!(unmatched[0].employee_id, "0");
    assert_eq!(unmatched[0].weight_tier_index, 4); // 2.2 kg
    assert_eq!(unmatched[0].tier_label, "2.01-2.50KG");
}

#[tokio::test]
async fn reingesting_the_same_month_replaces_instead_of_accumulating() {
    let pool = test_pool().await;
    seed_employee(&pool, "10001", "piece_rate").await;
    seed_rate(&pool, "BKK-01", 1000.0, 20.0, TIER_RATES, None).await;

    ingest::ingest_batch(&pool, THREE_ROW_CSV, "july-a.csv", 1, 2000, "tester")
        .await
        .unwrap();
    ingest::ingest_batch(&pool, THREE_ROW_CSV, "july-b.csv", 1, 2000, "tester")
        .await
        .unwrap();

    let row_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM monthly_salary_data WHERE employee_id = '10001' AND month = 7 AND year = 2025",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(row_count, 1);

    let summary = summary_for(&pool, "10001", 7, 2025).await;
    assert_eq!(summary.package_count, 2);
    assert_eq!(summary.total_salary, 1033.0);
}

#[tokio::test]
async fn resolver_prefers_specific_branch_over_all_branches() {
    let pool = test_pool().await;
    let specific_id = seed_rate(&pool, "BKK-01", 1000.0, 0.0, [7.0; 10], None).await;
    seed_rate(&pool, "ALL", 900.0, 0.0, [3.0; 10], None).await;

    let mut conn = pool.acquire().await.unwrap();
    let rate = rates::resolve_rate(&mut conn, "Courier", "piece_rate", "North", "BKK-01")
        .await
        .unwrap()
        .expect("rate resolves");
    assert_eq!(rate.id, specific_id);
    assert_eq!(rate.tier_rate_1, 7.0);

    sqlx::query("DELETE FROM piece_rates WHERE id = ?")
        .bind(specific_id)
        .execute(&mut *conn)
        .await
        .unwrap();

    let rate = rates::resolve_rate(&mut conn, "Courier", "piece_rate", "North", "BKK-01")
        .await
        .unwrap()
        .expect("falls back to all-branches row");
    assert_eq!(rate.branch_code, "ALL");
    assert_eq!(rate.tier_rate_1, 3.0);

    let none = rates::resolve_rate(&mut conn, "Courier", "piece_rate", "South", "BKK-01")
        .await
        .unwrap();
    assert!(none.is_none());

    // required-field guard: no position means no lookup at all
    let none = rates::resolve_rate(&mut conn, "", "piece_rate", "North", "BKK-01")
        .await
        .unwrap();
    assert!(none.is_none());
}

#[tokio::test]
async fn rate_miss_is_counted_but_not_persisted() {
    let pool = test_pool().await;
    seed_employee(&pool, "10001", "piece_rate").await;
    // no rate card at all

    let report = ingest::ingest_batch(&pool, THREE_ROW_CSV, "july.csv", 1, 2000, "tester")
        .await
        .unwrap();
    assert_eq!(report.success_count, 0);
    assert_eq!(report.error_count, 2);
    assert_eq!(report.rate_miss_count, 2);
    assert_eq!(report.unmatched_count, 1);

    let details: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employee_salary_records")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(details, 0);
    let summaries: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM monthly_salary_data")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(summaries, 0);
}

#[tokio::test]
async fn unknown_employee_goes_to_the_unmatched_ledger() {
    let pool = test_pool().await;
    // directory is empty: every row with a real id is unmatched
    let report = ingest::ingest_batch(&pool, THREE_ROW_CSV, "july.csv", 1, 2000, "tester")
        .await
        .unwrap();
    assert_eq!(report.success_count, 0);
    assert_eq!(report.unmatched_count, 3);

    let unmatched: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM unmatched_salary_records")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(unmatched, 3);
}

#[tokio::test]
async fn missing_columns_abort_before_any_row_is_written() {
    let pool = test_pool().await;
    let csv = "AWB,Branch,Weight\nAWB001,BKK-01,0.3\n";
    let err = ingest::ingest_batch(&pool, csv, "bad.csv", 7, 2025, "tester")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::MissingColumns { .. }));

    let uploads: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM salary_uploads")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(uploads, 0);
}

#[tokio::test]
async fn confirmation_freezes_the_month() {
    let pool = test_pool().await;
    seed_employee(&pool, "10001", "piece_rate").await;
    seed_rate(&pool, "BKK-01", 1000.0, 20.0, TIER_RATES, None).await;

    // nothing ingested yet: nothing to confirm
    let err = confirm::confirm(&pool, "2025-07", "finance").await.unwrap_err();
    assert!(matches!(err, AppError::NothingToConfirm(_)));

    ingest::ingest_batch(&pool, THREE_ROW_CSV, "july.csv", 1, 2000, "tester")
        .await
        .unwrap();

    let status = confirm::status(&pool, "2025-07").await.unwrap();
    assert!(!status.is_confirmed);

    let status = confirm::confirm(&pool, "2025-07", "finance").await.unwrap();
    assert!(status.is_confirmed);
    assert_eq!(status.confirmed_by.as_deref(), Some("finance"));

    // second confirm is a typed conflict, not a silent overwrite
    let err = confirm::confirm(&pool, "2025-07", "someone-else")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyConfirmed(_)));

    // and the month is frozen against re-uploads
    let err = ingest::ingest_batch(&pool, THREE_ROW_CSV, "july-again.csv", 1, 2000, "tester")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyConfirmed(_)));
}

#[tokio::test]
async fn deleting_a_batch_removes_only_its_own_month() {
    let pool = test_pool().await;
    seed_employee(&pool, "10001", "piece_rate").await;
    seed_rate(&pool, "BKK-01", 1000.0, 20.0, TIER_RATES, None).await;

    let july = ingest::ingest_batch(&pool, THREE_ROW_CSV, "july.csv", 1, 2000, "tester")
        .await
        .unwrap();

    let august_csv = "\
AWB,Branch,Weight,Time,Employee,Employee ID
AWB010,BKK-01,0.4,2025-08-10 10:00:00,Employee 10001,10001
";
    ingest::ingest_batch(&pool, august_csv, "august.csv", 1, 2000, "tester")
        .await
        .unwrap();

    let report = batch::delete_batch(&pool, july.upload_id, "target/test-uploads")
        .await
        .unwrap();
    assert_eq!(report.deleted_records, 2);
    assert_eq!(report.deleted_unmatched, 1);
    assert_eq!(report.deleted_monthly_records, 1);

    let details = sqlx::query_as::<_, SalaryDetail>(
        "SELECT * FROM employee_salary_records WHERE upload_batch_id = ?",
    )
    .bind(&july.batch_id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert!(details.is_empty());

    let july_summaries: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM monthly_salary_data WHERE month = 7 AND year = 2025",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(july_summaries, 0);

    // the other month's summary survives the deletion
    let august = summary_for(&pool, "10001", 8, 2025).await;
    assert_eq!(august.package_count, 1);

    let listed: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM salary_uploads WHERE id = ?")
        .bind(july.upload_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(listed, 0);

    let err = batch::delete_batch(&pool, july.upload_id, "target/test-uploads")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn fixed_salary_employees_accumulate_pieces_but_calculator_pays_base_only() {
    let pool = test_pool().await;
    seed_employee(&pool, "20002", "base_salary").await;
    // rate row keyed by the employee's salary type
    sqlx::query(
        "INSERT INTO piece_rates
         (position, zone, branch_code, salary_type, base_salary, piece_rate_bonus,
          allowance, allowance_tiers,
          tier_rate_1, tier_rate_2, tier_rate_3, tier_rate_4, tier_rate_5,
          tier_rate_6, tier_rate_7, tier_rate_8, tier_rate_9, tier_rate_10, created_at)
         VALUES ('Courier', 'North', 'ALL', 'base_salary', 12000, 0, 0, NULL,
                 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, ?)",
    )
    .bind(chrono::Utc::now())
    .execute(&pool)
    .await
    .unwrap();

    let csv = "\
AWB,Branch,Weight,Time,Employee,Employee ID
AWB020,BKK-01,0.4,2025-07-02 10:00:00,Employee 20002,20002
AWB021,BKK-01,0.4,2025-07-02 10:05:00,Employee 20002,20002
";
    let report = ingest::ingest_batch(&pool, csv, "july.csv", 1, 2000, "tester")
        .await
        .unwrap();
    assert_eq!(report.success_count, 2);

    let summary = summary_for(&pool, "20002", 7, 2025).await;
    assert_eq!(summary.package_count, 2);

    let rate = sqlx::query_as::<_, RateCard>("SELECT * FROM piece_rates LIMIT 1")
        .fetch_one(&pool)
        .await
        .unwrap();
    let breakdown = calculator::calculate(Some(&rate), "base_salary", summary.package_count);
    assert_eq!(breakdown.piece_rate_bonus, 0.0);
    assert_eq!(breakdown.total_amount, 12000.0);
}
