// src/services/aggregate.rs
//
// Monthly summary persistence. One row per (employee, month, year), always
// replaced wholesale: re-uploading the same month must never double-count,
// so the prior row is deleted before the fresh one is written.

use crate::{errors::AppResult, services::ingest::EmployeeAccumulator};
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

pub async fn replace_summary(
    conn: &mut SqliteConnection,
    employee_id: &str,
    month: u32,
    year: i32,
    acc: &EmployeeAccumulator,
) -> AppResult<()> {
    let total_salary = acc.base_salary + acc.total_piece_amount + acc.allowance;

    sqlx::query("DELETE FROM monthly_salary_data WHERE employee_id = ? AND month = ? AND year = ?")
        .bind(employee_id)
        .bind(month as i64)
        .bind(year as i64)
        .execute(&mut *conn)
        .await?;

    let mut query = sqlx::query(
        "INSERT INTO monthly_salary_data
         (employee_id, month, year, package_count, total_weight,
          base_salary, piece_rate_bonus, allowance, total_salary,
          tier_1_pieces, tier_2_pieces, tier_3_pieces, tier_4_pieces, tier_5_pieces,
          tier_6_pieces, tier_7_pieces, tier_8_pieces, tier_9_pieces, tier_10_pieces,
          tier_1_amount, tier_2_amount, tier_3_amount, tier_4_amount, tier_5_amount,
          tier_6_amount, tier_7_amount, tier_8_amount, tier_9_amount, tier_10_amount,
          position, branch_code, zone, employment_type, upload_date)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?,
                 ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                 ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                 ?, ?, ?, ?, ?)",
    )
    .bind(employee_id)
    .bind(month as i64)
    .bind(year as i64)
    .bind(acc.total_pieces)
    .bind(acc.total_weight)
    .bind(acc.base_salary)
    .bind(acc.total_piece_amount)
    .bind(acc.allowance)
    .bind(total_salary);
    for pieces in acc.tier_pieces {
        query = query.bind(pieces);
    }
    for amount in acc.tier_amounts {
        query = query.bind(amount);
    }
    query = query
        .bind(&acc.position)
        .bind(&acc.branch_code)
        .bind(&acc.zone)
        .bind(&acc.employment_type)
        .bind(Utc::now());

    query.execute(conn).await?;

    debug!(
        "Summary for {employee_id} {year:04}-{month:02}: {} pieces, total {total_salary:.2}",
        acc.total_pieces
    );
    Ok(())
}
