// src/services/rates.rs
//
// Rate card lookup. A rate row is keyed by (position, salary_type, zone,
// branch_code); the branch key is either a concrete branch code or the
// catch-all row that applies to every branch. Lookup order is a hard
// contract: the branch-specific row always wins over the catch-all.

use crate::errors::AppResult;
use crate::models::RateCard;
use sqlx::SqliteConnection;
use tracing::debug;

/// Sentinel stored in `piece_rates.branch_code` for rows that apply to all
/// branches. Only this module maps between the sentinel and the domain type.
pub const ALL_BRANCHES: &str = "ALL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchScope {
    Specific(String),
    AnyBranch,
}

impl BranchScope {
    pub fn from_code(code: &str) -> Self {
        if code == ALL_BRANCHES {
            BranchScope::AnyBranch
        } else {
            BranchScope::Specific(code.to_string())
        }
    }

    pub fn as_code(&self) -> &str {
        match self {
            BranchScope::Specific(code) => code,
            BranchScope::AnyBranch => ALL_BRANCHES,
        }
    }
}

async fn fetch_rate(
    conn: &mut SqliteConnection,
    position: &str,
    salary_type: &str,
    zone: &str,
    branch: &BranchScope,
) -> AppResult<Option<RateCard>> {
    let rate = sqlx::query_as::<_, RateCard>(
        "SELECT * FROM piece_rates
         WHERE position = ? AND salary_type = ? AND zone = ? AND branch_code = ?
         LIMIT 1",
    )
    .bind(position)
    .bind(salary_type)
    .bind(zone)
    .bind(branch.as_code())
    .fetch_optional(&mut *conn)
    .await?;
    Ok(rate)
}

/// Resolve the rate card for an employee: exact branch first, then the
/// all-branches row. Missing position or zone means no lookup is possible.
pub async fn resolve_rate(
    conn: &mut SqliteConnection,
    position: &str,
    salary_type: &str,
    zone: &str,
    branch_code: &str,
) -> AppResult<Option<RateCard>> {
    if position.is_empty() || zone.is_empty() {
        return Ok(None);
    }

    let specific = BranchScope::Specific(branch_code.to_string());
    if let Some(rate) = fetch_rate(conn, position, salary_type, zone, &specific).await? {
        debug!("Rate {} resolved for branch {}", rate.id, branch_code);
        return Ok(Some(rate));
    }

    let fallback = fetch_rate(conn, position, salary_type, zone, &BranchScope::AnyBranch).await?;
    if let Some(rate) = &fallback {
        debug!(
            "No branch-specific rate for {}, using all-branches rate {}",
            branch_code, rate.id
        );
    }
    Ok(fallback)
}
