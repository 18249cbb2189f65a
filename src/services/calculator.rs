// src/services/calculator.rs
//
// Authoritative month-end pay computation. Every read-side view derives its
// totals from this function instead of re-deriving from raw scan rows;
// ingestion keeps its own per-row amounts (see ingest.rs) which stay
// persisted untouched.

use crate::models::{AllowanceTier, RateCard};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct SalaryBreakdown {
    pub base_salary: f64,
    pub piece_rate_bonus: f64,
    pub allowance: f64,
    pub total_amount: f64,
}

/// Unified pay formula: `total = base + piece amount + allowance`.
///
/// Fixed-salary employees ("base_salary") earn no piece amount regardless of
/// volume. Everyone else is paid `pieces x first tier rate` — the legacy
/// render-time formula applies the first tier's flat rate rather than
/// re-bucketing, and that behavior is kept.
pub fn calculate(rate: Option<&RateCard>, salary_type: &str, pieces: i64) -> SalaryBreakdown {
    let Some(rate) = rate else {
        return SalaryBreakdown::default();
    };

    let base_salary = rate.base_salary;

    let piece_rate_bonus = if pieces > 0 && salary_type != "base_salary" {
        pieces as f64 * rate.tier_rates()[0]
    } else {
        0.0
    };

    let allowance = effective_allowance(rate, pieces);

    SalaryBreakdown {
        base_salary,
        piece_rate_bonus,
        allowance,
        total_amount: base_salary + piece_rate_bonus + allowance,
    }
}

/// Flat allowance, upgraded by the tier schedule when one is configured.
/// All tiers are scanned and the last one whose threshold the piece count
/// meets wins, so a higher later threshold overrides an earlier one.
fn effective_allowance(rate: &RateCard, pieces: i64) -> f64 {
    let Some(raw) = rate.allowance_tiers.as_deref() else {
        return rate.allowance;
    };
    if raw.trim().is_empty() {
        return rate.allowance;
    }

    let tiers: Vec<AllowanceTier> = match serde_json::from_str(raw) {
        Ok(tiers) => tiers,
        Err(e) => {
            warn!("Unparseable allowance_tiers on rate {}: {e}", rate.id);
            return rate.allowance;
        }
    };

    let mut allowance = rate.allowance;
    for tier in &tiers {
        if pieces >= tier.pieces {
            allowance = tier.amount;
        }
    }
    allowance
}
