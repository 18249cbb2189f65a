// src/services/weight.rs
//
// Buckets a package weight into one of 10 contiguous tiers. Tier boundaries
// are inclusive upper bounds (a package weighing exactly 0.50 kg is tier 0);
// the last tier is unbounded above.

use crate::errors::{AppError, AppResult};
use tracing::warn;

pub const TIER_COUNT: usize = 10;

/// Inclusive upper bound of tiers 0..=8; tier 9 has no upper bound.
const UPPER_BOUNDS: [f64; 9] = [0.50, 1.00, 1.50, 2.00, 2.50, 3.00, 5.00, 10.00, 15.00];

pub const TIER_LABELS: [&str; TIER_COUNT] = [
    "0.00-0.50KG",
    "0.51-1.00KG",
    "1.01-1.50KG",
    "1.51-2.00KG",
    "2.01-2.50KG",
    "2.51-3.00KG",
    "3.01-5.00KG",
    "5.01-10.00KG",
    "10.01-15.00KG",
    "15.00KG+",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightTier {
    pub index: usize,
}

impl WeightTier {
    pub fn label(&self) -> &'static str {
        TIER_LABELS[self.index]
    }
}

/// Classify a package weight (kg) into its tier.
///
/// Negative weights are rejected; anything else lands in exactly one tier.
pub fn classify(weight: f64) -> AppResult<WeightTier> {
    if weight < 0.0 {
        return Err(AppError::Validation(format!(
            "Package weight cannot be negative: {weight}"
        )));
    }
    if !weight.is_finite() {
        warn!("Non-finite package weight {weight}, forcing top tier");
        return Ok(WeightTier {
            index: TIER_COUNT - 1,
        });
    }
    for (i, bound) in UPPER_BOUNDS.iter().enumerate() {
        if weight <= *bound {
            return Ok(WeightTier { index: i });
        }
    }
    // heavier than every bounded tier
    Ok(WeightTier {
        index: TIER_COUNT - 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lightest_tier_covers_zero_to_half_kilo() {
        assert_eq!(classify(0.0).unwrap().index, 0);
        assert_eq!(classify(0.3).unwrap().index, 0);
        assert_eq!(classify(0.5).unwrap().index, 0);
    }

    #[test]
    fn boundaries_belong_to_the_lower_tier() {
        let boundaries = [0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 5.0, 10.0, 15.0];
        for (i, w) in boundaries.iter().enumerate() {
            assert_eq!(classify(*w).unwrap().index, i, "boundary {w}");
        }
    }

    #[test]
    fn just_above_a_boundary_moves_up_one_tier() {
        assert_eq!(classify(0.51).unwrap().index, 1);
        assert_eq!(classify(1.2).unwrap().index, 2);
        assert_eq!(classify(15.01).unwrap().index, 9);
    }

    #[test]
    fn heavy_packages_land_in_the_open_ended_tier() {
        assert_eq!(classify(15.001).unwrap().index, 9);
        assert_eq!(classify(250.0).unwrap().index, 9);
        assert_eq!(classify(f64::INFINITY).unwrap().index, 9);
    }

    #[test]
    fn negative_weight_is_rejected() {
        assert!(classify(-0.1).is_err());
    }

    #[test]
    fn labels_line_up_with_indices() {
        assert_eq!(classify(0.3).unwrap().label(), "0.00-0.50KG");
        assert_eq!(classify(42.0).unwrap().label(), "15.00KG+");
    }
}
