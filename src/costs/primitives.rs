//! Distance and feature-penalty primitives
//!
//! Pure functions over pairs of spots. Everything here is deterministic
//! and side-effect free so matrix rows can be filled in any order.

use std::collections::BTreeMap;

use crate::common::constants::FEATURE_PENALTY_SCALE;
use crate::tracker::errors::InputError;
use crate::types::{Feature, Spot};

/// Per-feature penalty weights.
pub type FeaturePenalties = BTreeMap<Feature, f64>;

/// Squared Euclidean distance between two spots.
///
/// Both spots must have the same dimensionality.
pub fn squared_distance(a: &Spot, b: &Spot) -> Result<f64, InputError> {
    if a.dim() != b.dim() {
        return Err(InputError::DimensionMismatch {
            first: a.id(),
            second: b.id(),
            expected: a.dim(),
            actual: b.dim(),
        });
    }
    Ok(a.position()
        .iter()
        .zip(b.position().iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum())
}

/// Euclidean distance between two spots.
#[inline]
pub fn euclidean_distance(a: &Spot, b: &Spot) -> Result<f64, InputError> {
    squared_distance(a, b).map(f64::sqrt)
}

/// Normalized difference `|a - b| / (a + b)`, zero when both are zero.
#[inline]
pub fn normalized_difference(a: f64, b: f64) -> f64 {
    let sum = a + b;
    if sum == 0.0 {
        0.0
    } else {
        (a - b).abs() / sum
    }
}

/// Multiplicative penalty `1 + Σ 1.5 · w · ndiff(f)` over the weighted features.
///
/// Each weighted feature must be present on both spots.
pub fn feature_penalty(a: &Spot, b: &Spot, penalties: &FeaturePenalties) -> Result<f64, InputError> {
    let mut penalty = 1.0;
    for (&feature, &weight) in penalties {
        let fa = a.require_feature(feature)?;
        let fb = b.require_feature(feature)?;
        penalty += FEATURE_PENALTY_SCALE * weight * normalized_difference(fa, fb);
    }
    Ok(penalty)
}

/// Squared distance scaled by the squared feature penalty.
///
/// Returns `None` when the pair fails the distance gate. Features are only
/// read for pairs inside the gate.
pub fn penalized_squared_distance(
    a: &Spot,
    b: &Spot,
    max_distance: f64,
    strict_gate: bool,
    penalties: &FeaturePenalties,
) -> Result<Option<f64>, InputError> {
    let d2 = squared_distance(a, b)?;
    let max2 = max_distance * max_distance;
    let gated_out = if strict_gate { d2 >= max2 } else { d2 > max2 };
    if gated_out {
        return Ok(None);
    }
    let penalty = feature_penalty(a, b, penalties)?;
    Ok(Some(d2 * penalty * penalty))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distances() {
        let a = Spot::from_coords(1, 0, &[0.0, 0.0]);
        let b = Spot::from_coords(2, 1, &[3.0, 4.0]);
        assert_eq!(squared_distance(&a, &b).unwrap(), 25.0);
        assert_eq!(euclidean_distance(&a, &b).unwrap(), 5.0);
        assert_eq!(squared_distance(&b, &a).unwrap(), 25.0);
    }

    #[test]
    fn test_dimension_mismatch_is_reported() {
        let a = Spot::from_coords(1, 0, &[0.0, 0.0]);
        let b = Spot::from_coords(2, 1, &[0.0, 0.0, 0.0]);
        let err = squared_distance(&a, &b).unwrap_err();
        assert_eq!(
            err,
            InputError::DimensionMismatch {
                first: 1,
                second: 2,
                expected: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn test_feature_penalty() {
        let a = Spot::from_coords(1, 0, &[0.0, 0.0]).with_feature(Feature::MeanIntensity, 100.0);
        let b = Spot::from_coords(2, 1, &[1.0, 0.0]).with_feature(Feature::MeanIntensity, 300.0);
        let mut penalties = FeaturePenalties::new();
        assert_eq!(feature_penalty(&a, &b, &penalties).unwrap(), 1.0);

        penalties.insert(Feature::MeanIntensity, 1.0);
        // ndiff = 200 / 400 = 0.5 -> 1 + 1.5 * 0.5
        assert!((feature_penalty(&a, &b, &penalties).unwrap() - 1.75).abs() < 1e-12);

        let cost = penalized_squared_distance(&a, &b, 5.0, true, &penalties)
            .unwrap()
            .unwrap();
        assert!((cost - 1.75 * 1.75).abs() < 1e-12);
    }

    #[test]
    fn test_missing_feature_only_read_inside_gate() {
        let a = Spot::from_coords(1, 0, &[0.0, 0.0]);
        let near = Spot::from_coords(2, 1, &[1.0, 0.0]);
        let far = Spot::from_coords(3, 1, &[100.0, 0.0]);
        let mut penalties = FeaturePenalties::new();
        penalties.insert(Feature::Quality, 1.0);

        assert_eq!(
            penalized_squared_distance(&a, &far, 5.0, true, &penalties).unwrap(),
            None
        );
        let err = penalized_squared_distance(&a, &near, 5.0, true, &penalties).unwrap_err();
        assert_eq!(
            err,
            InputError::MissingFeature {
                spot: 1,
                feature: Feature::Quality
            }
        );
    }

    #[test]
    fn test_gate_strictness() {
        let a = Spot::from_coords(1, 0, &[0.0, 0.0]);
        let b = Spot::from_coords(2, 1, &[5.0, 0.0]);
        let none = FeaturePenalties::new();
        assert_eq!(penalized_squared_distance(&a, &b, 5.0, true, &none).unwrap(), None);
        assert_eq!(
            penalized_squared_distance(&a, &b, 5.0, false, &none).unwrap(),
            Some(25.0)
        );
    }

    #[test]
    fn test_normalized_difference_zero_sum() {
        assert_eq!(normalized_difference(0.0, 0.0), 0.0);
        assert_eq!(normalized_difference(1.0, 1.0), 0.0);
        assert_eq!(normalized_difference(1.0, 3.0), 0.5);
    }
}
