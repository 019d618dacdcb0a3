//! Intensity-ratio costs for merge and split events
//!
//! A merge or split conserves total intensity: the spot at the junction
//! should be about as bright as the two spots on the other side combined.
//! The ratio `I(junction) / (I(a) + I(b))` drives both the gate and the
//! cost multiplier.

use serde::{Deserialize, Serialize};

use crate::common::constants::{MORPHOLOGY_RATIO_TOLERANCE, MORPHOLOGY_STEP};
use crate::tracker::errors::InputError;
use crate::types::{Feature, MorphologyClass, Spot};

/// Accepted `[min, max]` band for the intensity ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioBounds {
    pub min: f64,
    pub max: f64,
}

impl RatioBounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `ratio` lies inside the band (inclusive). NaN never does.
    #[inline]
    pub fn contains(&self, ratio: f64) -> bool {
        ratio >= self.min && ratio <= self.max
    }
}

impl Default for RatioBounds {
    fn default() -> Self {
        let (min, max) = crate::common::constants::DEFAULT_INTENSITY_RATIO_BOUNDS;
        Self { min, max }
    }
}

/// Intensity ratio `I(junction) / (I(a) + I(b))` over mean intensity.
pub fn intensity_ratio(junction: &Spot, a: &Spot, b: &Spot) -> Result<f64, InputError> {
    let ij = junction.require_feature(Feature::MeanIntensity)?;
    let ia = a.require_feature(Feature::MeanIntensity)?;
    let ib = b.require_feature(Feature::MeanIntensity)?;
    Ok(ij / (ia + ib))
}

/// Scale a squared distance by the intensity ratio.
///
/// `d² · ratio` when `ratio >= 1`, `d² / ratio²` otherwise. Both branches
/// give `d²` at `ratio == 1`.
#[inline]
pub fn ratio_cost(d2: f64, ratio: f64) -> f64 {
    if ratio >= 1.0 {
        d2 * ratio
    } else {
        d2 / (ratio * ratio)
    }
}

/// Largest multiplier [`ratio_cost`] can apply to `d²` inside `bounds`.
pub fn max_ratio_multiplier(bounds: &RatioBounds) -> f64 {
    bounds.max.max(1.0 / (bounds.min * bounds.min))
}

/// Morphology agreement factor for a division `mother -> {sibling, daughter}`.
///
/// Starts at 1.0 and moves by a fixed step per criterion: down when the
/// criterion agrees, up when it does not. Criteria are mother and daughter
/// sharing a shape class, and the daughter matching the sibling within
/// tolerance on diameter and on mean intensity.
///
/// Empirical heuristic; the step size and the additive combination are
/// tunable, not derived.
pub fn morphology_factor(mother: &Spot, sibling: &Spot, daughter: &Spot) -> Result<f64, InputError> {
    let mut factor = 1.0;
    let mut score = |agrees: bool| {
        if agrees {
            factor -= MORPHOLOGY_STEP;
        } else {
            factor += MORPHOLOGY_STEP;
        }
    };

    let mother_class = MorphologyClass::from_feature(mother.require_feature(Feature::Morphology)?);
    let daughter_class =
        MorphologyClass::from_feature(daughter.require_feature(Feature::Morphology)?);
    score(mother_class.is_some() && mother_class == daughter_class);

    let diameter_ratio = daughter.require_feature(Feature::EstimatedDiameter)?
        / sibling.require_feature(Feature::EstimatedDiameter)?;
    score(within_tolerance(diameter_ratio));

    let intensity_ratio = daughter.require_feature(Feature::MeanIntensity)?
        / sibling.require_feature(Feature::MeanIntensity)?;
    score(within_tolerance(intensity_ratio));

    Ok(factor)
}

#[inline]
fn within_tolerance(ratio: f64) -> bool {
    (ratio - 1.0).abs() <= MORPHOLOGY_RATIO_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(id: u64, intensity: f64, diameter: f64, class: MorphologyClass) -> Spot {
        Spot::from_coords(id, 0, &[0.0, 0.0])
            .with_feature(Feature::MeanIntensity, intensity)
            .with_feature(Feature::EstimatedDiameter, diameter)
            .with_feature(Feature::Morphology, class.as_feature())
    }

    #[test]
    fn test_ratio_cost_is_continuous_at_one() {
        assert_eq!(ratio_cost(4.0, 1.0), 4.0);
        let below = ratio_cost(4.0, 1.0 - 1e-12);
        assert!((below - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_ratio_cost_branches() {
        assert_eq!(ratio_cost(2.0, 2.0), 4.0);
        assert_eq!(ratio_cost(2.0, 0.5), 8.0);
    }

    #[test]
    fn test_intensity_ratio() {
        let mother = blob(1, 100.0, 5.0, MorphologyClass::Sphere);
        let sibling = blob(2, 40.0, 5.0, MorphologyClass::Sphere);
        let daughter = blob(3, 60.0, 5.0, MorphologyClass::Sphere);
        assert_eq!(intensity_ratio(&mother, &sibling, &daughter).unwrap(), 1.0);
    }

    #[test]
    fn test_bounds() {
        let bounds = RatioBounds::default();
        assert!(bounds.contains(0.5));
        assert!(bounds.contains(4.0));
        assert!(!bounds.contains(4.01));
        assert!(!bounds.contains(f64::NAN));
        assert_eq!(max_ratio_multiplier(&bounds), 4.0);
        assert_eq!(max_ratio_multiplier(&RatioBounds::new(0.25, 2.0)), 16.0);
    }

    #[test]
    fn test_morphology_factor_all_agree() {
        let mother = blob(1, 200.0, 6.0, MorphologyClass::Prolate);
        let sibling = blob(2, 100.0, 5.0, MorphologyClass::Sphere);
        let daughter = blob(3, 105.0, 5.2, MorphologyClass::Prolate);
        let factor = morphology_factor(&mother, &sibling, &daughter).unwrap();
        assert!((factor - 0.85).abs() < 1e-12);
    }

    #[test]
    fn test_morphology_factor_all_disagree() {
        let mother = blob(1, 200.0, 6.0, MorphologyClass::Prolate);
        let sibling = blob(2, 100.0, 5.0, MorphologyClass::Sphere);
        let daughter = blob(3, 50.0, 9.0, MorphologyClass::Oblate);
        let factor = morphology_factor(&mother, &sibling, &daughter).unwrap();
        assert!((factor - 1.15).abs() < 1e-12);
    }

    #[test]
    fn test_morphology_factor_needs_features() {
        let mother = Spot::from_coords(1, 0, &[0.0, 0.0]);
        let other = blob(2, 1.0, 1.0, MorphologyClass::Sphere);
        let err = morphology_factor(&mother, &other, &other).unwrap_err();
        assert!(matches!(
            err,
            InputError::MissingFeature {
                spot: 1,
                feature: Feature::Morphology
            }
        ));
    }
}
