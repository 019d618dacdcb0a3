//! Event cost functions
//!
//! Each sub-problem of the tracker (frame linking, gap closing, merging,
//! splitting) is a variant of [`CostFunction`]. A variant carries only the
//! read-only parameters it needs and is evaluated on an [`EventSpots`]
//! triple. `Ok(None)` means the pairing is forbidden; the matrix builders
//! turn that into the blocking value.

pub mod primitives;
pub mod ratio;

pub use primitives::{
    euclidean_distance, feature_penalty, normalized_difference, penalized_squared_distance,
    squared_distance, FeaturePenalties,
};
pub use ratio::{intensity_ratio, max_ratio_multiplier, morphology_factor, ratio_cost, RatioBounds};

use crate::common::constants::{LINKING_COST_EPSILON, SEGMENT_COST_EPSILON};
use crate::tracker::errors::InputError;
use crate::types::Spot;

/// Spots taking part in one candidate event.
///
/// | Event       | `source`           | `target`            | `partner`                  |
/// |-------------|--------------------|---------------------|----------------------------|
/// | Linking     | spot in frame t    | spot in frame t+1   | -                          |
/// | Gap closing | segment end        | later segment start | -                          |
/// | Merging     | segment end        | middle point        | predecessor of the middle  |
/// | Splitting   | middle point       | segment start       | successor of the middle    |
#[derive(Debug, Clone, Copy)]
pub struct EventSpots<'s> {
    pub source: &'s Spot,
    pub target: &'s Spot,
    pub partner: Option<&'s Spot>,
}

impl<'s> EventSpots<'s> {
    /// Two-spot event (linking, gap closing)
    pub fn pair(source: &'s Spot, target: &'s Spot) -> Self {
        Self {
            source,
            target,
            partner: None,
        }
    }

    /// Three-spot event (merging, splitting)
    pub fn junction(source: &'s Spot, target: &'s Spot, partner: &'s Spot) -> Self {
        Self {
            source,
            target,
            partner: Some(partner),
        }
    }
}

/// Cost function of one tracking sub-problem.
#[derive(Debug, Clone, Copy)]
pub enum CostFunction<'c> {
    /// Frame t to frame t+1. Gate is strict: `d² < max²`.
    Linking {
        max_distance: f64,
        penalties: &'c FeaturePenalties,
    },
    /// Segment end to a later segment start within `max_frame_gap` frames.
    GapClosing {
        max_distance: f64,
        max_frame_gap: usize,
        penalties: &'c FeaturePenalties,
    },
    /// Segment end into the next-frame middle point of another segment.
    Merging {
        max_distance: f64,
        ratio_bounds: RatioBounds,
        penalties: &'c FeaturePenalties,
    },
    /// Middle point to the next-frame start of another segment.
    Splitting {
        max_distance: f64,
        ratio_bounds: RatioBounds,
        penalties: &'c FeaturePenalties,
        morphology_heuristic: bool,
    },
}

impl CostFunction<'_> {
    /// Cost of an event, `None` when it is forbidden.
    pub fn evaluate(&self, event: EventSpots<'_>) -> Result<Option<f64>, InputError> {
        let EventSpots {
            source,
            target,
            partner,
        } = event;

        match *self {
            CostFunction::Linking {
                max_distance,
                penalties,
            } => Ok(penalized_squared_distance(source, target, max_distance, true, penalties)?
                .map(|cost| cost + LINKING_COST_EPSILON)),

            CostFunction::GapClosing {
                max_distance,
                max_frame_gap,
                penalties,
            } => {
                if target.frame() <= source.frame() || target.frame() - source.frame() > max_frame_gap
                {
                    return Ok(None);
                }
                Ok(
                    penalized_squared_distance(source, target, max_distance, false, penalties)?
                        .map(|cost| cost + SEGMENT_COST_EPSILON),
                )
            }

            CostFunction::Merging {
                max_distance,
                ratio_bounds,
                penalties,
            } => {
                let Some(predecessor) = partner else {
                    return Ok(None);
                };
                // source = segment end, target = middle point
                let cost = junction_cost(
                    source,
                    target,
                    max_distance,
                    &ratio_bounds,
                    penalties,
                    || intensity_ratio(target, predecessor, source),
                )?;
                Ok(cost.map(|cost| cost + SEGMENT_COST_EPSILON))
            }

            CostFunction::Splitting {
                max_distance,
                ratio_bounds,
                penalties,
                morphology_heuristic,
            } => {
                let Some(sibling) = partner else {
                    return Ok(None);
                };
                // source = mother (middle point), target = daughter
                let cost = junction_cost(
                    source,
                    target,
                    max_distance,
                    &ratio_bounds,
                    penalties,
                    || intensity_ratio(source, sibling, target),
                )?;
                let Some(cost) = cost else {
                    return Ok(None);
                };
                let factor = if morphology_heuristic {
                    morphology_factor(source, sibling, target)?
                } else {
                    1.0
                };
                Ok(Some(cost * factor + SEGMENT_COST_EPSILON))
            }
        }
    }

    /// Short variant name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            CostFunction::Linking { .. } => "linking",
            CostFunction::GapClosing { .. } => "gap closing",
            CostFunction::Merging { .. } => "merging",
            CostFunction::Splitting { .. } => "splitting",
        }
    }
}

/// Shared gating for merge and split events: `target` one frame after
/// `source`, within distance, intensity ratio inside the band. The squared
/// distance is scaled by the feature penalty of `source` and `target`
/// before the ratio term.
fn junction_cost<F>(
    source: &Spot,
    target: &Spot,
    max_distance: f64,
    bounds: &RatioBounds,
    penalties: &FeaturePenalties,
    ratio: F,
) -> Result<Option<f64>, InputError>
where
    F: FnOnce() -> Result<f64, InputError>,
{
    if target.frame() != source.frame() + 1 {
        return Ok(None);
    }
    let Some(d2) = penalized_squared_distance(source, target, max_distance, false, penalties)?
    else {
        return Ok(None);
    };
    let ratio = ratio()?;
    if !bounds.contains(ratio) {
        return Ok(None);
    }
    Ok(Some(ratio_cost(d2, ratio)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Feature;

    fn spot(id: u64, frame: usize, x: f64, y: f64) -> Spot {
        Spot::from_coords(id, frame, &[x, y])
    }

    fn bright(id: u64, frame: usize, x: f64, y: f64, intensity: f64) -> Spot {
        spot(id, frame, x, y).with_feature(Feature::MeanIntensity, intensity)
    }

    #[test]
    fn test_linking_adds_epsilon_and_blocks_at_threshold() {
        let none = FeaturePenalties::new();
        let f = CostFunction::Linking {
            max_distance: 5.0,
            penalties: &none,
        };
        let a = spot(1, 0, 0.0, 0.0);
        let cost = f.evaluate(EventSpots::pair(&a, &spot(2, 1, 1.0, 1.0))).unwrap();
        assert_eq!(cost, Some(2.0 + LINKING_COST_EPSILON));

        let zero = f.evaluate(EventSpots::pair(&a, &spot(3, 1, 0.0, 0.0))).unwrap();
        assert_eq!(zero, Some(LINKING_COST_EPSILON));

        let at_max = f.evaluate(EventSpots::pair(&a, &spot(4, 1, 3.0, 4.0))).unwrap();
        assert_eq!(at_max, None);
    }

    #[test]
    fn test_gap_closing_frame_window() {
        let none = FeaturePenalties::new();
        let f = CostFunction::GapClosing {
            max_distance: 15.0,
            max_frame_gap: 2,
            penalties: &none,
        };
        let end = spot(1, 2, 0.0, 0.0);
        assert_eq!(
            f.evaluate(EventSpots::pair(&end, &spot(2, 4, 0.0, 1.0))).unwrap(),
            Some(1.0 + SEGMENT_COST_EPSILON)
        );
        assert_eq!(f.evaluate(EventSpots::pair(&end, &spot(3, 5, 0.0, 0.0))).unwrap(), None);
        assert_eq!(f.evaluate(EventSpots::pair(&end, &spot(4, 2, 0.0, 0.0))).unwrap(), None);
        assert_eq!(f.evaluate(EventSpots::pair(&end, &spot(5, 1, 0.0, 0.0))).unwrap(), None);
    }

    #[test]
    fn test_gap_closing_is_symmetric_in_distance() {
        let none = FeaturePenalties::new();
        let f = CostFunction::GapClosing {
            max_distance: 15.0,
            max_frame_gap: 3,
            penalties: &none,
        };
        let a = spot(1, 0, 1.0, 2.0);
        let b = spot(2, 2, 4.0, 6.0);
        let a2 = spot(3, 2, 1.0, 2.0);
        let b2 = spot(4, 0, 4.0, 6.0);
        assert_eq!(
            f.evaluate(EventSpots::pair(&a, &b)).unwrap(),
            f.evaluate(EventSpots::pair(&b2, &a2)).unwrap()
        );
    }

    #[test]
    fn test_splitting_conserved_intensity() {
        let none = FeaturePenalties::new();
        let f = CostFunction::Splitting {
            max_distance: 15.0,
            ratio_bounds: RatioBounds::default(),
            penalties: &none,
            morphology_heuristic: false,
        };
        let mother = bright(1, 3, 0.0, 0.0, 100.0);
        let sibling = bright(2, 4, 0.0, -1.0, 40.0);
        let daughter = bright(3, 4, 0.0, 1.0, 60.0);
        let cost = f
            .evaluate(EventSpots::junction(&mother, &daughter, &sibling))
            .unwrap();
        assert_eq!(cost, Some(1.0 + SEGMENT_COST_EPSILON));
    }

    #[test]
    fn test_splitting_blocked_outside_ratio_band() {
        let none = FeaturePenalties::new();
        let f = CostFunction::Splitting {
            max_distance: 15.0,
            ratio_bounds: RatioBounds::default(),
            penalties: &none,
            morphology_heuristic: false,
        };
        let mother = bright(1, 3, 0.0, 0.0, 10.0);
        let sibling = bright(2, 4, 0.0, -1.0, 40.0);
        let daughter = bright(3, 4, 0.0, 1.0, 60.0);
        // ratio = 0.1
        assert_eq!(
            f.evaluate(EventSpots::junction(&mother, &daughter, &sibling))
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_merging_requires_next_frame() {
        let none = FeaturePenalties::new();
        let f = CostFunction::Merging {
            max_distance: 15.0,
            ratio_bounds: RatioBounds::default(),
            penalties: &none,
        };
        let end = bright(1, 3, 0.0, 0.0, 50.0);
        let predecessor = bright(2, 3, 2.0, 0.0, 50.0);
        let middle = bright(3, 4, 1.0, 0.0, 200.0);
        // ratio = 200 / 100 = 2 -> d² * 2
        assert_eq!(
            f.evaluate(EventSpots::junction(&end, &middle, &predecessor))
                .unwrap(),
            Some(2.0 + SEGMENT_COST_EPSILON)
        );

        let late = bright(4, 5, 1.0, 0.0, 200.0);
        assert_eq!(
            f.evaluate(EventSpots::junction(&end, &late, &predecessor))
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_merging_missing_intensity_is_an_error() {
        let none = FeaturePenalties::new();
        let f = CostFunction::Merging {
            max_distance: 15.0,
            ratio_bounds: RatioBounds::default(),
            penalties: &none,
        };
        let end = spot(1, 3, 0.0, 0.0);
        let predecessor = bright(2, 3, 2.0, 0.0, 50.0);
        let middle = bright(3, 4, 1.0, 0.0, 200.0);
        let err = f
            .evaluate(EventSpots::junction(&end, &middle, &predecessor))
            .unwrap_err();
        assert!(matches!(err, InputError::MissingFeature { spot: 1, .. }));
    }

    #[test]
    fn test_stationary_gap_closing_is_never_free() {
        let none = FeaturePenalties::new();
        let f = CostFunction::GapClosing {
            max_distance: 15.0,
            max_frame_gap: 3,
            penalties: &none,
        };
        let end = spot(1, 2, 0.0, 0.0);
        let start = spot(2, 4, 0.0, 0.0);
        assert_eq!(
            f.evaluate(EventSpots::pair(&end, &start)).unwrap(),
            Some(SEGMENT_COST_EPSILON)
        );
    }

    #[test]
    fn test_merging_feature_penalty_scales_distance() {
        let mut penalties = FeaturePenalties::new();
        penalties.insert(Feature::Quality, 1.0);
        let f = CostFunction::Merging {
            max_distance: 15.0,
            ratio_bounds: RatioBounds::default(),
            penalties: &penalties,
        };
        let end = bright(1, 3, 0.0, 0.0, 50.0).with_feature(Feature::Quality, 1.0);
        let predecessor = bright(2, 3, 2.0, 0.0, 50.0);
        let middle = bright(3, 4, 1.0, 0.0, 200.0).with_feature(Feature::Quality, 3.0);
        // ndiff = 2 / 4 -> penalty 1.75; d² = 1; ratio 2
        let cost = f
            .evaluate(EventSpots::junction(&end, &middle, &predecessor))
            .unwrap()
            .unwrap();
        assert!((cost - (1.75 * 1.75 * 2.0 + SEGMENT_COST_EPSILON)).abs() < 1e-12);

        // The penalty feature must be on both spots of the event
        let bare = bright(4, 4, 1.0, 0.0, 200.0);
        let err = f
            .evaluate(EventSpots::junction(&end, &bare, &predecessor))
            .unwrap_err();
        assert!(matches!(err, InputError::MissingFeature { spot: 4, .. }));
    }

    #[test]
    fn test_splitting_feature_penalty_applies_before_ratio() {
        let mut penalties = FeaturePenalties::new();
        penalties.insert(Feature::EstimatedDiameter, 2.0);
        let f = CostFunction::Splitting {
            max_distance: 15.0,
            ratio_bounds: RatioBounds::default(),
            penalties: &penalties,
            morphology_heuristic: false,
        };
        let mother = bright(1, 3, 0.0, 0.0, 50.0).with_feature(Feature::EstimatedDiameter, 3.0);
        let sibling = bright(2, 4, 0.0, -1.0, 50.0);
        let daughter = bright(3, 4, 0.0, 2.0, 50.0).with_feature(Feature::EstimatedDiameter, 1.0);
        // d² = 4; ndiff = 2 / 4 -> penalty 1 + 1.5 * 2 * 0.5 = 2.5
        // ratio = 50 / 100 = 0.5 -> d² / r² = 4 * 6.25 / 0.25
        let cost = f
            .evaluate(EventSpots::junction(&mother, &daughter, &sibling))
            .unwrap()
            .unwrap();
        assert!((cost - (100.0 + SEGMENT_COST_EPSILON)).abs() < 1e-9);

        // Outside the distance gate the penalty feature is never read
        let far = bright(4, 4, 0.0, 20.0, 50.0);
        assert_eq!(
            f.evaluate(EventSpots::junction(&mother, &far, &sibling))
                .unwrap(),
            None
        );
    }
}
