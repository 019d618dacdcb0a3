//! Spot fixtures and randomized scenarios
//!
//! Centralizes spot construction so integration tests read as scenarios
//! rather than setup code.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use lap_tracker::{Feature, MorphologyClass, Spot, SpotCollection, TrackerConfig};

//=============================================================================
// Spot builders
//=============================================================================

/// 2D spot without features
pub fn spot(id: u64, frame: usize, x: f64, y: f64) -> Spot {
    Spot::from_coords(id, frame, &[x, y])
}

/// 2D spot with a mean intensity
pub fn bright_spot(id: u64, frame: usize, x: f64, y: f64, intensity: f64) -> Spot {
    spot(id, frame, x, y).with_feature(Feature::MeanIntensity, intensity)
}

/// Group spots by frame, panicking on malformed fixtures.
pub fn collection(spots: Vec<Spot>) -> SpotCollection {
    SpotCollection::from_spots(spots).expect("valid fixture")
}

/// Look up a spot reference by detector id.
pub fn by_id(spots: &SpotCollection, id: u64) -> lap_tracker::SpotRef {
    spots
        .iter()
        .find(|(_, s)| s.id() == id)
        .map(|(r, _)| r)
        .expect("spot id in fixture")
}

//=============================================================================
// Configurations
//=============================================================================

/// Small-distance config with every event type enabled.
pub fn all_events_config(num_workers: usize) -> TrackerConfig {
    TrackerConfig::builder()
        .linking_max_distance(5.0)
        .gap_closing_max_distance(8.0)
        .max_frame_gap(2)
        .merging(true)
        .merging_max_distance(5.0)
        .splitting(true)
        .splitting_max_distance(5.0)
        .num_workers(num_workers)
        .build()
        .expect("valid config")
}

//=============================================================================
// Randomized scenarios
//=============================================================================

/// Random 2D spots with every feature the cost functions read.
///
/// Some frames are skipped and some are empty so missing-frame handling is
/// exercised too.
pub fn random_scenario(seed: u64, num_frames: usize, max_per_frame: usize) -> SpotCollection {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut spots = Vec::new();
    let mut id = 0u64;

    for frame in 0..num_frames {
        if rng.gen_bool(0.1) {
            continue;
        }
        let count = rng.gen_range(0..=max_per_frame);
        for _ in 0..count {
            id += 1;
            let class = match rng.gen_range(0..4) {
                0 => MorphologyClass::Sphere,
                1 => MorphologyClass::Oblate,
                2 => MorphologyClass::Prolate,
                _ => MorphologyClass::Ellipsoid,
            };
            spots.push(
                Spot::from_coords(
                    id,
                    frame,
                    &[rng.gen_range(0.0..20.0), rng.gen_range(0.0..20.0)],
                )
                .with_feature(Feature::MeanIntensity, rng.gen_range(10.0..200.0))
                .with_feature(Feature::EstimatedDiameter, rng.gen_range(2.0..6.0))
                .with_feature(Feature::Morphology, class.as_feature()),
            );
        }
    }

    collection(spots)
}
