//! Spot types and the frame-indexed spot store
//!
//! A [`Spot`] is a detected point object produced by an upstream detector.
//! Spots are read-only to the tracker: their frame and position are fixed
//! at creation, and the tracker only ever reads their features.

use std::collections::BTreeMap;
use std::ops::Range;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::tracker::errors::InputError;

/// Scalar spot feature keys understood by the cost functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Feature {
    /// Mean pixel intensity inside the spot
    MeanIntensity,
    /// Median pixel intensity inside the spot
    MedianIntensity,
    /// Estimated spot diameter, in the same unit as the coordinates
    EstimatedDiameter,
    /// Shape class, encoded as a [`MorphologyClass`] discriminant
    Morphology,
    /// Contrast between spot and its surroundings
    Contrast,
    /// Detector quality score
    Quality,
}

impl Feature {
    /// Upper-case key, as used in configuration files.
    pub fn key(&self) -> &'static str {
        match self {
            Feature::MeanIntensity => "MEAN_INTENSITY",
            Feature::MedianIntensity => "MEDIAN_INTENSITY",
            Feature::EstimatedDiameter => "ESTIMATED_DIAMETER",
            Feature::Morphology => "MORPHOLOGY",
            Feature::Contrast => "CONTRAST",
            Feature::Quality => "QUALITY",
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Blob shape classes stored in [`Feature::Morphology`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MorphologyClass {
    /// All semi-axes roughly equal
    Sphere,
    /// Flat disk (a ≅ b > c)
    Oblate,
    /// Rugby ball (a > b ≅ c)
    Prolate,
    /// No two semi-axes alike
    Ellipsoid,
}

impl MorphologyClass {
    /// Decode a morphology feature value. Values are rounded to the
    /// nearest class index; anything out of range is `None`.
    pub fn from_feature(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        match value.round() as i64 {
            0 => Some(MorphologyClass::Sphere),
            1 => Some(MorphologyClass::Oblate),
            2 => Some(MorphologyClass::Prolate),
            3 => Some(MorphologyClass::Ellipsoid),
            _ => None,
        }
    }

    /// Encode as a feature value.
    pub fn as_feature(&self) -> f64 {
        match self {
            MorphologyClass::Sphere => 0.0,
            MorphologyClass::Oblate => 1.0,
            MorphologyClass::Prolate => 2.0,
            MorphologyClass::Ellipsoid => 3.0,
        }
    }
}

/// A detected point object.
#[derive(Debug, Clone, PartialEq)]
pub struct Spot {
    id: u64,
    frame: usize,
    position: DVector<f64>,
    features: BTreeMap<Feature, f64>,
}

impl Spot {
    /// Create a spot without features.
    pub fn new(id: u64, frame: usize, position: DVector<f64>) -> Self {
        Self {
            id,
            frame,
            position,
            features: BTreeMap::new(),
        }
    }

    /// Create a spot from a coordinate slice.
    pub fn from_coords(id: u64, frame: usize, coords: &[f64]) -> Self {
        Self::new(id, frame, DVector::from_column_slice(coords))
    }

    /// Builder-style feature setter, used by detectors when emitting spots.
    pub fn with_feature(mut self, feature: Feature, value: f64) -> Self {
        self.features.insert(feature, value);
        self
    }

    /// Detector-assigned identifier
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Frame index
    #[inline]
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Position vector
    #[inline]
    pub fn position(&self) -> &DVector<f64> {
        &self.position
    }

    /// Number of spatial dimensions
    #[inline]
    pub fn dim(&self) -> usize {
        self.position.len()
    }

    /// Feature value, if present.
    #[inline]
    pub fn feature(&self, feature: Feature) -> Option<f64> {
        self.features.get(&feature).copied()
    }

    /// Feature value, or [`InputError::MissingFeature`].
    pub fn require_feature(&self, feature: Feature) -> Result<f64, InputError> {
        self.feature(feature).ok_or(InputError::MissingFeature {
            spot: self.id,
            feature,
        })
    }

    /// All features carried by this spot
    pub fn features(&self) -> &BTreeMap<Feature, f64> {
        &self.features
    }
}

/// Stable index of a spot inside a [`SpotCollection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpotRef(pub usize);

impl SpotRef {
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Spots of one frame, stored as a range into the flattened spot list.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FrameSlot {
    frame: usize,
    range: Range<usize>,
}

/// Time-ordered, flattened spot store.
///
/// Spots are grouped by frame with strictly increasing frame indices.
/// The collection is immutable once built; [`SpotRef`] indices stay valid
/// for its whole lifetime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpotCollection {
    spots: Vec<Spot>,
    frames: Vec<FrameSlot>,
    dim: Option<usize>,
}

impl SpotCollection {
    /// Build a collection from `(frame_index, spots)` pairs.
    ///
    /// Frame indices must be strictly increasing, every spot must carry the
    /// frame index it is listed under, and all spots must share the same
    /// dimensionality with finite coordinates.
    pub fn from_frames<I>(frames: I) -> Result<Self, InputError>
    where
        I: IntoIterator<Item = (usize, Vec<Spot>)>,
    {
        let mut collection = SpotCollection::default();
        let mut previous: Option<usize> = None;

        for (frame, spots) in frames {
            if let Some(prev) = previous {
                if frame <= prev {
                    return Err(InputError::NonMonotonicFrames {
                        previous: prev,
                        current: frame,
                    });
                }
            }
            previous = Some(frame);

            let start = collection.spots.len();
            for spot in spots {
                collection.check_spot(frame, &spot)?;
                collection.spots.push(spot);
            }
            collection.frames.push(FrameSlot {
                frame,
                range: start..collection.spots.len(),
            });
        }

        Ok(collection)
    }

    /// Group loose spots by their own frame index.
    pub fn from_spots<I>(spots: I) -> Result<Self, InputError>
    where
        I: IntoIterator<Item = Spot>,
    {
        let mut grouped: BTreeMap<usize, Vec<Spot>> = BTreeMap::new();
        for spot in spots {
            grouped.entry(spot.frame()).or_default().push(spot);
        }
        Self::from_frames(grouped)
    }

    fn check_spot(&mut self, frame: usize, spot: &Spot) -> Result<(), InputError> {
        if spot.frame() != frame {
            return Err(InputError::FrameMismatch {
                spot: spot.id(),
                expected: frame,
                actual: spot.frame(),
            });
        }
        match self.dim {
            Some(dim) if dim != spot.dim() => {
                return Err(InputError::InconsistentDimensionality {
                    spot: spot.id(),
                    expected: dim,
                    actual: spot.dim(),
                });
            }
            None => self.dim = Some(spot.dim()),
            _ => {}
        }
        if spot.position().iter().any(|c| !c.is_finite()) {
            return Err(InputError::NonFiniteCoordinate { spot: spot.id() });
        }
        Ok(())
    }

    /// Total number of spots
    #[inline]
    pub fn len(&self) -> usize {
        self.spots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.spots.is_empty()
    }

    /// Number of frames (including frames without spots)
    #[inline]
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Spatial dimensionality shared by all spots, `None` when empty
    #[inline]
    pub fn dim(&self) -> Option<usize> {
        self.dim
    }

    /// Frame indices in increasing order
    pub fn frame_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.frames.iter().map(|slot| slot.frame)
    }

    /// Spots of a frame, empty if the frame is absent.
    pub fn frame(&self, frame: usize) -> &[Spot] {
        match self.frames.binary_search_by_key(&frame, |slot| slot.frame) {
            Ok(i) => &self.spots[self.frames[i].range.clone()],
            Err(_) => &[],
        }
    }

    /// Reference of the `offset`-th spot of a frame.
    pub fn spot_ref(&self, frame: usize, offset: usize) -> Option<SpotRef> {
        let i = self
            .frames
            .binary_search_by_key(&frame, |slot| slot.frame)
            .ok()?;
        let range = &self.frames[i].range;
        (offset < range.len()).then(|| SpotRef(range.start + offset))
    }

    /// First flattened index of a frame (used to convert frame-local offsets).
    pub(crate) fn frame_range(&self, frame: usize) -> Range<usize> {
        match self.frames.binary_search_by_key(&frame, |slot| slot.frame) {
            Ok(i) => self.frames[i].range.clone(),
            Err(_) => 0..0,
        }
    }

    /// Pairs of present frames `(t, t+1)` eligible for frame-to-frame linking.
    pub fn linkable_frame_pairs(&self) -> Vec<(usize, usize)> {
        self.frames
            .windows(2)
            .filter(|w| w[1].frame == w[0].frame + 1)
            .map(|w| (w[0].frame, w[1].frame))
            .collect()
    }

    /// Spot by reference
    #[inline]
    pub fn get(&self, spot: SpotRef) -> &Spot {
        &self.spots[spot.0]
    }

    /// Spot by reference, `None` if out of range.
    #[inline]
    pub fn try_get(&self, spot: SpotRef) -> Option<&Spot> {
        self.spots.get(spot.0)
    }

    /// All spots, frame-ordered
    pub fn spots(&self) -> &[Spot] {
        &self.spots
    }

    /// Iterate over `(SpotRef, &Spot)`
    pub fn iter(&self) -> impl Iterator<Item = (SpotRef, &Spot)> {
        self.spots.iter().enumerate().map(|(i, s)| (SpotRef(i), s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spot(id: u64, frame: usize, x: f64, y: f64) -> Spot {
        Spot::from_coords(id, frame, &[x, y])
    }

    #[test]
    fn test_from_frames_flattens_in_order() {
        let spots = SpotCollection::from_frames(vec![
            (0, vec![spot(1, 0, 0.0, 0.0), spot(2, 0, 1.0, 1.0)]),
            (1, vec![spot(3, 1, 2.0, 2.0)]),
            (3, vec![]),
        ])
        .unwrap();

        assert_eq!(spots.len(), 3);
        assert_eq!(spots.num_frames(), 3);
        assert_eq!(spots.frame(0).len(), 2);
        assert_eq!(spots.frame(2).len(), 0);
        assert_eq!(spots.spot_ref(1, 0), Some(SpotRef(2)));
        assert_eq!(spots.get(SpotRef(2)).id(), 3);
        assert_eq!(spots.dim(), Some(2));
    }

    #[test]
    fn test_non_monotonic_frames_rejected() {
        let err = SpotCollection::from_frames(vec![(2, vec![]), (2, vec![])]).unwrap_err();
        assert_eq!(
            err,
            InputError::NonMonotonicFrames {
                previous: 2,
                current: 2
            }
        );

        let err = SpotCollection::from_frames(vec![(3, vec![]), (1, vec![])]).unwrap_err();
        assert!(matches!(err, InputError::NonMonotonicFrames { .. }));
    }

    #[test]
    fn test_frame_mismatch_rejected() {
        let err = SpotCollection::from_frames(vec![(0, vec![spot(7, 1, 0.0, 0.0)])]).unwrap_err();
        assert_eq!(
            err,
            InputError::FrameMismatch {
                spot: 7,
                expected: 0,
                actual: 1
            }
        );
    }

    #[test]
    fn test_mixed_dimensionality_rejected() {
        let err = SpotCollection::from_frames(vec![(
            0,
            vec![spot(1, 0, 0.0, 0.0), Spot::from_coords(2, 0, &[0.0, 0.0, 0.0])],
        )])
        .unwrap_err();
        assert!(matches!(
            err,
            InputError::InconsistentDimensionality {
                spot: 2,
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_linkable_pairs_skip_missing_frames() {
        let spots = SpotCollection::from_spots(vec![
            spot(1, 0, 0.0, 0.0),
            spot(2, 1, 0.0, 0.0),
            spot(3, 3, 0.0, 0.0),
            spot(4, 4, 0.0, 0.0),
        ])
        .unwrap();
        assert_eq!(spots.linkable_frame_pairs(), vec![(0, 1), (3, 4)]);
    }

    #[test]
    fn test_morphology_roundtrip_and_bounds() {
        assert_eq!(
            MorphologyClass::from_feature(MorphologyClass::Prolate.as_feature()),
            Some(MorphologyClass::Prolate)
        );
        assert_eq!(MorphologyClass::from_feature(7.0), None);
        assert_eq!(MorphologyClass::from_feature(f64::NAN), None);
    }
}
