//! Tracker configuration
//!
//! One [`TrackerConfig`] drives a whole run. It is grouped by stage
//! (linking, gap closing, merging, splitting) plus the settings shared by
//! every matrix: alternative-cost policy, blocking value and resources.
//!
//! Every field has a default, so a config can be built from scratch with
//! [`TrackerConfig::builder`], taken as [`Default`], or parsed from partial
//! JSON. Validation is eager: [`TrackerConfig::validate`] runs before any
//! matrix is built.

use serde::{Deserialize, Serialize};

use crate::common::constants::*;
use crate::costs::{max_ratio_multiplier, CostFunction, FeaturePenalties, RatioBounds};
use crate::types::Feature;

use super::errors::ConfigError;

// ============================================================================
// Stage configurations
// ============================================================================

/// Frame-to-frame linking settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkingConfig {
    /// Spots at or beyond this distance are never linked.
    pub max_distance: f64,
    /// Feature weights scaling the squared distance.
    pub feature_penalties: FeaturePenalties,
}

impl Default for LinkingConfig {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_LINKING_MAX_DISTANCE,
            feature_penalties: FeaturePenalties::new(),
        }
    }
}

/// Gap-closing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapClosingConfig {
    pub enabled: bool,
    pub max_distance: f64,
    /// Largest frame difference bridged between a segment end and a start.
    pub max_frame_gap: usize,
    pub feature_penalties: FeaturePenalties,
}

impl Default for GapClosingConfig {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_ALLOW_GAP_CLOSING,
            max_distance: DEFAULT_GAP_CLOSING_MAX_DISTANCE,
            max_frame_gap: DEFAULT_GAP_CLOSING_MAX_FRAME_GAP,
            feature_penalties: FeaturePenalties::new(),
        }
    }
}

/// Merging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergingConfig {
    pub enabled: bool,
    pub max_distance: f64,
    /// Feature weights between the segment end and the middle point.
    pub feature_penalties: FeaturePenalties,
}

impl Default for MergingConfig {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_ALLOW_MERGING,
            max_distance: DEFAULT_MERGING_MAX_DISTANCE,
            feature_penalties: FeaturePenalties::new(),
        }
    }
}

/// Splitting settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplittingConfig {
    pub enabled: bool,
    pub max_distance: f64,
    /// Feature weights between the mother and the daughter.
    pub feature_penalties: FeaturePenalties,
    /// Scale split costs by the morphology agreement factor.
    pub morphology_heuristic: bool,
}

impl Default for SplittingConfig {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_ALLOW_SPLITTING,
            max_distance: DEFAULT_SPLITTING_MAX_DISTANCE,
            feature_penalties: FeaturePenalties::new(),
            morphology_heuristic: false,
        }
    }
}

// ============================================================================
// TrackerConfig
// ============================================================================

/// Full configuration of a tracking run.
///
/// # Example
///
/// ```
/// use lap_tracker::TrackerConfig;
///
/// let config = TrackerConfig::builder()
///     .linking_max_distance(5.0)
///     .max_frame_gap(3)
///     .splitting(true)
///     .num_workers(2)
///     .build()
///     .unwrap();
/// assert!(config.splitting.enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub linking: LinkingConfig,
    pub gap_closing: GapClosingConfig,
    pub merging: MergingConfig,
    pub splitting: SplittingConfig,
    /// Accepted intensity-ratio band for merges and splits.
    pub intensity_ratio_bounds: RatioBounds,
    /// Multiplier on the percentile cutoff giving the alternative cost.
    pub alternative_cost_factor: f64,
    /// Percentile of finite costs used as cutoff, in `(0, 1]`.
    pub cutoff_percentile: f64,
    /// Cost written for forbidden pairings. Must be finite and above every
    /// achievable cost.
    pub blocking_value: f64,
    /// Threads in the run-scoped worker pool.
    pub num_workers: usize,
    /// Largest square matrix, in elements.
    pub max_matrix_elements: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            linking: LinkingConfig::default(),
            gap_closing: GapClosingConfig::default(),
            merging: MergingConfig::default(),
            splitting: SplittingConfig::default(),
            intensity_ratio_bounds: RatioBounds::default(),
            alternative_cost_factor: DEFAULT_ALTERNATIVE_COST_FACTOR,
            cutoff_percentile: DEFAULT_CUTOFF_PERCENTILE,
            blocking_value: DEFAULT_BLOCKING_VALUE,
            num_workers: default_num_workers(),
            max_matrix_elements: DEFAULT_MAX_MATRIX_ELEMENTS,
        }
    }
}

/// Available hardware parallelism, at least 1.
pub fn default_num_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl TrackerConfig {
    /// Create with builder pattern.
    pub fn builder() -> TrackerConfigBuilder {
        TrackerConfigBuilder::default()
    }

    /// Parse a (possibly partial) JSON document and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: TrackerConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::new("json", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::new("json", e.to_string()))
    }

    /// Whether the segment-level stage has anything to do.
    pub fn any_segment_event_enabled(&self) -> bool {
        self.gap_closing.enabled || self.merging.enabled || self.splitting.enabled
    }

    pub fn linking_cost(&self) -> CostFunction<'_> {
        CostFunction::Linking {
            max_distance: self.linking.max_distance,
            penalties: &self.linking.feature_penalties,
        }
    }

    pub fn gap_closing_cost(&self) -> Option<CostFunction<'_>> {
        self.gap_closing.enabled.then(|| CostFunction::GapClosing {
            max_distance: self.gap_closing.max_distance,
            max_frame_gap: self.gap_closing.max_frame_gap,
            penalties: &self.gap_closing.feature_penalties,
        })
    }

    pub fn merging_cost(&self) -> Option<CostFunction<'_>> {
        self.merging.enabled.then(|| CostFunction::Merging {
            max_distance: self.merging.max_distance,
            ratio_bounds: self.intensity_ratio_bounds,
            penalties: &self.merging.feature_penalties,
        })
    }

    pub fn splitting_cost(&self) -> Option<CostFunction<'_>> {
        self.splitting.enabled.then(|| CostFunction::Splitting {
            max_distance: self.splitting.max_distance,
            ratio_bounds: self.intensity_ratio_bounds,
            penalties: &self.splitting.feature_penalties,
            morphology_heuristic: self.splitting.morphology_heuristic,
        })
    }

    /// Upper bound on any finite cost a run can write, alternative costs
    /// included.
    pub fn max_achievable_cost(&self) -> f64 {
        let squared = |d: f64| d * d;
        let penalized = |max_distance: f64, penalties: &FeaturePenalties| {
            let total_weight: f64 = penalties.values().map(|w| w.abs()).sum();
            let penalty = 1.0 + FEATURE_PENALTY_SCALE * total_weight;
            squared(max_distance) * penalty * penalty
        };

        let mut max_cost = penalized(self.linking.max_distance, &self.linking.feature_penalties)
            + LINKING_COST_EPSILON;

        if self.gap_closing.enabled {
            max_cost = max_cost.max(
                penalized(
                    self.gap_closing.max_distance,
                    &self.gap_closing.feature_penalties,
                ) + SEGMENT_COST_EPSILON,
            );
        }
        let ratio = max_ratio_multiplier(&self.intensity_ratio_bounds);
        if self.merging.enabled {
            let merging = penalized(
                self.merging.max_distance,
                &self.merging.feature_penalties,
            );
            max_cost = max_cost.max(merging * ratio + SEGMENT_COST_EPSILON);
        }
        if self.splitting.enabled {
            let morphology = if self.splitting.morphology_heuristic {
                1.0 + MORPHOLOGY_CRITERIA as f64 * MORPHOLOGY_STEP
            } else {
                1.0
            };
            let splitting = penalized(
                self.splitting.max_distance,
                &self.splitting.feature_penalties,
            );
            max_cost = max_cost.max(splitting * ratio * morphology + SEGMENT_COST_EPSILON);
        }

        max_cost.max(max_cost * self.alternative_cost_factor)
    }

    /// Check every field; the error names the first offending one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive_distance("linking.max_distance", self.linking.max_distance)?;
        finite_weights("linking.feature_penalties", &self.linking.feature_penalties)?;
        positive_distance("gap_closing.max_distance", self.gap_closing.max_distance)?;
        finite_weights(
            "gap_closing.feature_penalties",
            &self.gap_closing.feature_penalties,
        )?;
        positive_distance("merging.max_distance", self.merging.max_distance)?;
        finite_weights("merging.feature_penalties", &self.merging.feature_penalties)?;
        positive_distance("splitting.max_distance", self.splitting.max_distance)?;
        finite_weights(
            "splitting.feature_penalties",
            &self.splitting.feature_penalties,
        )?;

        let RatioBounds { min, max } = self.intensity_ratio_bounds;
        if !(min > 0.0 && min <= 1.0 && max >= 1.0 && max.is_finite()) {
            return Err(ConfigError::new(
                "intensity_ratio_bounds",
                format!("must satisfy 0 < min <= 1 <= max, got ({}, {})", min, max),
            ));
        }

        if !(self.alternative_cost_factor > 0.0 && self.alternative_cost_factor.is_finite()) {
            return Err(ConfigError::new(
                "alternative_cost_factor",
                format!("must be > 0, got {}", self.alternative_cost_factor),
            ));
        }
        if !(self.cutoff_percentile > 0.0 && self.cutoff_percentile <= 1.0) {
            return Err(ConfigError::new(
                "cutoff_percentile",
                format!("must be in (0, 1], got {}", self.cutoff_percentile),
            ));
        }
        if self.num_workers == 0 {
            return Err(ConfigError::new("num_workers", "must be >= 1"));
        }
        if self.max_matrix_elements == 0 {
            return Err(ConfigError::new("max_matrix_elements", "must be >= 1"));
        }

        if !self.blocking_value.is_finite() {
            return Err(ConfigError::new(
                "blocking_value",
                format!("must be finite, got {}", self.blocking_value),
            ));
        }
        let max_cost = self.max_achievable_cost();
        if self.blocking_value <= max_cost {
            return Err(ConfigError::new(
                "blocking_value",
                format!(
                    "must exceed the largest achievable cost {:e}, got {:e}",
                    max_cost, self.blocking_value
                ),
            ));
        }

        Ok(())
    }
}

fn positive_distance(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::new(field, format!("must be > 0, got {}", value)))
    }
}

fn finite_weights(field: &'static str, penalties: &FeaturePenalties) -> Result<(), ConfigError> {
    match penalties.iter().find(|(_, w)| !w.is_finite()) {
        Some((feature, w)) => Err(ConfigError::new(
            field,
            format!("weight for {} must be finite, got {}", feature, w),
        )),
        None => Ok(()),
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`TrackerConfig`].
#[derive(Debug, Default)]
pub struct TrackerConfigBuilder {
    linking_max_distance: Option<f64>,
    linking_penalties: FeaturePenalties,
    gap_closing: Option<bool>,
    gap_closing_max_distance: Option<f64>,
    max_frame_gap: Option<usize>,
    gap_closing_penalties: FeaturePenalties,
    merging: Option<bool>,
    merging_max_distance: Option<f64>,
    merging_penalties: FeaturePenalties,
    splitting: Option<bool>,
    splitting_max_distance: Option<f64>,
    splitting_penalties: FeaturePenalties,
    morphology_heuristic: Option<bool>,
    intensity_ratio_bounds: Option<RatioBounds>,
    alternative_cost_factor: Option<f64>,
    cutoff_percentile: Option<f64>,
    blocking_value: Option<f64>,
    num_workers: Option<usize>,
    max_matrix_elements: Option<usize>,
}

impl TrackerConfigBuilder {
    pub fn linking_max_distance(mut self, distance: f64) -> Self {
        self.linking_max_distance = Some(distance);
        self
    }

    /// Add a linking feature penalty.
    pub fn linking_feature_penalty(mut self, feature: Feature, weight: f64) -> Self {
        self.linking_penalties.insert(feature, weight);
        self
    }

    pub fn gap_closing(mut self, enabled: bool) -> Self {
        self.gap_closing = Some(enabled);
        self
    }

    pub fn gap_closing_max_distance(mut self, distance: f64) -> Self {
        self.gap_closing_max_distance = Some(distance);
        self
    }

    pub fn max_frame_gap(mut self, gap: usize) -> Self {
        self.max_frame_gap = Some(gap);
        self
    }

    /// Add a gap-closing feature penalty.
    pub fn gap_closing_feature_penalty(mut self, feature: Feature, weight: f64) -> Self {
        self.gap_closing_penalties.insert(feature, weight);
        self
    }

    pub fn merging(mut self, enabled: bool) -> Self {
        self.merging = Some(enabled);
        self
    }

    pub fn merging_max_distance(mut self, distance: f64) -> Self {
        self.merging_max_distance = Some(distance);
        self
    }

    /// Add a merging feature penalty.
    pub fn merging_feature_penalty(mut self, feature: Feature, weight: f64) -> Self {
        self.merging_penalties.insert(feature, weight);
        self
    }

    pub fn splitting(mut self, enabled: bool) -> Self {
        self.splitting = Some(enabled);
        self
    }

    pub fn splitting_max_distance(mut self, distance: f64) -> Self {
        self.splitting_max_distance = Some(distance);
        self
    }

    /// Add a splitting feature penalty.
    pub fn splitting_feature_penalty(mut self, feature: Feature, weight: f64) -> Self {
        self.splitting_penalties.insert(feature, weight);
        self
    }

    /// Enable the morphology agreement factor on split costs.
    pub fn morphology_heuristic(mut self, enabled: bool) -> Self {
        self.morphology_heuristic = Some(enabled);
        self
    }

    pub fn intensity_ratio_bounds(mut self, min: f64, max: f64) -> Self {
        self.intensity_ratio_bounds = Some(RatioBounds::new(min, max));
        self
    }

    pub fn alternative_cost_factor(mut self, factor: f64) -> Self {
        self.alternative_cost_factor = Some(factor);
        self
    }

    pub fn cutoff_percentile(mut self, percentile: f64) -> Self {
        self.cutoff_percentile = Some(percentile);
        self
    }

    pub fn blocking_value(mut self, value: f64) -> Self {
        self.blocking_value = Some(value);
        self
    }

    pub fn num_workers(mut self, workers: usize) -> Self {
        self.num_workers = Some(workers);
        self
    }

    pub fn max_matrix_elements(mut self, elements: usize) -> Self {
        self.max_matrix_elements = Some(elements);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<TrackerConfig, ConfigError> {
        let defaults = TrackerConfig::default();
        let config = TrackerConfig {
            linking: LinkingConfig {
                max_distance: self
                    .linking_max_distance
                    .unwrap_or(defaults.linking.max_distance),
                feature_penalties: self.linking_penalties,
            },
            gap_closing: GapClosingConfig {
                enabled: self.gap_closing.unwrap_or(defaults.gap_closing.enabled),
                max_distance: self
                    .gap_closing_max_distance
                    .unwrap_or(defaults.gap_closing.max_distance),
                max_frame_gap: self
                    .max_frame_gap
                    .unwrap_or(defaults.gap_closing.max_frame_gap),
                feature_penalties: self.gap_closing_penalties,
            },
            merging: MergingConfig {
                enabled: self.merging.unwrap_or(defaults.merging.enabled),
                max_distance: self
                    .merging_max_distance
                    .unwrap_or(defaults.merging.max_distance),
                feature_penalties: self.merging_penalties,
            },
            splitting: SplittingConfig {
                enabled: self.splitting.unwrap_or(defaults.splitting.enabled),
                max_distance: self
                    .splitting_max_distance
                    .unwrap_or(defaults.splitting.max_distance),
                feature_penalties: self.splitting_penalties,
                morphology_heuristic: self
                    .morphology_heuristic
                    .unwrap_or(defaults.splitting.morphology_heuristic),
            },
            intensity_ratio_bounds: self
                .intensity_ratio_bounds
                .unwrap_or(defaults.intensity_ratio_bounds),
            alternative_cost_factor: self
                .alternative_cost_factor
                .unwrap_or(defaults.alternative_cost_factor),
            cutoff_percentile: self
                .cutoff_percentile
                .unwrap_or(defaults.cutoff_percentile),
            blocking_value: self.blocking_value.unwrap_or(defaults.blocking_value),
            num_workers: self.num_workers.unwrap_or(defaults.num_workers),
            max_matrix_elements: self
                .max_matrix_elements
                .unwrap_or(defaults.max_matrix_elements),
        };
        config.validate()?;
        Ok(config)
    }
}
