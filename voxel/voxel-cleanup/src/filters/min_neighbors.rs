//! Removing features with too few contiguous neighbors.

use hashbrown::HashSet;
use tracing::debug;
use voxel_types::{AttributeMatrix, GridDims};

use super::{check_cells, check_single_phase, phase_filter};
use crate::error::CleanupResult;
use crate::features::{RemovalOptions, RemovalReport, find_num_neighbors, remove_features};
use crate::sweep::{SweepConfig, SweepObserver};

/// Parameters for [`min_neighbors`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MinNeighborsParams {
    /// Features touching fewer distinct features are removed.
    ///
    /// Default: `1`
    pub min_num_neighbors: usize,

    /// Only remove features of this phase.
    ///
    /// Default: `None` (all phases)
    pub single_phase: Option<i32>,

    /// Feature array holding each feature's phase.
    ///
    /// Default: `"Phases"`
    pub feature_phases_array: String,

    /// Cell arrays that are not copied while filling.
    ///
    /// Default: empty
    pub ignored_arrays: HashSet<String>,

    /// Sweep settings for the fill.
    pub sweep: SweepConfig,
}

impl Default for MinNeighborsParams {
    fn default() -> Self {
        Self {
            min_num_neighbors: 1,
            single_phase: None,
            feature_phases_array: "Phases".to_string(),
            ignored_arrays: HashSet::new(),
            sweep: SweepConfig::default(),
        }
    }
}

impl MinNeighborsParams {
    /// Set the minimum number of neighbouring features.
    #[must_use]
    pub fn with_min_num_neighbors(mut self, n: usize) -> Self {
        self.min_num_neighbors = n;
        self
    }

    /// Restrict removal to one phase.
    #[must_use]
    pub fn with_single_phase(mut self, phase: Option<i32>) -> Self {
        self.single_phase = phase;
        self
    }

    /// Set the name of the feature phases array.
    #[must_use]
    pub fn with_feature_phases_array(mut self, name: impl Into<String>) -> Self {
        self.feature_phases_array = name.into();
        self
    }

    /// Exclude a cell array from copying.
    #[must_use]
    pub fn with_ignored_array(mut self, name: impl Into<String>) -> Self {
        self.ignored_arrays.insert(name.into());
        self
    }

    /// Set the sweep settings.
    #[must_use]
    pub fn with_sweep(mut self, sweep: SweepConfig) -> Self {
        self.sweep = sweep;
        self
    }

    /// Checks the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CleanupError::InvalidParameter`](crate::CleanupError::InvalidParameter)
    /// if `single_phase` is below 1.
    pub fn validate(&self) -> CleanupResult<()> {
        check_single_phase(self.single_phase)
    }
}

/// Removes features with fewer than `min_num_neighbors` contiguous neighbours.
///
/// Removed voxels are filled from the survivors and the feature table is
/// compacted, as in [`min_size`](crate::min_size).
///
/// # Errors
///
/// Returns [`CleanupError::AllFeaturesRemoved`](crate::CleanupError::AllFeaturesRemoved)
/// when no feature would survive, or a validation error. Nothing is modified
/// in either case.
pub fn min_neighbors(
    grid: &GridDims,
    labels: &mut [i32],
    cells: &mut AttributeMatrix,
    features: &mut AttributeMatrix,
    params: &MinNeighborsParams,
    observer: &mut dyn SweepObserver,
) -> CleanupResult<RemovalReport> {
    params.validate()?;
    check_cells(grid.voxel_count(), labels, cells)?;

    let counts = find_num_neighbors(grid, labels, features.num_tuples())?;
    let phases = phase_filter(features, params.single_phase, &params.feature_phases_array)?;

    let active: Vec<bool> = counts
        .iter()
        .enumerate()
        .map(|(id, &count)| {
            let in_phase = phases.is_none_or(|(phases, phase)| phases[id] == phase);
            id == 0 || count >= params.min_num_neighbors || !in_phase
        })
        .collect();
    debug!(
        min_num_neighbors = params.min_num_neighbors,
        isolated = active.iter().filter(|&&a| !a).count(),
        "neighbor counts checked"
    );

    let options = RemovalOptions {
        fill: true,
        ignored: &params.ignored_arrays,
        config: &params.sweep,
    };
    remove_features(grid, labels, cells, features, &active, &options, observer)
}
