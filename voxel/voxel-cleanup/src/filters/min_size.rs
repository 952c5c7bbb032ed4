//! Removing features below a voxel-count threshold.

use hashbrown::HashSet;
use tracing::debug;
use voxel_types::{AttributeMatrix, GridDims};

use super::{check_cells, check_single_phase, phase_filter};
use crate::error::CleanupResult;
use crate::features::{RemovalOptions, RemovalReport, feature_sizes, remove_features};
use crate::sweep::{SweepConfig, SweepObserver};

/// Parameters for [`min_size`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MinSizeParams {
    /// Features with fewer voxels are removed.
    ///
    /// Default: `1`
    pub min_allowed_size: usize,

    /// Only remove features of this phase.
    ///
    /// Default: `None` (all phases)
    pub single_phase: Option<i32>,

    /// Feature array holding each feature's phase.
    ///
    /// Only read when `single_phase` is set.
    /// Default: `"Phases"`
    pub feature_phases_array: String,

    /// Cell arrays that are not copied while filling.
    ///
    /// Default: empty
    pub ignored_arrays: HashSet<String>,

    /// Sweep settings for the fill.
    pub sweep: SweepConfig,
}

impl Default for MinSizeParams {
    fn default() -> Self {
        Self {
            min_allowed_size: 1,
            single_phase: None,
            feature_phases_array: "Phases".to_string(),
            ignored_arrays: HashSet::new(),
            sweep: SweepConfig::default(),
        }
    }
}

impl MinSizeParams {
    /// Set the minimum feature size.
    #[must_use]
    pub fn with_min_allowed_size(mut self, size: usize) -> Self {
        self.min_allowed_size = size;
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

/// Removes features smaller than `min_allowed_size` voxels.
///
/// Their voxels are filled from the surviving neighbours, then the feature
/// table is compacted and labels renumbered.
///
/// # Errors
///
/// Returns [`CleanupError::AllFeaturesRemoved`](crate::CleanupError::AllFeaturesRemoved)
/// when no feature would survive, or a validation error. Nothing is modified
/// in either case.
///
/// # Example
///
/// ```
/// use voxel_cleanup::{MinSizeParams, min_size};
/// use voxel_types::{AttributeMatrix, GridDims};
///
/// let grid = GridDims::new(5, 1, 1).unwrap();
/// let mut labels = vec![1, 1, 2, 3, 3];
/// let mut cells = AttributeMatrix::new(5);
/// let mut features = AttributeMatrix::new(4);
///
/// let params = MinSizeParams::default().with_min_allowed_size(2);
/// let report = min_size(&grid, &mut labels, &mut cells, &mut features, &params, &mut ()).unwrap();
///
/// assert_eq!(report.removed_features, 1);
/// assert_eq!(labels, vec![1, 1, 1, 2, 2]);
/// ```
pub fn min_size(
    grid: &GridDims,
    labels: &mut [i32],
    cells: &mut AttributeMatrix,
    features: &mut AttributeMatrix,
    params: &MinSizeParams,
    observer: &mut dyn SweepObserver,
) -> CleanupResult<RemovalReport> {
    params.validate()?;
    check_cells(grid.voxel_count(), labels, cells)?;

    let sizes = feature_sizes(labels, features.num_tuples())?;
    let phases = phase_filter(features, params.single_phase, &params.feature_phases_array)?;

    let active: Vec<bool> = sizes
        .iter()
        .enumerate()
        .map(|(id, &size)| {
            let in_phase = phases.is_none_or(|(phases, phase)| phases[id] == phase);
            id == 0 || size >= params.min_allowed_size || !in_phase
        })
        .collect();
    debug!(
        min_allowed_size = params.min_allowed_size,
        undersized = active.iter().filter(|&&a| !a).count(),
        "feature sizes checked"
    );

    let options = RemovalOptions {
        fill: true,
        ignored: &params.ignored_arrays,
        config: &params.sweep,
    };
    remove_features(grid, labels, cells, features, &active, &options, observer)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::CleanupError;
    use voxel_types::DataArray;

    #[test]
    fn test_single_phase_only() {
        let grid = GridDims::new(6, 1, 1).unwrap();
        let mut labels = vec![1, 1, 2, 3, 3, 4];
        let mut cells = AttributeMatrix::new(6);
        let mut features = AttributeMatrix::new(5);
        features
            .insert(DataArray::from_vec("Phases", 1, vec![0, 1, 1, 1, 2]).unwrap())
            .unwrap();
        let params = MinSizeParams::default()
            .with_min_allowed_size(2)
            .with_single_phase(Some(1));

        let report =
            min_size(&grid, &mut labels, &mut cells, &mut features, &params, &mut ()).unwrap();

        // Feature 2 (phase 1) goes; feature 4 is small but phase 2.
        assert_eq!(report.active, vec![true, true, false, true, true]);
        assert_eq!(labels, vec![1, 1, 1, 2, 2, 3]);
        assert_eq!(features.get::<i32>("Phases").unwrap().as_slice(), &[0, 1, 1, 2]);
    }

    #[test]
    fn test_all_too_small() {
        let grid = GridDims::new(2, 1, 1).unwrap();
        let mut labels = vec![1, 2];
        let mut cells = AttributeMatrix::new(2);
        let mut features = AttributeMatrix::new(3);
        let params = MinSizeParams::default().with_min_allowed_size(5);

        let err =
            min_size(&grid, &mut labels, &mut cells, &mut features, &params, &mut ()).unwrap_err();

        assert_eq!(err, CleanupError::AllFeaturesRemoved { num_features: 2 });
        assert_eq!(labels, vec![1, 2]);
    }

    #[test]
    fn test_label_beyond_table() {
        let grid = GridDims::new(2, 1, 1).unwrap();
        let mut labels = vec![1, 9];
        let mut cells = AttributeMatrix::new(2);
        let mut features = AttributeMatrix::new(3);
        let err = min_size(
            &grid,
            &mut labels,
            &mut cells,
            &mut features,
            &MinSizeParams::default(),
            &mut (),
        )
        .unwrap_err();
        assert!(matches!(err, CleanupError::FeatureOutOfRange { id: 9, .. }));
    }

    #[test]
    fn test_rejects_phase_zero() {
        assert!(MinSizeParams::default().with_single_phase(Some(0)).validate().is_err());
    }
}
