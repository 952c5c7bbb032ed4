//! Removing caller-flagged features.

use hashbrown::HashSet;
use voxel_types::{AttributeArray, AttributeMatrix, GridDims};

use super::check_cells;
use crate::error::{CleanupResult, invalid};
use crate::features::{RemovalOptions, RemovalReport, remove_features};
use crate::sweep::{SweepConfig, SweepObserver};

/// Parameters for [`remove_flagged_features`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RemoveFlaggedParams {
    /// Boolean feature array; `true` marks a feature for removal.
    ///
    /// Default: `"FlaggedFeatures"`
    pub flagged_array: String,

    /// Fill the removed voxels from the surviving neighbours.
    ///
    /// When false they become background.
    /// Default: `true`
    pub fill_removed: bool,

    /// Cell arrays that are not copied while filling.
    ///
    /// Default: empty
    pub ignored_arrays: HashSet<String>,

    /// Sweep settings for the fill.
    pub sweep: SweepConfig,
}

impl Default for RemoveFlaggedParams {
    fn default() -> Self {
        Self {
            flagged_array: "FlaggedFeatures".to_string(),
            fill_removed: true,
            ignored_arrays: HashSet::new(),
            sweep: SweepConfig::default(),
        }
    }
}

impl RemoveFlaggedParams {
    /// Set the name of the flag array.
    #[must_use]
    pub fn with_flagged_array(mut self, name: impl Into<String>) -> Self {
        self.flagged_array = name.into();
        self
    }

    /// Set whether removed voxels are filled.
    #[must_use]
    pub fn with_fill_removed(mut self, fill: bool) -> Self {
        self.fill_removed = fill;
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
    /// if the flag array name is empty.
    pub fn validate(&self) -> CleanupResult<()> {
        if self.flagged_array.is_empty() {
            return Err(invalid("flagged_array", "must not be empty"));
        }
        Ok(())
    }
}

/// Removes every feature whose flag is set.
///
/// # Errors
///
/// Returns an error if the flag array is missing, not `bool` or has more than
/// one component, if every feature is flagged, or for mismatched lengths.
/// Nothing is modified in those cases.
///
/// # Example
///
/// ```
/// use voxel_cleanup::{RemoveFlaggedParams, remove_flagged_features};
/// use voxel_types::{AttributeMatrix, DataArray, GridDims};
///
/// let grid = GridDims::new(3, 1, 1).unwrap();
/// let mut labels = vec![1, 2, 3];
/// let mut cells = AttributeMatrix::new(3);
/// let mut features = AttributeMatrix::new(4);
/// features
///     .insert(DataArray::from_vec("FlaggedFeatures", 1, vec![false, false, true, false]).unwrap())
///     .unwrap();
///
/// let params = RemoveFlaggedParams::default().with_fill_removed(false);
/// remove_flagged_features(&grid, &mut labels, &mut cells, &mut features, &params, &mut ()).unwrap();
///
/// assert_eq!(labels, vec![1, 0, 2]);
/// assert_eq!(features.num_tuples(), 3);
/// ```
pub fn remove_flagged_features(
    grid: &GridDims,
    labels: &mut [i32],
    cells: &mut AttributeMatrix,
    features: &mut AttributeMatrix,
    params: &RemoveFlaggedParams,
    observer: &mut dyn SweepObserver,
) -> CleanupResult<RemovalReport> {
    params.validate()?;
    check_cells(grid.voxel_count(), labels, cells)?;

    let flags = features.get::<bool>(&params.flagged_array)?;
    if flags.components() != 1 {
        return Err(invalid(
            "flagged_array",
            format!("`{}` must have one component", params.flagged_array),
        ));
    }
    let active: Vec<bool> = flags.as_slice().iter().map(|&flagged| !flagged).collect();

    let options = RemovalOptions {
        fill: params.fill_removed,
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

    fn features_with_flags(flags: Vec<bool>) -> AttributeMatrix {
        let mut m = AttributeMatrix::new(flags.len());
        m.insert(DataArray::from_vec("FlaggedFeatures", 1, flags).unwrap())
            .unwrap();
        m
    }

    #[test]
    fn test_fill_removed() {
        let grid = GridDims::new(3, 1, 1).unwrap();
        let mut labels = vec![1, 2, 2];
        let mut cells = AttributeMatrix::new(3);
        let mut features = features_with_flags(vec![false, false, true]);

        let report = remove_flagged_features(
            &grid,
            &mut labels,
            &mut cells,
            &mut features,
            &RemoveFlaggedParams::default(),
            &mut (),
        )
        .unwrap();

        assert_eq!(labels, vec![1, 1, 1]);
        assert_eq!(report.fill.unwrap().sweeps, 2);
        assert_eq!(
            features.get::<bool>("FlaggedFeatures").unwrap().as_slice(),
            &[false, false]
        );
    }

    #[test]
    fn test_wrong_type_flag_array() {
        let grid = GridDims::new(2, 1, 1).unwrap();
        let mut labels = vec![1, 1];
        let mut cells = AttributeMatrix::new(2);
        let mut features = AttributeMatrix::new(2);
        features
            .insert(DataArray::from_vec("FlaggedFeatures", 1, vec![0i32, 1]).unwrap())
            .unwrap();

        let err = remove_flagged_features(
            &grid,
            &mut labels,
            &mut cells,
            &mut features,
            &RemoveFlaggedParams::default(),
            &mut (),
        )
        .unwrap_err();
        assert!(matches!(err, CleanupError::Grid(_)));
    }

    #[test]
    fn test_everything_flagged() {
        let grid = GridDims::new(2, 1, 1).unwrap();
        let mut labels = vec![1, 2];
        let mut cells = AttributeMatrix::new(2);
        let mut features = features_with_flags(vec![false, true, true]);

        let err = remove_flagged_features(
            &grid,
            &mut labels,
            &mut cells,
            &mut features,
            &RemoveFlaggedParams::default(),
            &mut (),
        )
        .unwrap_err();
        assert_eq!(err, CleanupError::AllFeaturesRemoved { num_features: 2 });
        assert_eq!(labels, vec![1, 2]);
    }
}
